//! Spacecraft, Shield, Piloted компоненты

use bevy::prelude::*;
use std::sync::Arc;

use crate::classes::{ShieldClass, SpacecraftClass};

/// Корабль: класс, команда, целостность корпуса
#[derive(Component, Debug, Clone)]
pub struct Spacecraft {
    pub class: Arc<SpacecraftClass>,
    /// None — нейтрал, враждебен всем
    pub team: Option<u32>,
    pub hull: f32,
    /// Вне боя (прыжок, ангар): не цель и не участник hit test
    pub away: bool,
}

impl Spacecraft {
    pub fn new(class: Arc<SpacecraftClass>, team: Option<u32>) -> Self {
        Self {
            hull: class.hull,
            class,
            team,
            away: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hull > 0.0
    }

    pub fn hull_ratio(&self) -> f32 {
        (self.hull / self.class.hull).clamp(0.0, 1.0)
    }
}

/// Энергетический щит
///
/// Поглощает урон до нуля ёмкости, остаток проходит в корпус.
/// Восстановление начинается через `recharge_delay_ms` после последнего попадания.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Shield {
    pub capacity: f32,
    pub max_capacity: f32,
    pub recharge_delay_ms: f32,
    /// Ёмкость в секунду
    pub recharge_rate: f32,
    /// Время до начала восстановления
    pub recharge_timer_ms: f32,
}

impl Shield {
    pub fn from_class(class: &ShieldClass) -> Self {
        Self {
            capacity: class.capacity,
            max_capacity: class.capacity,
            recharge_delay_ms: class.recharge_delay_ms,
            recharge_rate: class.recharge_rate,
            recharge_timer_ms: 0.0,
        }
    }

    /// Поглощает урон, возвращает остаток `max(0, d − capacity)`
    pub fn damage(&mut self, damage: f32) -> f32 {
        let damage = damage.max(0.0);
        let absorbed = damage.min(self.capacity);
        self.capacity = (self.capacity - absorbed).max(0.0);
        if damage > 0.0 {
            self.recharge_timer_ms = self.recharge_delay_ms;
        }
        damage - absorbed
    }

    pub fn recharge(&mut self, dt_ms: f32) {
        if self.recharge_timer_ms > 0.0 {
            self.recharge_timer_ms = (self.recharge_timer_ms - dt_ms).max(0.0);
            return;
        }
        self.capacity = (self.capacity + self.recharge_rate * dt_ms / 1000.0).min(self.max_capacity);
    }

    pub fn is_up(&self) -> bool {
        self.capacity > 0.0
    }
}

/// Маркер: корабль игрока
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Piloted;
