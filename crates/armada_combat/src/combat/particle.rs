//! Muzzle flash — короткоживущая частица у ствола
//!
//! Чисто визуальная: следует за кораблём-стрелком, presentation читает
//! активные вспышки из `MuzzleFlashPool`.

use bevy::prelude::*;

use crate::pool::Poolable;

#[derive(Debug, Default, Clone)]
pub struct MuzzleFlash {
    pub class_name: String,
    pub owner: Option<Entity>,
    /// Позиция в системе корабля
    pub local_position: Vec3,
    pub direction: Vec3,
    time_left: f32,
}

impl MuzzleFlash {
    pub fn init(&mut self, class_name: &str, owner: Option<Entity>, local_position: Vec3, direction: Vec3, duration_ms: f32) {
        self.class_name.clear();
        self.class_name.push_str(class_name);
        self.owner = owner;
        self.local_position = local_position;
        self.direction = direction;
        self.time_left = duration_ms;
    }

    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    pub fn simulate(&mut self, dt_ms: f32) {
        self.time_left -= dt_ms.max(0.0);
    }

    /// Гасит вспышку (владелец уничтожен)
    pub fn extinguish(&mut self) {
        self.time_left = 0.0;
    }
}

impl Poolable for MuzzleFlash {
    fn can_be_reused(&self) -> bool {
        self.time_left <= 0.0
    }
}
