//! MissileLauncher — пусковая установка
//!
//! Залп (salvo): первый ручной пуск с целью взводит `salvo_left = class.salvo`,
//! остальные ракеты уходят автоматически по `salvo_cooldown`.
//! Залп отменяется, если кончились ракеты или цель пропала.

use bevy::prelude::*;
use std::sync::Arc;

use super::missile::Missile;
use super::weapon::Shooter;
use crate::battlefield::{Battlefield, CraftSnapshot};
use crate::classes::{CombatEntity, MissileClass, MissileLauncherClass, ResourceHost};
use crate::config::{CombatSettings, GraphicsSettings};
use crate::math::{bearing, hit_time, FORWARD};
use crate::physics::RigidBody;
use crate::pool::{Pool, PoolHandle};

/// Успешный пуск
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchReport {
    pub handle: PoolHandle,
    pub position: Vec3,
    pub target: Option<Entity>,
}

#[derive(Debug, Clone)]
pub struct MissileLauncher {
    pub class: Arc<MissileLauncherClass>,
    missile: Arc<MissileClass>,
    mount_position: Vec3,
    mount_orientation: Quat,
    count: u32,
    cooldown: f32,
    next_tube: usize,
    salvo_enabled: bool,
    salvo_left: u32,
    salvo_target: Option<Entity>,
}

impl MissileLauncher {
    pub fn new(
        class: Arc<MissileLauncherClass>,
        missile: Arc<MissileClass>,
        mount_position: Vec3,
        mount_orientation: Quat,
    ) -> Self {
        Self {
            count: class.capacity,
            salvo_enabled: class.salvo > 1,
            class,
            missile,
            mount_position,
            mount_orientation,
            cooldown: 0.0,
            next_tube: 0,
            salvo_left: 0,
            salvo_target: None,
        }
    }

    pub fn missile_class(&self) -> &Arc<MissileClass> {
        &self.missile
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn salvo_enabled(&self) -> bool {
        self.salvo_enabled
    }

    pub fn salvo_left(&self) -> u32 {
        self.salvo_left
    }

    pub fn salvo_target(&self) -> Option<Entity> {
        self.salvo_target
    }

    /// Базовое время захвата цели этой пусковой
    pub fn locking_time_ms(&self) -> f32 {
        self.missile.locking_time_ms
    }

    /// Следующая ракета залпа готова к пуску
    pub fn salvo_pending(&self) -> bool {
        self.salvo_left > 0 && self.cooldown <= 0.0
    }

    pub fn simulate(&mut self, dt_ms: f32) {
        self.cooldown = (self.cooldown - dt_ms.max(0.0)).max(0.0);
    }

    pub fn toggle_salvo(&mut self) {
        self.salvo_enabled = !self.salvo_enabled;
        self.cancel_salvo();
    }

    pub fn cancel_salvo(&mut self) {
        self.salvo_left = 0;
        self.salvo_target = None;
    }

    /// Отменяет залп, если цель залпа уничтожена или вне боя
    pub fn check_salvo_target(&mut self, battlefield: &Battlefield) {
        if self.salvo_left == 0 {
            return;
        }
        let present = self
            .salvo_target
            .is_some_and(|target| battlefield.present(target).is_some());
        if !present {
            crate::log(&format!("{}: salvo target lost, cancelling salvo", self.class.name));
            self.cancel_salvo();
        }
    }

    fn forward(&self, ship: &impl RigidBody) -> Vec3 {
        ship.orientation() * self.mount_orientation * FORWARD
    }

    /// Пуск ракеты из следующей трубы
    ///
    /// `None`: cooldown, нет ракет (залп отменяется) или пул ракет исчерпан.
    pub fn launch(
        &mut self,
        ship: &mut impl RigidBody,
        shooter: Shooter,
        target: Option<Entity>,
        missiles: &mut Pool<Missile>,
        settings: &CombatSettings,
    ) -> Option<LaunchReport> {
        if self.cooldown > 0.0 {
            return None;
        }
        if self.count == 0 {
            self.cancel_salvo();
            return None;
        }

        // Слот пула до взвода залпа: при исчерпании состояние не меняется
        let (handle, missile) = missiles.acquire()?;

        if self.salvo_left == 0 && self.salvo_enabled && target.is_some() && self.class.salvo > 1 {
            self.salvo_left = self.class.salvo;
            self.salvo_target = target;
        }
        let target = if self.salvo_left > 0 { self.salvo_target } else { target };

        let tube = self
            .class
            .tubes
            .get(self.next_tube % self.class.tubes.len().max(1))
            .copied()
            .unwrap_or(Vec3::ZERO);
        self.next_tube = (self.next_tube + 1) % self.class.tubes.len().max(1);

        let position = ship.to_world(self.mount_position + self.mount_orientation * tube);
        let orientation = ship.orientation() * self.mount_orientation;
        let forward = orientation * FORWARD;
        let velocity = ship.velocity() + forward * self.missile.launch_velocity;

        missile.init(
            self.missile.clone(),
            position,
            orientation,
            velocity,
            target,
            shooter.entity,
            shooter.team,
        );

        self.count -= 1;
        self.salvo_left = self.salvo_left.saturating_sub(1);
        self.cooldown = if self.salvo_left > 0 {
            self.class.salvo_cooldown_ms
        } else {
            self.class.cooldown_ms
        };
        if self.count == 0 {
            self.cancel_salvo();
        }

        let momentum_s = settings.momentum_duration_ms / 1000.0;
        let recoil = -forward * self.missile.mass * self.missile.launch_velocity / momentum_s;
        let torque = (position - ship.position()).cross(recoil);
        ship.apply_force_and_torque(recoil, torque, settings.momentum_duration_ms);

        Some(LaunchReport {
            handle,
            position,
            target,
        })
    }

    /// Может ли ракета, запущенная сейчас, догнать цель за время жизни
    ///
    /// Последовательно: дрейф до зажигания → разворот на точку перехвата →
    /// разгон до перехвата. Пеленг больше угла захвата → всегда false.
    pub fn is_in_locking_range(&self, ship: &impl RigidBody, target: &CraftSnapshot, settings: &CombatSettings) -> bool {
        let forward = self.forward(ship);
        let locking_angle = self.missile.locking_angle();
        if locking_angle > 0.0 && bearing(forward, target.position - ship.position()) > locking_angle {
            return false;
        }

        let missile = &self.missile;
        let acceleration = missile.acceleration();
        let launch_velocity = ship.velocity() + forward * missile.launch_velocity;
        let relative_velocity = target.velocity - launch_velocity;

        // Дрейф до зажигания
        let ignition_s = missile.ignition_time_s();
        let mut relative_position = target.position - ship.position() + relative_velocity * ignition_s;

        // Разворот на точку перехвата
        let time = hit_time(relative_position, relative_velocity, 0.0, acceleration);
        let angle = bearing(forward, relative_position + relative_velocity * time);
        let alpha = missile.angular_acceleration;
        let turn_s = if angle <= f32::EPSILON {
            0.0
        } else if alpha > 0.0 {
            (2.0 * (angle / alpha).sqrt()).max(angle / (alpha * settings.turn_acceleration_duration_s))
        } else {
            return false;
        };
        relative_position += relative_velocity * turn_s;

        let remaining_s = missile.duration_s() - ignition_s - turn_s;
        if remaining_s <= 0.0 {
            return false;
        }

        let time = hit_time(relative_position, relative_velocity, 0.0, acceleration);
        time > 0.0 && time <= remaining_s
    }
}

impl CombatEntity for MissileLauncher {
    fn display_name(&self) -> &str {
        &self.class.name
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings) {
        self.class.acquire_resources(host, graphics);
        self.missile.acquire_resources(host, graphics);
    }
}
