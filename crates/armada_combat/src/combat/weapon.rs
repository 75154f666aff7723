//! Weapon — орудие на корабле (фиксированное или турель)
//!
//! Цепочка трансформаций (в системе корабля):
//! `mount · [T(c0) R0(a0) T(-c0)] · [T(c1) R1(a1) T(-c1)]`
//! где R0/R1 задаются стилем вращения:
//! - YawPitch: R0 = Rz(yaw), R1 = Rx(pitch)
//! - RollYaw:  R0 = Ry(roll), R1 = Rz(yaw)
//!
//! Углы ротаторов абсолютные относительно крепления (mount).

use bevy::math::Affine3A;
use bevy::prelude::*;
use std::sync::Arc;

use super::particle::MuzzleFlash;
use super::projectile::Projectile;
use crate::classes::{CombatEntity, ProjectileClass, ResourceHost, RotationStyle, WeaponClass};
use crate::config::{CombatSettings, GraphicsSettings};
use crate::math::{bearing, roll_and_yaw, wrap_angle, yaw_and_pitch, FORWARD};
use crate::physics::RigidBody;
use crate::pool::Pool;

/// Результат последнего `aim_towards`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AimStatus {
    /// Неподвижное орудие
    Fixed,
    #[default]
    NoTarget,
    /// Цель вне диапазона ротаторов
    AimingOutOfReach,
    Aiming,
    AimedOutOfRange,
    AimedInRange,
}

/// Кто стреляет (для фильтров hit test)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shooter {
    pub entity: Option<Entity>,
    pub team: Option<u32>,
}

/// Что произошло при выстреле
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volley {
    /// Позиция первого ствола (мир)
    pub position: Vec3,
    pub direction: Vec3,
    pub projectiles: usize,
}

#[derive(Debug, Clone)]
pub struct Weapon {
    pub class: Arc<WeaponClass>,
    projectile: Arc<ProjectileClass>,
    mount_position: Vec3,
    mount_orientation: Quat,
    angles: [f32; 2],
    cooldown: f32,
    status: AimStatus,
    muzzle_flashes: bool,
}

impl Weapon {
    pub fn new(
        class: Arc<WeaponClass>,
        projectile: Arc<ProjectileClass>,
        mount_position: Vec3,
        mount_orientation: Quat,
    ) -> Self {
        let mut angles = [0.0; 2];
        let status = if class.rotation_style.is_fixed() {
            AimStatus::Fixed
        } else {
            for (angle, rotator) in angles.iter_mut().zip(&class.rotators) {
                *angle = rotator.default_angle();
            }
            AimStatus::NoTarget
        };

        Self {
            class,
            projectile,
            mount_position,
            mount_orientation,
            angles,
            cooldown: 0.0,
            status,
            muzzle_flashes: true,
        }
    }

    pub fn projectile_class(&self) -> &Arc<ProjectileClass> {
        &self.projectile
    }

    pub fn angles(&self) -> [f32; 2] {
        self.angles
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn status(&self) -> AimStatus {
        self.status
    }

    /// Дальность, на которой снаряд ещё жив (м)
    pub fn range(&self) -> f32 {
        self.class.projectile_velocity * self.projectile.duration_s()
    }

    pub fn can_fire(&self) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        self.class.rotation_style.is_fixed()
            || !self.class.only_if_aimed_or_fixed
            || self.status == AimStatus::AimedInRange
    }

    pub fn simulate(&mut self, dt_ms: f32) {
        self.cooldown = (self.cooldown - dt_ms.max(0.0)).max(0.0);
    }

    /// Поворот ротаторов относительно крепления
    fn rotation_in_mount(&self) -> Quat {
        let [a0, a1] = self.angles;
        match self.class.rotation_style {
            RotationStyle::None | RotationStyle::Unknown => Quat::IDENTITY,
            RotationStyle::YawPitch => Quat::from_rotation_z(a0) * Quat::from_rotation_x(a1),
            RotationStyle::RollYaw => Quat::from_rotation_y(a0) * Quat::from_rotation_z(a1),
        }
    }

    /// Полная трансформация орудия в системе корабля
    pub fn transform_in_ship(&self) -> Affine3A {
        let mount = Affine3A::from_rotation_translation(self.mount_orientation, self.mount_position);
        let [a0, a1] = self.angles;
        let center = |index: usize| {
            self.class
                .rotators
                .get(index)
                .map_or(Vec3::ZERO, |rotator| rotator.center)
        };

        match self.class.rotation_style {
            RotationStyle::None | RotationStyle::Unknown => mount,
            RotationStyle::YawPitch => {
                mount
                    * rotate_about(center(0), Quat::from_rotation_z(a0))
                    * rotate_about(center(1), Quat::from_rotation_x(a1))
            }
            RotationStyle::RollYaw => {
                mount
                    * rotate_about(center(0), Quat::from_rotation_y(a0))
                    * rotate_about(center(1), Quat::from_rotation_z(a1))
            }
        }
    }

    /// Наводит орудие на точку упреждения (мир) и поворачивает ротаторы за `dt_ms`
    ///
    /// Точку считает `TargetingComputer::intercept_point`; `None` — цели нет.
    pub fn aim_towards(&mut self, ship: &impl RigidBody, aim_point: Option<Vec3>, dt_ms: f32) {
        if self.class.rotation_style.is_fixed() {
            self.status = AimStatus::Fixed;
            return;
        }

        let Some(aim_point) = aim_point else {
            let defaults = self.default_angles();
            self.rotate_to(defaults, dt_ms);
            self.status = AimStatus::NoTarget;
            return;
        };

        let base = ship.to_world(self.transform_in_ship().transform_point3(self.class.base_point));
        let aim = aim_point - base;

        let mount_orientation = ship.orientation() * self.mount_orientation;
        let local = mount_orientation.inverse() * aim;

        let (first, second) = match self.class.rotation_style {
            RotationStyle::YawPitch => yaw_and_pitch(local),
            RotationStyle::RollYaw => roll_and_yaw(local),
            RotationStyle::None | RotationStyle::Unknown => return,
        };

        let mut targets = [first, second];
        let mut out_of_reach = false;
        for (angle, rotator) in targets.iter_mut().zip(&self.class.rotators) {
            if let Some((min, max)) = rotator.range() {
                let clamped = angle.clamp(min, max);
                out_of_reach |= clamped != *angle;
                *angle = clamped;
            }
        }

        self.rotate_to(targets, dt_ms);

        let error = bearing(self.rotation_in_mount() * FORWARD, local);
        self.status = if out_of_reach {
            AimStatus::AimingOutOfReach
        } else if error > self.class.fire_threshold() {
            AimStatus::Aiming
        } else if aim.length() <= self.range() {
            AimStatus::AimedInRange
        } else {
            AimStatus::AimedOutOfRange
        };
    }

    fn default_angles(&self) -> [f32; 2] {
        let mut angles = [0.0; 2];
        for (angle, rotator) in angles.iter_mut().zip(&self.class.rotators) {
            *angle = rotator.default_angle();
        }
        angles
    }

    /// Двигает ротаторы к целевым углам с их скоростью
    ///
    /// Ограниченный ротатор клампится в диапазон, свободный идёт кратчайшим путём.
    pub fn rotate_to(&mut self, targets: [f32; 2], dt_ms: f32) {
        if self.class.rotation_style.is_fixed() {
            return;
        }
        let dt_s = dt_ms.max(0.0) / 1000.0;

        for ((angle, target), rotator) in self.angles.iter_mut().zip(targets).zip(&self.class.rotators) {
            let step = rotator.rotation_rate() * dt_s;
            match rotator.range() {
                Some((min, max)) => {
                    let target = target.clamp(min, max);
                    *angle = (*angle + (target - *angle).clamp(-step, step)).clamp(min, max);
                }
                None => {
                    let delta = wrap_angle(target - *angle);
                    *angle = wrap_angle(*angle + delta.clamp(-step, step));
                }
            }
        }
    }

    /// Выстрел из всех стволов
    ///
    /// Returns `None` если орудие не готово (cooldown / не наведено).
    pub fn fire(
        &mut self,
        ship: &mut impl RigidBody,
        shooter: Shooter,
        projectiles: &mut Pool<Projectile>,
        flashes: &mut Pool<MuzzleFlash>,
        settings: &CombatSettings,
    ) -> Option<Volley> {
        if !self.can_fire() {
            return None;
        }

        let transform = self.transform_in_ship();
        let local_direction = (self.mount_orientation * self.rotation_in_mount() * FORWARD).normalize();
        let direction = ship.orientation() * local_direction;
        let velocity = ship.velocity() + direction * self.class.projectile_velocity;

        let momentum_s = settings.momentum_duration_ms / 1000.0;
        let recoil = -direction * self.projectile.mass * self.class.projectile_velocity / momentum_s;

        let mut volley = Volley {
            position: ship.position(),
            direction,
            projectiles: 0,
        };

        for (index, barrel) in self.class.barrels.iter().enumerate() {
            let local_position = transform.transform_point3(barrel.position);
            let position = ship.to_world(local_position);
            if index == 0 {
                volley.position = position;
            }

            if self.muzzle_flashes && !self.class.muzzle_flash.is_empty() {
                if let Some((_, flash)) = flashes.acquire() {
                    flash.init(
                        &self.class.muzzle_flash,
                        shooter.entity,
                        local_position,
                        local_direction,
                        self.class.muzzle_flash_duration_ms,
                    );
                }
            }

            if let Some((_, projectile)) = projectiles.acquire() {
                projectile.init(self.projectile.clone(), position, velocity, shooter.entity, shooter.team);
                volley.projectiles += 1;
            }

            let torque = (position - ship.position()).cross(recoil);
            ship.apply_force_and_torque(recoil, torque, settings.momentum_duration_ms);
        }

        self.cooldown = self.class.cooldown_ms;
        Some(volley)
    }
}

fn rotate_about(center: Vec3, rotation: Quat) -> Affine3A {
    Affine3A::from_translation(center) * Affine3A::from_quat(rotation) * Affine3A::from_translation(-center)
}

impl CombatEntity for Weapon {
    fn display_name(&self) -> &str {
        &self.class.name
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings) {
        self.class.acquire_resources(host, graphics);
        self.projectile.acquire_resources(host, graphics);
    }

    fn handle_graphics_settings_changed(&mut self, graphics: &GraphicsSettings) {
        self.muzzle_flashes = graphics.muzzle_flashes;
    }
}
