//! Rigid body модель боевых объектов
//!
//! Headless интегратор (semi-implicit Euler). Силы передаются как импульс
//! за `duration_ms`: `Δv = F·t / m`, `Δω = τ·t / I`. Инерция скалярная.
//!
//! Rapier подключается отдельно (rapier.rs): коллайдеры из hitboxes
//! и синхронизация скоростей, интеграция остаётся здесь.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Интерфейс rigid body, который вызывает combat core
pub trait RigidBody {
    fn position(&self) -> Vec3;
    fn orientation(&self) -> Quat;
    fn velocity(&self) -> Vec3;

    /// Угловая скорость в мировых осях (rad/s)
    fn angular_velocity(&self) -> Vec3;

    fn mass(&self) -> f32;
    fn inertia(&self) -> f32;

    /// Сила в мировых осях, действующая `duration_ms`
    fn apply_force(&mut self, force: Vec3, duration_ms: f32);

    /// Момент в мировых осях, действующий `duration_ms`
    fn apply_torque(&mut self, torque: Vec3, duration_ms: f32);

    fn apply_force_and_torque(&mut self, force: Vec3, torque: Vec3, duration_ms: f32) {
        self.apply_force(force, duration_ms);
        self.apply_torque(torque, duration_ms);
    }

    /// Сопротивление среды: гасит линейную и угловую скорость
    fn apply_drag(&mut self, drag: f32, dt_ms: f32);

    /// Мировая → локальная (object space) точка
    fn to_local(&self, world_point: Vec3) -> Vec3 {
        self.orientation().inverse() * (world_point - self.position())
    }

    fn to_world(&self, local_point: Vec3) -> Vec3 {
        self.position() + self.orientation() * local_point
    }

    fn local_velocity(&self) -> Vec3 {
        self.orientation().inverse() * self.velocity()
    }

    fn local_angular_velocity(&self) -> Vec3 {
        self.orientation().inverse() * self.angular_velocity()
    }
}

/// Oriented hitbox (оси совпадают с осями объекта)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitBox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl HitBox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Параметр t ∈ [0, 1] первого входа отрезка `start..end` (object space)
    /// в hitbox, расширенный на `offset` по каждой оси
    pub fn intersect_segment(&self, start: Vec3, end: Vec3, offset: f32) -> Option<f32> {
        let half = self.half_extents + Vec3::splat(offset.max(0.0));
        let min = self.center - half;
        let max = self.center + half;
        let direction = end - start;

        let mut t_enter = 0.0f32;
        let mut t_exit = 1.0f32;

        for axis in 0..3 {
            let origin = start[axis];
            let delta = direction[axis];

            if delta.abs() <= f32::EPSILON {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / delta;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        Some(t_enter)
    }

    /// Радиус описанной сферы относительно центра объекта
    pub fn bounding_radius(&self) -> f32 {
        self.center.length() + self.half_extents.length()
    }
}

/// Физическое тело корабля/ракеты
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PhysicalObject {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub inertia: f32,
    pub hitboxes: Vec<HitBox>,
}

impl Default for PhysicalObject {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            inertia: 1.0,
            hitboxes: Vec::new(),
        }
    }
}

impl PhysicalObject {
    pub fn new(mass: f32, inertia: f32, hitboxes: Vec<HitBox>) -> Self {
        Self {
            mass,
            inertia,
            hitboxes,
            ..default()
        }
    }

    pub fn with_pose(mut self, position: Vec3, orientation: Quat) -> Self {
        self.position = position;
        self.orientation = orientation;
        self
    }

    /// Шаг интеграции: position += v·dt, orientation поворачивается на ω·dt
    pub fn integrate(&mut self, dt_ms: f32) {
        let dt = dt_ms / 1000.0;
        self.position += self.velocity * dt;

        let rotation = self.angular_velocity * dt;
        if rotation.length_squared() > 0.0 {
            self.orientation = (Quat::from_scaled_axis(rotation) * self.orientation).normalize();
        }
    }

    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.orientation)
    }
}

impl RigidBody for PhysicalObject {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn inertia(&self) -> f32 {
        self.inertia
    }

    fn apply_force(&mut self, force: Vec3, duration_ms: f32) {
        if self.mass > 0.0 {
            self.velocity += force * (duration_ms / 1000.0) / self.mass;
        }
    }

    fn apply_torque(&mut self, torque: Vec3, duration_ms: f32) {
        if self.inertia > 0.0 {
            self.angular_velocity += torque * (duration_ms / 1000.0) / self.inertia;
        }
    }

    fn apply_drag(&mut self, drag: f32, dt_ms: f32) {
        if drag <= 0.0 {
            return;
        }
        let factor = (1.0 - drag * dt_ms / 1000.0).max(0.0);
        self.velocity *= factor;
        self.angular_velocity *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn unit_box() -> HitBox {
        HitBox::new(Vec3::ZERO, Vec3::splat(1.0))
    }

    #[test]
    fn test_segment_through_box() {
        let t = unit_box()
            .intersect_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 0.0)
            .unwrap();
        assert!((t - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_segment_misses_box_unless_offset() {
        let start = Vec3::new(-5.0, 1.5, 0.0);
        let end = Vec3::new(5.0, 1.5, 0.0);
        assert!(unit_box().intersect_segment(start, end, 0.0).is_none());
        assert!(unit_box().intersect_segment(start, end, 1.0).is_some());
    }

    #[test]
    fn test_segment_stopping_short() {
        let hit = unit_box().intersect_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0), 0.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_force_is_impulse_over_duration() {
        let mut body = PhysicalObject::new(10.0, 2.0, Vec::new());
        body.apply_force(Vec3::new(100.0, 0.0, 0.0), 500.0);
        assert!((body.velocity.x - 5.0).abs() < 1e-5);

        body.apply_torque(Vec3::new(0.0, 0.0, 4.0), 1000.0);
        assert!((body.angular_velocity.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_integrate_rotates_forward() {
        let mut body = PhysicalObject {
            angular_velocity: Vec3::new(0.0, 0.0, FRAC_PI_2),
            ..default()
        };
        body.integrate(1000.0);

        // +90° вокруг Z: forward (+Y) уходит в -X (влево)
        let forward = body.orientation * Vec3::Y;
        assert!((forward - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-4);
    }
}
