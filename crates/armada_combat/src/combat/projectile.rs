//! Projectile — неуправляемый снаряд
//!
//! Жизненный цикл: alive → dissipating (time_left < dissipation, мощность
//! затухает линейно) → reusable (time_left ≤ 0).
//! Тик: drag → движение → fade → hit test.

use bevy::prelude::*;
use std::sync::Arc;

use super::events::Impact;
use super::hit_test::{check_hit, HitFlow, HitOffset, HitQuery};
use crate::battlefield::{PilotedCraft, SpatialIndex};
use crate::classes::ProjectileClass;
use crate::config::CombatSettings;
use crate::pool::Poolable;

#[derive(Debug, Default, Clone)]
pub struct Projectile {
    class: Option<Arc<ProjectileClass>>,
    pub position: Vec3,
    pub velocity: Vec3,
    time_left: f32,
    power: f32,
    origin: Option<Entity>,
    origin_team: Option<u32>,
}

impl Projectile {
    pub fn init(
        &mut self,
        class: Arc<ProjectileClass>,
        position: Vec3,
        velocity: Vec3,
        origin: Option<Entity>,
        origin_team: Option<u32>,
    ) {
        self.time_left = class.duration_ms;
        self.class = Some(class);
        self.position = position;
        self.velocity = velocity;
        self.power = 1.0;
        self.origin = origin;
        self.origin_team = origin_team;
    }

    /// Оставшееся время жизни (ms), может уйти в минус
    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    /// Множитель урона/импульса [0, 1]
    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn origin(&self) -> Option<Entity> {
        self.origin
    }

    pub fn simulate(
        &mut self,
        dt_ms: f32,
        index: &impl SpatialIndex,
        piloted: Option<PilotedCraft>,
        settings: &CombatSettings,
    ) -> Option<Impact> {
        if self.can_be_reused() {
            return None;
        }
        let class = self.class.clone()?;
        let dt_ms = dt_ms.max(0.0);
        let dt_s = dt_ms / 1000.0;

        self.time_left -= dt_ms;

        let drag = class.drag_factor * settings.drag_coefficient;
        if drag > 0.0 {
            self.velocity *= (1.0 - drag * dt_s).max(0.0);
        }
        self.position += self.velocity * dt_s;

        self.power = if self.time_left < class.dissipation_duration_ms {
            (self.time_left / class.dissipation_duration_ms).max(0.0)
        } else {
            1.0
        };

        if self.time_left <= 0.0 {
            return None;
        }

        let query = HitQuery {
            position: self.position,
            velocity: self.velocity,
            dt_ms,
            origin: self.origin,
            origin_team: self.origin_team,
            piloted,
            offset: HitOffset::Player(settings.player_hitbox_offset),
        };

        let mut impact = None;
        check_hit(&query, index, settings, |report| {
            impact = Some(Impact::kinetic(
                report,
                self.origin,
                class.damage * self.power,
                class.mass,
                self.power,
                (&class.shield_explosion, &class.armor_explosion),
                settings,
            ));
            HitFlow::Stop
        });

        if impact.is_some() {
            self.time_left = 0.0;
        }
        impact
    }
}

impl Poolable for Projectile {
    fn can_be_reused(&self) -> bool {
        self.time_left <= 0.0
    }
}
