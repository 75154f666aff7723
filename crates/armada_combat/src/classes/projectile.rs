//! Класс снаряда (immutable template)

use serde::{Deserialize, Serialize};

use super::{CombatEntity, ModelRef, ResourceHost};
use crate::config::{ensure_non_negative, ensure_positive, ConfigError, GraphicsSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileClass {
    pub name: String,
    pub damage: f32,
    /// kg — определяет передачу импульса и отдачу
    pub mass: f32,
    pub duration_ms: f32,
    /// Последние N ms жизни мощность линейно затухает до 0
    pub dissipation_duration_ms: f32,
    /// Множитель к environment drag
    pub drag_factor: f32,
    pub model: ModelRef,
    pub shield_explosion: String,
    pub armor_explosion: String,
}

impl Default for ProjectileClass {
    fn default() -> Self {
        Self {
            name: "projectile".to_string(),
            damage: 10.0,
            mass: 1.0,
            duration_ms: 2000.0,
            dissipation_duration_ms: 500.0,
            drag_factor: 1.0,
            model: ModelRef::default(),
            shield_explosion: "shield_spark".to_string(),
            armor_explosion: "armor_spark".to_string(),
        }
    }
}

impl ProjectileClass {
    pub fn duration_s(&self) -> f32 {
        self.duration_ms / 1000.0
    }

    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = format!("projectile `{}`", self.name);

        ensure_non_negative(&owner, "damage", &mut self.damage, defaults.damage, &mut errors);
        ensure_positive(&owner, "mass", &mut self.mass, defaults.mass, &mut errors);
        ensure_positive(&owner, "duration_ms", &mut self.duration_ms, defaults.duration_ms, &mut errors);
        ensure_non_negative(
            &owner,
            "dissipation_duration_ms",
            &mut self.dissipation_duration_ms,
            defaults.dissipation_duration_ms,
            &mut errors,
        );
        ensure_non_negative(&owner, "drag_factor", &mut self.drag_factor, defaults.drag_factor, &mut errors);
        errors
    }
}

impl CombatEntity for ProjectileClass {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, _graphics: &GraphicsSettings) {
        self.model.acquire(host);
        host.request_particle(&self.shield_explosion);
        host.request_particle(&self.armor_explosion);
    }
}
