//! Combat events (core ↔ host/presentation)

use bevy::prelude::*;

use super::hit_test::HitReport;
use crate::config::CombatSettings;

/// Host/AI → core: стрелять из орудий (None — из всех)
#[derive(Event, Debug, Clone)]
pub struct FireIntent {
    pub shooter: Entity,
    pub weapon: Option<usize>,
}

/// Host/AI → core: пуск ракеты из активной пусковой
#[derive(Event, Debug, Clone)]
pub struct LaunchIntent {
    pub shooter: Entity,
}

/// Орудие выстрелило (звук, отдача на камере)
#[derive(Event, Debug, Clone)]
pub struct WeaponFired {
    pub shooter: Entity,
    pub weapon: usize,
    pub position: Vec3,
    pub direction: Vec3,
}

#[derive(Event, Debug, Clone)]
pub struct MissileLaunched {
    pub shooter: Entity,
    pub launcher: usize,
    pub target: Option<Entity>,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplosionKind {
    /// Попадание в щит
    Shield,
    /// Попадание в корпус
    Armor,
    /// Самоликвидация без урона
    Fizzle,
}

#[derive(Event, Debug, Clone)]
pub struct ExplosionSpawned {
    pub kind: ExplosionKind,
    pub class_name: String,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Попадание снаряда/ракеты: урон + импульс (применяет damage::apply_hits)
#[derive(Event, Debug, Clone)]
pub struct SpacecraftHit {
    pub target: Entity,
    pub source: Option<Entity>,
    pub damage: f32,
    pub force: Vec3,
    pub torque: Vec3,
    pub duration_ms: f32,
}

#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub target: Entity,
    pub source: Option<Entity>,
    pub shield_damage: f32,
    pub hull_damage: f32,
}

#[derive(Event, Debug, Clone)]
pub struct SpacecraftDestroyed {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Результат попадания снаряда/ракеты за тик
#[derive(Debug, Clone)]
pub struct Impact {
    pub hit: SpacecraftHit,
    pub explosion: ExplosionSpawned,
}

impl Impact {
    /// Кинетическое попадание: импульс `|v_rel| · mass · power`,
    /// передаётся за `momentum_duration_ms`
    pub fn kinetic(
        report: &HitReport,
        source: Option<Entity>,
        damage: f32,
        mass: f32,
        power: f32,
        explosions: (&str, &str),
        settings: &CombatSettings,
    ) -> Self {
        let duration_ms = settings.momentum_duration_ms;
        let momentum = report.relative_velocity.length() * mass * power;
        let force = report.relative_velocity.normalize_or_zero() * momentum / (duration_ms / 1000.0);
        let torque = (report.world_point - report.target.position).cross(force);

        let (shield_explosion, armor_explosion) = explosions;
        let (kind, class_name) = if report.target.shield > 0.0 {
            (ExplosionKind::Shield, shield_explosion)
        } else {
            (ExplosionKind::Armor, armor_explosion)
        };

        Self {
            hit: SpacecraftHit {
                target: report.target.entity,
                source,
                damage,
                force,
                torque,
                duration_ms,
            },
            explosion: ExplosionSpawned {
                kind,
                class_name: class_name.to_string(),
                position: report.world_point,
                velocity: report.target.velocity,
            },
        }
    }
}
