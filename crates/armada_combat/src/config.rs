//! Настройки симуляции (explicit context вместо module-level singletons)
//!
//! `CombatSettings` — ECS resource, владеет им App (game session lifecycle).
//! Все поля с `#[serde(default)]`: частично заполненный конфиг валиден.
//! Невалидные значения заменяются дефолтами в `sanitize()`, ошибки логируются.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки конфигурации (class records, settings, identifiers)
///
/// Никогда не паникуем: ошибка логируется, значение заменяется безопасным.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{owner}: `{field}` must be {expected}, got {value}")]
    OutOfRange {
        owner: String,
        field: &'static str,
        expected: &'static str,
        value: f32,
    },

    #[error("unknown {kind} class `{name}`")]
    UnknownClass { kind: &'static str, name: String },

    #[error("unrecognized {kind} `{value}`")]
    UnrecognizedIdentifier { kind: &'static str, value: String },

    #[error("{owner}: missing required field `{field}`")]
    MissingField { owner: String, field: &'static str },
}

impl ConfigError {
    pub(crate) fn out_of_range(
        owner: &str,
        field: &'static str,
        expected: &'static str,
        value: f32,
    ) -> Self {
        Self::OutOfRange {
            owner: owner.to_string(),
            field,
            expected,
            value,
        }
    }
}

/// Проверка `value > 0`, иначе fallback + ошибка в `errors`
pub(crate) fn ensure_positive(
    owner: &str,
    field: &'static str,
    value: &mut f32,
    fallback: f32,
    errors: &mut Vec<ConfigError>,
) {
    if !(value.is_finite() && *value > 0.0) {
        errors.push(ConfigError::out_of_range(owner, field, "> 0", *value));
        *value = fallback;
    }
}

/// Проверка `value >= 0`, иначе fallback + ошибка в `errors`
pub(crate) fn ensure_non_negative(
    owner: &str,
    field: &'static str,
    value: &mut f32,
    fallback: f32,
    errors: &mut Vec<ConfigError>,
) {
    if !(value.is_finite() && *value >= 0.0) {
        errors.push(ConfigError::out_of_range(owner, field, ">= 0", *value));
        *value = fallback;
    }
}

/// Логирует список config ошибок как warnings
pub(crate) fn report(errors: &[ConfigError]) {
    for error in errors {
        crate::log_warning(&format!("Config error: {}", error));
    }
}

/// Главные настройки боевой симуляции
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    /// Разрешено ли попадание в самого себя
    pub self_fire: bool,

    /// Может ли игрок повредить сам себя (при включенном self_fire)
    pub player_self_damage: bool,

    /// Урон по пилотируемому кораблю от союзников
    pub friendly_fire_on_player: bool,

    /// Расширение hitbox (м) для выстрелов игрока по врагам (difficulty aid)
    pub player_hitbox_offset: f32,

    /// Коэффициент сопротивления среды (0 = вакуум)
    pub drag_coefficient: f32,

    /// Множитель дальности сенсоров (environment)
    pub sensor_range_factor: f32,

    /// Длительность передачи импульса при попадании/отдаче (ms)
    pub momentum_duration_ms: f32,

    /// Время разгона вращения до turning limit (s)
    pub turn_acceleration_duration_s: f32,

    pub targeting: TargetingSettings,
    pub pools: PoolSettings,
    pub graphics: GraphicsSettings,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            self_fire: false,
            player_self_damage: false,
            friendly_fire_on_player: false,
            player_hitbox_offset: 1.0,
            drag_coefficient: 0.0,
            sensor_range_factor: 1.0,
            momentum_duration_ms: 1.0,
            turn_acceleration_duration_s: 0.2,
            targeting: TargetingSettings::default(),
            pools: PoolSettings::default(),
            graphics: GraphicsSettings::default(),
        }
    }
}

impl CombatSettings {
    /// Заменяет невалидные значения дефолтами, возвращает найденные ошибки
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = "settings";

        ensure_non_negative(
            owner,
            "player_hitbox_offset",
            &mut self.player_hitbox_offset,
            defaults.player_hitbox_offset,
            &mut errors,
        );
        ensure_non_negative(
            owner,
            "drag_coefficient",
            &mut self.drag_coefficient,
            defaults.drag_coefficient,
            &mut errors,
        );
        ensure_positive(
            owner,
            "sensor_range_factor",
            &mut self.sensor_range_factor,
            defaults.sensor_range_factor,
            &mut errors,
        );
        ensure_positive(
            owner,
            "momentum_duration_ms",
            &mut self.momentum_duration_ms,
            defaults.momentum_duration_ms,
            &mut errors,
        );
        ensure_positive(
            owner,
            "turn_acceleration_duration_s",
            &mut self.turn_acceleration_duration_s,
            defaults.turn_acceleration_duration_s,
            &mut errors,
        );
        errors.extend(self.targeting.sanitize());
        errors.extend(self.pools.sanitize());

        report(&errors);
        errors
    }
}

/// Параметры упорядочивания целей
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingSettings {
    /// Сколько живёт отсортированный список кандидатов (ms)
    pub order_duration_ms: f32,

    /// K в формуле best-hostile: distance + K·bearing (м/рад)
    pub angle_factor: f32,

    /// Множитель для целей, против которых наш тип силён (< 1)
    pub good_against_factor: f32,

    /// Множитель для целей, против которых наш тип слаб (> 1)
    pub bad_against_factor: f32,

    /// Учитывать good/bad-against типы при выборе цели (см. DESIGN.md)
    pub type_effectiveness: bool,
}

impl Default for TargetingSettings {
    fn default() -> Self {
        Self {
            order_duration_ms: 3000.0,
            angle_factor: 500.0,
            good_against_factor: 0.5,
            bad_against_factor: 2.0,
            type_effectiveness: false,
        }
    }
}

impl TargetingSettings {
    fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = "settings.targeting";

        ensure_positive(
            owner,
            "order_duration_ms",
            &mut self.order_duration_ms,
            defaults.order_duration_ms,
            &mut errors,
        );
        ensure_non_negative(
            owner,
            "angle_factor",
            &mut self.angle_factor,
            defaults.angle_factor,
            &mut errors,
        );
        ensure_positive(
            owner,
            "good_against_factor",
            &mut self.good_against_factor,
            defaults.good_against_factor,
            &mut errors,
        );
        ensure_positive(
            owner,
            "bad_against_factor",
            &mut self.bad_against_factor,
            defaults.bad_against_factor,
            &mut errors,
        );
        errors
    }
}

/// Ёмкости object pools (фиксированные, без роста в hot path)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub projectiles: usize,
    pub missiles: usize,
    pub particles: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            projectiles: 2048,
            missiles: 256,
            particles: 1024,
        }
    }
}

impl PoolSettings {
    fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();

        for (field, value, fallback) in [
            ("projectiles", &mut self.projectiles, defaults.projectiles),
            ("missiles", &mut self.missiles, defaults.missiles),
            ("particles", &mut self.particles, defaults.particles),
        ] {
            if *value == 0 {
                errors.push(ConfigError::out_of_range("settings.pools", field, "> 0", 0.0));
                *value = fallback;
            }
        }
        errors
    }
}

/// Графические переключатели, влияющие на то, что core запрашивает у presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsSettings {
    pub muzzle_flashes: bool,
    pub thruster_flames: bool,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            muzzle_flashes: true,
            thruster_flames: true,
        }
    }
}
