//! Класс орудия: стволы, стиль вращения, ротаторы

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::{CombatEntity, ModelRef, ResourceHost};
use crate::config::{ensure_non_negative, ensure_positive, ConfigError, GraphicsSettings};

/// Как орудие наводится на цель
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationStyle {
    /// Неподвижное, стреляет по forward
    #[default]
    None,
    /// Ротатор 0 — yaw вокруг Z, ротатор 1 — pitch вокруг X
    YawPitch,
    /// Ротатор 0 — roll вокруг Y, ротатор 1 — yaw вокруг Z
    RollYaw,
    /// Нераспознанное значение из данных (заменяется в sanitize)
    #[serde(other)]
    Unknown,
}

impl RotationStyle {
    /// Нераспознанный стиль ведёт себя как неподвижный
    pub fn is_fixed(&self) -> bool {
        matches!(self, RotationStyle::None | RotationStyle::Unknown)
    }
}

/// Ротатор турели
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatorClass {
    /// Точка вращения в системе орудия
    pub center: Vec3,
    /// Допустимый диапазон [min, max] в градусах; None — свободное вращение 360°
    pub range_deg: Option<[f32; 2]>,
    /// Скорость вращения (°/s)
    pub rotation_rate_deg: f32,
    pub default_angle_deg: f32,
}

impl Default for RotatorClass {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            range_deg: None,
            rotation_rate_deg: 90.0,
            default_angle_deg: 0.0,
        }
    }
}

impl RotatorClass {
    pub fn range(&self) -> Option<(f32, f32)> {
        self.range_deg
            .map(|[min, max]| (min.to_radians(), max.to_radians()))
    }

    pub fn rotation_rate(&self) -> f32 {
        self.rotation_rate_deg.to_radians()
    }

    pub fn default_angle(&self) -> f32 {
        self.default_angle_deg.to_radians()
    }
}

/// Ствол: точка вылета снаряда в системе орудия
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Barrel {
    pub position: Vec3,
}

impl Default for Barrel {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponClass {
    pub name: String,
    pub model: ModelRef,
    /// Имя ProjectileClass в реестре
    pub projectile: String,
    /// Начальная скорость снаряда относительно стрелка (м/с)
    pub projectile_velocity: f32,
    pub barrels: Vec<Barrel>,
    pub cooldown_ms: f32,
    pub rotation_style: RotationStyle,
    pub rotators: Vec<RotatorClass>,
    /// Точка, относительно которой считается направление на цель
    pub base_point: Vec3,
    /// Допуск наведения, при котором орудие считается наведённым (°)
    pub fire_threshold_deg: f32,
    /// Поворотное орудие стреляет только при AimedInRange
    pub only_if_aimed_or_fixed: bool,
    pub muzzle_flash: String,
    pub muzzle_flash_duration_ms: f32,
    pub fire_sound: String,
}

impl Default for WeaponClass {
    fn default() -> Self {
        Self {
            name: "weapon".to_string(),
            model: ModelRef::default(),
            projectile: "projectile".to_string(),
            projectile_velocity: 1000.0,
            barrels: vec![Barrel::default()],
            cooldown_ms: 250.0,
            rotation_style: RotationStyle::None,
            rotators: Vec::new(),
            base_point: Vec3::ZERO,
            fire_threshold_deg: 1.0,
            only_if_aimed_or_fixed: false,
            muzzle_flash: "muzzle_flash".to_string(),
            muzzle_flash_duration_ms: 80.0,
            fire_sound: "cannon".to_string(),
        }
    }
}

impl WeaponClass {
    pub fn fire_threshold(&self) -> f32 {
        self.fire_threshold_deg.to_radians()
    }

    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = format!("weapon `{}`", self.name);

        ensure_positive(
            &owner,
            "projectile_velocity",
            &mut self.projectile_velocity,
            defaults.projectile_velocity,
            &mut errors,
        );
        ensure_non_negative(&owner, "cooldown_ms", &mut self.cooldown_ms, defaults.cooldown_ms, &mut errors);
        ensure_non_negative(
            &owner,
            "fire_threshold_deg",
            &mut self.fire_threshold_deg,
            defaults.fire_threshold_deg,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "muzzle_flash_duration_ms",
            &mut self.muzzle_flash_duration_ms,
            defaults.muzzle_flash_duration_ms,
            &mut errors,
        );

        if self.barrels.is_empty() {
            errors.push(ConfigError::MissingField {
                owner: owner.clone(),
                field: "barrels",
            });
            self.barrels = defaults.barrels;
        }

        if self.rotation_style == RotationStyle::Unknown {
            errors.push(ConfigError::UnrecognizedIdentifier {
                kind: "rotation style",
                value: format!("unknown (weapon `{}`)", self.name),
            });
            self.rotation_style = RotationStyle::None;
        }

        if !self.rotation_style.is_fixed() && self.rotators.len() < 2 {
            errors.push(ConfigError::MissingField {
                owner: owner.clone(),
                field: "rotators",
            });
            self.rotators.resize_with(2, RotatorClass::default);
        }

        for (index, rotator) in self.rotators.iter_mut().enumerate() {
            ensure_positive(
                &owner,
                if index == 0 {
                    "rotators[0].rotation_rate_deg"
                } else {
                    "rotators[1].rotation_rate_deg"
                },
                &mut rotator.rotation_rate_deg,
                RotatorClass::default().rotation_rate_deg,
                &mut errors,
            );
            if let Some([min, max]) = rotator.range_deg {
                if min > max {
                    errors.push(ConfigError::out_of_range(&owner, "rotators.range_deg", "min <= max", min));
                    rotator.range_deg = Some([max, min]);
                }
            }
        }
        errors
    }
}

impl CombatEntity for WeaponClass {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings) {
        self.model.acquire(host);
        host.request_sound(&self.fire_sound);
        if graphics.muzzle_flashes {
            host.request_particle(&self.muzzle_flash);
        }
    }
}
