//! Классы ракеты и пусковой установки

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::{CombatEntity, ModelRef, ResourceHost};
use crate::config::{ensure_non_negative, ensure_positive, ConfigError, GraphicsSettings};

/// Степень самонаведения ракеты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomingMode {
    /// Летит по направлению пуска
    #[default]
    None,
    /// Наводится до включения маршевого и погашенного разворота, дальше держит курс
    Initial,
    /// Наводится всё время активной фазы
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissileClass {
    pub name: String,
    pub model: ModelRef,
    pub mass: f32,
    /// Тяга маршевого двигателя (N)
    pub thrust: f32,
    /// Угловое ускорение маневровых двигателей (rad/s²)
    pub angular_acceleration: f32,
    /// Маршевый двигатель включается, когда yaw и pitch ошибки меньше порога
    pub main_burn_angle_threshold_deg: f32,
    pub homing_mode: HomingMode,
    pub duration_ms: f32,
    /// Дрейф без тяги после пуска
    pub ignition_time_ms: f32,
    /// Скорость отделения от пусковой (м/с, вдоль forward)
    pub launch_velocity: f32,
    /// Радиус неконтактного подрыва
    pub proximity_range: f32,
    pub damage: f32,
    pub drag_factor: f32,
    /// Максимальный пеленг цели для захвата (0 = без ограничения)
    pub locking_angle_deg: f32,
    /// Базовое время захвата (масштабируется locking_time_factor цели)
    pub locking_time_ms: f32,
    pub shield_explosion: String,
    pub armor_explosion: String,
    pub fizzle_explosion: String,
    pub engine_sound: String,
}

impl Default for MissileClass {
    fn default() -> Self {
        Self {
            name: "missile".to_string(),
            model: ModelRef::default(),
            mass: 50.0,
            thrust: 5000.0,
            angular_acceleration: 4.0,
            main_burn_angle_threshold_deg: 5.0,
            homing_mode: HomingMode::Continuous,
            duration_ms: 10_000.0,
            ignition_time_ms: 300.0,
            launch_velocity: 20.0,
            proximity_range: 5.0,
            damage: 200.0,
            drag_factor: 1.0,
            locking_angle_deg: 30.0,
            locking_time_ms: 2000.0,
            shield_explosion: "shield_blast".to_string(),
            armor_explosion: "armor_blast".to_string(),
            fizzle_explosion: "fizzle".to_string(),
            engine_sound: "missile_engine".to_string(),
        }
    }
}

impl MissileClass {
    /// Линейное ускорение на маршевом двигателе (м/с²)
    pub fn acceleration(&self) -> f32 {
        self.thrust / self.mass
    }

    pub fn main_burn_angle_threshold(&self) -> f32 {
        self.main_burn_angle_threshold_deg.to_radians()
    }

    pub fn locking_angle(&self) -> f32 {
        self.locking_angle_deg.to_radians()
    }

    pub fn duration_s(&self) -> f32 {
        self.duration_ms / 1000.0
    }

    pub fn ignition_time_s(&self) -> f32 {
        self.ignition_time_ms / 1000.0
    }

    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = format!("missile `{}`", self.name);

        ensure_positive(&owner, "mass", &mut self.mass, defaults.mass, &mut errors);
        ensure_non_negative(&owner, "thrust", &mut self.thrust, defaults.thrust, &mut errors);
        ensure_non_negative(
            &owner,
            "angular_acceleration",
            &mut self.angular_acceleration,
            defaults.angular_acceleration,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "main_burn_angle_threshold_deg",
            &mut self.main_burn_angle_threshold_deg,
            defaults.main_burn_angle_threshold_deg,
            &mut errors,
        );
        ensure_positive(&owner, "duration_ms", &mut self.duration_ms, defaults.duration_ms, &mut errors);
        ensure_non_negative(
            &owner,
            "ignition_time_ms",
            &mut self.ignition_time_ms,
            defaults.ignition_time_ms,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "launch_velocity",
            &mut self.launch_velocity,
            defaults.launch_velocity,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "proximity_range",
            &mut self.proximity_range,
            defaults.proximity_range,
            &mut errors,
        );
        ensure_non_negative(&owner, "damage", &mut self.damage, defaults.damage, &mut errors);
        ensure_non_negative(&owner, "drag_factor", &mut self.drag_factor, defaults.drag_factor, &mut errors);
        ensure_non_negative(
            &owner,
            "locking_angle_deg",
            &mut self.locking_angle_deg,
            defaults.locking_angle_deg,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "locking_time_ms",
            &mut self.locking_time_ms,
            defaults.locking_time_ms,
            &mut errors,
        );
        errors
    }
}

impl CombatEntity for MissileClass {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, _graphics: &GraphicsSettings) {
        self.model.acquire(host);
        host.request_sound(&self.engine_sound);
        for explosion in [&self.shield_explosion, &self.armor_explosion, &self.fizzle_explosion] {
            host.request_particle(explosion);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissileLauncherClass {
    pub name: String,
    /// Имя MissileClass в реестре
    pub missile: String,
    /// Позиции труб относительно точки крепления
    pub tubes: Vec<Vec3>,
    pub capacity: u32,
    pub cooldown_ms: f32,
    /// Количество ракет в залпе (1 = без залпа)
    pub salvo: u32,
    pub salvo_cooldown_ms: f32,
    pub launch_sound: String,
}

impl Default for MissileLauncherClass {
    fn default() -> Self {
        Self {
            name: "launcher".to_string(),
            missile: "missile".to_string(),
            tubes: vec![Vec3::ZERO],
            capacity: 8,
            cooldown_ms: 1500.0,
            salvo: 1,
            salvo_cooldown_ms: 250.0,
            launch_sound: "missile_launch".to_string(),
        }
    }
}

impl MissileLauncherClass {
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = format!("launcher `{}`", self.name);

        ensure_non_negative(&owner, "cooldown_ms", &mut self.cooldown_ms, defaults.cooldown_ms, &mut errors);
        ensure_non_negative(
            &owner,
            "salvo_cooldown_ms",
            &mut self.salvo_cooldown_ms,
            defaults.salvo_cooldown_ms,
            &mut errors,
        );
        if self.tubes.is_empty() {
            errors.push(ConfigError::MissingField {
                owner: owner.clone(),
                field: "tubes",
            });
            self.tubes = defaults.tubes;
        }
        if self.salvo == 0 {
            errors.push(ConfigError::out_of_range(&owner, "salvo", ">= 1", 0.0));
            self.salvo = 1;
        }
        errors
    }
}

impl CombatEntity for MissileLauncherClass {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, _graphics: &GraphicsSettings) {
        host.request_sound(&self.launch_sound);
    }
}
