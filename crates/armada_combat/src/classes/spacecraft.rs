//! Класс корабля и тип корабля (роль для AI targeting)

use bevy::math::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{CombatEntity, ModelRef, ResourceHost};
use crate::config::{ensure_non_negative, ensure_positive, ConfigError, GraphicsSettings};
use crate::physics::HitBox;

/// Тип корабля (fighter, bomber, corvette...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacecraftType {
    pub name: String,
    pub full_name: String,
    /// Типы, против которых этот тип эффективен
    pub good_against: Vec<String>,
    /// Типы, против которых этот тип слаб
    pub bad_against: Vec<String>,
}

impl SpacecraftType {
    pub fn is_good_against(&self, other: &str) -> bool {
        self.good_against.iter().any(|name| name == other)
    }

    pub fn is_bad_against(&self, other: &str) -> bool {
        self.bad_against.iter().any(|name| name == other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldClass {
    pub capacity: f32,
    /// Пауза после попадания перед восстановлением
    pub recharge_delay_ms: f32,
    /// Восстановление в секунду
    pub recharge_rate: f32,
}

impl Default for ShieldClass {
    fn default() -> Self {
        Self {
            capacity: 0.0,
            recharge_delay_ms: 3000.0,
            recharge_rate: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropulsionClass {
    /// Линейная тяга по каждой оси (N)
    pub thrust: f32,
    /// Момент маневровых двигателей по каждой оси (N·m)
    pub angular_thrust: f32,
    pub max_move_burn_level: f32,
    pub max_turn_burn_level: f32,
    pub flame_particle: String,
}

impl Default for PropulsionClass {
    fn default() -> Self {
        Self {
            thrust: 200_000.0,
            angular_thrust: 400_000.0,
            max_move_burn_level: 1.0,
            max_turn_burn_level: 1.0,
            flame_particle: "thruster_flame".to_string(),
        }
    }
}

/// Слот двигателя на корпусе (визуальный, use-идентификаторы из данных)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrusterSlot {
    pub position: Vec3,
    pub size: f32,
    pub uses: Vec<String>,
}

/// Точка крепления оборудования
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mount {
    /// Имя класса (WeaponClass или MissileLauncherClass)
    pub class: String,
    pub position: Vec3,
    /// yaw, pitch, roll (°)
    pub rotation_deg: Vec3,
}

impl Mount {
    /// Ориентация слота: yaw вокруг Z, затем pitch вокруг X, затем roll вокруг Y
    pub fn orientation(&self) -> Quat {
        let radians = Vec3::new(
            self.rotation_deg.x.to_radians(),
            self.rotation_deg.y.to_radians(),
            self.rotation_deg.z.to_radians(),
        );
        Quat::from_euler(EulerRot::ZXY, radians.x, radians.y, radians.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacecraftClass {
    pub name: String,
    pub full_name: String,
    /// Имя SpacecraftType
    pub spacecraft_type: String,
    pub model: ModelRef,
    pub mass: f32,
    pub inertia: f32,
    pub hitboxes: Vec<HitBox>,
    pub hull: f32,
    pub shield: ShieldClass,
    pub propulsion: PropulsionClass,
    pub thrusters: Vec<ThrusterSlot>,
    pub weapons: Vec<Mount>,
    pub launchers: Vec<Mount>,
    /// Множитель времени захвата этого корабля ракетами
    pub locking_time_factor: f32,
    pub sensor_range: f32,
    pub explosion: String,
}

impl Default for SpacecraftClass {
    fn default() -> Self {
        Self {
            name: "spacecraft".to_string(),
            full_name: String::new(),
            spacecraft_type: "fighter".to_string(),
            model: ModelRef::default(),
            mass: 10_000.0,
            inertia: 50_000.0,
            hitboxes: vec![HitBox::new(Vec3::ZERO, Vec3::new(5.0, 8.0, 2.0))],
            hull: 1000.0,
            shield: ShieldClass::default(),
            propulsion: PropulsionClass::default(),
            thrusters: Vec::new(),
            weapons: Vec::new(),
            launchers: Vec::new(),
            locking_time_factor: 1.0,
            sensor_range: 5000.0,
            explosion: "ship_explosion".to_string(),
        }
    }
}

impl SpacecraftClass {
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let defaults = Self::default();
        let mut errors = Vec::new();
        let owner = format!("spacecraft `{}`", self.name);

        ensure_positive(&owner, "mass", &mut self.mass, defaults.mass, &mut errors);
        ensure_positive(&owner, "inertia", &mut self.inertia, defaults.inertia, &mut errors);
        ensure_positive(&owner, "hull", &mut self.hull, defaults.hull, &mut errors);
        ensure_non_negative(
            &owner,
            "shield.capacity",
            &mut self.shield.capacity,
            defaults.shield.capacity,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "shield.recharge_delay_ms",
            &mut self.shield.recharge_delay_ms,
            defaults.shield.recharge_delay_ms,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "shield.recharge_rate",
            &mut self.shield.recharge_rate,
            defaults.shield.recharge_rate,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "propulsion.thrust",
            &mut self.propulsion.thrust,
            defaults.propulsion.thrust,
            &mut errors,
        );
        ensure_non_negative(
            &owner,
            "propulsion.angular_thrust",
            &mut self.propulsion.angular_thrust,
            defaults.propulsion.angular_thrust,
            &mut errors,
        );
        ensure_positive(
            &owner,
            "propulsion.max_move_burn_level",
            &mut self.propulsion.max_move_burn_level,
            defaults.propulsion.max_move_burn_level,
            &mut errors,
        );
        ensure_positive(
            &owner,
            "propulsion.max_turn_burn_level",
            &mut self.propulsion.max_turn_burn_level,
            defaults.propulsion.max_turn_burn_level,
            &mut errors,
        );
        ensure_positive(
            &owner,
            "locking_time_factor",
            &mut self.locking_time_factor,
            defaults.locking_time_factor,
            &mut errors,
        );
        ensure_non_negative(&owner, "sensor_range", &mut self.sensor_range, defaults.sensor_range, &mut errors);

        // Корабль без hitboxes — призрак для hit test (допустимо), но логируем
        if self.hitboxes.is_empty() {
            errors.push(ConfigError::MissingField {
                owner,
                field: "hitboxes",
            });
        }
        errors
    }
}

impl CombatEntity for SpacecraftClass {
    fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.name
        } else {
            &self.full_name
        }
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings) {
        self.model.acquire(host);
        host.request_particle(&self.explosion);
        if graphics.thruster_flames && !self.thrusters.is_empty() {
            host.request_particle(&self.propulsion.flame_particle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_orientation_yaw() {
        let mount = Mount {
            rotation_deg: Vec3::new(90.0, 0.0, 0.0),
            ..Default::default()
        };
        // Yaw +90° разворачивает forward (+Y) влево (-X)
        let forward = mount.orientation() * Vec3::Y;
        assert!((forward - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_type_effectiveness_lookup() {
        let fighter = SpacecraftType {
            name: "fighter".to_string(),
            good_against: vec!["bomber".to_string()],
            bad_against: vec!["corvette".to_string()],
            ..Default::default()
        };
        assert!(fighter.is_good_against("bomber"));
        assert!(fighter.is_bad_against("corvette"));
        assert!(!fighter.is_good_against("fighter"));
    }

    #[test]
    fn test_ghost_hull_reported() {
        let mut class = SpacecraftClass {
            hitboxes: Vec::new(),
            mass: 0.0,
            ..Default::default()
        };
        let errors = class.sanitize();
        assert_eq!(errors.len(), 2);
        assert_eq!(class.mass, 10_000.0);
    }
}
