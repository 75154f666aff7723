//! Thrusters и Propulsion (burn levels → силы/моменты)
//!
//! Burn накапливается по use за тик (несколько контроллеров могут
//! добавлять burn), применяется один раз, затем сбрасывается.
//! На каждой оси работает только одно направление: net = positive − negative.

use bevy::prelude::*;
use std::fmt;
use std::str::FromStr;

use crate::classes::{CombatEntity, PropulsionClass, ResourceHost, ThrusterSlot};
use crate::config::{ConfigError, GraphicsSettings};
use crate::math::{FORWARD, RIGHT, UP};
use crate::physics::RigidBody;

/// Назначение двигателя
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrusterUse {
    Forward,
    Reverse,
    StrafeLeft,
    StrafeRight,
    Raise,
    Lower,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
    RollLeft,
    RollRight,
}

pub const THRUSTER_USE_COUNT: usize = 12;

impl ThrusterUse {
    pub const ALL: [ThrusterUse; THRUSTER_USE_COUNT] = [
        ThrusterUse::Forward,
        ThrusterUse::Reverse,
        ThrusterUse::StrafeLeft,
        ThrusterUse::StrafeRight,
        ThrusterUse::Raise,
        ThrusterUse::Lower,
        ThrusterUse::YawLeft,
        ThrusterUse::YawRight,
        ThrusterUse::PitchUp,
        ThrusterUse::PitchDown,
        ThrusterUse::RollLeft,
        ThrusterUse::RollRight,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThrusterUse::Forward => "forward",
            ThrusterUse::Reverse => "reverse",
            ThrusterUse::StrafeLeft => "strafeLeft",
            ThrusterUse::StrafeRight => "strafeRight",
            ThrusterUse::Raise => "raise",
            ThrusterUse::Lower => "lower",
            ThrusterUse::YawLeft => "yawLeft",
            ThrusterUse::YawRight => "yawRight",
            ThrusterUse::PitchUp => "pitchUp",
            ThrusterUse::PitchDown => "pitchDown",
            ThrusterUse::RollLeft => "rollLeft",
            ThrusterUse::RollRight => "rollRight",
        }
    }
}

impl fmt::Display for ThrusterUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThrusterUse {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ThrusterUse::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| ConfigError::UnrecognizedIdentifier {
                kind: "thruster use",
                value: value.to_string(),
            })
    }
}

/// Накопленные burn levels по use
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BurnLevels([f32; THRUSTER_USE_COUNT]);

impl BurnLevels {
    pub fn add(&mut self, thruster_use: ThrusterUse, value: f32) {
        if value > 0.0 {
            self.0[thruster_use.index()] += value;
        }
    }

    /// Знаковый burn по оси: > 0 → `positive`, < 0 → `negative`
    pub fn add_axis(&mut self, positive: ThrusterUse, negative: ThrusterUse, value: f32) {
        if value > 0.0 {
            self.add(positive, value);
        } else if value < 0.0 {
            self.add(negative, -value);
        }
    }

    pub fn get(&self, thruster_use: ThrusterUse) -> f32 {
        self.0[thruster_use.index()]
    }

    /// Чистый burn оси с ограничением по max
    pub fn net(&self, positive: ThrusterUse, negative: ThrusterUse, max: f32) -> f32 {
        self.get(positive).min(max) - self.get(negative).min(max)
    }

    pub fn reset(&mut self) {
        self.0 = [0.0; THRUSTER_USE_COUNT];
    }
}

/// Визуальный двигатель (flame) на слоте корпуса
#[derive(Debug, Clone, PartialEq)]
pub struct Thruster {
    pub position: Vec3,
    pub size: f32,
    uses: Vec<ThrusterUse>,
    /// Видимая интенсивность пламени [0, 1]
    pub intensity: f32,
}

impl Thruster {
    /// Use-идентификаторы из данных; нераспознанные логируются и пропускаются
    pub fn from_slot(slot: &ThrusterSlot) -> Self {
        let uses = slot
            .uses
            .iter()
            .filter_map(|name| match name.parse::<ThrusterUse>() {
                Ok(thruster_use) => Some(thruster_use),
                Err(error) => {
                    crate::log_error(&format!("Thruster slot at {:?}: {}", slot.position, error));
                    None
                }
            })
            .collect();

        Self {
            position: slot.position,
            size: slot.size,
            uses,
            intensity: 0.0,
        }
    }

    pub fn uses(&self) -> &[ThrusterUse] {
        &self.uses
    }

    fn update_intensity(&mut self, burn: &BurnLevels, max_burn: f32) {
        self.intensity = self
            .uses
            .iter()
            .map(|thruster_use| (burn.get(*thruster_use) / max_burn).min(1.0))
            .fold(0.0, f32::max);
    }
}

/// Двигательная установка корабля
#[derive(Component, Debug, Clone)]
pub struct Propulsion {
    pub class: PropulsionClass,
    pub burn: BurnLevels,
    pub thrusters: Vec<Thruster>,
    flames_visible: bool,
}

impl Propulsion {
    pub fn new(class: PropulsionClass, slots: &[ThrusterSlot]) -> Self {
        Self {
            class,
            burn: BurnLevels::default(),
            thrusters: slots.iter().map(Thruster::from_slot).collect(),
            flames_visible: true,
        }
    }

    /// Burn по идентификатору из данных/скриптов (нераспознанный → error + no-op)
    pub fn add_burn_named(&mut self, name: &str, value: f32) {
        match name.parse::<ThrusterUse>() {
            Ok(thruster_use) => self.burn.add(thruster_use, value),
            Err(error) => crate::log_error(&format!("Propulsion: {}", error)),
        }
    }

    pub fn reset_burn(&mut self) {
        self.burn.reset();
    }

    /// Максимальное линейное ускорение по оси (м/с²)
    pub fn max_acceleration(&self, body: &impl RigidBody) -> f32 {
        self.class.thrust / body.mass()
    }

    /// Максимальное угловое ускорение по оси (rad/s²)
    pub fn max_angular_acceleration(&self, body: &impl RigidBody) -> f32 {
        self.class.angular_thrust / body.inertia()
    }

    pub fn flames_visible(&self) -> bool {
        self.flames_visible
    }

    /// Применяет накопленный burn к телу на `dt_ms`
    ///
    /// Сила/момент по оси = тяга × burn / max_burn.
    pub fn apply(&mut self, body: &mut impl RigidBody, dt_ms: f32) {
        let move_max = self.class.max_move_burn_level;
        let turn_max = self.class.max_turn_burn_level;
        let burn = &self.burn;

        let local_force = (FORWARD * burn.net(ThrusterUse::Forward, ThrusterUse::Reverse, move_max)
            + RIGHT * burn.net(ThrusterUse::StrafeRight, ThrusterUse::StrafeLeft, move_max)
            + UP * burn.net(ThrusterUse::Raise, ThrusterUse::Lower, move_max))
            * (self.class.thrust / move_max);

        // yaw вокруг +Z (влево), pitch вокруг +X (вверх), roll вокруг +Y (вправо)
        let local_torque = (UP * burn.net(ThrusterUse::YawLeft, ThrusterUse::YawRight, turn_max)
            + RIGHT * burn.net(ThrusterUse::PitchUp, ThrusterUse::PitchDown, turn_max)
            + FORWARD * burn.net(ThrusterUse::RollRight, ThrusterUse::RollLeft, turn_max))
            * (self.class.angular_thrust / turn_max);

        let orientation = body.orientation();
        body.apply_force_and_torque(orientation * local_force, orientation * local_torque, dt_ms);

        if self.flames_visible {
            let max = move_max.max(turn_max);
            for thruster in &mut self.thrusters {
                thruster.update_intensity(&self.burn, max);
            }
        }
    }
}

impl CombatEntity for Propulsion {
    fn display_name(&self) -> &str {
        "propulsion"
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings) {
        if graphics.thruster_flames && !self.thrusters.is_empty() {
            host.request_particle(&self.class.flame_particle);
        }
    }

    fn handle_graphics_settings_changed(&mut self, graphics: &GraphicsSettings) {
        self.flames_visible = graphics.thruster_flames;
        if !self.flames_visible {
            for thruster in &mut self.thrusters {
                thruster.intensity = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicalObject;

    fn propulsion() -> Propulsion {
        Propulsion::new(
            PropulsionClass {
                thrust: 1000.0,
                angular_thrust: 200.0,
                max_move_burn_level: 1.0,
                max_turn_burn_level: 1.0,
                ..Default::default()
            },
            &[ThrusterSlot {
                position: Vec3::new(0.0, -3.0, 0.0),
                size: 1.0,
                uses: vec!["forward".to_string(), "warpDrive".to_string()],
            }],
        )
    }

    #[test]
    fn test_thruster_use_parsing() {
        assert_eq!("strafeLeft".parse::<ThrusterUse>().unwrap(), ThrusterUse::StrafeLeft);
        assert!(matches!(
            "sideways".parse::<ThrusterUse>(),
            Err(ConfigError::UnrecognizedIdentifier { kind: "thruster use", .. })
        ));
        for thruster_use in ThrusterUse::ALL {
            assert_eq!(thruster_use.to_string().parse::<ThrusterUse>().unwrap(), thruster_use);
        }
    }

    #[test]
    fn test_unrecognized_use_is_dropped() {
        let propulsion = propulsion();
        assert_eq!(propulsion.thrusters[0].uses(), &[ThrusterUse::Forward]);
    }

    #[test]
    fn test_burn_accumulates_and_resets() {
        let mut propulsion = propulsion();
        propulsion.burn.add(ThrusterUse::Forward, 0.25);
        propulsion.burn.add(ThrusterUse::Forward, 0.5);
        propulsion.add_burn_named("hyperspace", 1.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::Forward), 0.75);

        propulsion.reset_burn();
        assert_eq!(propulsion.burn, BurnLevels::default());
    }

    #[test]
    fn test_opposite_burns_cancel_on_axis() {
        let mut burn = BurnLevels::default();
        burn.add_axis(ThrusterUse::YawLeft, ThrusterUse::YawRight, 0.8);
        burn.add_axis(ThrusterUse::YawLeft, ThrusterUse::YawRight, -0.3);
        let net = burn.net(ThrusterUse::YawLeft, ThrusterUse::YawRight, 1.0);
        assert!((net - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_apply_forward_and_yaw() {
        let mut propulsion = propulsion();
        let mut body = PhysicalObject::new(100.0, 10.0, Vec::new());

        propulsion.burn.add(ThrusterUse::Forward, 1.0);
        propulsion.burn.add(ThrusterUse::YawLeft, 0.5);
        propulsion.apply(&mut body, 1000.0);

        // F = 1000 N за 1 s на 100 kg → 10 м/с вдоль +Y
        assert!((body.velocity - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
        // τ = 100 N·m за 1 s на I = 10 → 10 rad/s вокруг +Z
        assert!((body.angular_velocity - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-4);
        assert_eq!(propulsion.thrusters[0].intensity, 1.0);
    }

    #[test]
    fn test_flames_hidden_by_graphics_settings() {
        let mut propulsion = propulsion();
        propulsion.handle_graphics_settings_changed(&GraphicsSettings {
            thruster_flames: false,
            ..Default::default()
        });

        let mut body = PhysicalObject::default();
        propulsion.burn.add(ThrusterUse::Forward, 1.0);
        propulsion.apply(&mut body, 10.0);
        assert_eq!(propulsion.thrusters[0].intensity, 0.0);
    }
}
