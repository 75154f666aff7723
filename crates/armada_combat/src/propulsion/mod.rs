//! Propulsion module
//!
//! Поток управления за тик:
//! 1. `Propulsion::reset_burn`
//! 2. `ManeuveringComputer::control_thrusters` — накопление burn
//! 3. `Propulsion::apply` — силы/моменты на rigid body
//! 4. интеграция тела (physics)

pub mod maneuvering;
pub mod thruster;

pub use maneuvering::{FlightMode, ManeuveringComputer};
pub use thruster::{BurnLevels, Propulsion, Thruster, ThrusterUse, THRUSTER_USE_COUNT};

use bevy::prelude::*;

use crate::components::Spacecraft;
use crate::config::CombatSettings;
use crate::physics::PhysicalObject;

/// Система: maneuvering → burn → силы для всех живых кораблей
pub fn control_thrusters(
    mut query: Query<(
        &Spacecraft,
        &mut ManeuveringComputer,
        &mut Propulsion,
        &mut PhysicalObject,
    )>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
) {
    let dt_ms = time.delta_secs() * 1000.0;

    for (spacecraft, mut computer, mut propulsion, mut body) in query.iter_mut() {
        propulsion.reset_burn();
        if !spacecraft.is_alive() {
            continue;
        }
        computer.control_thrusters(&mut propulsion, &*body, &settings, dt_ms);
        propulsion.apply(&mut *body, dt_ms);
    }
}
