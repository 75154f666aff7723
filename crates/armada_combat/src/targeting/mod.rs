//! Targeting module
//!
//! - `TargetingComputer` — текущая цель, упорядоченные списки, захват
//! - `TargetingIntent` — команды выбора цели от host/AI
//! - `update_targeting` — система: команды → тик захвата → наведение турелей

pub mod computer;


pub use computer::{TargetOrder, TargetingComputer, TargetingContext};

use bevy::prelude::*;

use crate::battlefield::Battlefield;
use crate::classes::ClassRegistry;
use crate::combat::Armament;
use crate::components::Spacecraft;
use crate::config::CombatSettings;
use crate::physics::PhysicalObject;

/// Какую цель выбрать
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelection {
    NextNearestHostile,
    NextHostile,
    NextNonHostile,
    BestHostile,
    Clear,
}

/// Host/AI → core: команда выбора цели
#[derive(Event, Debug, Clone)]
pub struct TargetingIntent {
    pub shooter: Entity,
    pub selection: TargetSelection,
}

/// Система: выбор целей, таймер захвата, наведение орудий
pub fn update_targeting(
    mut intents: EventReader<TargetingIntent>,
    mut query: Query<(
        Entity,
        &Spacecraft,
        &PhysicalObject,
        &mut TargetingComputer,
        &mut Armament,
    )>,
    battlefield: Res<Battlefield>,
    registry: Option<Res<ClassRegistry>>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
) {
    let dt_ms = time.delta_secs() * 1000.0;
    let type_of = |spacecraft: &Spacecraft| {
        registry
            .as_ref()
            .and_then(|registry| registry.spacecraft_type(&spacecraft.class.spacecraft_type))
    };

    for intent in intents.read() {
        let Ok((entity, spacecraft, _, mut computer, _)) = query.get_mut(intent.shooter) else {
            continue;
        };
        let Some(own) = battlefield.present(entity) else {
            continue;
        };
        let own_type = type_of(spacecraft);
        let ctx = TargetingContext {
            own,
            battlefield: &battlefield,
            settings: &settings,
            own_type: own_type.as_deref(),
        };

        match intent.selection {
            TargetSelection::NextNearestHostile => computer.target_next_nearest_hostile(&ctx),
            TargetSelection::NextHostile => computer.target_next_hostile(&ctx),
            TargetSelection::NextNonHostile => computer.target_next_non_hostile(&ctx),
            TargetSelection::BestHostile => computer.target_best_hostile(&ctx),
            TargetSelection::Clear => computer.clear_target(),
        }
    }

    for (entity, spacecraft, body, mut computer, mut armament) in query.iter_mut() {
        let Some(own) = battlefield.present(entity) else {
            continue;
        };
        let own_type = type_of(spacecraft);
        let ctx = TargetingContext {
            own,
            battlefield: &battlefield,
            settings: &settings,
            own_type: own_type.as_deref(),
        };

        computer.update(&ctx, body, armament.active_launcher(), dt_ms);

        let target = computer.target().and_then(|target| battlefield.present(target));
        armament.aim_all(body, target, &mut computer, dt_ms);
    }
}
