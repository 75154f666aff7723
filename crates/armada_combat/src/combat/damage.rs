//! Применение попаданий и восстановление щитов

use bevy::prelude::*;

use super::events::{DamageDealt, SpacecraftDestroyed, SpacecraftHit};
use crate::components::{Shield, Spacecraft};
use crate::physics::{PhysicalObject, RigidBody};

/// Разделение урона: сначала щит, остаток в корпус
///
/// Returns (shield_damage, hull_damage).
pub fn split_damage(spacecraft: &mut Spacecraft, shield: Option<&mut Shield>, damage: f32) -> (f32, f32) {
    let damage = damage.max(0.0);
    let overflow = match shield {
        Some(shield) => shield.damage(damage),
        None => damage,
    };
    let hull_damage = overflow.min(spacecraft.hull.max(0.0));
    spacecraft.hull = (spacecraft.hull - overflow).max(0.0);
    (damage - overflow, hull_damage)
}

/// Система: применяет SpacecraftHit (урон + импульс)
///
/// Корабль, у которого корпус упал до 0 на этом тике, порождает ровно
/// один SpacecraftDestroyed.
pub fn apply_hits(
    mut hits: EventReader<SpacecraftHit>,
    mut targets: Query<(&mut Spacecraft, &mut PhysicalObject, Option<&mut Shield>)>,
    mut damage_events: EventWriter<DamageDealt>,
    mut destroyed_events: EventWriter<SpacecraftDestroyed>,
) {
    for hit in hits.read() {
        let Ok((mut spacecraft, mut body, shield)) = targets.get_mut(hit.target) else {
            continue;
        };
        if !spacecraft.is_alive() {
            continue;
        }

        body.apply_force_and_torque(hit.force, hit.torque, hit.duration_ms);

        let (shield_damage, hull_damage) = split_damage(&mut spacecraft, shield.map(|s| s.into_inner()), hit.damage);
        damage_events.write(DamageDealt {
            target: hit.target,
            source: hit.source,
            shield_damage,
            hull_damage,
        });

        if !spacecraft.is_alive() {
            crate::log(&format!(
                "💥 {} {:?} destroyed (killer: {:?})",
                spacecraft.class.name, hit.target, hit.source
            ));
            destroyed_events.write(SpacecraftDestroyed {
                entity: hit.target,
                killer: hit.source,
            });
        }
    }
}

/// Система: восстановление щитов живых кораблей
pub fn recharge_shields(mut shields: Query<(&Spacecraft, &mut Shield)>, time: Res<Time<Fixed>>) {
    let dt_ms = time.delta_secs() * 1000.0;
    for (spacecraft, mut shield) in shields.iter_mut() {
        if spacecraft.is_alive() {
            shield.recharge(dt_ms);
        }
    }
}
