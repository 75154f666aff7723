//! Combat systems (FixedUpdate)
//!
//! Тонкие обёртки: вся логика в Weapon/MissileLauncher/Projectile/Missile,
//! системы только достают компоненты/ресурсы и пишут события.

use bevy::prelude::*;

use super::armament::Armament;
use super::events::{ExplosionSpawned, FireIntent, LaunchIntent, MissileLaunched, SpacecraftHit, WeaponFired};
use super::missile::MissileOutcome;
use super::weapon::Shooter;
use super::{MissilePool, MuzzleFlashPool, ProjectilePool};
use crate::battlefield::Battlefield;
use crate::classes::{CombatEntity, ResourceManifest};
use crate::components::Spacecraft;
use crate::config::CombatSettings;
use crate::physics::PhysicalObject;
use crate::propulsion::Propulsion;
use crate::targeting::TargetingComputer;

fn dt_ms(time: &Time<Fixed>) -> f32 {
    time.delta_secs() * 1000.0
}

fn shooter(entity: Entity, spacecraft: &Spacecraft) -> Shooter {
    Shooter {
        entity: Some(entity),
        team: spacecraft.team,
    }
}

/// Система: cooldown'ы орудий/пусковых + автопуск залпов
pub fn simulate_armaments(
    mut query: Query<(Entity, &Spacecraft, &mut Armament, &mut PhysicalObject)>,
    mut missiles: ResMut<MissilePool>,
    battlefield: Res<Battlefield>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
    mut launched_events: EventWriter<MissileLaunched>,
) {
    let dt_ms = dt_ms(&time);

    for (entity, spacecraft, mut armament, mut body) in query.iter_mut() {
        armament.simulate(dt_ms);
        if !spacecraft.is_alive() {
            continue;
        }

        for (index, launcher) in armament.launchers.iter_mut().enumerate() {
            launcher.check_salvo_target(&battlefield);
            if !launcher.salvo_pending() {
                continue;
            }

            let target = launcher.salvo_target();
            if let Some(report) = launcher.launch(
                &mut *body,
                shooter(entity, spacecraft),
                target,
                &mut missiles,
                &settings,
            ) {
                launched_events.write(MissileLaunched {
                    shooter: entity,
                    launcher: index,
                    target: report.target,
                    position: report.position,
                });
            }
        }
    }
}

/// Система: FireIntent → выстрелы
pub fn handle_fire_intents(
    mut intents: EventReader<FireIntent>,
    mut query: Query<(&Spacecraft, &mut Armament, &mut PhysicalObject)>,
    mut projectiles: ResMut<ProjectilePool>,
    mut flashes: ResMut<MuzzleFlashPool>,
    settings: Res<CombatSettings>,
    mut fired_events: EventWriter<WeaponFired>,
) {
    for intent in intents.read() {
        let Ok((spacecraft, mut armament, mut body)) = query.get_mut(intent.shooter) else {
            continue;
        };
        if !spacecraft.is_alive() || spacecraft.away {
            continue;
        }

        let shooter = shooter(intent.shooter, spacecraft);
        for (index, weapon) in armament.weapons.iter_mut().enumerate() {
            if intent.weapon.is_some_and(|selected| selected != index) {
                continue;
            }
            if let Some(volley) = weapon.fire(&mut *body, shooter, &mut projectiles, &mut flashes, &settings) {
                fired_events.write(WeaponFired {
                    shooter: intent.shooter,
                    weapon: index,
                    position: volley.position,
                    direction: volley.direction,
                });
            }
        }
    }
}

/// Система: LaunchIntent → пуск из активной пусковой
///
/// Цель передаётся ракете только при завершённом захвате.
pub fn handle_launch_intents(
    mut intents: EventReader<LaunchIntent>,
    mut query: Query<(
        &Spacecraft,
        &mut Armament,
        &mut PhysicalObject,
        Option<&TargetingComputer>,
    )>,
    mut missiles: ResMut<MissilePool>,
    settings: Res<CombatSettings>,
    mut launched_events: EventWriter<MissileLaunched>,
) {
    for intent in intents.read() {
        let Ok((spacecraft, mut armament, mut body, targeting)) = query.get_mut(intent.shooter) else {
            continue;
        };
        if !spacecraft.is_alive() || spacecraft.away {
            continue;
        }

        let target = targeting.and_then(TargetingComputer::locked_target);
        let Some(index) = armament.active_launcher_index() else {
            continue;
        };
        let launcher = &mut armament.launchers[index];

        if let Some(report) = launcher.launch(
            &mut *body,
            shooter(intent.shooter, spacecraft),
            target,
            &mut missiles,
            &settings,
        ) {
            launched_events.write(MissileLaunched {
                shooter: intent.shooter,
                launcher: index,
                target: report.target,
                position: report.position,
            });
        }
    }
}

/// Система: шаг всех снарядов
pub fn simulate_projectiles(
    mut projectiles: ResMut<ProjectilePool>,
    battlefield: Res<Battlefield>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
    mut hit_events: EventWriter<SpacecraftHit>,
    mut explosion_events: EventWriter<ExplosionSpawned>,
) {
    let dt_ms = dt_ms(&time);
    let piloted = battlefield.piloted();

    for (_, projectile) in projectiles.iter_active_mut() {
        if let Some(impact) = projectile.simulate(dt_ms, &*battlefield, piloted, &settings) {
            hit_events.write(impact.hit);
            explosion_events.write(impact.explosion);
        }
    }
}

/// Система: шаг всех ракет
pub fn simulate_missiles(
    mut missiles: ResMut<MissilePool>,
    battlefield: Res<Battlefield>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
    mut hit_events: EventWriter<SpacecraftHit>,
    mut explosion_events: EventWriter<ExplosionSpawned>,
) {
    let dt_ms = dt_ms(&time);
    let piloted = battlefield.piloted();

    for (_, missile) in missiles.iter_active_mut() {
        match missile.simulate(dt_ms, &battlefield, piloted, &settings) {
            Some(MissileOutcome::Hit(impact)) => {
                hit_events.write(impact.hit);
                explosion_events.write(impact.explosion);
            }
            Some(MissileOutcome::Fizzle(explosion)) => {
                explosion_events.write(explosion);
            }
            None => {}
        }
    }
}

/// Система: muzzle flash гаснет по времени или вместе с владельцем
pub fn simulate_muzzle_flashes(
    mut flashes: ResMut<MuzzleFlashPool>,
    battlefield: Res<Battlefield>,
    time: Res<Time<Fixed>>,
) {
    let dt_ms = dt_ms(&time);

    for (_, flash) in flashes.iter_active_mut() {
        let owner_present = flash.owner.is_none_or(|owner| battlefield.present(owner).is_some());
        if owner_present {
            flash.simulate(dt_ms);
        } else {
            flash.extinguish();
        }
    }
}

/// Система: новые корабли сообщают presentation, какие ресурсы им нужны
pub fn collect_resource_requests(
    query: Query<(&Spacecraft, &Armament, Option<&Propulsion>), Added<Armament>>,
    mut manifest: ResMut<ResourceManifest>,
    settings: Res<CombatSettings>,
) {
    for (spacecraft, armament, propulsion) in query.iter() {
        spacecraft.class.acquire_resources(&mut *manifest, &settings.graphics);
        armament.acquire_resources(&mut *manifest, &settings.graphics);
        if let Some(propulsion) = propulsion {
            propulsion.acquire_resources(&mut *manifest, &settings.graphics);
        }
    }
}

/// Система: раздаёт изменённые GraphicsSettings боевым сущностям
pub fn apply_graphics_settings(
    settings: Res<CombatSettings>,
    mut armaments: Query<&mut Armament>,
    mut propulsions: Query<&mut Propulsion>,
) {
    if !settings.is_changed() {
        return;
    }

    for mut armament in armaments.iter_mut() {
        armament.handle_graphics_settings_changed(&settings.graphics);
    }
    for mut propulsion in propulsions.iter_mut() {
        propulsion.handle_graphics_settings_changed(&settings.graphics);
    }
}
