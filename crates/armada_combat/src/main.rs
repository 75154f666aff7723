//! Headless skirmish
//!
//! Две эскадры из встроенного реестра дерутся без рендера:
//! простой AI выбирает цель, доворачивает нос, стреляет и пускает ракеты
//! после захвата.

use bevy::prelude::*;
use std::f32::consts::PI;

use armada_combat::battlefield::refresh_battlefield;
use armada_combat::classes::presets::{skirmish_registry, CORVETTE, FIGHTER};
use armada_combat::math::bearing;
use armada_combat::*;

/// Огонь, когда цель в этом конусе от носа
const FIRE_CONE: f32 = 0.15;
const CRUISE_SPEED: f32 = 120.0;

fn ai_pilots(
    mut query: Query<
        (
            Entity,
            &Spacecraft,
            &PhysicalObject,
            &TargetingComputer,
            &mut ManeuveringComputer,
        ),
        Without<Piloted>,
    >,
    battlefield: Res<Battlefield>,
    mut targeting: EventWriter<TargetingIntent>,
    mut fire: EventWriter<FireIntent>,
    mut launch: EventWriter<LaunchIntent>,
) {
    for (entity, spacecraft, body, computer, mut maneuvering) in query.iter_mut() {
        if !spacecraft.is_alive() {
            continue;
        }

        let Some(target) = computer.target().and_then(|target| battlefield.present(target)) else {
            targeting.write(TargetingIntent {
                shooter: entity,
                selection: TargetSelection::BestHostile,
            });
            maneuvering.set_speed_target(CRUISE_SPEED);
            continue;
        };

        maneuvering.turn_towards(body.to_local(target.position));
        maneuvering.set_speed_target(CRUISE_SPEED);

        let forward = body.orientation * armada_combat::math::FORWARD;
        if bearing(forward, target.position - body.position) < FIRE_CONE {
            fire.write(FireIntent {
                shooter: entity,
                weapon: None,
            });
        }
        if computer.is_locked() {
            launch.write(LaunchIntent { shooter: entity });
        }
    }
}

fn main() -> Result<(), ConfigError> {
    println!("Starting Armada headless skirmish");

    let mut app = create_headless_app();
    app.add_plugins(SimulationPlugin)
        .add_systems(FixedUpdate, ai_pilots.before(refresh_battlefield));

    let registry = skirmish_registry();
    let settings = app.world().resource::<CombatSettings>().clone();

    let facing_south = Quat::from_rotation_z(PI);
    let spawns = [
        SpacecraftSpawn::new(FIGHTER, Some(1), Vec3::new(-60.0, -1500.0, 0.0)),
        SpacecraftSpawn::new(FIGHTER, Some(1), Vec3::new(0.0, -1500.0, 0.0)),
        SpacecraftSpawn::new(FIGHTER, Some(1), Vec3::new(60.0, -1500.0, 0.0)),
        SpacecraftSpawn::new(CORVETTE, Some(2), Vec3::new(0.0, 1500.0, 0.0)).facing(facing_south),
        SpacecraftSpawn::new(FIGHTER, Some(2), Vec3::new(-80.0, 1500.0, 0.0)).facing(facing_south),
        SpacecraftSpawn::new(FIGHTER, Some(2), Vec3::new(80.0, 1500.0, 0.0)).facing(facing_south),
    ];
    for spawn in &spawns {
        spawn_spacecraft(&mut app.world_mut().commands(), &registry, &settings, spawn)?;
    }
    app.insert_resource(registry);

    let mut kills = 0;
    // 4096 тиков = 64 секунды боя
    for tick in 0..4096 {
        app.update();

        kills += app
            .world_mut()
            .resource_mut::<Events<SpacecraftDestroyed>>()
            .drain()
            .count();

        if tick % 256 == 0 {
            let world = app.world();
            let alive = world
                .resource::<Battlefield>()
                .iter()
                .filter(|craft| craft.is_present())
                .count();
            println!(
                "Tick {}: {} alive, {} projectiles, {} missiles, {} kills",
                tick,
                alive,
                world.resource::<ProjectilePool>().active_count(),
                world.resource::<MissilePool>().active_count(),
                kills
            );
        }
    }

    println!("Skirmish complete! {} spacecraft destroyed", kills);
    Ok(())
}
