//! Встроенный набор классов для headless skirmish и интеграционных тестов

use bevy::math::Vec3;

use super::*;
use crate::physics::HitBox;

pub const FIGHTER: &str = "falcon";
pub const CORVETTE: &str = "warden";

/// Реестр с минимальным боевым набором: пушка, турель, ракеты, два корабля
pub fn skirmish_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::default();

    registry.register_spacecraft_type(SpacecraftType {
        name: "fighter".to_string(),
        full_name: "Fighter".to_string(),
        good_against: vec!["bomber".to_string()],
        bad_against: vec!["corvette".to_string()],
    });
    registry.register_spacecraft_type(SpacecraftType {
        name: "corvette".to_string(),
        full_name: "Corvette".to_string(),
        good_against: vec!["fighter".to_string()],
        bad_against: Vec::new(),
    });

    registry.register_projectile(ProjectileClass {
        name: "slug".to_string(),
        damage: 25.0,
        mass: 2.0,
        duration_ms: 2500.0,
        dissipation_duration_ms: 500.0,
        ..Default::default()
    });

    registry.register_weapon(WeaponClass {
        name: "autocannon".to_string(),
        projectile: "slug".to_string(),
        projectile_velocity: 1200.0,
        barrels: vec![
            Barrel {
                position: Vec3::new(-0.5, 2.0, 0.0),
            },
            Barrel {
                position: Vec3::new(0.5, 2.0, 0.0),
            },
        ],
        cooldown_ms: 200.0,
        ..Default::default()
    });

    registry.register_weapon(WeaponClass {
        name: "flak_turret".to_string(),
        projectile: "slug".to_string(),
        projectile_velocity: 900.0,
        cooldown_ms: 400.0,
        rotation_style: RotationStyle::YawPitch,
        rotators: vec![
            RotatorClass {
                rotation_rate_deg: 120.0,
                ..Default::default()
            },
            RotatorClass {
                range_deg: Some([-10.0, 80.0]),
                rotation_rate_deg: 90.0,
                ..Default::default()
            },
        ],
        fire_threshold_deg: 2.0,
        only_if_aimed_or_fixed: true,
        ..Default::default()
    });

    registry.register_missile(MissileClass {
        name: "viper".to_string(),
        homing_mode: HomingMode::Continuous,
        ..Default::default()
    });

    registry.register_launcher(MissileLauncherClass {
        name: "viper_rack".to_string(),
        missile: "viper".to_string(),
        tubes: vec![Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 0.0, -1.0)],
        capacity: 6,
        salvo: 2,
        ..Default::default()
    });

    registry.register_spacecraft(SpacecraftClass {
        name: FIGHTER.to_string(),
        full_name: "Falcon Interceptor".to_string(),
        spacecraft_type: "fighter".to_string(),
        hitboxes: vec![HitBox::new(Vec3::ZERO, Vec3::new(4.0, 6.0, 1.5))],
        hull: 400.0,
        shield: ShieldClass {
            capacity: 100.0,
            ..Default::default()
        },
        thrusters: vec![ThrusterSlot {
            position: Vec3::new(0.0, -6.0, 0.0),
            size: 1.0,
            uses: vec!["forward".to_string()],
        }],
        weapons: vec![Mount {
            class: "autocannon".to_string(),
            position: Vec3::new(0.0, 4.0, 0.0),
            ..Default::default()
        }],
        launchers: vec![Mount {
            class: "viper_rack".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    });

    registry.register_spacecraft(SpacecraftClass {
        name: CORVETTE.to_string(),
        full_name: "Warden Corvette".to_string(),
        spacecraft_type: "corvette".to_string(),
        mass: 80_000.0,
        inertia: 900_000.0,
        hitboxes: vec![
            HitBox::new(Vec3::ZERO, Vec3::new(8.0, 25.0, 5.0)),
            HitBox::new(Vec3::new(0.0, -10.0, 6.0), Vec3::new(4.0, 6.0, 2.0)),
        ],
        hull: 3000.0,
        shield: ShieldClass {
            capacity: 500.0,
            ..Default::default()
        },
        weapons: vec![Mount {
            class: "flak_turret".to_string(),
            position: Vec3::new(0.0, 10.0, 5.0),
            ..Default::default()
        }],
        locking_time_factor: 0.5,
        ..Default::default()
    });

    registry
}
