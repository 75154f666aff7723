//! Property-based тесты боевых инвариантов (proptest)

use bevy::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

use armada_combat::classes::{HomingMode, MissileClass, MissileLauncherClass, ProjectileClass, ShieldClass, WeaponClass};
use armada_combat::combat::{Missile, MissileLauncher, MuzzleFlash, Projectile, Shooter, Weapon};
use armada_combat::math::{bearing, FORWARD};
use armada_combat::pool::{Pool, Poolable};
use armada_combat::*;

fn shield(capacity: f32) -> Shield {
    Shield::from_class(&ShieldClass {
        capacity,
        ..Default::default()
    })
}

proptest! {
    /// Щит поглощает min(d, capacity), возвращает max(0, d − capacity)
    #[test]
    fn prop_shield_damage_split(capacity in 0.0f32..1000.0, damage in 0.0f32..2000.0) {
        let mut shield = shield(capacity);
        let overflow = shield.damage(damage);

        prop_assert!((overflow - (damage - capacity).max(0.0)).abs() < 1e-3);
        prop_assert!((shield.capacity - (capacity - damage.min(capacity))).abs() < 1e-3);
        prop_assert!(shield.capacity >= 0.0);
    }

    /// Время жизни снаряда не растёт; слот свободен ровно когда время вышло
    #[test]
    fn prop_projectile_lifetime(
        duration in 1.0f32..5000.0,
        steps in prop::collection::vec(0.0f32..400.0, 1..40),
    ) {
        let class = Arc::new(ProjectileClass {
            duration_ms: duration,
            dissipation_duration_ms: duration / 4.0,
            ..Default::default()
        });
        let field = Battlefield::default();
        let settings = CombatSettings::default();
        let mut projectile = Projectile::default();
        projectile.init(class, Vec3::ZERO, Vec3::new(0.0, 500.0, 0.0), None, None);

        let mut previous = projectile.time_left();
        for dt in steps {
            projectile.simulate(dt, &field, None, &settings);
            prop_assert!(projectile.time_left() <= previous);
            prop_assert_eq!(projectile.can_be_reused(), projectile.time_left() <= 0.0);
            prop_assert!((0.0..=1.0).contains(&projectile.power()));
            previous = projectile.time_left();
        }
    }

    /// Оружие не стреляет на cooldown; после выстрела cooldown == класс
    #[test]
    fn prop_weapon_cooldown(
        cooldown in 10.0f32..1000.0,
        steps in prop::collection::vec(0.0f32..200.0, 1..60),
    ) {
        let class = WeaponClass {
            cooldown_ms: cooldown,
            ..Default::default()
        };
        let mut weapon = Weapon::new(
            Arc::new(class),
            Arc::new(ProjectileClass::default()),
            Vec3::ZERO,
            Quat::IDENTITY,
        );
        let mut ship = PhysicalObject::new(1000.0, 1000.0, Vec::new());
        let mut projectiles: Pool<Projectile> = Pool::with_capacity("projectiles", 256);
        let mut flashes: Pool<MuzzleFlash> = Pool::with_capacity("flashes", 256);
        let settings = CombatSettings::default();

        for dt in steps {
            weapon.simulate(dt);
            let before = weapon.cooldown();
            let volley = weapon.fire(&mut ship, Shooter::default(), &mut projectiles, &mut flashes, &settings);
            if before > 0.0 {
                prop_assert!(volley.is_none());
                prop_assert_eq!(weapon.cooldown(), before);
            } else {
                prop_assert!(volley.is_some());
                prop_assert_eq!(weapon.cooldown(), cooldown);
            }
            projectiles.reclaim();
            flashes.reclaim();
        }
    }

    /// Пеленг больше угла захвата → цель вне зоны захвата
    #[test]
    fn prop_locking_range_respects_angle(
        angle_deg in 31.0f32..180.0,
        distance in 50.0f32..3000.0,
        pitch_deg in -60.0f32..60.0,
    ) {
        let launcher = MissileLauncher::new(
            Arc::new(MissileLauncherClass::default()),
            Arc::new(MissileClass {
                locking_angle_deg: 30.0,
                ..Default::default()
            }),
            Vec3::ZERO,
            Quat::IDENTITY,
        );
        let ship = PhysicalObject::new(1000.0, 1000.0, Vec::new());

        let rotation = Quat::from_rotation_z(angle_deg.to_radians()) * Quat::from_rotation_x(pitch_deg.to_radians());
        let direction = rotation * FORWARD;
        prop_assume!(bearing(FORWARD, direction) > 30.5f32.to_radians());

        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let class = Arc::new(armada_combat::classes::SpacecraftClass::default());
        let spacecraft = Spacecraft::new(class, Some(2));
        let body = PhysicalObject::default().with_pose(direction * distance, Quat::IDENTITY);
        let target = CraftSnapshot::new(entity, &spacecraft, &body, None, false);

        prop_assert!(!launcher.is_in_locking_range(&ship, &target, &CombatSettings::default()));
    }

    /// Ненаводящаяся ракета с целью не отклоняется от курса пуска
    #[test]
    fn prop_unguided_missile_keeps_heading(
        yaw in -3.0f32..3.0,
        target_x in -500.0f32..500.0,
        steps in 1usize..200,
    ) {
        let class = Arc::new(MissileClass {
            homing_mode: HomingMode::None,
            ..Default::default()
        });
        let orientation = Quat::from_rotation_z(yaw);
        let heading = orientation * FORWARD;

        let mut world = World::new();
        let target_entity = world.spawn_empty().id();
        let target_class = Arc::new(armada_combat::classes::SpacecraftClass::default());
        let spacecraft = Spacecraft::new(target_class, Some(2));
        let body = PhysicalObject::default().with_pose(Vec3::new(target_x, 800.0, 0.0), Quat::IDENTITY);
        let mut field = Battlefield::default();
        field.rebuild([CraftSnapshot::new(target_entity, &spacecraft, &body, None, false)]);

        let mut missile = Missile::default();
        missile.init(class, Vec3::ZERO, orientation, heading * 20.0, Some(target_entity), None, Some(1));

        let settings = CombatSettings::default();
        for _ in 0..steps {
            if missile.simulate(15.625, &field, None, &settings).is_some() {
                break;
            }
            prop_assert!((missile.body.orientation * FORWARD).dot(heading) > 0.9999);
            prop_assert!(missile.body.velocity.normalize().dot(heading) > 0.9999);
        }
    }
}
