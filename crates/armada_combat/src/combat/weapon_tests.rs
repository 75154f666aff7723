//! Tests for Weapon (aiming, rotation, firing).

#[cfg(test)]
mod tests {
    use super::super::particle::MuzzleFlash;
    use super::super::projectile::Projectile;
    use super::super::weapon::*;
    use crate::battlefield::test_support::craft;
    use crate::classes::{ProjectileClass, RotationStyle, RotatorClass, WeaponClass};
    use crate::config::CombatSettings;
    use crate::physics::PhysicalObject;
    use crate::pool::Pool;
    use bevy::prelude::*;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    fn ship() -> PhysicalObject {
        PhysicalObject::new(1000.0, 1000.0, Vec::new())
    }

    fn projectile_class() -> Arc<ProjectileClass> {
        Arc::new(ProjectileClass {
            mass: 1.0,
            ..Default::default()
        })
    }

    fn fixed_cannon() -> Weapon {
        let class = WeaponClass {
            projectile_velocity: 1000.0,
            cooldown_ms: 250.0,
            ..Default::default()
        };
        Weapon::new(Arc::new(class), projectile_class(), Vec3::ZERO, Quat::IDENTITY)
    }

    fn turret(range_deg: Option<[f32; 2]>, only_if_aimed: bool) -> Weapon {
        let rotator = RotatorClass {
            range_deg,
            rotation_rate_deg: 90.0,
            ..Default::default()
        };
        let class = WeaponClass {
            rotation_style: RotationStyle::YawPitch,
            rotators: vec![rotator, RotatorClass::default()],
            only_if_aimed_or_fixed: only_if_aimed,
            ..Default::default()
        };
        Weapon::new(Arc::new(class), projectile_class(), Vec3::ZERO, Quat::IDENTITY)
    }

    fn pools() -> (Pool<Projectile>, Pool<MuzzleFlash>) {
        (
            Pool::with_capacity("projectiles", 8),
            Pool::with_capacity("flashes", 8),
        )
    }

    #[test]
    fn test_fixed_weapon_never_rotates() {
        let mut weapon = fixed_cannon();
        let target = craft(1, Some(2), Vec3::new(300.0, 100.0, -50.0));

        for _ in 0..10 {
            weapon.aim_towards(&ship(), Some(target.position), 100.0);
        }

        assert_eq!(weapon.angles(), [0.0, 0.0]);
        assert_eq!(weapon.status(), AimStatus::Fixed);
    }

    #[test]
    fn test_unsanitized_unknown_style_acts_fixed() {
        let class = WeaponClass {
            rotation_style: RotationStyle::Unknown,
            ..Default::default()
        };
        let mut weapon = Weapon::new(Arc::new(class), projectile_class(), Vec3::ZERO, Quat::IDENTITY);
        let target = craft(1, Some(2), Vec3::new(300.0, 100.0, 0.0));

        weapon.aim_towards(&ship(), Some(target.position), 100.0);

        assert_eq!(weapon.status(), AimStatus::Fixed);
        assert_eq!(weapon.transform_in_ship(), bevy::math::Affine3A::IDENTITY);
    }

    #[test]
    fn test_cooldown_blocks_fire() {
        let mut weapon = fixed_cannon();
        let mut body = ship();
        let (mut projectiles, mut flashes) = pools();
        let settings = CombatSettings::default();

        assert!(weapon
            .fire(&mut body, Shooter::default(), &mut projectiles, &mut flashes, &settings)
            .is_some());
        assert_eq!(weapon.cooldown(), 250.0);

        assert!(weapon
            .fire(&mut body, Shooter::default(), &mut projectiles, &mut flashes, &settings)
            .is_none());

        weapon.simulate(200.0);
        assert!(!weapon.can_fire());
        weapon.simulate(50.0);
        assert!(weapon
            .fire(&mut body, Shooter::default(), &mut projectiles, &mut flashes, &settings)
            .is_some());
        assert_eq!(projectiles.active_count(), 2);
    }

    #[test]
    fn test_fire_spawns_projectile_and_recoil() {
        let mut weapon = fixed_cannon();
        let mut body = ship();
        let (mut projectiles, mut flashes) = pools();
        let shooter = Shooter {
            entity: Some(Entity::from_raw(4)),
            team: Some(1),
        };

        let volley = weapon
            .fire(&mut body, shooter, &mut projectiles, &mut flashes, &CombatSettings::default())
            .unwrap();

        assert_eq!(volley.projectiles, 1);
        assert_eq!(volley.direction, Vec3::Y);
        assert_eq!(flashes.active_count(), 1);

        let (_, projectile) = projectiles.iter_active().next().unwrap();
        assert_eq!(projectile.velocity, Vec3::new(0.0, 1000.0, 0.0));
        assert_eq!(projectile.origin(), Some(Entity::from_raw(4)));

        // 1 кг · 1000 м/с за 1 ms на корабль 1000 кг → −1 м/с
        assert!((body.velocity - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_muzzle_flashes_follow_graphics_settings() {
        use crate::classes::CombatEntity;
        use crate::config::GraphicsSettings;

        let mut weapon = fixed_cannon();
        weapon.handle_graphics_settings_changed(&GraphicsSettings {
            muzzle_flashes: false,
            ..Default::default()
        });
        let (mut projectiles, mut flashes) = pools();

        weapon.fire(
            &mut ship(),
            Shooter::default(),
            &mut projectiles,
            &mut flashes,
            &CombatSettings::default(),
        );
        assert_eq!(projectiles.active_count(), 1);
        assert_eq!(flashes.active_count(), 0);
    }

    #[test]
    fn test_turret_rotates_at_rate() {
        let mut weapon = turret(None, false);
        // Цель слева — yaw +90°
        let target = craft(1, Some(2), Vec3::new(-100.0, 0.0, 0.0));

        weapon.aim_towards(&ship(), Some(target.position), 100.0);
        assert!((weapon.angles()[0] - 9f32.to_radians()).abs() < 1e-5);
        assert_eq!(weapon.status(), AimStatus::Aiming);

        for _ in 0..15 {
            weapon.aim_towards(&ship(), Some(target.position), 100.0);
        }
        assert!((weapon.angles()[0] - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(weapon.status(), AimStatus::AimedInRange);
    }

    #[test]
    fn test_ranged_rotator_clamps() {
        let mut weapon = turret(Some([-45.0, 45.0]), false);
        let target = craft(1, Some(2), Vec3::new(-100.0, 0.0, 0.0));

        for _ in 0..20 {
            weapon.aim_towards(&ship(), Some(target.position), 100.0);
        }

        assert!((weapon.angles()[0] - 45f32.to_radians()).abs() < 1e-5);
        assert_eq!(weapon.status(), AimStatus::AimingOutOfReach);
    }

    #[test]
    fn test_free_rotator_takes_shortest_path() {
        let mut weapon = turret(None, false);
        weapon.rotate_to([170f32.to_radians(), 0.0], 10_000.0);
        assert!((weapon.angles()[0] - 170f32.to_radians()).abs() < 1e-5);

        weapon.rotate_to([(-170f32).to_radians(), 0.0], 100.0);
        assert!((weapon.angles()[0] - 179f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_only_if_aimed_turret_waits_for_aim() {
        let mut weapon = turret(None, true);
        let mut body = ship();
        let (mut projectiles, mut flashes) = pools();
        let settings = CombatSettings::default();

        assert!(weapon
            .fire(&mut body, Shooter::default(), &mut projectiles, &mut flashes, &settings)
            .is_none());

        let target = craft(1, Some(2), Vec3::new(0.0, 200.0, 0.0));
        weapon.aim_towards(&body, Some(target.position), 15.625);
        assert_eq!(weapon.status(), AimStatus::AimedInRange);
        assert!(weapon
            .fire(&mut body, Shooter::default(), &mut projectiles, &mut flashes, &settings)
            .is_some());
    }

    #[test]
    fn test_no_target_returns_to_default_angles() {
        let mut weapon = turret(None, false);
        weapon.rotate_to([FRAC_PI_2, 0.0], 10_000.0);

        weapon.aim_towards(&ship(), None, 10_000.0);

        assert!(weapon.angles()[0].abs() < 1e-5);
        assert_eq!(weapon.status(), AimStatus::NoTarget);
    }

    #[test]
    fn test_transform_rotates_about_rotator_center() {
        let rotator = RotatorClass {
            center: Vec3::new(1.0, 0.0, 0.0),
            default_angle_deg: 90.0,
            ..Default::default()
        };
        let class = WeaponClass {
            rotation_style: RotationStyle::YawPitch,
            rotators: vec![rotator, RotatorClass::default()],
            ..Default::default()
        };
        let weapon = Weapon::new(
            Arc::new(class),
            projectile_class(),
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
        );

        let transform = weapon.transform_in_ship();
        let origin = transform.transform_point3(Vec3::ZERO);
        let forward = transform.transform_vector3(Vec3::Y);

        assert!((origin - Vec3::new(1.0, 4.0, 0.0)).length() < 1e-5);
        assert!((forward - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
