//! Combat module: снаряды, ракеты, орудия, пусковые, hit test
//!
//! ECS ответственность:
//! - состояние: Armament (орудия + пусковые), пулы снарядов/ракет/вспышек
//! - правила: hit test, урон, импульс, залпы
//! - события: WeaponFired, MissileLaunched, ExplosionSpawned, DamageDealt, SpacecraftDestroyed
//!
//! Presentation (host) только читает события и пулы.

use bevy::prelude::*;
use bevy_rapier3d::plugin::PhysicsSet;

pub mod armament;
pub mod damage;
pub mod events;
pub mod launcher;
pub mod missile;
pub mod particle;
pub mod projectile;
pub mod spawn;
pub mod systems;
pub mod weapon;

#[cfg(test)]
mod weapon_tests;

// Re-export основных типов
pub use armament::Armament;
pub use damage::{apply_hits, recharge_shields, split_damage};
pub use events::{
    DamageDealt, ExplosionKind, ExplosionSpawned, FireIntent, Impact, LaunchIntent, MissileLaunched,
    SpacecraftDestroyed, SpacecraftHit, WeaponFired,
};
pub use hit_test::{check_hit, HitFlow, HitOffset, HitQuery, HitReport};
pub use launcher::{LaunchReport, MissileLauncher};
pub use missile::{Missile, MissileOutcome};
pub use particle::MuzzleFlash;
pub use projectile::Projectile;
pub use spawn::{spacecraft_bundle, spawn_spacecraft, SpacecraftSpawn};
pub use weapon::{AimStatus, Shooter, Volley, Weapon};

use crate::config::CombatSettings;
use crate::pool::Pool;

/// Пул снарядов (ECS resource, ёмкость из `CombatSettings::pools`)
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct ProjectilePool(pub Pool<Projectile>);

impl FromWorld for ProjectilePool {
    fn from_world(world: &mut World) -> Self {
        let capacity = world
            .get_resource::<CombatSettings>()
            .map_or_else(|| CombatSettings::default().pools.projectiles, |settings| settings.pools.projectiles);
        Self(Pool::with_capacity("projectiles", capacity))
    }
}

#[derive(Resource, Debug, Deref, DerefMut)]
pub struct MissilePool(pub Pool<Missile>);

impl FromWorld for MissilePool {
    fn from_world(world: &mut World) -> Self {
        let capacity = world
            .get_resource::<CombatSettings>()
            .map_or_else(|| CombatSettings::default().pools.missiles, |settings| settings.pools.missiles);
        Self(Pool::with_capacity("missiles", capacity))
    }
}

#[derive(Resource, Debug, Deref, DerefMut)]
pub struct MuzzleFlashPool(pub Pool<MuzzleFlash>);

impl FromWorld for MuzzleFlashPool {
    fn from_world(world: &mut World) -> Self {
        let capacity = world
            .get_resource::<CombatSettings>()
            .map_or_else(|| CombatSettings::default().pools.particles, |settings| settings.pools.particles);
        Self(Pool::with_capacity("muzzle flashes", capacity))
    }
}

/// Combat Plugin
///
/// Регистрирует события, пулы и весь боевой тик в FixedUpdate (64Hz).
///
/// Порядок выполнения:
/// 1. apply_graphics_settings / collect_resource_requests — presentation hooks
/// 2. refresh_battlefield — снимок кораблей ДО движения
/// 3. control_thrusters — burn reset → burn → силы
/// 4. update_targeting — цели, захват, наведение турелей
/// 5. simulate_armaments → handle_fire_intents → handle_launch_intents
/// 6. integrate_physical_objects — движение кораблей
/// 7. simulate_projectiles / simulate_missiles / simulate_muzzle_flashes
/// 8. reclaim_pools — освобождение слотов
/// 9. apply_hits → recharge_shields
/// 10. sync_transforms → sync_velocity_to_rapier (до rapier step)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<FireIntent>()
            .add_event::<LaunchIntent>()
            .add_event::<WeaponFired>()
            .add_event::<MissileLaunched>()
            .add_event::<ExplosionSpawned>()
            .add_event::<SpacecraftHit>()
            .add_event::<DamageDealt>()
            .add_event::<SpacecraftDestroyed>()
            .add_event::<crate::targeting::TargetingIntent>();

        app.init_resource::<CombatSettings>()
            .init_resource::<crate::battlefield::Battlefield>()
            .init_resource::<crate::classes::ResourceManifest>()
            .init_resource::<ProjectilePool>()
            .init_resource::<MissilePool>()
            .init_resource::<MuzzleFlashPool>();

        app.add_systems(
            FixedUpdate,
            (
                systems::apply_graphics_settings,
                systems::collect_resource_requests,
                crate::battlefield::refresh_battlefield,
                crate::propulsion::control_thrusters,
                crate::targeting::update_targeting,
                systems::simulate_armaments,
                systems::handle_fire_intents,
                systems::handle_launch_intents,
                crate::physics::integrate_physical_objects,
                systems::simulate_projectiles,
                systems::simulate_missiles,
                systems::simulate_muzzle_flashes,
                crate::pool::reclaim_pools,
                damage::apply_hits,
                damage::recharge_shields,
                crate::physics::sync_transforms,
                crate::physics::sync_velocity_to_rapier,
            )
                .chain() // Последовательное выполнение
                .before(PhysicsSet::SyncBackend), // До rapier physics step
        );
    }
}
