//! Armada Combat Core
//!
//! Headless боевая симуляция космических кораблей на Bevy 0.16 (ECS).
//!
//! Слои:
//! - ECS = правила боя (снаряды, ракеты, орудия, цели, урон, двигатели)
//! - host = presentation (модели, звук, частицы), читает события и пулы
//!
//! Тик фиксированный: 64Hz (15.625 ms), всё в FixedUpdate.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

// Публичные модули
pub mod battlefield;
pub mod classes;
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;
pub mod math;
pub mod physics;
pub mod pool;
pub mod propulsion;
pub mod targeting;

// Re-export основных типов для удобства
pub use battlefield::{are_hostile, Battlefield, CraftSnapshot};
pub use classes::{ClassRegistry, CombatEntity, ResourceHost, ResourceManifest};
pub use combat::{
    spacecraft_bundle, spawn_spacecraft, Armament, CombatPlugin, DamageDealt, ExplosionKind, ExplosionSpawned,
    FireIntent, LaunchIntent, MissileLaunched, MissilePool, MuzzleFlashPool, ProjectilePool, SpacecraftDestroyed,
    SpacecraftHit, SpacecraftSpawn, WeaponFired,
};
pub use components::{Piloted, Shield, Spacecraft};
pub use config::{CombatSettings, ConfigError, GraphicsSettings, PoolSettings, TargetingSettings};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use physics::{PhysicalObject, RigidBody};
pub use propulsion::{FlightMode, ManeuveringComputer, Propulsion};
pub use targeting::{TargetSelection, TargetingComputer, TargetingIntent};

/// Длительность фиксированного тика (64Hz)
pub const FIXED_TIMESTEP: Duration = Duration::from_micros(15_625);

/// Главный plugin симуляции
///
/// `CombatSettings`, вставленные до плагина, проходят sanitize;
/// `ClassRegistry` создаётся пустым, если host не вставил свой.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let mut settings = app
            .world_mut()
            .remove_resource::<CombatSettings>()
            .unwrap_or_default();
        settings.sanitize();

        app.insert_resource(Time::<Fixed>::from_duration(FIXED_TIMESTEP))
            .insert_resource(settings)
            .init_resource::<ClassRegistry>()
            .add_plugins(CombatPlugin);
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную ровно на один тик за `app.update()`
/// (первый update — нулевой delta).
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(FIXED_TIMESTEP))
        .insert_resource(Time::<Fixed>::from_duration(FIXED_TIMESTEP));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
