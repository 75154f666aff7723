//! Spawn helpers: корабль из класса реестра
//!
//! Один вызов собирает полный набор компонентов: корпус, щит, тело,
//! двигатели, бортовой компьютер, сенсоры, вооружение и rapier коллайдер.

use bevy::prelude::*;

use super::armament::Armament;
use super::launcher::MissileLauncher;
use super::weapon::Weapon;
use crate::classes::{ClassRegistry, CombatEntity, SpacecraftClass};
use crate::components::{Piloted, Shield, Spacecraft};
use crate::config::{CombatSettings, ConfigError};
use crate::physics::{rapier_components, PhysicalObject};
use crate::propulsion::{FlightMode, ManeuveringComputer, Propulsion};
use crate::targeting::TargetingComputer;

/// Параметры появления корабля
#[derive(Debug, Clone)]
pub struct SpacecraftSpawn {
    /// Имя SpacecraftClass в реестре
    pub class: String,
    pub team: Option<u32>,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub flight_mode: FlightMode,
    pub piloted: bool,
}

impl SpacecraftSpawn {
    pub fn new(class: impl Into<String>, team: Option<u32>, position: Vec3) -> Self {
        Self {
            class: class.into(),
            team,
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            flight_mode: FlightMode::default(),
            piloted: false,
        }
    }

    pub fn facing(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn piloted(mut self) -> Self {
        self.piloted = true;
        self
    }
}

fn build_armament(registry: &ClassRegistry, class: &SpacecraftClass) -> Result<Armament, ConfigError> {
    let mut weapons = Vec::with_capacity(class.weapons.len());
    for mount in &class.weapons {
        let weapon = registry.weapon(&mount.class)?;
        let projectile = registry.projectile(&weapon.projectile)?;
        weapons.push(Weapon::new(weapon, projectile, mount.position, mount.orientation()));
    }

    let mut launchers = Vec::with_capacity(class.launchers.len());
    for mount in &class.launchers {
        let launcher = registry.launcher(&mount.class)?;
        let missile = registry.missile(&launcher.missile)?;
        launchers.push(MissileLauncher::new(launcher, missile, mount.position, mount.orientation()));
    }

    Ok(Armament::new(weapons, launchers))
}

/// Bundle корабля
///
/// Ошибка, если класс корабля или его оборудования не зарегистрирован.
pub fn spacecraft_bundle(
    registry: &ClassRegistry,
    settings: &CombatSettings,
    spawn: &SpacecraftSpawn,
) -> Result<impl Bundle, ConfigError> {
    let class = registry.spacecraft(&spawn.class)?;

    let mut armament = build_armament(registry, &class)?;
    armament.handle_graphics_settings_changed(&settings.graphics);

    let mut propulsion = Propulsion::new(class.propulsion.clone(), &class.thrusters);
    propulsion.handle_graphics_settings_changed(&settings.graphics);

    let mut body =
        PhysicalObject::new(class.mass, class.inertia, class.hitboxes.clone()).with_pose(spawn.position, spawn.orientation);
    body.velocity = spawn.velocity;

    let transform = body.to_transform();
    let rapier = rapier_components(&body);

    Ok((
        (
            Spacecraft::new(class.clone(), spawn.team),
            Shield::from_class(&class.shield),
            body,
            transform,
        ),
        (
            propulsion,
            ManeuveringComputer::new(spawn.flight_mode),
            TargetingComputer::new(class.sensor_range),
            armament,
        ),
        rapier,
    ))
}

/// Spawn корабля через Commands
pub fn spawn_spacecraft(
    commands: &mut Commands,
    registry: &ClassRegistry,
    settings: &CombatSettings,
    spawn: &SpacecraftSpawn,
) -> Result<Entity, ConfigError> {
    let bundle = spacecraft_bundle(registry, settings, spawn)?;

    let mut entity = commands.spawn(bundle);
    if spawn.piloted {
        entity.insert(Piloted);
    }
    let id = entity.id();

    crate::log(&format!(
        "🚀 Spawned {} {:?} (team {:?}) at {:?}",
        spawn.class, id, spawn.team, spawn.position
    ));
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::presets::{skirmish_registry, CORVETTE, FIGHTER};

    #[test]
    fn test_bundle_carries_class_loadout() {
        let registry = skirmish_registry();
        let settings = CombatSettings::default();
        let mut world = World::new();

        let spawn = SpacecraftSpawn::new(FIGHTER, Some(1), Vec3::new(10.0, 0.0, 0.0));
        let bundle = spacecraft_bundle(&registry, &settings, &spawn).unwrap();
        let entity = world.spawn(bundle).id();

        let spacecraft = world.get::<Spacecraft>(entity).unwrap();
        assert_eq!(spacecraft.class.name, FIGHTER);
        assert_eq!(spacecraft.hull, 400.0);
        assert_eq!(world.get::<Shield>(entity).unwrap().capacity, 100.0);

        let armament = world.get::<Armament>(entity).unwrap();
        assert_eq!(armament.weapons.len(), 1);
        assert_eq!(armament.launchers.len(), 1);
        assert_eq!(armament.launchers[0].count(), 6);

        let body = world.get::<PhysicalObject>(entity).unwrap();
        assert_eq!(body.position, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(world.get::<Transform>(entity).unwrap().translation, body.position);
    }

    #[test]
    fn test_spawn_marks_piloted() {
        let registry = skirmish_registry();
        let settings = CombatSettings::default();
        let mut world = World::new();

        let spawn = SpacecraftSpawn::new(CORVETTE, Some(2), Vec3::ZERO).piloted();
        let entity = spawn_spacecraft(&mut world.commands(), &registry, &settings, &spawn).unwrap();
        world.flush();

        assert!(world.get::<Piloted>(entity).is_some());
        assert_eq!(world.get::<Armament>(entity).unwrap().launchers.len(), 0);
    }

    #[test]
    fn test_unknown_class_is_error() {
        let registry = skirmish_registry();
        let settings = CombatSettings::default();

        let spawn = SpacecraftSpawn::new("dreadnought", None, Vec3::ZERO);
        let error = spacecraft_bundle(&registry, &settings, &spawn).err().unwrap();
        assert_eq!(
            error,
            ConfigError::UnknownClass {
                kind: "spacecraft",
                name: "dreadnought".to_string(),
            }
        );
    }
}
