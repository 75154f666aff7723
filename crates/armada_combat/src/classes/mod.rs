//! Class records (immutable templates) и реестр классов
//!
//! Классы загружаются внешним loader'ом (serde), регистрируются в `ClassRegistry`.
//! При регистрации:
//! - `sanitize()` заменяет невалидные поля дефолтами
//! - ошибки логируются как warnings (simulation продолжает работать)
//!
//! Runtime объекты держат `Arc<Class>`, поиск по имени только при spawn.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::config::{report, ConfigError, GraphicsSettings};

pub mod missile;
pub mod presets;
pub mod projectile;
pub mod spacecraft;
pub mod weapon;

pub use missile::{HomingMode, MissileClass, MissileLauncherClass};
pub use projectile::ProjectileClass;
pub use spacecraft::{Mount, PropulsionClass, ShieldClass, SpacecraftClass, SpacecraftType, ThrusterSlot};
pub use weapon::{Barrel, RotationStyle, RotatorClass, WeaponClass};

/// Ссылка на визуальную модель (composition вместо иерархии классов)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRef {
    pub model: String,
    pub shader: Option<String>,
}

impl ModelRef {
    pub fn acquire(&self, host: &mut dyn ResourceHost) {
        if !self.model.is_empty() {
            host.request_model(&self.model);
        }
    }
}

/// Presentation слой: получает имена ресурсов, которые понадобятся entity
pub trait ResourceHost {
    fn request_model(&mut self, name: &str);
    fn request_sound(&mut self, name: &str);
    fn request_particle(&mut self, name: &str);
}

/// Capability интерфейс боевых сущностей
pub trait CombatEntity {
    fn display_name(&self) -> &str;

    /// Сообщает host'у, какие ресурсы нужны для отображения
    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings);

    fn handle_graphics_settings_changed(&mut self, _graphics: &GraphicsSettings) {}
}

/// Накопитель запросов ресурсов (читает presentation layer)
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct ResourceManifest {
    pub models: BTreeSet<String>,
    pub sounds: BTreeSet<String>,
    pub particles: BTreeSet<String>,
}

impl ResourceHost for ResourceManifest {
    fn request_model(&mut self, name: &str) {
        self.models.insert(name.to_string());
    }

    fn request_sound(&mut self, name: &str) {
        self.sounds.insert(name.to_string());
    }

    fn request_particle(&mut self, name: &str) {
        self.particles.insert(name.to_string());
    }
}

/// Реестр классов (ECS resource, владеет App)
#[derive(Resource, Debug, Default)]
pub struct ClassRegistry {
    projectiles: HashMap<String, Arc<ProjectileClass>>,
    missiles: HashMap<String, Arc<MissileClass>>,
    launchers: HashMap<String, Arc<MissileLauncherClass>>,
    weapons: HashMap<String, Arc<WeaponClass>>,
    spacecraft: HashMap<String, Arc<SpacecraftClass>>,
    spacecraft_types: HashMap<String, Arc<SpacecraftType>>,
}

macro_rules! class_accessors {
    ($register:ident, $get:ident, $fallback:ident, $field:ident, $ty:ty, $kind:literal) => {
        /// Регистрирует класс (после sanitize), возвращает найденные config ошибки
        pub fn $register(&mut self, mut class: $ty) -> Vec<ConfigError> {
            let errors = class.sanitize();
            report(&errors);
            self.$field.insert(class.name.clone(), Arc::new(class));
            errors
        }

        pub fn $get(&self, name: &str) -> Result<Arc<$ty>, ConfigError> {
            self.$field
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownClass {
                    kind: $kind,
                    name: name.to_string(),
                })
        }

        /// Класс по имени или дефолтный (ошибка логируется)
        pub fn $fallback(&self, name: &str) -> Arc<$ty> {
            self.$get(name).unwrap_or_else(|error| {
                crate::log_warning(&format!("{}, using defaults", error));
                Arc::new(<$ty>::default())
            })
        }
    };
}

impl ClassRegistry {
    class_accessors!(
        register_projectile,
        projectile,
        projectile_or_fallback,
        projectiles,
        ProjectileClass,
        "projectile"
    );
    class_accessors!(register_missile, missile, missile_or_fallback, missiles, MissileClass, "missile");
    class_accessors!(
        register_launcher,
        launcher,
        launcher_or_fallback,
        launchers,
        MissileLauncherClass,
        "launcher"
    );
    class_accessors!(register_weapon, weapon, weapon_or_fallback, weapons, WeaponClass, "weapon");
    class_accessors!(
        register_spacecraft,
        spacecraft,
        spacecraft_or_fallback,
        spacecraft,
        SpacecraftClass,
        "spacecraft"
    );

    pub fn register_spacecraft_type(&mut self, spacecraft_type: SpacecraftType) {
        self.spacecraft_types
            .insert(spacecraft_type.name.clone(), Arc::new(spacecraft_type));
    }

    pub fn spacecraft_type(&self, name: &str) -> Option<Arc<SpacecraftType>> {
        self.spacecraft_types.get(name).cloned()
    }

    /// Проверяет ссылки между классами (weapon → projectile, launcher → missile,
    /// spacecraft → type/weapons/launchers)
    ///
    /// Ошибки сортированы для стабильного вывода.
    pub fn validate_references(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        for weapon in self.weapons.values() {
            if !self.projectiles.contains_key(&weapon.projectile) {
                errors.push(ConfigError::UnknownClass {
                    kind: "projectile",
                    name: weapon.projectile.clone(),
                });
            }
        }

        for launcher in self.launchers.values() {
            if !self.missiles.contains_key(&launcher.missile) {
                errors.push(ConfigError::UnknownClass {
                    kind: "missile",
                    name: launcher.missile.clone(),
                });
            }
        }

        for craft in self.spacecraft.values() {
            if !self.spacecraft_types.contains_key(&craft.spacecraft_type) {
                errors.push(ConfigError::UnknownClass {
                    kind: "spacecraft type",
                    name: craft.spacecraft_type.clone(),
                });
            }
            for mount in &craft.weapons {
                if !self.weapons.contains_key(&mount.class) {
                    errors.push(ConfigError::UnknownClass {
                        kind: "weapon",
                        name: mount.class.clone(),
                    });
                }
            }
            for mount in &craft.launchers {
                if !self.launchers.contains_key(&mount.class) {
                    errors.push(ConfigError::UnknownClass {
                        kind: "launcher",
                        name: mount.class.clone(),
                    });
                }
            }
        }

        errors.sort_by_key(|error| error.to_string());
        errors.dedup();
        report(&errors);
        errors
    }
}
