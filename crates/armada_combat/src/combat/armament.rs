//! Armament — орудия и пусковые корабля

use bevy::prelude::*;

use super::launcher::MissileLauncher;
use super::weapon::Weapon;
use crate::battlefield::CraftSnapshot;
use crate::classes::{CombatEntity, ResourceHost};
use crate::config::GraphicsSettings;
use crate::physics::RigidBody;
use crate::targeting::TargetingComputer;

#[derive(Component, Debug, Clone, Default)]
pub struct Armament {
    pub weapons: Vec<Weapon>,
    pub launchers: Vec<MissileLauncher>,
    active_launcher: usize,
}

impl Armament {
    pub fn new(weapons: Vec<Weapon>, launchers: Vec<MissileLauncher>) -> Self {
        Self {
            weapons,
            launchers,
            active_launcher: 0,
        }
    }

    pub fn active_launcher_index(&self) -> Option<usize> {
        (self.active_launcher < self.launchers.len()).then_some(self.active_launcher)
    }

    pub fn active_launcher(&self) -> Option<&MissileLauncher> {
        self.launchers.get(self.active_launcher)
    }

    pub fn active_launcher_mut(&mut self) -> Option<&mut MissileLauncher> {
        self.launchers.get_mut(self.active_launcher)
    }

    /// Переключает активную пусковую по кругу (залп текущей отменяется)
    pub fn select_next_launcher(&mut self) {
        if self.launchers.is_empty() {
            return;
        }
        if let Some(launcher) = self.active_launcher_mut() {
            launcher.cancel_salvo();
        }
        self.active_launcher = (self.active_launcher + 1) % self.launchers.len();
    }

    /// Тик cooldown'ов всех орудий и пусковых
    pub fn simulate(&mut self, dt_ms: f32) {
        for weapon in &mut self.weapons {
            weapon.simulate(dt_ms);
        }
        for launcher in &mut self.launchers {
            launcher.simulate(dt_ms);
        }
    }

    /// Наводит все орудия на точки упреждения из кэша бортового компьютера
    pub fn aim_all(
        &mut self,
        ship: &impl RigidBody,
        target: Option<&CraftSnapshot>,
        computer: &mut TargetingComputer,
        dt_ms: f32,
    ) {
        for weapon in &mut self.weapons {
            let aim_point =
                target.map(|target| computer.intercept_point(ship, target, weapon.class.projectile_velocity));
            weapon.aim_towards(ship, aim_point, dt_ms);
        }
    }
}

impl CombatEntity for Armament {
    fn display_name(&self) -> &str {
        "armament"
    }

    fn acquire_resources(&self, host: &mut dyn ResourceHost, graphics: &GraphicsSettings) {
        for weapon in &self.weapons {
            weapon.acquire_resources(host, graphics);
        }
        for launcher in &self.launchers {
            launcher.acquire_resources(host, graphics);
        }
    }

    fn handle_graphics_settings_changed(&mut self, graphics: &GraphicsSettings) {
        for weapon in &mut self.weapons {
            weapon.handle_graphics_settings_changed(graphics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::{MissileClass, MissileLauncherClass};
    use std::sync::Arc;

    fn launcher(name: &str) -> MissileLauncher {
        let class = MissileLauncherClass {
            name: name.to_string(),
            salvo: 3,
            ..Default::default()
        };
        MissileLauncher::new(Arc::new(class), Arc::new(MissileClass::default()), Vec3::ZERO, Quat::IDENTITY)
    }

    #[test]
    fn test_select_next_launcher_cycles() {
        let mut armament = Armament::new(Vec::new(), vec![launcher("a"), launcher("b")]);
        assert_eq!(armament.active_launcher().unwrap().class.name, "a");

        armament.select_next_launcher();
        assert_eq!(armament.active_launcher().unwrap().class.name, "b");

        armament.select_next_launcher();
        assert_eq!(armament.active_launcher_index(), Some(0));
    }

    #[test]
    fn test_no_launchers() {
        let mut armament = Armament::default();
        armament.select_next_launcher();
        assert!(armament.active_launcher().is_none());
        assert_eq!(armament.active_launcher_index(), None);
    }
}
