//! ECS компоненты кораблей
//!
//! Боевые подсистемы (Armament, TargetingComputer, Propulsion) живут
//! в своих модулях, здесь — состояние самого корабля.

pub mod spacecraft;

pub use spacecraft::{Piloted, Shield, Spacecraft};
