//! Physics module
//!
//! - `RigidBody` — интерфейс тела, через который core прикладывает силы
//! - `PhysicalObject` — headless rigid body (ECS component)
//! - rapier bridge — коллайдеры и синхронизация скоростей

pub mod body;
pub mod rapier;

pub use body::{HitBox, PhysicalObject, RigidBody};
pub use rapier::{hitbox_collider, rapier_components, sync_transforms, sync_velocity_to_rapier};

use bevy::prelude::*;

/// Система: интеграция всех PhysicalObject за фиксированный тик
pub fn integrate_physical_objects(mut query: Query<&mut PhysicalObject>, time: Res<Time<Fixed>>) {
    let dt_ms = time.delta_secs() * 1000.0;

    for mut body in query.iter_mut() {
        body.integrate(dt_ms);
    }
}
