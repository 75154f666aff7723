//! Rapier bridge
//!
//! Rapier — внешний physics engine: коллайдеры строятся из hitboxes класса,
//! скорости синхронизируются из `PhysicalObject` перед rapier backend sync.
//! Интеграция движения остаётся в combat core (детерминизм headless).

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, RigidBody as RapierBody, Velocity};

use super::{HitBox, PhysicalObject};

/// Compound cuboid collider из hitboxes
///
/// Пустой список → маленькая сфера (rapier не принимает пустой compound).
pub fn hitbox_collider(hitboxes: &[HitBox]) -> Collider {
    if hitboxes.is_empty() {
        return Collider::ball(0.1);
    }

    let shapes = hitboxes
        .iter()
        .map(|hitbox| {
            let half = hitbox.half_extents.max(Vec3::splat(0.01));
            (
                hitbox.center,
                Quat::IDENTITY,
                Collider::cuboid(half.x, half.y, half.z),
            )
        })
        .collect();

    Collider::compound(shapes)
}

/// Rapier компоненты для боевого объекта (kinematic — двигаем сами)
pub fn rapier_components(body: &PhysicalObject) -> (RapierBody, Collider, Velocity) {
    (
        RapierBody::KinematicPositionBased,
        hitbox_collider(&body.hitboxes),
        Velocity {
            linvel: body.velocity,
            angvel: body.angular_velocity,
        },
    )
}

/// Система: PhysicalObject → Transform
pub fn sync_transforms(mut query: Query<(&PhysicalObject, &mut Transform)>) {
    for (body, mut transform) in query.iter_mut() {
        transform.translation = body.position;
        transform.rotation = body.orientation;
    }
}

/// Система: PhysicalObject скорости → rapier Velocity
pub fn sync_velocity_to_rapier(mut query: Query<(&PhysicalObject, &mut Velocity)>) {
    for (body, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel = body.velocity;
        rapier_velocity.angvel = body.angular_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_systems_copy_state() {
        let mut app = App::new();
        app.add_systems(Update, (sync_transforms, sync_velocity_to_rapier));

        let body = PhysicalObject {
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(0.0, 50.0, 0.0),
            angular_velocity: Vec3::new(0.0, 0.0, 0.5),
            ..default()
        };
        let entity = app
            .world_mut()
            .spawn((body, Transform::default(), Velocity::default()))
            .id();

        app.update();

        let transform = app.world().get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));

        let velocity = app.world().get::<Velocity>(entity).unwrap();
        assert_eq!(velocity.linvel, Vec3::new(0.0, 50.0, 0.0));
        assert_eq!(velocity.angvel, Vec3::new(0.0, 0.0, 0.5));
    }
}
