//! Battlefield snapshot — read-only вид всех кораблей на начало тика
//!
//! Строится первой системой тика (до движения), поэтому hit test снарядов
//! и ракет видит позиции/скорости целей pre-movement.
//! Порядок — по `Entity::index()` (детерминизм).

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::classes::SpacecraftClass;
use crate::combat::HitFlow;
use crate::components::{Piloted, Shield, Spacecraft};
use crate::physics::PhysicalObject;

/// Команды враждебны, если различаются; без команды — враждебен всем
pub fn are_hostile(a: Option<u32>, b: Option<u32>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_segment(start: Vec3, end: Vec3) -> Self {
        Self {
            min: start.min(end),
            max: start.max(end),
        }
    }

    pub fn from_sphere(center: Vec3, radius: f32) -> Self {
        Self {
            min: center - Vec3::splat(radius),
            max: center + Vec3::splat(radius),
        }
    }

    pub fn expanded(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

/// Пространственный индекс кандидатов для hit test
pub trait SpatialIndex {
    /// Вызывает `callback` для каждого объекта, чьи границы пересекают `bounds`,
    /// пока callback не вернёт `HitFlow::Stop`
    fn execute_for_objects(&self, bounds: &Aabb, callback: &mut dyn FnMut(&CraftSnapshot) -> HitFlow);
}

/// Игрок (для правил friendly fire / self damage)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PilotedCraft {
    pub entity: Entity,
    pub team: Option<u32>,
}

/// Снимок корабля
#[derive(Debug, Clone)]
pub struct CraftSnapshot {
    pub entity: Entity,
    pub class: Arc<SpacecraftClass>,
    pub team: Option<u32>,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub shield: f32,
    pub hull: f32,
    pub away: bool,
    pub piloted: bool,
    bounding_radius: f32,
}

impl CraftSnapshot {
    pub fn new(
        entity: Entity,
        spacecraft: &Spacecraft,
        body: &PhysicalObject,
        shield: Option<&Shield>,
        piloted: bool,
    ) -> Self {
        let bounding_radius = spacecraft
            .class
            .hitboxes
            .iter()
            .map(|hitbox| hitbox.bounding_radius())
            .fold(0.0, f32::max);

        Self {
            entity,
            class: spacecraft.class.clone(),
            team: spacecraft.team,
            position: body.position,
            orientation: body.orientation,
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
            shield: shield.map_or(0.0, |shield| shield.capacity),
            hull: spacecraft.hull,
            away: spacecraft.away,
            piloted,
            bounding_radius,
        }
    }

    /// Может быть целью/участником боя
    pub fn is_present(&self) -> bool {
        self.hull > 0.0 && !self.away
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * crate::math::FORWARD
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_sphere(self.position, self.bounding_radius)
    }

    pub fn has_hitboxes(&self) -> bool {
        !self.class.hitboxes.is_empty()
    }

    /// Пересечение мирового отрезка с hitboxes (расширенными на offset)
    ///
    /// Returns точку входа в object space.
    pub fn check_hit(&self, start: Vec3, end: Vec3, offset: f32) -> Option<Vec3> {
        let inverse = self.orientation.inverse();
        let local_start = inverse * (start - self.position);
        let local_end = inverse * (end - self.position);

        self.class
            .hitboxes
            .iter()
            .filter_map(|hitbox| hitbox.intersect_segment(local_start, local_end, offset))
            .reduce(f32::min)
            .map(|t| local_start.lerp(local_end, t))
    }
}

/// Снимок поля боя (ECS resource)
#[derive(Resource, Debug, Default)]
pub struct Battlefield {
    crafts: Vec<CraftSnapshot>,
    lookup: HashMap<Entity, usize>,
    piloted: Option<PilotedCraft>,
}

impl Battlefield {
    /// Пересобирает снимок (порядок по entity index)
    pub fn rebuild(&mut self, crafts: impl IntoIterator<Item = CraftSnapshot>) {
        self.crafts.clear();
        self.crafts.extend(crafts);
        self.crafts.sort_by_key(|craft| craft.entity.index());

        self.lookup.clear();
        self.piloted = None;
        for (index, craft) in self.crafts.iter().enumerate() {
            self.lookup.insert(craft.entity, index);
            if craft.piloted {
                self.piloted = Some(PilotedCraft {
                    entity: craft.entity,
                    team: craft.team,
                });
            }
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&CraftSnapshot> {
        self.lookup.get(&entity).map(|&index| &self.crafts[index])
    }

    /// Снимок, если корабль жив и в бою
    pub fn present(&self, entity: Entity) -> Option<&CraftSnapshot> {
        self.get(entity).filter(|craft| craft.is_present())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CraftSnapshot> {
        self.crafts.iter()
    }

    pub fn len(&self) -> usize {
        self.crafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crafts.is_empty()
    }

    pub fn piloted(&self) -> Option<PilotedCraft> {
        self.piloted
    }
}

impl SpatialIndex for Battlefield {
    fn execute_for_objects(&self, bounds: &Aabb, callback: &mut dyn FnMut(&CraftSnapshot) -> HitFlow) {
        for craft in &self.crafts {
            if craft.bounds().intersects(bounds) && callback(craft) == HitFlow::Stop {
                return;
            }
        }
    }
}

/// Система: пересборка снимка в начале тика
pub fn refresh_battlefield(
    mut battlefield: ResMut<Battlefield>,
    query: Query<(Entity, &Spacecraft, &PhysicalObject, Option<&Shield>, Has<Piloted>)>,
) {
    battlefield.rebuild(
        query
            .iter()
            .map(|(entity, spacecraft, body, shield, piloted)| {
                CraftSnapshot::new(entity, spacecraft, body, shield, piloted)
            }),
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::physics::HitBox;

    /// Корабль-снимок с одним hitbox 2×2×2 в точке `position`
    pub fn craft(index: u32, team: Option<u32>, position: Vec3) -> CraftSnapshot {
        let class = Arc::new(SpacecraftClass {
            hitboxes: vec![HitBox::new(Vec3::ZERO, Vec3::splat(1.0))],
            ..Default::default()
        });
        let spacecraft = Spacecraft::new(class, team);
        let body = PhysicalObject {
            position,
            ..default()
        };
        CraftSnapshot::new(Entity::from_raw(index), &spacecraft, &body, None, false)
    }

    pub fn battlefield(crafts: Vec<CraftSnapshot>) -> Battlefield {
        let mut battlefield = Battlefield::default();
        battlefield.rebuild(crafts);
        battlefield
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_check_hit_respects_orientation() {
        // Длинный box вдоль локального Y, корабль повёрнут на 90° вокруг Z
        let class = Arc::new(SpacecraftClass {
            hitboxes: vec![crate::physics::HitBox::new(Vec3::ZERO, Vec3::new(0.5, 10.0, 0.5))],
            ..Default::default()
        });
        let spacecraft = Spacecraft::new(class, Some(2));
        let body = PhysicalObject::default().with_pose(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let snapshot = CraftSnapshot::new(Entity::from_raw(1), &spacecraft, &body, None, false);

        // После поворота box вытянут вдоль мирового X
        assert!(snapshot.check_hit(Vec3::new(8.0, -5.0, 0.0), Vec3::new(8.0, 5.0, 0.0), 0.0).is_some());
        assert!(snapshot.check_hit(Vec3::new(-5.0, 8.0, 0.0), Vec3::new(5.0, 8.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_hostility() {
        assert!(are_hostile(Some(1), Some(2)));
        assert!(!are_hostile(Some(1), Some(1)));
        assert!(are_hostile(None, Some(1)));
        assert!(are_hostile(None, None));
    }

    #[test]
    fn test_rebuild_orders_by_entity_index() {
        let battlefield = battlefield(vec![
            craft(7, Some(1), Vec3::ZERO),
            craft(2, Some(2), Vec3::X * 10.0),
        ]);

        let order: Vec<u32> = battlefield.iter().map(|craft| craft.entity.index()).collect();
        assert_eq!(order, vec![2, 7]);
        assert_eq!(battlefield.get(Entity::from_raw(7)).unwrap().team, Some(1));
    }

    #[test]
    fn test_spatial_query_filters_by_bounds() {
        let battlefield = battlefield(vec![
            craft(1, Some(1), Vec3::ZERO),
            craft(2, Some(1), Vec3::new(100.0, 0.0, 0.0)),
        ]);

        let mut seen = Vec::new();
        battlefield.execute_for_objects(
            &Aabb::from_segment(Vec3::new(-5.0, -1.0, 0.0), Vec3::new(5.0, 1.0, 0.0)),
            &mut |craft| {
                seen.push(craft.entity.index());
                HitFlow::Continue
            },
        );
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn test_piloted_tracked() {
        let mut player = craft(3, Some(1), Vec3::ZERO);
        player.piloted = true;
        let battlefield = battlefield(vec![craft(1, Some(2), Vec3::ZERO), player]);

        assert_eq!(
            battlefield.piloted(),
            Some(PilotedCraft {
                entity: Entity::from_raw(3),
                team: Some(1),
            })
        );
    }
}
