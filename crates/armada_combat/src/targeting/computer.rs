//! TargetingComputer — выбор цели и захват для ракет
//!
//! Кандидаты фильтруются по враждебности и дальности сенсоров (²),
//! сортируются стабильно по значению порядка и перебираются начиная
//! после текущей цели.
//!
//! Кэш списков живёт `order_duration_ms`: пока он валиден, новые кандидаты
//! дописываются в конец без пересортировки; по истечении — полная
//! пересортировка и выбор первого.

use bevy::prelude::*;

use crate::battlefield::{are_hostile, Battlefield, CraftSnapshot};
use crate::classes::SpacecraftType;
use crate::combat::MissileLauncher;
use crate::config::CombatSettings;
use crate::math::{bearing, hit_time};
use crate::physics::RigidBody;

/// Критерий упорядочивания кандидатов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOrder {
    /// Угол между forward и направлением на кандидата
    Bearing,
    Distance,
    /// `(distance + K·bearing) × effectiveness`
    BestHostile,
}

/// Всё, что нужно для выбора цели (plain value, без глобального состояния)
#[derive(Clone, Copy)]
pub struct TargetingContext<'a> {
    pub own: &'a CraftSnapshot,
    pub battlefield: &'a Battlefield,
    pub settings: &'a CombatSettings,
    pub own_type: Option<&'a SpacecraftType>,
}

impl TargetingContext<'_> {
    fn order_value(&self, order: TargetOrder, candidate: &CraftSnapshot) -> f32 {
        let offset = candidate.position - self.own.position;
        match order {
            TargetOrder::Bearing => bearing(self.own.forward(), offset),
            TargetOrder::Distance => offset.length(),
            TargetOrder::BestHostile => {
                let targeting = &self.settings.targeting;
                let value = offset.length() + targeting.angle_factor * bearing(self.own.forward(), offset);
                value * self.effectiveness(candidate)
            }
        }
    }

    /// Множитель для best-hostile (< 1 — предпочтительная цель)
    fn effectiveness(&self, candidate: &CraftSnapshot) -> f32 {
        let targeting = &self.settings.targeting;
        let Some(own_type) = self.own_type.filter(|_| targeting.type_effectiveness) else {
            return 1.0;
        };
        let candidate_type = candidate.class.spacecraft_type.as_str();
        if own_type.is_good_against(candidate_type) {
            targeting.good_against_factor
        } else if own_type.is_bad_against(candidate_type) {
            targeting.bad_against_factor
        } else {
            1.0
        }
    }
}

/// Кэшированный упорядоченный список кандидатов
#[derive(Debug, Clone, Default)]
struct OrderedTargets {
    order: Option<TargetOrder>,
    entries: Vec<Entity>,
    time_left_ms: f32,
}

impl OrderedTargets {
    fn is_valid_for(&self, order: TargetOrder) -> bool {
        self.order == Some(order) && self.time_left_ms > 0.0
    }
}

#[derive(Component, Debug, Clone)]
pub struct TargetingComputer {
    sensor_range: f32,
    target: Option<Entity>,
    hostile: OrderedTargets,
    non_hostile: OrderedTargets,

    lock_time_ms: f32,
    lock_duration_ms: f32,
    in_locking_range: bool,

    /// Точки упреждения для текущей цели по скорости снаряда
    /// (сбрасываются каждый тик и при смене цели)
    intercepts: Vec<(f32, Vec3)>,
}

impl TargetingComputer {
    pub fn new(sensor_range: f32) -> Self {
        Self {
            sensor_range,
            target: None,
            hostile: OrderedTargets::default(),
            non_hostile: OrderedTargets::default(),
            lock_time_ms: 0.0,
            lock_duration_ms: 0.0,
            in_locking_range: false,
            intercepts: Vec::new(),
        }
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    /// Эффективная дальность сенсоров в квадрате
    pub fn sensor_range_squared(&self, settings: &CombatSettings) -> f32 {
        let range = self.sensor_range * settings.sensor_range_factor;
        range * range
    }

    pub fn lock_time_ms(&self) -> f32 {
        self.lock_time_ms
    }

    pub fn lock_duration_ms(&self) -> f32 {
        self.lock_duration_ms
    }

    pub fn in_locking_range(&self) -> bool {
        self.in_locking_range
    }

    pub fn is_locked(&self) -> bool {
        self.target.is_some() && self.in_locking_range && self.lock_time_ms >= self.lock_duration_ms
    }

    /// Цель, если захват завершён
    pub fn locked_target(&self) -> Option<Entity> {
        self.target.filter(|_| self.is_locked())
    }

    /// Назначает цель; смена цели сбрасывает захват и кэш упреждения
    pub fn select(&mut self, target: Option<Entity>) {
        if self.target == target {
            return;
        }
        self.target = target;
        self.lock_time_ms = 0.0;
        self.in_locking_range = false;
        self.intercepts.clear();
    }

    pub fn clear_target(&mut self) {
        self.select(None);
    }

    pub fn target_next_nearest_hostile(&mut self, ctx: &TargetingContext) {
        self.target_next(ctx, TargetOrder::Bearing, true);
    }

    pub fn target_next_hostile(&mut self, ctx: &TargetingContext) {
        self.target_next(ctx, TargetOrder::Distance, true);
    }

    pub fn target_next_non_hostile(&mut self, ctx: &TargetingContext) {
        self.target_next(ctx, TargetOrder::Distance, false);
    }

    /// Лучшая враждебная цель (всегда свежая сортировка)
    pub fn target_best_hostile(&mut self, ctx: &TargetingContext) {
        self.hostile.time_left_ms = 0.0;
        self.target_next(ctx, TargetOrder::BestHostile, true);
    }

    fn is_candidate(&self, ctx: &TargetingContext, candidate: &CraftSnapshot, hostile: bool) -> bool {
        candidate.entity != ctx.own.entity
            && candidate.is_present()
            && are_hostile(ctx.own.team, candidate.team) == hostile
            && candidate.position.distance_squared(ctx.own.position) <= self.sensor_range_squared(ctx.settings)
    }

    fn target_next(&mut self, ctx: &TargetingContext, order: TargetOrder, hostile: bool) {
        let candidates: Vec<&CraftSnapshot> = ctx
            .battlefield
            .iter()
            .filter(|candidate| self.is_candidate(ctx, candidate, hostile))
            .collect();

        let order_duration_ms = ctx.settings.targeting.order_duration_ms;
        let list = if hostile {
            &mut self.hostile
        } else {
            &mut self.non_hostile
        };

        if !list.is_valid_for(order) {
            let mut scored: Vec<(f32, Entity)> = candidates
                .iter()
                .map(|candidate| (ctx.order_value(order, candidate), candidate.entity))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));

            list.entries = scored.into_iter().map(|(_, entity)| entity).collect();
            list.order = Some(order);
            list.time_left_ms = order_duration_ms;

            let first = list.entries.first().copied();
            self.select(first);
            return;
        }

        // Подкрепления — в конец, без пересортировки
        for candidate in &candidates {
            if !list.entries.contains(&candidate.entity) {
                list.entries.push(candidate.entity);
            }
        }

        let len = list.entries.len();
        let start = self
            .target
            .and_then(|target| list.entries.iter().position(|&entity| entity == target))
            .map_or(0, |index| index + 1);

        let next = (0..len)
            .map(|offset| list.entries[(start + offset) % len])
            .find(|entity| candidates.iter().any(|candidate| candidate.entity == *entity));
        self.select(next);
    }

    /// Тик: кэши, валидность цели, таймер захвата активной пусковой
    pub fn update(
        &mut self,
        ctx: &TargetingContext,
        ship: &impl RigidBody,
        launcher: Option<&MissileLauncher>,
        dt_ms: f32,
    ) {
        self.hostile.time_left_ms -= dt_ms;
        self.non_hostile.time_left_ms -= dt_ms;
        self.intercepts.clear();

        let Some(target) = self.target.and_then(|entity| ctx.battlefield.present(entity)) else {
            self.clear_target();
            return;
        };

        let Some(launcher) = launcher else {
            self.lock_duration_ms = 0.0;
            self.lock_time_ms = 0.0;
            self.in_locking_range = false;
            return;
        };

        self.lock_duration_ms = launcher.locking_time_ms() * target.class.locking_time_factor;
        self.in_locking_range = launcher.is_in_locking_range(ship, target, ctx.settings);
        if self.in_locking_range {
            self.lock_time_ms = (self.lock_time_ms + dt_ms).min(self.lock_duration_ms);
        } else {
            self.lock_time_ms = 0.0;
        }
    }

    /// Точка упреждения для снарядов со скоростью `projectile_velocity`
    ///
    /// Кэшируется до следующего `update` или смены цели.
    pub fn intercept_point(&mut self, ship: &impl RigidBody, target: &CraftSnapshot, projectile_velocity: f32) -> Vec3 {
        if let Some(&(_, point)) = self
            .intercepts
            .iter()
            .find(|(velocity, _)| *velocity == projectile_velocity)
        {
            return point;
        }

        let relative_position = target.position - ship.position();
        let relative_velocity = target.velocity - ship.velocity();
        let time = hit_time(relative_position, relative_velocity, projectile_velocity, 0.0);
        let point = target.position + relative_velocity * time;

        self.intercepts.push((projectile_velocity, point));
        point
    }
}
