//! Missile — управляемая ракета
//!
//! Фазы: ignition (дрейф после пуска) → активная (наведение + маршевый
//! двигатель) → подрыв (попадание / proximity) или fizzle по истечении
//! времени жизни.
//!
//! Маневровые двигатели: bang-bang с учётом тормозного пути
//! `ω|ω| / 2α`, чтобы ракета не проскакивала направление на цель.

use bevy::prelude::*;
use std::sync::Arc;

use super::events::{ExplosionKind, ExplosionSpawned, Impact};
use super::hit_test::{check_hit, HitFlow, HitOffset, HitQuery};
use crate::battlefield::{Battlefield, PilotedCraft};
use crate::classes::{HomingMode, MissileClass};
use crate::config::CombatSettings;
use crate::math::{hit_time, yaw_and_pitch, FORWARD, RIGHT, UP};
use crate::physics::{PhysicalObject, RigidBody};
use crate::pool::Poolable;
use crate::propulsion::{BurnLevels, ThrusterUse};

/// Мёртвая зона маневровых двигателей
const TURN_DEAD_ZONE: f32 = 0.05 * std::f32::consts::PI / 180.0;

/// Initial: курс фиксируется, когда ошибка и тормозной угол меньше этого
const LOCK_IN_TOLERANCE: f32 = 0.25 * std::f32::consts::PI / 180.0;

/// Чем закончился тик ракеты
#[derive(Debug, Clone)]
pub enum MissileOutcome {
    Hit(Impact),
    Fizzle(ExplosionSpawned),
}

#[derive(Debug, Default, Clone)]
pub struct Missile {
    class: Option<Arc<MissileClass>>,
    pub body: PhysicalObject,
    time_left: f32,
    ignition_left: f32,
    target: Option<Entity>,
    origin: Option<Entity>,
    origin_team: Option<u32>,
    stop_homing: bool,
    /// Зафиксированное направление полёта (мир), Initial после захвата курса
    locked_heading: Option<Vec3>,
    burn: BurnLevels,
    /// Последняя рассчитанная точка перехвата (мир)
    hit_position: Option<Vec3>,
}

impl Missile {
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        class: Arc<MissileClass>,
        position: Vec3,
        orientation: Quat,
        velocity: Vec3,
        target: Option<Entity>,
        origin: Option<Entity>,
        origin_team: Option<u32>,
    ) {
        let mut body = PhysicalObject::new(class.mass, class.mass, Vec::new()).with_pose(position, orientation);
        body.velocity = velocity;

        self.body = body;
        self.time_left = class.duration_ms;
        self.ignition_left = class.ignition_time_ms;
        self.target = target;
        self.origin = origin;
        self.origin_team = origin_team;
        self.stop_homing = class.homing_mode == HomingMode::None;
        self.locked_heading = None;
        self.burn = BurnLevels::default();
        self.hit_position = None;
        self.class = Some(class);
    }

    pub fn class(&self) -> Option<&Arc<MissileClass>> {
        self.class.as_ref()
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn origin(&self) -> Option<Entity> {
        self.origin
    }

    pub fn time_left(&self) -> f32 {
        self.time_left
    }

    /// Наведение ещё активно
    pub fn is_homing(&self) -> bool {
        !self.stop_homing
    }

    pub fn is_ignited(&self) -> bool {
        self.ignition_left <= 0.0
    }

    pub fn main_engine_burning(&self) -> bool {
        self.burn.get(ThrusterUse::Forward) > 0.0
    }

    pub fn hit_position(&self) -> Option<Vec3> {
        self.hit_position
    }

    pub fn locked_heading(&self) -> Option<Vec3> {
        self.locked_heading
    }

    pub fn simulate(
        &mut self,
        dt_ms: f32,
        battlefield: &Battlefield,
        piloted: Option<PilotedCraft>,
        settings: &CombatSettings,
    ) -> Option<MissileOutcome> {
        if self.can_be_reused() {
            return None;
        }
        let class = self.class.clone()?;
        let dt_ms = dt_ms.max(0.0);

        self.time_left -= dt_ms;
        if self.time_left <= 0.0 {
            self.burn.reset();
            return Some(MissileOutcome::Fizzle(ExplosionSpawned {
                kind: ExplosionKind::Fizzle,
                class_name: class.fizzle_explosion.clone(),
                position: self.body.position,
                velocity: self.body.velocity,
            }));
        }

        self.burn.reset();
        if self.ignition_left > 0.0 {
            self.ignition_left -= dt_ms;
        } else {
            self.guide(&class, battlefield, dt_ms);
            self.apply_burn(&class, dt_ms);
        }

        self.body
            .apply_drag(class.drag_factor * settings.drag_coefficient, dt_ms);
        self.body.integrate(dt_ms);

        let query = HitQuery {
            position: self.body.position,
            velocity: self.body.velocity,
            dt_ms,
            origin: self.origin,
            origin_team: self.origin_team,
            piloted,
            offset: HitOffset::Proximity(class.proximity_range),
        };

        let mut impact = None;
        check_hit(&query, battlefield, settings, |report| {
            impact = Some(Impact::kinetic(
                report,
                self.origin,
                class.damage,
                class.mass,
                1.0,
                (&class.shield_explosion, &class.armor_explosion),
                settings,
            ));
            HitFlow::Stop
        });

        impact.map(|impact| {
            self.time_left = 0.0;
            self.burn.reset();
            MissileOutcome::Hit(impact)
        })
    }

    /// Наведение: burn маневровых по yaw/pitch/roll + решение о маршевом
    fn guide(&mut self, class: &MissileClass, battlefield: &Battlefield, dt_ms: f32) {
        let mut yaw_error = 0.0;
        let mut pitch_error = 0.0;
        let mut aim_direction = None;

        if !self.stop_homing {
            if let Some(target) = self.target.and_then(|entity| battlefield.present(entity)) {
                let relative_position = target.position - self.body.position;
                let relative_velocity = target.velocity - self.body.velocity;
                let time = hit_time(relative_position, relative_velocity, 0.0, class.acceleration());
                let aim = relative_position + relative_velocity * time;

                self.hit_position = Some(self.body.position + aim);
                aim_direction = aim.try_normalize();
                (yaw_error, pitch_error) = yaw_and_pitch(self.body.to_local(self.body.position + aim));
            }
        } else if let Some(heading) = self.locked_heading {
            (yaw_error, pitch_error) = yaw_and_pitch(self.body.orientation.inverse() * heading);
        }

        let alpha = class.angular_acceleration;
        let dt_s = dt_ms / 1000.0;
        let omega = self.body.local_angular_velocity();

        self.burn.add_axis(
            ThrusterUse::YawLeft,
            ThrusterUse::YawRight,
            turn_burn(yaw_error, omega.z, alpha, dt_s),
        );
        self.burn.add_axis(
            ThrusterUse::PitchUp,
            ThrusterUse::PitchDown,
            turn_burn(pitch_error, omega.x, alpha, dt_s),
        );
        self.burn.add_axis(
            ThrusterUse::RollRight,
            ThrusterUse::RollLeft,
            turn_burn(0.0, omega.y, alpha, dt_s),
        );

        let threshold = class.main_burn_angle_threshold();
        let aligned = yaw_error.abs() < threshold && pitch_error.abs() < threshold;
        if self.stop_homing || aligned {
            self.burn.add(ThrusterUse::Forward, 1.0);
        }

        // Initial: курс фиксируется только после того, как разворот погашен
        if class.homing_mode == HomingMode::Initial && !self.stop_homing {
            let stopping = |omega: f32| omega * omega / (2.0 * alpha.max(f32::EPSILON));
            let settled = yaw_error.hypot(pitch_error) < LOCK_IN_TOLERANCE
                && stopping(omega.z) < LOCK_IN_TOLERANCE
                && stopping(omega.x) < LOCK_IN_TOLERANCE;
            if settled {
                self.stop_homing = true;
                self.locked_heading = aim_direction;
            }
        }
    }

    fn apply_burn(&mut self, class: &MissileClass, dt_ms: f32) {
        let burn = &self.burn;
        let local_force = FORWARD * burn.get(ThrusterUse::Forward).min(1.0) * class.thrust;
        let local_torque = (UP * burn.net(ThrusterUse::YawLeft, ThrusterUse::YawRight, 1.0)
            + RIGHT * burn.net(ThrusterUse::PitchUp, ThrusterUse::PitchDown, 1.0)
            + FORWARD * burn.net(ThrusterUse::RollRight, ThrusterUse::RollLeft, 1.0))
            * class.angular_acceleration
            * self.body.inertia();

        let orientation = self.body.orientation;
        self.body
            .apply_force_and_torque(orientation * local_force, orientation * local_torque, dt_ms);
    }
}

/// Знаковая интенсивность поворота к углу `angle` при текущей ω
///
/// Учитывает тормозной путь; внутри мёртвой зоны 0.
pub(crate) fn turn_burn(angle: f32, omega: f32, alpha: f32, dt_s: f32) -> f32 {
    if alpha <= 0.0 || dt_s <= 0.0 {
        return 0.0;
    }
    let stopping = omega * omega.abs() / (2.0 * alpha);
    let remaining = angle - stopping;
    if remaining.abs() < TURN_DEAD_ZONE {
        return 0.0;
    }
    let intensity = (remaining.abs() / (alpha * dt_s * dt_s)).min(1.0);
    intensity.copysign(remaining)
}

impl Poolable for Missile {
    fn can_be_reused(&self) -> bool {
        self.time_left <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battlefield::test_support::{battlefield, craft};

    const DT: f32 = 15.625;

    fn class(homing_mode: HomingMode) -> Arc<MissileClass> {
        Arc::new(MissileClass {
            homing_mode,
            ignition_time_ms: 0.0,
            duration_ms: 5000.0,
            ..Default::default()
        })
    }

    fn launch(missile: &mut Missile, class: Arc<MissileClass>, target: Option<Entity>) {
        missile.init(
            class,
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::new(0.0, 20.0, 0.0),
            target,
            Some(Entity::from_raw(99)),
            Some(1),
        );
    }

    #[test]
    fn test_turn_burn_respects_stopping_distance() {
        // Далеко от цели — полный burn в сторону цели
        assert_eq!(turn_burn(1.0, 0.0, 4.0, 0.015625), 1.0);
        assert_eq!(turn_burn(-1.0, 0.0, 4.0, 0.015625), -1.0);
        // Уже вращаемся быстро: тормозной путь 2 рад > 1 рад → тормозим
        assert_eq!(turn_burn(1.0, 4.0, 4.0, 0.015625), -1.0);
        // Мёртвая зона
        assert_eq!(turn_burn(0.0001, 0.0, 4.0, 0.015625), 0.0);
    }

    #[test]
    fn test_unguided_missile_keeps_heading() {
        let field = battlefield(vec![craft(1, Some(2), Vec3::new(500.0, 200.0, 0.0))]);
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        launch(&mut missile, class(HomingMode::None), Some(Entity::from_raw(1)));

        for _ in 0..64 {
            assert!(missile.simulate(DT, &field, None, &settings).is_none());
        }

        assert!(missile.body.orientation.angle_between(Quat::IDENTITY) < 1e-5);
        assert!(missile.body.velocity.x.abs() < 1e-3);
        // 1 s маршевого: 20 + 100 м/с
        assert!((missile.body.velocity.y - 120.0).abs() < 0.5);
        assert!(!missile.is_homing());
    }

    #[test]
    fn test_homing_turns_towards_target_before_main_burn() {
        // Цель справа-впереди под 45°
        let field = battlefield(vec![craft(1, Some(2), Vec3::new(400.0, 400.0, 0.0))]);
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        launch(&mut missile, class(HomingMode::Continuous), Some(Entity::from_raw(1)));

        missile.simulate(DT, &field, None, &settings);

        assert!(missile.body.angular_velocity.z < 0.0, "must yaw right");
        assert!(!missile.main_engine_burning());
        assert!((missile.body.velocity.y - 20.0).abs() < 1e-4);
        assert!(missile.hit_position().is_some());
    }

    #[test]
    fn test_initial_homing_stops_after_main_burn() {
        let field = battlefield(vec![craft(1, Some(2), Vec3::new(0.0, 2000.0, 0.0))]);
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        launch(&mut missile, class(HomingMode::Initial), Some(Entity::from_raw(1)));

        assert!(missile.is_homing());
        missile.simulate(DT, &field, None, &settings);

        assert!(missile.main_engine_burning());
        assert!(!missile.is_homing());
    }

    #[test]
    fn test_initial_homing_hits_off_boresight_target() {
        // Неподвижная цель под 45°: курс фиксируется только после разворота
        let field = battlefield(vec![craft(1, Some(2), Vec3::new(400.0, 400.0, 0.0))]);
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        let class = Arc::new(MissileClass {
            homing_mode: HomingMode::Initial,
            ..Default::default()
        });
        launch(&mut missile, class, Some(Entity::from_raw(1)));

        let mut outcome = None;
        let mut locked_at_ignition = None;
        for _ in 0..640 {
            outcome = missile.simulate(DT, &field, None, &settings);
            if outcome.is_some() {
                break;
            }
            if locked_at_ignition.is_none() && missile.main_engine_burning() {
                locked_at_ignition = Some(!missile.is_homing());
            }
        }

        assert_eq!(locked_at_ignition, Some(false), "must keep homing while still turning");
        assert!(!missile.is_homing());
        assert!(missile.locked_heading().is_some());
        match outcome {
            Some(MissileOutcome::Hit(impact)) => assert_eq!(impact.hit.target, Entity::from_raw(1)),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn test_ignition_delay_drifts() {
        let field = battlefield(Vec::new());
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        let class = Arc::new(MissileClass {
            homing_mode: HomingMode::None,
            ignition_time_ms: 300.0,
            ..Default::default()
        });
        launch(&mut missile, class, None);

        for _ in 0..10 {
            missile.simulate(DT, &field, None, &settings);
        }
        assert!(!missile.is_ignited());
        assert_eq!(missile.body.velocity, Vec3::new(0.0, 20.0, 0.0));
    }

    #[test]
    fn test_expiry_fizzles_without_damage() {
        let field = battlefield(Vec::new());
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        launch(&mut missile, class(HomingMode::None), None);

        let outcome = missile.simulate(5000.0, &field, None, &settings);

        match outcome {
            Some(MissileOutcome::Fizzle(explosion)) => {
                assert_eq!(explosion.kind, ExplosionKind::Fizzle);
                assert_eq!(explosion.class_name, "fizzle");
            }
            other => panic!("expected fizzle, got {:?}", other),
        }
        assert!(missile.can_be_reused());
        assert!(missile.simulate(DT, &field, None, &settings).is_none());
    }

    #[test]
    fn test_proximity_detonation_on_hostile() {
        // Пролетает в 3 м от цели — proximity_range 5 м
        let field = battlefield(vec![craft(1, Some(2), Vec3::new(3.0, 60.0, 0.0))]);
        let settings = CombatSettings::default();
        let mut missile = Missile::default();
        launch(&mut missile, class(HomingMode::None), None);
        missile.body.velocity = Vec3::new(0.0, 200.0, 0.0);

        let mut outcome = None;
        for _ in 0..40 {
            outcome = missile.simulate(DT, &field, None, &settings);
            if outcome.is_some() {
                break;
            }
        }

        match outcome {
            Some(MissileOutcome::Hit(impact)) => {
                assert_eq!(impact.hit.target, Entity::from_raw(1));
                assert_eq!(impact.hit.damage, 200.0);
                assert_eq!(impact.hit.source, Some(Entity::from_raw(99)));
            }
            other => panic!("expected hit, got {:?}", other),
        }
        assert!(missile.can_be_reused());
    }
}
