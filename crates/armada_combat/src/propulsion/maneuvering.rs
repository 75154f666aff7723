//! ManeuveringComputer — намерения пилота/AI → burn levels
//!
//! Closed loop на каждой оси:
//!   burn = Δv / (a_max · dt) · max_burn, clamp в [-max_burn, max_burn]
//!
//! Turn targets задаются долей turning limit ([-1, 1]) и сбрасываются
//! каждый тик, если не удержаны `retain_turn_targets()`.
//! Speed/strafe/lift targets (м/с) постоянны.

use bevy::prelude::*;

use super::{Propulsion, ThrusterUse};
use crate::config::CombatSettings;
use crate::math::yaw_and_pitch;
use crate::physics::RigidBody;

/// Режим полёта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightMode {
    /// Прямое управление тягой (без удержания скорости)
    Free,
    /// Удержание заданных скоростей по всем осям, компенсация дрейфа
    #[default]
    Combat,
    /// Только вперёд, strafe/lift = 0, turning limit ограничен скоростью
    Cruise,
}

impl FlightMode {
    pub fn next(self) -> Self {
        match self {
            FlightMode::Free => FlightMode::Combat,
            FlightMode::Combat => FlightMode::Cruise,
            FlightMode::Cruise => FlightMode::Free,
        }
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct ManeuveringComputer {
    flight_mode: FlightMode,
    /// Режим до lock_controls (Some → управление заблокировано)
    locked_from: Option<FlightMode>,

    speed_target: f32,
    strafe_target: f32,
    lift_target: f32,

    yaw_target: f32,
    pitch_target: f32,
    roll_target: f32,
    retain_turn: bool,

    /// Free mode: прямой burn за этот тик
    forward_burn: f32,
    strafe_burn: f32,
    lift_burn: f32,

    /// Free mode: удерживать скорость вместо прямой тяги
    hold_speed: bool,
    capture_speed: bool,

    turning_limit: f32,
    angular_acceleration: f32,
    acceleration: f32,
    last_dt_s: f32,
}

impl ManeuveringComputer {
    pub fn new(flight_mode: FlightMode) -> Self {
        Self {
            flight_mode,
            ..default()
        }
    }

    pub fn flight_mode(&self) -> FlightMode {
        self.flight_mode
    }

    pub fn set_flight_mode(&mut self, mode: FlightMode) {
        if self.locked_from.is_some() {
            return;
        }
        self.flight_mode = mode;
        if mode == FlightMode::Cruise {
            self.strafe_target = 0.0;
            self.lift_target = 0.0;
            self.speed_target = self.speed_target.max(0.0);
        }
    }

    pub fn change_flight_mode(&mut self) {
        self.set_flight_mode(self.flight_mode.next());
    }

    /// Блокирует ввод (прыжковая последовательность): Cruise, без поворотов
    pub fn lock_controls(&mut self) {
        if self.locked_from.is_some() {
            return;
        }
        let previous = self.flight_mode;
        self.set_flight_mode(FlightMode::Cruise);
        self.locked_from = Some(previous);
        self.clear_turn_targets();
    }

    /// Снимает блокировку, восстанавливает прежний режим полёта
    pub fn unlock_controls(&mut self) {
        if let Some(previous) = self.locked_from.take() {
            self.set_flight_mode(previous);
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_from.is_some()
    }

    pub fn turning_limit(&self) -> f32 {
        self.turning_limit
    }

    pub fn speed_target(&self) -> f32 {
        self.speed_target
    }

    pub fn strafe_target(&self) -> f32 {
        self.strafe_target
    }

    pub fn lift_target(&self) -> f32 {
        self.lift_target
    }

    // ------------------------------------------------------------------
    // Повороты (доли turning limit)
    // ------------------------------------------------------------------

    pub fn yaw_left(&mut self, intensity: f32) {
        self.add_turn(intensity, 0.0, 0.0);
    }

    pub fn yaw_right(&mut self, intensity: f32) {
        self.add_turn(-intensity, 0.0, 0.0);
    }

    pub fn pitch_up(&mut self, intensity: f32) {
        self.add_turn(0.0, intensity, 0.0);
    }

    pub fn pitch_down(&mut self, intensity: f32) {
        self.add_turn(0.0, -intensity, 0.0);
    }

    pub fn roll_right(&mut self, intensity: f32) {
        self.add_turn(0.0, 0.0, intensity);
    }

    pub fn roll_left(&mut self, intensity: f32) {
        self.add_turn(0.0, 0.0, -intensity);
    }

    fn add_turn(&mut self, yaw: f32, pitch: f32, roll: f32) {
        if self.locked_from.is_some() {
            return;
        }
        self.yaw_target = (self.yaw_target + yaw).clamp(-1.0, 1.0);
        self.pitch_target = (self.pitch_target + pitch).clamp(-1.0, 1.0);
        self.roll_target = (self.roll_target + roll).clamp(-1.0, 1.0);
    }

    pub fn set_turn_targets(&mut self, yaw: f32, pitch: f32, roll: f32) {
        if self.locked_from.is_some() {
            return;
        }
        self.yaw_target = yaw.clamp(-1.0, 1.0);
        self.pitch_target = pitch.clamp(-1.0, 1.0);
        self.roll_target = roll.clamp(-1.0, 1.0);
    }

    /// Turn targets переживут следующий `control_thrusters`
    pub fn retain_turn_targets(&mut self) {
        self.retain_turn = true;
    }

    fn clear_turn_targets(&mut self) {
        self.yaw_target = 0.0;
        self.pitch_target = 0.0;
        self.roll_target = 0.0;
        self.retain_turn = false;
    }

    /// Поворот к направлению в локальной системе (AI)
    ///
    /// Желаемая угловая скорость — та, с которой ещё можно затормозить
    /// к нулевой ошибке: `ω = sqrt(2α|θ|)`.
    pub fn turn_towards(&mut self, local_direction: Vec3) {
        if self.turning_limit <= 0.0 {
            return;
        }
        let (yaw, pitch) = yaw_and_pitch(local_direction);
        let rate = |angle: f32| {
            let omega = (2.0 * self.angular_acceleration * angle.abs()).sqrt();
            (omega / self.turning_limit).min(1.0).copysign(angle)
        };
        let (yaw_rate, pitch_rate) = (rate(yaw), rate(pitch));
        self.set_turn_targets(yaw_rate, pitch_rate, 0.0);
    }

    // ------------------------------------------------------------------
    // Линейное движение
    // ------------------------------------------------------------------

    pub fn set_speed_target(&mut self, speed: f32) {
        if self.locked_from.is_some() {
            return;
        }
        self.speed_target = if self.flight_mode == FlightMode::Cruise {
            speed.max(0.0)
        } else {
            speed
        };
    }

    pub fn set_strafe_target(&mut self, speed: f32) {
        if self.locked_from.is_none() && self.flight_mode != FlightMode::Cruise {
            self.strafe_target = speed;
        }
    }

    pub fn set_lift_target(&mut self, speed: f32) {
        if self.locked_from.is_none() && self.flight_mode != FlightMode::Cruise {
            self.lift_target = speed;
        }
    }

    /// Полная остановка (все линейные targets = 0)
    pub fn stop(&mut self) {
        if self.locked_from.is_some() {
            return;
        }
        self.speed_target = 0.0;
        self.strafe_target = 0.0;
        self.lift_target = 0.0;
    }

    /// Тяга вперёд/назад. Free → прямой burn, иначе сдвиг speed target
    /// на ускорение за тик.
    pub fn forward(&mut self, intensity: f32) {
        if self.direct_control() {
            self.forward_burn = (self.forward_burn + intensity).clamp(-1.0, 1.0);
        } else {
            let step = intensity.clamp(-1.0, 1.0) * self.acceleration * self.last_dt_s;
            self.set_speed_target(self.speed_target + step);
        }
    }

    pub fn strafe(&mut self, intensity: f32) {
        if self.direct_control() {
            self.strafe_burn = (self.strafe_burn + intensity).clamp(-1.0, 1.0);
        } else {
            let step = intensity.clamp(-1.0, 1.0) * self.acceleration * self.last_dt_s;
            self.set_strafe_target(self.strafe_target + step);
        }
    }

    pub fn lift(&mut self, intensity: f32) {
        if self.direct_control() {
            self.lift_burn = (self.lift_burn + intensity).clamp(-1.0, 1.0);
        } else {
            let step = intensity.clamp(-1.0, 1.0) * self.acceleration * self.last_dt_s;
            self.set_lift_target(self.lift_target + step);
        }
    }

    /// Free mode: переключение на удержание текущей скорости
    pub fn set_hold_speed(&mut self, hold: bool) {
        if hold && !self.hold_speed {
            self.capture_speed = true;
        }
        self.hold_speed = hold;
    }

    pub fn holds_speed(&self) -> bool {
        self.flight_mode != FlightMode::Free || self.hold_speed
    }

    fn direct_control(&self) -> bool {
        self.locked_from.is_none() && !self.holds_speed()
    }

    // ------------------------------------------------------------------
    // Closed loop
    // ------------------------------------------------------------------

    /// Переводит targets в burn levels двигательной установки
    pub fn control_thrusters(
        &mut self,
        propulsion: &mut Propulsion,
        body: &impl RigidBody,
        settings: &CombatSettings,
        dt_ms: f32,
    ) {
        let dt_s = dt_ms / 1000.0;
        if dt_s <= 0.0 {
            return;
        }
        self.last_dt_s = dt_s;

        let alpha = propulsion.max_angular_acceleration(body);
        let acceleration = propulsion.max_acceleration(body);
        self.angular_acceleration = alpha;
        self.acceleration = acceleration;

        let velocity = body.local_velocity();
        let angular_velocity = body.local_angular_velocity();

        if self.capture_speed {
            self.speed_target = velocity.y;
            self.strafe_target = velocity.x;
            self.lift_target = velocity.z;
            self.capture_speed = false;
        }

        let mut limit = alpha * settings.turn_acceleration_duration_s;
        if self.flight_mode == FlightMode::Cruise && velocity.y.abs() > f32::EPSILON {
            // Быстрый поворот на скорости → дрейф, который strafe не погасит
            limit = limit.min(acceleration / velocity.y.abs());
        }
        self.turning_limit = limit;

        let turn_max = propulsion.class.max_turn_burn_level;
        let turn_burn = |target: f32, current: f32| {
            if alpha <= 0.0 {
                return 0.0;
            }
            ((target * limit - current) / (alpha * dt_s) * turn_max).clamp(-turn_max, turn_max)
        };

        let burn = &mut propulsion.burn;
        burn.add_axis(
            ThrusterUse::YawLeft,
            ThrusterUse::YawRight,
            turn_burn(self.yaw_target, angular_velocity.z),
        );
        burn.add_axis(
            ThrusterUse::PitchUp,
            ThrusterUse::PitchDown,
            turn_burn(self.pitch_target, angular_velocity.x),
        );
        burn.add_axis(
            ThrusterUse::RollRight,
            ThrusterUse::RollLeft,
            turn_burn(self.roll_target, angular_velocity.y),
        );

        let move_max = propulsion.class.max_move_burn_level;
        let speed_burn = |target: f32, current: f32| {
            if acceleration <= 0.0 {
                return 0.0;
            }
            ((target - current) / (acceleration * dt_s) * move_max).clamp(-move_max, move_max)
        };

        let (forward, strafe, lift) = match self.flight_mode {
            FlightMode::Free if !self.hold_speed => (
                self.forward_burn * move_max,
                self.strafe_burn * move_max,
                self.lift_burn * move_max,
            ),
            FlightMode::Free | FlightMode::Combat => (
                speed_burn(self.speed_target, velocity.y),
                speed_burn(self.strafe_target, velocity.x),
                speed_burn(self.lift_target, velocity.z),
            ),
            FlightMode::Cruise => {
                self.speed_target = self.speed_target.max(0.0);
                (
                    speed_burn(self.speed_target, velocity.y),
                    speed_burn(0.0, velocity.x),
                    speed_burn(0.0, velocity.z),
                )
            }
        };
        burn.add_axis(ThrusterUse::Forward, ThrusterUse::Reverse, forward);
        burn.add_axis(ThrusterUse::StrafeRight, ThrusterUse::StrafeLeft, strafe);
        burn.add_axis(ThrusterUse::Raise, ThrusterUse::Lower, lift);

        // Transient ввод живёт один тик
        if !self.retain_turn {
            self.yaw_target = 0.0;
            self.pitch_target = 0.0;
            self.roll_target = 0.0;
        }
        self.retain_turn = false;
        self.forward_burn = 0.0;
        self.strafe_burn = 0.0;
        self.lift_burn = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::PropulsionClass;
    use crate::physics::PhysicalObject;

    const DT_MS: f32 = 15.625;

    fn setup() -> (Propulsion, PhysicalObject, CombatSettings) {
        let propulsion = Propulsion::new(
            PropulsionClass {
                thrust: 1000.0,
                angular_thrust: 100.0,
                ..Default::default()
            },
            &[],
        );
        // a = 10 м/с², α = 10 rad/s²
        let body = PhysicalObject::new(100.0, 10.0, Vec::new());
        (propulsion, body, CombatSettings::default())
    }

    #[test]
    fn test_yaw_command_burns_yaw_left() {
        let (mut propulsion, body, settings) = setup();
        let mut computer = ManeuveringComputer::new(FlightMode::Combat);

        computer.yaw_left(1.0);
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);

        assert_eq!(propulsion.burn.get(ThrusterUse::YawLeft), 1.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::YawRight), 0.0);
        // α · 0.2 s = 2 rad/s
        assert!((computer.turning_limit() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_turn_targets_are_transient_unless_retained() {
        let (mut propulsion, body, settings) = setup();
        let mut computer = ManeuveringComputer::new(FlightMode::Combat);

        computer.pitch_up(1.0);
        computer.retain_turn_targets();
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);
        propulsion.reset_burn();

        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);
        assert!(propulsion.burn.get(ThrusterUse::PitchUp) > 0.0);
        propulsion.reset_burn();

        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);
        assert_eq!(propulsion.burn.get(ThrusterUse::PitchUp), 0.0);
    }

    #[test]
    fn test_combat_mode_compensates_drift() {
        let (mut propulsion, mut body, settings) = setup();
        body.velocity = Vec3::new(0.05, 0.0, 0.0);
        let mut computer = ManeuveringComputer::new(FlightMode::Combat);

        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);

        // Δv = 0.05, a·dt = 10 · 0.015625 = 0.15625 → burn 0.32
        let burn = propulsion.burn.get(ThrusterUse::StrafeLeft);
        assert!((burn - 0.32).abs() < 1e-4, "burn = {}", burn);
    }

    #[test]
    fn test_cruise_caps_turning_limit_and_speed() {
        let (mut propulsion, mut body, settings) = setup();
        body.velocity = Vec3::new(0.0, 50.0, 0.0);
        let mut computer = ManeuveringComputer::new(FlightMode::Combat);
        computer.set_strafe_target(5.0);
        computer.set_flight_mode(FlightMode::Cruise);
        computer.set_speed_target(-20.0);

        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);

        // min(α·0.2, a/|v|) = min(2, 0.2)
        assert!((computer.turning_limit() - 0.2).abs() < 1e-5);
        assert_eq!(computer.speed_target(), 0.0);
        assert_eq!(computer.strafe_target(), 0.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::Reverse), 1.0);
    }

    #[test]
    fn test_free_mode_direct_burn_is_transient() {
        let (mut propulsion, body, settings) = setup();
        let mut computer = ManeuveringComputer::new(FlightMode::Free);

        computer.forward(0.5);
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);
        assert_eq!(propulsion.burn.get(ThrusterUse::Forward), 0.5);

        propulsion.reset_burn();
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);
        assert_eq!(propulsion.burn.get(ThrusterUse::Forward), 0.0);
    }

    #[test]
    fn test_hold_speed_captures_current_velocity() {
        let (mut propulsion, mut body, settings) = setup();
        body.velocity = Vec3::new(0.0, 30.0, 0.0);
        let mut computer = ManeuveringComputer::new(FlightMode::Free);

        computer.set_hold_speed(true);
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);

        assert_eq!(computer.speed_target(), 30.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::Forward), 0.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::Reverse), 0.0);
    }

    #[test]
    fn test_control_lock_restores_mode() {
        let mut computer = ManeuveringComputer::new(FlightMode::Free);
        computer.lock_controls();

        assert!(computer.is_locked());
        assert_eq!(computer.flight_mode(), FlightMode::Cruise);

        computer.set_flight_mode(FlightMode::Combat);
        computer.yaw_left(1.0);
        assert_eq!(computer.flight_mode(), FlightMode::Cruise);

        computer.unlock_controls();
        assert!(!computer.is_locked());
        assert_eq!(computer.flight_mode(), FlightMode::Free);
    }

    #[test]
    fn test_turn_towards_target_on_left() {
        let (mut propulsion, body, settings) = setup();
        let mut computer = ManeuveringComputer::new(FlightMode::Combat);
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);
        propulsion.reset_burn();

        computer.turn_towards(Vec3::new(-1.0, 1.0, 0.0));
        computer.control_thrusters(&mut propulsion, &body, &settings, DT_MS);

        assert!(propulsion.burn.get(ThrusterUse::YawLeft) > 0.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::PitchUp), 0.0);
        assert_eq!(propulsion.burn.get(ThrusterUse::PitchDown), 0.0);
    }
}
