//! Геометрия и guidance math
//!
//! Локальная система координат корабля/ракеты/оружия:
//! - +Y — вперёд (nose)
//! - +X — вправо
//! - +Z — вверх
//!
//! Углы:
//! - yaw: поворот вокруг +Z, положительный = влево
//! - pitch: поворот вокруг +X, положительный = вверх
//! - roll: поворот вокруг +Y, положительный = вправо
//!
//! Intercept (hit time) решается как наименьший положительный корень полинома
//! до 4-й степени. Вырожденные случаи возвращают 0, никогда NaN.

use bevy::math::Vec3;
use std::f32::consts::{PI, TAU};

pub const FORWARD: Vec3 = Vec3::Y;
pub const RIGHT: Vec3 = Vec3::X;
pub const UP: Vec3 = Vec3::Z;

/// Yaw и pitch направления, заданного в локальной системе
///
/// Порядок: сначала yaw вокруг Z, затем pitch вокруг повёрнутого X.
pub fn yaw_and_pitch(direction: Vec3) -> (f32, f32) {
    let yaw = (-direction.x).atan2(direction.y);
    let pitch = direction
        .z
        .atan2((direction.x * direction.x + direction.y * direction.y).sqrt());
    (yaw, pitch)
}

/// Roll и yaw направления (для roll-yaw турелей)
///
/// Roll кладёт цель в плоскость XY, затем yaw доворачивает к ней.
/// Yaw всегда ≤ 0 — цель после roll оказывается справа.
pub fn roll_and_yaw(direction: Vec3) -> (f32, f32) {
    let roll = (-direction.z).atan2(direction.x);
    let lateral = (direction.x * direction.x + direction.z * direction.z).sqrt();
    let yaw = (-lateral).atan2(direction.y);
    (roll, yaw)
}

/// Приводит угол к (-π, π]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Угол между forward и direction (0 для нулевого direction)
pub fn bearing(forward: Vec3, direction: Vec3) -> f32 {
    if direction.length_squared() <= f32::EPSILON || forward.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    forward.angle_between(direction)
}

/// Время перехвата цели преследователем
///
/// Преследователь стартует из начала координат, может лететь в любом
/// направлении с начальной скоростью `speed` и ускорением `acceleration`.
/// Цель — в `relative_position`, движется с `relative_velocity`
/// (обе величины относительно преследователя).
///
/// Решаем `(s·t + ½a·t²)² = |p + v·t|²`:
/// `¼a²t⁴ + a·s·t³ + (s² − |v|²)t² − 2(p·v)t − |p|² = 0`
///
/// Возвращает наименьший положительный корень или 0, если перехват невозможен.
pub fn hit_time(
    relative_position: Vec3,
    relative_velocity: Vec3,
    speed: f32,
    acceleration: f32,
) -> f32 {
    let p = relative_position.as_dvec3();
    let v = relative_velocity.as_dvec3();
    let s = speed.max(0.0) as f64;
    let a = acceleration.max(0.0) as f64;

    let distance_squared = p.length_squared();
    if distance_squared <= f64::EPSILON {
        return 0.0;
    }

    let coefficients = [
        -distance_squared,
        -2.0 * p.dot(v),
        s * s - v.length_squared(),
        a * s,
        0.25 * a * a,
    ];

    let Some(bound) = root_bound(&coefficients) else {
        return 0.0;
    };

    let mut roots = [0.0; MAX_DEGREE];
    let count = real_roots(&coefficients, 0.0, bound, &mut roots);
    roots[..count]
        .iter()
        .copied()
        .find(|&t| t > 1e-9 && t.is_finite())
        .map_or(0.0, |t| t as f32)
}

// ============================================================================
// Polynomial roots (degree ≤ 4, ascending coefficients)
// ============================================================================

const MAX_DEGREE: usize = 4;
const BISECTION_STEPS: usize = 96;

fn degree_of(coefficients: &[f64]) -> usize {
    let scale = coefficients.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return 0;
    }
    let threshold = scale * 1e-12;
    coefficients
        .iter()
        .rposition(|c| c.abs() > threshold)
        .unwrap_or(0)
}

fn evaluate(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * t + c)
}

/// Cauchy bound: все действительные корни лежат в [-bound, bound]
fn root_bound(coefficients: &[f64]) -> Option<f64> {
    let degree = degree_of(coefficients);
    if degree == 0 {
        return None;
    }
    let lead = coefficients[degree].abs();
    let max_ratio = coefficients[..degree]
        .iter()
        .fold(0.0f64, |m, c| m.max(c.abs() / lead));
    Some(1.0 + max_ratio)
}

/// Действительные корни на [lo, hi] в порядке возрастания
///
/// Корни производной делят отрезок на монотонные интервалы,
/// на каждом интервале со сменой знака — бисекция.
fn real_roots(coefficients: &[f64], lo: f64, hi: f64, out: &mut [f64; MAX_DEGREE]) -> usize {
    let degree = degree_of(coefficients);
    let coefficients = &coefficients[..=degree];

    match degree {
        0 => 0,
        1 => {
            let t = -coefficients[0] / coefficients[1];
            if t >= lo && t <= hi {
                out[0] = t;
                1
            } else {
                0
            }
        }
        _ => {
            let mut derivative = [0.0; MAX_DEGREE];
            for i in 1..=degree {
                derivative[i - 1] = coefficients[i] * i as f64;
            }
            let mut critical = [0.0; MAX_DEGREE];
            let critical_count = real_roots(&derivative[..degree], lo, hi, &mut critical);

            let mut count = 0;
            let mut push = |t: f64, count: &mut usize| {
                if *count < MAX_DEGREE && (*count == 0 || out[*count - 1] < t) {
                    out[*count] = t;
                    *count += 1;
                }
            };

            let mut start = lo;
            let mut start_value = evaluate(coefficients, lo);
            for i in 0..=critical_count {
                let end = if i < critical_count { critical[i] } else { hi };
                let end_value = evaluate(coefficients, end);

                if start_value == 0.0 {
                    push(start, &mut count);
                } else if end_value != 0.0 && (start_value < 0.0) != (end_value < 0.0) {
                    push(bisect(coefficients, start, end, start_value), &mut count);
                }

                start = end;
                start_value = end_value;
            }
            if start_value == 0.0 {
                push(start, &mut count);
            }
            count
        }
    }
}

fn bisect(coefficients: &[f64], mut lo: f64, mut hi: f64, lo_value: f64) -> f64 {
    let lo_negative = lo_value < 0.0;
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        let value = evaluate(coefficients, mid);
        if value == 0.0 {
            return mid;
        }
        if (value < 0.0) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
