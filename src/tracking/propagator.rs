use crate::tracking::{
    EARTH_EQUATORIAL_RADIUS_KM, EARTH_J2, EARTH_MU_KM3_S2, OrbitalElementSet, StateVector, Vec3D,
};
use chrono::{DateTime, Utc};
use std::f64::consts::PI;

/// Newton-Raphson convergence tolerance for Kepler's equation.
const KEPLER_TOLERANCE: f64 = 1e-10;
/// Iteration cap for the Kepler solver.
const KEPLER_MAX_ITERATIONS: usize = 50;
/// Derivative magnitude below which the Newton step is abandoned.
const KEPLER_MIN_DERIVATIVE: f64 = 1e-12;

/// Propagation injected into the resolution engine as behavior, so the
/// algorithm can be upgraded without touching the tier logic.
pub trait PropagationStrategy: Send + Sync {
    /// Advances an element set to `instant` and returns the inertial state.
    fn state_at(&self, elements: &OrbitalElementSet, instant: DateTime<Utc>) -> StateVector;
}

/// The canonical propagator: two-body Kepler motion with first-order
/// secular J2 drift on RAAN, argument of perigee and mean anomaly.
///
/// Accuracy is a few kilometers over days for low Earth orbits, which is
/// what the wallpaper overlay needs. It is deliberately not an analytical
/// perturbation theory of SGP4 class.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeplerJ2;

impl PropagationStrategy for KeplerJ2 {
    fn state_at(&self, elements: &OrbitalElementSet, instant: DateTime<Utc>) -> StateVector {
        propagate(elements, instant)
    }
}

/// Advances `elements` to `instant`, producing an inertial state vector.
///
/// Degenerate inputs (non-positive mean motion, eccentricity outside
/// [0, 1), non-finite fields) yield [`nominal_leo`] instead of propagating
/// non-finite values.
///
/// # Arguments
/// * `elements` - The validated element set.
/// * `instant` - The target instant.
///
/// # Returns
/// The inertial position (km) and velocity (km/s) at `instant`.
pub fn propagate(elements: &OrbitalElementSet, instant: DateTime<Utc>) -> StateVector {
    // mean motion is stored in rad/min; the math below runs in seconds
    let n = elements.mean_motion() / 60.0;
    let e = elements.eccentricity();
    if !(n > 0.0) || !(0.0..1.0).contains(&e) || !inputs_finite(elements) {
        return nominal_leo();
    }

    // Kepler's third law
    let a = (EARTH_MU_KM3_S2 / (n * n)).cbrt();
    let dt = (instant - elements.epoch()).num_milliseconds() as f64 / 1000.0;

    // first-order secular J2 drift rates
    let p = a * (1.0 - e * e);
    let cos_i = elements.inclination().cos();
    let j2_factor = n * EARTH_J2 * (EARTH_EQUATORIAL_RADIUS_KM / p).powi(2);
    let raan_rate = -1.5 * j2_factor * cos_i;
    let argp_rate = 0.75 * j2_factor * (5.0 * cos_i * cos_i - 1.0);
    let mean_rate =
        n + 0.75 * j2_factor * (1.0 - e * e).sqrt() * (3.0 * cos_i * cos_i - 1.0);

    let raan = elements.raan() + raan_rate * dt;
    let argp = elements.argument_of_perigee() + argp_rate * dt;
    let mean_anomaly = normalize_angle(elements.mean_anomaly() + mean_rate * dt);

    let eccentric_anomaly = solve_kepler(mean_anomaly, e);
    let (sin_e, cos_e) = eccentric_anomaly.sin_cos();
    let true_anomaly = ((1.0 - e * e).sqrt() * sin_e).atan2(cos_e - e);
    let radius = a * (1.0 - e * cos_e);

    // perifocal position/velocity
    let h = (EARTH_MU_KM3_S2 * p).sqrt();
    let (sin_nu, cos_nu) = true_anomaly.sin_cos();
    let pos_pqw = Vec3D::new(radius * cos_nu, radius * sin_nu, 0.0);
    let vel_pqw =
        Vec3D::new(-EARTH_MU_KM3_S2 / h * sin_nu, EARTH_MU_KM3_S2 / h * (e + cos_nu), 0.0);

    let position = perifocal_to_inertial(pos_pqw, raan, elements.inclination(), argp);
    let velocity = perifocal_to_inertial(vel_pqw, raan, elements.inclination(), argp);

    let state = StateVector::new(position, velocity);
    if state.is_finite() { state } else { nominal_leo() }
}

/// Solves Kepler's equation M = E - e·sin(E) for the eccentric anomaly by
/// Newton-Raphson, seeded with E₀ = M. Terminates early if the derivative
/// collapses toward zero.
///
/// # Arguments
/// * `mean_anomaly` - Mean anomaly in radians.
/// * `eccentricity` - Eccentricity in [0, 1).
///
/// # Returns
/// The eccentric anomaly in radians.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut e_anom = mean_anomaly;
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = e_anom - eccentricity * e_anom.sin() - mean_anomaly;
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        if f_prime.abs() < KEPLER_MIN_DERIVATIVE {
            break;
        }
        let step = f / f_prime;
        e_anom -= step;
        if step.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    e_anom
}

/// The sentinel state for degenerate inputs: a circular equatorial orbit
/// at roughly ISS altitude, so downstream conversions stay finite.
pub fn nominal_leo() -> StateVector {
    let radius = EARTH_EQUATORIAL_RADIUS_KM + 420.0;
    let speed = (EARTH_MU_KM3_S2 / radius).sqrt();
    StateVector::new(Vec3D::new(radius, 0.0, 0.0), Vec3D::new(0.0, speed, 0.0))
}

/// Rotates a perifocal vector into the inertial frame via
/// R₃(-Ω) R₁(-i) R₃(-ω).
fn perifocal_to_inertial(v: Vec3D<f64>, raan: f64, inclination: f64, argp: f64) -> Vec3D<f64> {
    let (sin_o, cos_o) = raan.sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();
    let (sin_w, cos_w) = argp.sin_cos();

    let r11 = cos_o * cos_w - sin_o * sin_w * cos_i;
    let r12 = -cos_o * sin_w - sin_o * cos_w * cos_i;
    let r13 = sin_o * sin_i;
    let r21 = sin_o * cos_w + cos_o * sin_w * cos_i;
    let r22 = -sin_o * sin_w + cos_o * cos_w * cos_i;
    let r23 = -cos_o * sin_i;
    let r31 = sin_w * sin_i;
    let r32 = cos_w * sin_i;
    let r33 = cos_i;

    Vec3D::new(
        r11 * v.x() + r12 * v.y() + r13 * v.z(),
        r21 * v.x() + r22 * v.y() + r23 * v.z(),
        r31 * v.x() + r32 * v.y() + r33 * v.z(),
    )
}

/// Normalizes an angle into [0, 2π).
pub(crate) fn normalize_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let wrapped = angle % two_pi;
    if wrapped < 0.0 { wrapped + two_pi } else { wrapped }
}

fn inputs_finite(elements: &OrbitalElementSet) -> bool {
    elements.inclination().is_finite()
        && elements.raan().is_finite()
        && elements.argument_of_perigee().is_finite()
        && elements.mean_anomaly().is_finite()
        && elements.eccentricity().is_finite()
        && elements.mean_motion().is_finite()
}
