//! Orbital math core: element sets, propagation, frame conversions and
//! day/night classification.

mod elements;
mod frames;
mod propagator;
mod sunlight;
mod vec3d;

pub use elements::{ElementSetError, OrbitalElementSet, checksum};
pub use frames::{
    LookAngle, ecef_to_eci, ecef_to_geodetic, eci_to_ecef, eci_to_geodetic, geodetic_to_ecef,
    gmst, great_circle_distance, initial_bearing, look_angles,
};
pub use propagator::{KeplerJ2, PropagationStrategy, nominal_leo, propagate, solve_kepler};
pub(crate) use frames::wrap_longitude;
pub use sunlight::{Sunlight, classify_sunlight, solar_declination};
pub use vec3d::{GeodeticFix, StateVector, Vec3D};

/// Earth gravitational parameter in km³/s².
pub const EARTH_MU_KM3_S2: f64 = 398_600.4418;
/// Equatorial radius of the reference ellipsoid in km (WGS-72, matching
/// the element-set ecosystem).
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.135;
/// Flattening of the reference ellipsoid.
pub const EARTH_FLATTENING: f64 = 1.0 / 298.26;
/// Second zonal harmonic of the geopotential.
pub const EARTH_J2: f64 = 1.082_616e-3;
/// Earth rotation rate in rad/s (sidereal).
pub const EARTH_ROTATION_RATE_RAD_S: f64 = 7.292_115_9e-5;
