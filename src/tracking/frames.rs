use crate::tracking::propagator::normalize_angle;
use crate::tracking::{
    EARTH_EQUATORIAL_RADIUS_KM, EARTH_FLATTENING, GeodeticFix, Vec3D,
};
use chrono::{DateTime, Utc};

/// Julian date of the J2000 reference epoch.
const J2000_JD: f64 = 2_451_545.0;
/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Convergence tolerance for the geodetic latitude iteration, radians.
const GEODETIC_TOLERANCE: f64 = 1e-12;
/// Iteration cap for the geodetic conversion.
const GEODETIC_MAX_ITERATIONS: usize = 20;
/// Below this |cos(latitude)| the altitude switches to its polar form.
const POLAR_COS_THRESHOLD: f64 = 1e-10;
/// Mean Earth radius used by the great-circle formulas, km.
const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

/// Topocentric look angles from an observer to a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngle {
    /// Azimuth in degrees, clockwise from north.
    pub azimuth: f64,
    /// Elevation above the local horizon in degrees.
    pub elevation: f64,
    /// Slant range in km.
    pub range: f64,
}

/// Computes the Greenwich mean sidereal time at `instant`, i.e. the
/// rotation angle between the inertial and the body-fixed frame.
///
/// Uses the IAU-1982 polynomial in Julian centuries since J2000.
///
/// # Arguments
/// * `instant` - The UTC instant.
///
/// # Returns
/// The sidereal angle in radians, normalized into [0, 2π).
pub fn gmst(instant: DateTime<Utc>) -> f64 {
    let jd = UNIX_EPOCH_JD + instant.timestamp_millis() as f64 / 86_400_000.0;
    let d = jd - J2000_JD;
    let t = d / 36_525.0;
    let degrees = 280.460_618_37
        + 360.985_647_366_29 * d
        + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    normalize_angle(degrees.to_radians())
}

/// Rotates an inertial position about the polar axis into the body-fixed
/// frame.
///
/// # Arguments
/// * `position` - Inertial position in km.
/// * `sidereal` - The sidereal angle in radians (see [`gmst`]).
pub fn eci_to_ecef(position: Vec3D<f64>, sidereal: f64) -> Vec3D<f64> {
    let (sin_t, cos_t) = sidereal.sin_cos();
    Vec3D::new(
        position.x() * cos_t + position.y() * sin_t,
        -position.x() * sin_t + position.y() * cos_t,
        position.z(),
    )
}

/// The inverse rotation of [`eci_to_ecef`].
pub fn ecef_to_eci(position: Vec3D<f64>, sidereal: f64) -> Vec3D<f64> {
    let (sin_t, cos_t) = sidereal.sin_cos();
    Vec3D::new(
        position.x() * cos_t - position.y() * sin_t,
        position.x() * sin_t + position.y() * cos_t,
        position.z(),
    )
}

/// Converts a body-fixed Cartesian position to geodetic coordinates on the
/// reference ellipsoid.
///
/// Latitude is seeded from the spherical approximation, then refined by
/// recomputing the prime-vertical radius of curvature until consecutive
/// estimates agree to within 1e-12 rad (at most 20 iterations).
///
/// # Arguments
/// * `position` - Body-fixed position in km.
/// * `instant` - The instant stamped onto the resulting fix.
///
/// # Returns
/// The geodetic fix (degrees, km).
pub fn ecef_to_geodetic(position: Vec3D<f64>, instant: DateTime<Utc>) -> GeodeticFix {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

    let longitude = position.y().atan2(position.x());
    let p = (position.x() * position.x() + position.y() * position.y()).sqrt();

    let mut latitude = position.z().atan2(p);
    let mut altitude = 0.0;
    for _ in 0..GEODETIC_MAX_ITERATIONS {
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        altitude = if cos_lat.abs() > POLAR_COS_THRESHOLD {
            p / cos_lat - n
        } else {
            // at the poles p vanishes; measure along the polar axis
            position.z() / sin_lat - n * (1.0 - e2)
        };
        let next = position.z().atan2(p * (1.0 - e2 * n / (n + altitude)));
        let converged = (next - latitude).abs() < GEODETIC_TOLERANCE;
        latitude = next;
        if converged {
            break;
        }
    }

    GeodeticFix::new(
        latitude.to_degrees(),
        wrap_longitude(longitude.to_degrees()),
        altitude,
        instant,
    )
}

/// Converts geodetic coordinates to a body-fixed Cartesian position.
///
/// # Arguments
/// * `latitude` - Geodetic latitude in degrees.
/// * `longitude` - Longitude in degrees.
/// * `altitude` - Altitude above the ellipsoid in km.
pub fn geodetic_to_ecef(latitude: f64, longitude: f64, altitude: f64) -> Vec3D<f64> {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);
    let (sin_lat, cos_lat) = latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = longitude.to_radians().sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    Vec3D::new(
        (n + altitude) * cos_lat * cos_lon,
        (n + altitude) * cos_lat * sin_lon,
        (n * (1.0 - e2) + altitude) * sin_lat,
    )
}

/// The composition the resolution engine uses: inertial position at an
/// instant straight to a geodetic fix.
pub fn eci_to_geodetic(position: Vec3D<f64>, instant: DateTime<Utc>) -> GeodeticFix {
    ecef_to_geodetic(eci_to_ecef(position, gmst(instant)), instant)
}

/// Computes the great-circle distance between two geodetic points with the
/// haversine formula on the mean sphere.
///
/// # Arguments
/// * `a`, `b` - The two fixes (altitudes are ignored).
///
/// # Returns
/// The surface distance in km.
pub fn great_circle_distance(a: &GeodeticFix, b: &GeodeticFix) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_KM * h.sqrt().asin()
}

/// Computes the initial bearing from `a` towards `b`.
///
/// # Returns
/// The bearing in degrees, clockwise from north, in [0, 360).
pub fn initial_bearing(a: &GeodeticFix, b: &GeodeticFix) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();
    let y = d_lon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lon.cos();
    normalize_angle(y.atan2(x)).to_degrees()
}

/// Computes topocentric look angles from an observer to a target given in
/// the inertial frame, by rotating the body-fixed range vector into the
/// observer's local East-North-Up frame.
///
/// # Arguments
/// * `observer` - The observer's geodetic position.
/// * `target_eci` - The target's inertial position in km.
/// * `instant` - The shared instant of both positions.
pub fn look_angles(
    observer: &GeodeticFix,
    target_eci: Vec3D<f64>,
    instant: DateTime<Utc>,
) -> LookAngle {
    let observer_ecef =
        geodetic_to_ecef(observer.latitude(), observer.longitude(), observer.altitude());
    let target_ecef = eci_to_ecef(target_eci, gmst(instant));
    let range_vec = observer_ecef.to(&target_ecef);

    let (sin_lat, cos_lat) = observer.latitude().to_radians().sin_cos();
    let (sin_lon, cos_lon) = observer.longitude().to_radians().sin_cos();

    let east = -sin_lon * range_vec.x() + cos_lon * range_vec.y();
    let north = -sin_lat * cos_lon * range_vec.x() - sin_lat * sin_lon * range_vec.y()
        + cos_lat * range_vec.z();
    let up = cos_lat * cos_lon * range_vec.x() + cos_lat * sin_lon * range_vec.y()
        + sin_lat * range_vec.z();

    let range = range_vec.abs();
    LookAngle {
        azimuth: normalize_angle(east.atan2(north)).to_degrees(),
        elevation: (up / range).asin().to_degrees(),
        range,
    }
}

/// Wraps a longitude in degrees into [-180, 180].
pub(crate) fn wrap_longitude(longitude: f64) -> f64 {
    let mut lon = (longitude + 180.0) % 360.0;
    if lon < 0.0 {
        lon += 360.0;
    }
    lon - 180.0
}
