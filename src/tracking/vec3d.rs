use crate::tracking::EARTH_EQUATORIAL_RADIUS_KM;
use chrono::{DateTime, Utc};
use num_traits::{NumAssignOps, NumCast, real::Real};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 3D vector generic over any real numeric type.
///
/// Represents a point or direction in a Cartesian frame and provides the
/// usual operations: addition, scaling, dot product, normalization and
/// magnitude.
///
/// # Type Parameters
/// * `T` - The available functionality depends on the traits implemented by `T`.
#[derive(Debug, PartialEq, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Vec3D<T> {
    /// The x-component of the vector.
    x: T,
    /// The y-component of the vector.
    y: T,
    /// The z-component of the vector.
    z: T,
}

impl<T: Copy> Vec3D<T> {
    /// Creates a new vector with the given components.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - The components of the vector.
    ///
    /// # Returns
    /// A new `Vec3D` object.
    pub const fn new(x: T, y: T, z: T) -> Self { Self { x, y, z } }

    /// Returns the x-component of the vector.
    pub const fn x(&self) -> T { self.x }

    /// Returns the y-component of the vector.
    pub const fn y(&self) -> T { self.y }

    /// Returns the z-component of the vector.
    pub const fn z(&self) -> T { self.z }
}

impl<T> Vec3D<T>
where
    T: Real + NumCast + NumAssignOps,
{
    /// Computes the magnitude (euclidean norm) of the vector.
    ///
    /// # Returns
    /// The magnitude of the vector as a scalar of type `T`.
    pub fn abs(&self) -> T { (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt() }

    /// Computes the dot product with another vector.
    ///
    /// # Arguments
    /// * `other` - The other vector.
    ///
    /// # Returns
    /// The scalar dot product.
    pub fn dot(&self, other: &Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Creates a vector pointing from `self` to `other`.
    ///
    /// # Arguments
    /// * `other` - The target vector.
    ///
    /// # Returns
    /// A new vector representing the direction from `self` to `other`.
    pub fn to(&self, other: &Self) -> Self {
        Self::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }

    /// Normalizes the vector to magnitude 1.
    /// If the magnitude is zero, the original vector is returned unmodified.
    ///
    /// # Returns
    /// A normalized vector.
    pub fn normalize(self) -> Self {
        let magnitude = self.abs();
        if magnitude.is_zero() {
            self
        } else {
            Self::new(self.x / magnitude, self.y / magnitude, self.z / magnitude)
        }
    }

}

impl Vec3D<f64> {
    /// Returns `true` if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl<T: Add<Output = T> + Copy> Add for Vec3D<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Sub<Output = T> + Copy> Sub for Vec3D<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Mul<Output = T> + Copy> Mul<T> for Vec3D<T> {
    type Output = Self;
    fn mul(self, scalar: T) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl<T: Div<Output = T> + Copy> Div<T> for Vec3D<T> {
    type Output = Self;
    fn div(self, scalar: T) -> Self {
        Self::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl<T: Neg<Output = T> + Copy> Neg for Vec3D<T> {
    type Output = Self;
    fn neg(self) -> Self { Self::new(-self.x, -self.y, -self.z) }
}

impl<T: Copy> From<(T, T, T)> for Vec3D<T> {
    fn from(tuple: (T, T, T)) -> Self { Self::new(tuple.0, tuple.1, tuple.2) }
}

impl<T: Display> Display for Vec3D<T> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// An inertial state vector: position in km and velocity in km/s, both in
/// an Earth-centered non-rotating frame.
///
/// Produced fresh on every propagation call and never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    /// Position components in km.
    position: Vec3D<f64>,
    /// Velocity components in km/s.
    velocity: Vec3D<f64>,
}

impl StateVector {
    /// Creates a new state vector from position and velocity.
    pub const fn new(position: Vec3D<f64>, velocity: Vec3D<f64>) -> Self {
        Self { position, velocity }
    }

    /// Returns the position vector in km.
    pub const fn position(&self) -> Vec3D<f64> { self.position }

    /// Returns the velocity vector in km/s.
    pub const fn velocity(&self) -> Vec3D<f64> { self.velocity }

    /// Returns the geocentric radius in km.
    pub fn radius(&self) -> f64 { self.position.abs() }

    /// Returns the speed in km/s.
    pub fn speed(&self) -> f64 { self.velocity.abs() }

    /// Returns the altitude above the equatorial radius in km.
    ///
    /// This is a spherical shortcut, only used for plausibility checks.
    /// The geodetic altitude comes from the frame conversion.
    pub fn altitude(&self) -> f64 { self.radius() - EARTH_EQUATORIAL_RADIUS_KM }

    /// Returns `true` if all six components are finite.
    pub fn is_finite(&self) -> bool { self.position.is_finite() && self.velocity.is_finite() }
}

/// A geodetic fix: latitude/longitude in degrees, altitude in km above the
/// reference ellipsoid, and the instant the fix is valid for.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeodeticFix {
    /// Geodetic latitude in degrees, positive north.
    latitude: f64,
    /// Longitude in degrees, positive east, wrapped into [-180, 180].
    longitude: f64,
    /// Altitude above the reference ellipsoid in km.
    altitude: f64,
    /// The instant this fix is valid for.
    timestamp: DateTime<Utc>,
}

impl GeodeticFix {
    /// Creates a new geodetic fix.
    ///
    /// # Arguments
    /// * `latitude` - Geodetic latitude in degrees.
    /// * `longitude` - Longitude in degrees.
    /// * `altitude` - Altitude above the ellipsoid in km.
    /// * `timestamp` - The instant the fix is valid for.
    pub const fn new(
        latitude: f64,
        longitude: f64,
        altitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { latitude, longitude, altitude, timestamp }
    }

    /// Returns the geodetic latitude in degrees.
    pub const fn latitude(&self) -> f64 { self.latitude }

    /// Returns the longitude in degrees.
    pub const fn longitude(&self) -> f64 { self.longitude }

    /// Returns the altitude above the ellipsoid in km.
    pub const fn altitude(&self) -> f64 { self.altitude }

    /// Returns the instant the fix is valid for.
    pub const fn timestamp(&self) -> DateTime<Utc> { self.timestamp }

    /// Returns `true` if latitude, longitude and altitude are finite and
    /// the latitude is inside the physical [-90, 90] range.
    pub fn is_plausible(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && self.latitude.abs() <= 90.0
    }
}

impl Display for GeodeticFix {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "lat {:.4}°, lon {:.4}°, alt {:.1} km @ {}",
            self.latitude,
            self.longitude,
            self.altitude,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}
