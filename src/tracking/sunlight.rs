use chrono::{DateTime, Datelike, Timelike, Utc};

/// Whether a ground point is on the sunlit or the night side of the
/// terminator. Consumed by the rendering layer for the day/night overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sunlight {
    Day,
    Night,
}

/// Classifies a ground point as day or night against the solar terminator.
///
/// The terminator latitude at the point's solar hour angle H is
/// `atan(-cos H / tan δ)` with δ the solar declination; the point is sunlit
/// when it lies on the subsolar side of that latitude. The side flips with
/// the declination's hemisphere.
///
/// # Arguments
/// * `latitude` - Geodetic latitude in degrees.
/// * `longitude` - Longitude in degrees, positive east.
/// * `reference_time` - The UTC instant to classify at.
/// * `solar_declination` - Solar declination in degrees (see
///   [`solar_declination`] for a built-in approximation).
///
/// # Returns
/// [`Sunlight::Day`] or [`Sunlight::Night`].
pub fn classify_sunlight(
    latitude: f64,
    longitude: f64,
    reference_time: DateTime<Utc>,
    solar_declination: f64,
) -> Sunlight {
    let hour_angle = solar_hour_angle(longitude, reference_time).to_radians();
    let declination = solar_declination.to_radians();

    if declination.abs() < 1e-9 {
        // equinox: the terminator runs pole to pole, daylight is simply
        // the half with the sun above the horizon
        return if hour_angle.cos() > 0.0 { Sunlight::Day } else { Sunlight::Night };
    }

    let terminator_latitude = (-hour_angle.cos() / declination.tan()).atan().to_degrees();
    let day = if declination > 0.0 {
        latitude >= terminator_latitude
    } else {
        latitude <= terminator_latitude
    };
    if day { Sunlight::Day } else { Sunlight::Night }
}

/// A low-precision solar declination so callers without an almanac can
/// feed [`classify_sunlight`]. Accurate to a fraction of a degree, which
/// is far below the visual width of the terminator blur.
///
/// # Arguments
/// * `instant` - The UTC instant.
///
/// # Returns
/// The solar declination in degrees.
pub fn solar_declination(instant: DateTime<Utc>) -> f64 {
    let day_of_year = f64::from(instant.ordinal());
    let fraction = 2.0 * std::f64::consts::PI / 365.0 * (day_of_year + 10.0);
    -23.44 * fraction.cos()
}

/// Computes the solar hour angle in degrees: 0 at local solar noon,
/// negative in the morning, positive in the afternoon.
fn solar_hour_angle(longitude: f64, instant: DateTime<Utc>) -> f64 {
    let utc_hours = f64::from(instant.hour())
        + f64::from(instant.minute()) / 60.0
        + f64::from(instant.second()) / 3600.0;
    (utc_hours - 12.0) * 15.0 + longitude
}
