use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::f64::consts::PI;
use strum_macros::Display;

/// Length of each data line in the fixed-column element format.
const LINE_LEN: usize = 69;
/// Two-digit epoch years below this pivot are 20xx, at or above are 19xx.
const EPOCH_YEAR_PIVOT: u32 = 57;

/// Classified rejection reasons for raw element text.
///
/// Parsing never panics: any malformed input maps onto one of these
/// variants so the resolution engine can fall through to its next source.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ElementSetError {
    /// Input was not 2 or 3 non-empty lines.
    BadLineCount,
    /// A data line was not exactly 69 ASCII characters long.
    BadLineLength,
    /// A data line did not start with its `1 `/`2 ` marker, or the two
    /// lines named different catalog numbers.
    BadLineMarker,
    /// The per-line checksum did not match the trailing digit.
    BadChecksum,
    /// A fixed-column field did not parse as a number.
    UnparseableField(&'static str),
    /// A field parsed but violated its physical range.
    OutOfRange(&'static str),
}

impl std::error::Error for ElementSetError {}

/// Computes the checksum of a fixed-column element line: the sum of all
/// digit characters plus 1 for each `-` character, modulo 10. The trailing
/// (69th) character is excluded since it carries the expected value.
///
/// # Arguments
/// * `line` - The element line, at least 68 characters.
///
/// # Returns
/// The checksum in `0..=9`.
pub fn checksum(line: &str) -> u32 {
    line.chars()
        .take(LINE_LEN - 1)
        .map(|c| match c {
            '-' => 1,
            _ => c.to_digit(10).unwrap_or(0),
        })
        .sum::<u32>()
        % 10
}

/// A validated, immutable orbital element set.
///
/// Constructed only through [`OrbitalElementSet::parse`], which enforces
/// line structure, checksums and field ranges. A refresh produces a brand
/// new instance that replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElementSet {
    /// Satellite catalog number.
    catalog_number: u32,
    /// Object name from the optional leading line, if present.
    name: Option<String>,
    /// Epoch instant of the element set.
    epoch: DateTime<Utc>,
    /// Inclination in radians.
    inclination: f64,
    /// Right ascension of the ascending node in radians.
    raan: f64,
    /// Argument of perigee in radians.
    argument_of_perigee: f64,
    /// Mean anomaly at epoch in radians.
    mean_anomaly: f64,
    /// Eccentricity, in [0, 1).
    eccentricity: f64,
    /// Mean motion in radians per minute, > 0.
    mean_motion: f64,
    /// B* drag coefficient in the format's native units.
    bstar: f64,
    /// Element set number.
    element_set_number: u32,
    /// Revolution number at epoch.
    revolution_number: u32,
}

impl OrbitalElementSet {
    /// Parses and validates raw fixed-column element text.
    ///
    /// Accepts two data lines with an optional name line in front. Every
    /// structural or numeric defect is returned as a classified
    /// [`ElementSetError`]; this function never panics on bad input.
    ///
    /// # Arguments
    /// * `raw` - The raw element text (2 or 3 lines).
    ///
    /// # Returns
    /// A validated `OrbitalElementSet`, or the rejection reason.
    pub fn parse(raw: &str) -> Result<Self, ElementSetError> {
        let lines: Vec<&str> =
            raw.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();
        let (name, line1, line2) = match lines.as_slice() {
            [l1, l2] => (None, *l1, *l2),
            [n, l1, l2] => (Some(n.trim().to_string()), *l1, *l2),
            _ => return Err(ElementSetError::BadLineCount),
        };

        // the format is ASCII-only; enforcing that here keeps the
        // byte-indexed column slices below from landing inside a
        // multibyte character
        for line in [line1, line2] {
            if line.len() != LINE_LEN || !line.is_ascii() {
                return Err(ElementSetError::BadLineLength);
            }
        }
        if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
            return Err(ElementSetError::BadLineMarker);
        }
        for line in [line1, line2] {
            let expected = line
                .chars()
                .nth(LINE_LEN - 1)
                .and_then(|c| c.to_digit(10))
                .ok_or(ElementSetError::BadChecksum)?;
            if checksum(line) != expected {
                return Err(ElementSetError::BadChecksum);
            }
        }

        let catalog_number = parse_field::<u32>(line1, 2, 7, "catalog number")?;
        if parse_field::<u32>(line2, 2, 7, "catalog number")? != catalog_number {
            return Err(ElementSetError::BadLineMarker);
        }

        let epoch_year = parse_field::<u32>(line1, 18, 20, "epoch year")?;
        let epoch_day = parse_field::<f64>(line1, 20, 32, "epoch day")?;
        let epoch = build_epoch(epoch_year, epoch_day)?;

        let bstar = parse_compressed_exponent(&line1[53..61])
            .ok_or(ElementSetError::UnparseableField("drag coefficient"))?;
        let element_set_number = parse_field::<u32>(line1, 64, 68, "element set number")?;

        let inclination = parse_field::<f64>(line2, 8, 16, "inclination")?.to_radians();
        let raan = parse_field::<f64>(line2, 17, 25, "raan")?.to_radians();
        let eccentricity = format!("0.{}", line2[26..33].trim())
            .parse::<f64>()
            .map_err(|_| ElementSetError::UnparseableField("eccentricity"))?;
        let argument_of_perigee =
            parse_field::<f64>(line2, 34, 42, "argument of perigee")?.to_radians();
        let mean_anomaly = parse_field::<f64>(line2, 43, 51, "mean anomaly")?.to_radians();
        let revs_per_day = parse_field::<f64>(line2, 52, 63, "mean motion")?;
        let revolution_number = parse_field::<u32>(line2, 63, 68, "revolution number")?;

        // rev/day -> rad/min
        let mean_motion = revs_per_day * 2.0 * PI / 1440.0;

        if !(0.0..1.0).contains(&eccentricity) {
            return Err(ElementSetError::OutOfRange("eccentricity"));
        }
        if !(mean_motion > 0.0) || !mean_motion.is_finite() {
            return Err(ElementSetError::OutOfRange("mean motion"));
        }
        if !inclination.is_finite() || !raan.is_finite() || !mean_anomaly.is_finite() {
            return Err(ElementSetError::OutOfRange("angles"));
        }

        Ok(Self {
            catalog_number,
            name,
            epoch,
            inclination,
            raan,
            argument_of_perigee,
            mean_anomaly,
            eccentricity,
            mean_motion,
            bstar,
            element_set_number,
            revolution_number,
        })
    }

    /// Returns the satellite catalog number.
    pub const fn catalog_number(&self) -> u32 { self.catalog_number }

    /// Returns the object name, if the text carried a name line.
    pub fn name(&self) -> Option<&str> { self.name.as_deref() }

    /// Returns the epoch instant.
    pub const fn epoch(&self) -> DateTime<Utc> { self.epoch }

    /// Returns the inclination in radians.
    pub const fn inclination(&self) -> f64 { self.inclination }

    /// Returns the right ascension of the ascending node in radians.
    pub const fn raan(&self) -> f64 { self.raan }

    /// Returns the argument of perigee in radians.
    pub const fn argument_of_perigee(&self) -> f64 { self.argument_of_perigee }

    /// Returns the mean anomaly at epoch in radians.
    pub const fn mean_anomaly(&self) -> f64 { self.mean_anomaly }

    /// Returns the eccentricity.
    pub const fn eccentricity(&self) -> f64 { self.eccentricity }

    /// Returns the mean motion in radians per minute.
    pub const fn mean_motion(&self) -> f64 { self.mean_motion }

    /// Returns the B* drag coefficient.
    pub const fn bstar(&self) -> f64 { self.bstar }

    /// Returns the element set number.
    pub const fn element_set_number(&self) -> u32 { self.element_set_number }

    /// Returns the revolution number at epoch.
    pub const fn revolution_number(&self) -> u32 { self.revolution_number }

    /// Returns the orbital period in minutes.
    pub fn period_minutes(&self) -> f64 { 2.0 * PI / self.mean_motion }

    #[cfg(test)]
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn test(
        epoch: DateTime<Utc>,
        inclination: f64,
        raan: f64,
        argument_of_perigee: f64,
        mean_anomaly: f64,
        eccentricity: f64,
        mean_motion: f64,
    ) -> Self {
        Self {
            catalog_number: 25544,
            name: Some("TESTSAT".to_string()),
            epoch,
            inclination,
            raan,
            argument_of_perigee,
            mean_anomaly,
            eccentricity,
            mean_motion,
            bstar: 0.0,
            element_set_number: 999,
            revolution_number: 1,
        }
    }
}

/// Parses a fixed-column field, trimming padding spaces.
fn parse_field<T: std::str::FromStr>(
    line: &str,
    start: usize,
    end: usize,
    what: &'static str,
) -> Result<T, ElementSetError> {
    line[start..end].trim().parse::<T>().map_err(|_| ElementSetError::UnparseableField(what))
}

/// Builds the UTC epoch from a two-digit year and a fractional day of year.
///
/// Years 00-56 land in the 2000s, 57-99 in the 1900s.
fn build_epoch(year2: u32, day_of_year: f64) -> Result<DateTime<Utc>, ElementSetError> {
    if !(1.0..=367.0).contains(&day_of_year) {
        return Err(ElementSetError::OutOfRange("epoch day"));
    }
    let year = if year2 < EPOCH_YEAR_PIVOT { 2000 + year2 } else { 1900 + year2 };
    let jan1 = Utc
        .with_ymd_and_hms(year as i32, 1, 1, 0, 0, 0)
        .single()
        .ok_or(ElementSetError::OutOfRange("epoch year"))?;
    let micros = ((day_of_year - 1.0) * 86_400.0 * 1e6).round() as i64;
    Ok(jan1 + TimeDelta::microseconds(micros))
}

/// Decodes the format's compressed scientific notation: an optional sign,
/// mantissa digits with an implied leading decimal point, and a signed
/// single-digit exponent. `" 23354-3"` decodes to `0.23354e-3`.
pub(crate) fn parse_compressed_exponent(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.len() < 2 {
        return None;
    }
    let (mantissa_part, exponent_part) = trimmed.split_at(trimmed.len() - 2);
    let (sign, digits) = match mantissa_part.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, mantissa_part.strip_prefix('+').unwrap_or(mantissa_part)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mantissa = format!("0.{digits}").parse::<f64>().ok()?;
    let exponent = exponent_part.parse::<i32>().ok()?;
    Some(sign * mantissa * 10f64.powi(exponent))
}
