use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::Display;

/// Why a cache access failed. A missing or unparseable file is treated by
/// the engine exactly like a miss.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The file does not exist or could not be read.
    Unreadable,
    /// The file exists but its JSON did not decode.
    Unparseable,
    /// The entry could not be written out.
    Unwritable,
}

impl std::error::Error for CacheError {}

/// The persisted element record: the raw lines of the last successfully
/// fetched element set plus its retrieval timestamp.
///
/// Overwritten on every successful catalog fetch, read at start-up and
/// whenever the in-memory element set has gone stale. Never deleted
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ElementCacheEntry {
    /// Satellite name or identifier.
    name: String,
    /// First raw element line, verbatim.
    line1: String,
    /// Second raw element line, verbatim.
    line2: String,
    /// When the record was retrieved from the remote catalog.
    cached_at: DateTime<Utc>,
}

impl ElementCacheEntry {
    /// Creates a new entry from the raw record and its retrieval instant.
    pub fn new(name: &str, line1: &str, line2: &str, cached_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
            cached_at,
        }
    }

    /// Returns the satellite name.
    pub fn name(&self) -> &str { &self.name }

    /// Returns the first raw element line.
    pub fn line1(&self) -> &str { &self.line1 }

    /// Returns the second raw element line.
    pub fn line2(&self) -> &str { &self.line2 }

    /// Returns the retrieval timestamp.
    pub const fn cached_at(&self) -> DateTime<Utc> { self.cached_at }

    /// Reassembles the raw three-line text for the parser.
    pub fn raw_text(&self) -> String {
        format!("{}\n{}\n{}", self.name, self.line1, self.line2)
    }
}

/// The persisted last-known-fix record that Tier 4 extrapolates from.
///
/// Overwritten on every successful fix from any tier; read only when all
/// live and propagated tiers have failed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FixCacheEntry {
    /// Last known latitude in degrees.
    latitude: f64,
    /// Last known longitude in degrees.
    longitude: f64,
    /// When the fix was valid.
    timestamp: DateTime<Utc>,
    /// Orbital phase angle in degrees, measured from the ascending node.
    orbital_phase: f64,
    /// Whether the latitude was increasing at `timestamp`.
    is_ascending: bool,
}

impl FixCacheEntry {
    /// Creates a new fix record.
    pub const fn new(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        orbital_phase: f64,
        is_ascending: bool,
    ) -> Self {
        Self { latitude, longitude, timestamp, orbital_phase, is_ascending }
    }

    /// Returns the cached latitude in degrees.
    pub const fn latitude(&self) -> f64 { self.latitude }

    /// Returns the cached longitude in degrees.
    pub const fn longitude(&self) -> f64 { self.longitude }

    /// Returns the instant the fix was valid for.
    pub const fn timestamp(&self) -> DateTime<Utc> { self.timestamp }

    /// Returns the orbital phase angle in degrees.
    pub const fn orbital_phase(&self) -> f64 { self.orbital_phase }

    /// Returns the cached ascending/descending flag.
    pub const fn is_ascending(&self) -> bool { self.is_ascending }
}

/// Single-file JSON store for the element record. Last-writer-wins, no
/// locking: at most one resolution is in flight system-wide.
#[derive(Debug)]
pub struct ElementCache {
    path: PathBuf,
}

impl ElementCache {
    /// Creates a cache over the given file path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    /// Loads the cached entry.
    pub fn load(&self) -> Result<ElementCacheEntry, CacheError> { read_json(&self.path) }

    /// Overwrites the cache with `entry`.
    pub fn store(&self, entry: &ElementCacheEntry) -> Result<(), CacheError> {
        write_json(&self.path, entry)
    }
}

/// Single-file JSON store for the last known fix.
#[derive(Debug)]
pub struct FixCache {
    path: PathBuf,
}

impl FixCache {
    /// Creates a cache over the given file path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    /// Loads the cached entry.
    pub fn load(&self) -> Result<FixCacheEntry, CacheError> { read_json(&self.path) }

    /// Overwrites the cache with `entry`.
    pub fn store(&self, entry: &FixCacheEntry) -> Result<(), CacheError> {
        write_json(&self.path, entry)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let raw = fs::read_to_string(path).map_err(|_| CacheError::Unreadable)?;
    serde_json::from_str(&raw).map_err(|_| CacheError::Unparseable)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CacheError> {
    let raw = serde_json::to_string_pretty(value).map_err(|_| CacheError::Unwritable)?;
    fs::write(path, raw).map_err(|_| CacheError::Unwritable)
}
