use crate::http_handler::catalog_get::{CatalogRequest, RawElementRecord};
use crate::http_handler::http_client::HTTPClient;
use crate::http_handler::live_fix_get::LiveFixRequest;
use crate::http_handler::request_common::HTTPRequestType;
use crate::http_handler::response_common::ResponseError;
use crate::resolution::cache::{
    CacheError, ElementCache, ElementCacheEntry, FixCache, FixCacheEntry,
};
use crate::tracking::{
    EARTH_EQUATORIAL_RADIUS_KM, EARTH_MU_KM3_S2, ElementSetError, GeodeticFix, KeplerJ2,
    OrbitalElementSet, PropagationStrategy, eci_to_geodetic, wrap_longitude,
};
use crate::{info, log, warn};
use chrono::{DateTime, TimeDelta, Utc};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use strum_macros::Display;

/// Default staleness threshold for a held element set, hours.
const DEFAULT_STALENESS_HOURS: i64 = 168;
/// Recency window inside which the previous cached latitude decides the
/// ascending/descending flag, minutes.
const ASCENDING_WINDOW_MINUTES: i64 = 10;
/// Peak ground-track latitude used when no element set is held, degrees.
const DEFAULT_PEAK_LATITUDE_DEG: f64 = 51.6;
/// Orbital period used when no element set is held, minutes.
const DEFAULT_PERIOD_MINUTES: f64 = 92.9;
/// Altitude reported when a tier produces no altitude of its own, km.
const DEFAULT_ALTITUDE_KM: f64 = 420.0;
/// Sidereal Earth rotation rate, degrees per minute.
const EARTH_ROTATION_DEG_PER_MIN: f64 = 360.985_647 / 1440.0;

/// Terminal outcome: every resolution tier was exhausted. The rendering
/// layer treats this as "skip the overlay, reuse the prior frame".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionFailed;

impl std::fmt::Display for ResolutionFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "all resolution tiers exhausted, no position available")
    }
}

impl std::error::Error for ResolutionFailed {}

/// Per-tier failure categories. Each is caught at its own tier boundary
/// and converted into "try the next tier"; none escapes the engine.
#[derive(Debug, Display)]
enum TierFailure {
    /// Raw element text failed parsing or validation.
    RejectedElementSet(ElementSetError),
    /// A remote source timed out, refused the connection or answered with
    /// a malformed payload.
    SourceUnavailable(ResponseError),
    /// Propagation or conversion produced a non-finite or out-of-range
    /// result.
    NumericDegeneracy,
    /// The cache file is missing or unparseable; identical to a miss.
    CacheUnavailable(CacheError),
}

/// Configuration of the resolution engine: source URLs, timeouts, cache
/// locations, tracked catalog numbers and the staleness threshold.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Full URL of the bulk element catalog (plain text, many records).
    pub catalog_url: String,
    /// Full URL of the live single-fix endpoint (JSON).
    pub live_fix_url: String,
    /// Timeout for catalog fetches.
    pub catalog_timeout: Duration,
    /// Timeout for live-fix fetches.
    pub live_fix_timeout: Duration,
    /// Path of the element cache file.
    pub element_cache_path: PathBuf,
    /// Path of the fix cache file.
    pub fix_cache_path: PathBuf,
    /// Catalog number tried first when scanning the bulk catalog.
    pub primary_catalog_number: u32,
    /// Catalog number tried when the primary is absent from the catalog.
    pub secondary_catalog_number: u32,
    /// Maximum age of a held element set before Tier 1 is skipped.
    pub staleness_threshold: TimeDelta,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://celestrak.org/NORAD/elements/gp.php?GROUP=stations&FORMAT=tle"
                .to_string(),
            live_fix_url: "https://api.wheretheiss.at/v1/satellites/25544".to_string(),
            catalog_timeout: Duration::from_secs(30),
            live_fix_timeout: Duration::from_secs(5),
            element_cache_path: PathBuf::from("element_cache.json"),
            fix_cache_path: PathBuf::from("fix_cache.json"),
            primary_catalog_number: 25544,
            secondary_catalog_number: 49044,
            staleness_threshold: TimeDelta::hours(DEFAULT_STALENESS_HOURS),
        }
    }
}

impl ResolverConfig {
    /// The default configuration with `ORBTRACK_CATALOG_URL`,
    /// `ORBTRACK_LIVE_FIX_URL` and `ORBTRACK_CACHE_DIR` environment
    /// overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("ORBTRACK_CATALOG_URL") {
            config.catalog_url = url;
        }
        if let Ok(url) = env::var("ORBTRACK_LIVE_FIX_URL") {
            config.live_fix_url = url;
        }
        if let Ok(dir) = env::var("ORBTRACK_CACHE_DIR") {
            let dir = PathBuf::from(dir);
            config.element_cache_path = dir.join("element_cache.json");
            config.fix_cache_path = dir.join("fix_cache.json");
        }
        config
    }
}

/// The held element set together with its retrieval timestamp. Replaced
/// wholesale on refresh, never partially mutated.
struct HeldElements {
    set: OrbitalElementSet,
    fetched_at: DateTime<Utc>,
}

/// The fallback state machine that resolves the tracked object's current
/// ground position.
///
/// Tiers, attempted top-down on every call:
/// 1. propagate a fresh held element set,
/// 2. refresh elements from the bulk catalog and propagate,
/// 3. query the live single-fix source,
/// 4. extrapolate from the cached last fix with a circular-orbit model.
///
/// Every successful tier overwrites the fix cache. Only the terminal
/// [`ResolutionFailed`] is visible to callers.
pub struct PositionResolver {
    catalog_client: HTTPClient,
    live_fix_client: HTTPClient,
    element_cache: ElementCache,
    fix_cache: FixCache,
    strategy: Box<dyn PropagationStrategy>,
    config: ResolverConfig,
    held: Option<HeldElements>,
}

impl PositionResolver {
    /// Creates a resolver with the given configuration and propagation
    /// strategy. The held element set starts empty and is seeded from the
    /// element cache on the first resolution.
    pub fn new(config: ResolverConfig, strategy: Box<dyn PropagationStrategy>) -> Self {
        Self {
            catalog_client: HTTPClient::new(&config.catalog_url, config.catalog_timeout),
            live_fix_client: HTTPClient::new(&config.live_fix_url, config.live_fix_timeout),
            element_cache: ElementCache::new(config.element_cache_path.clone()),
            fix_cache: FixCache::new(config.fix_cache_path.clone()),
            strategy,
            config,
            held: None,
        }
    }

    /// Creates a resolver with the default configuration and the canonical
    /// [`KeplerJ2`] propagator.
    pub fn with_defaults() -> Self { Self::new(ResolverConfig::from_env(), Box::new(KeplerJ2)) }

    /// Resolves the tracked object's current geodetic fix, degrading
    /// through the tiers until one succeeds.
    ///
    /// # Returns
    /// The current fix, or [`ResolutionFailed`] when all four tiers are
    /// exhausted.
    pub async fn resolve_current_fix(&mut self) -> Result<GeodeticFix, ResolutionFailed> {
        let now = Utc::now();
        self.reload_held_from_cache(now);

        if self.held_is_fresh(now) {
            match self.propagate_tier(now) {
                Ok(fix) => {
                    self.persist_fix(&fix);
                    info!("tier 1: propagated fix {fix}");
                    return Ok(fix);
                }
                Err(failure) => warn!("tier 1 propagation failed: {failure}"),
            }
        } else {
            log!("no fresh element set held, falling through to catalog refresh");
        }

        match self.refresh_elements(now).await {
            Ok(()) => match self.propagate_tier(now) {
                Ok(fix) => {
                    self.persist_fix(&fix);
                    info!("tier 2: propagated fix from refreshed elements {fix}");
                    return Ok(fix);
                }
                Err(failure) => warn!("tier 2 propagation failed: {failure}"),
            },
            Err(failure) => warn!("tier 2 element refresh failed: {failure}"),
        }

        match self.live_fix_tier().await {
            Ok(fix) => {
                info!("tier 3: live fix {fix}");
                return Ok(fix);
            }
            Err(failure) => warn!("tier 3 live fix failed: {failure}"),
        }

        match self.extrapolate_tier(now) {
            Ok(fix) => {
                info!("tier 4: extrapolated fix {fix}");
                Ok(fix)
            }
            Err(failure) => {
                warn!("tier 4 extrapolation failed: {failure}");
                Err(ResolutionFailed)
            }
        }
    }

    /// Returns the currently held element set, if any.
    pub fn held_elements(&self) -> Option<&OrbitalElementSet> {
        self.held.as_ref().map(|h| &h.set)
    }

    /// Seeds or refreshes the held element set from the element cache when
    /// the in-memory set is missing or stale. A stale or unreadable cache
    /// entry is a normal miss, not an error.
    fn reload_held_from_cache(&mut self, now: DateTime<Utc>) {
        if self.held_is_fresh(now) {
            return;
        }
        let entry = match self.element_cache.load() {
            Ok(entry) => entry,
            Err(err) => {
                log!("element cache miss: {err}");
                return;
            }
        };
        if now - entry.cached_at() >= self.config.staleness_threshold {
            log!("element cache entry is stale (cached at {})", entry.cached_at());
            return;
        }
        match OrbitalElementSet::parse(&entry.raw_text()) {
            Ok(set) => {
                info!("held element set seeded from cache (cached at {})", entry.cached_at());
                self.held = Some(HeldElements { set, fetched_at: entry.cached_at() });
            }
            Err(err) => warn!("element cache entry rejected: {err}"),
        }
    }

    fn held_is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.held
            .as_ref()
            .is_some_and(|h| now - h.fetched_at < self.config.staleness_threshold)
    }

    /// Tier 1/2 propagation: advance the held set to `now` and convert to
    /// a geodetic fix, rejecting non-finite or unphysical results.
    fn propagate_tier(&self, now: DateTime<Utc>) -> Result<GeodeticFix, TierFailure> {
        let held = self.held.as_ref().ok_or(TierFailure::NumericDegeneracy)?;
        let state = self.strategy.state_at(&held.set, now);
        if !state.is_finite() {
            return Err(TierFailure::NumericDegeneracy);
        }
        let fix = eci_to_geodetic(state.position(), now);
        if !fix.is_plausible() || fix.altitude() <= 0.0 {
            return Err(TierFailure::NumericDegeneracy);
        }
        Ok(fix)
    }

    /// Tier 2 fetch: pull the bulk catalog, scan for the primary then the
    /// secondary catalog number, validate, persist and swap the held set.
    async fn refresh_elements(&mut self, now: DateTime<Utc>) -> Result<(), TierFailure> {
        let response = CatalogRequest {}
            .send_request(&self.catalog_client)
            .await
            .map_err(TierFailure::SourceUnavailable)?;
        let record = response
            .find_record(self.config.primary_catalog_number)
            .or_else(|| response.find_record(self.config.secondary_catalog_number))
            .ok_or(TierFailure::SourceUnavailable(ResponseError::MalformedBody))?;
        let set = OrbitalElementSet::parse(&record_text(&record))
            .map_err(TierFailure::RejectedElementSet)?;

        let entry = ElementCacheEntry::new(
            record.name.as_deref().unwrap_or("UNNAMED"),
            &record.line1,
            &record.line2,
            now,
        );
        if let Err(err) = self.element_cache.store(&entry) {
            warn!("element cache write failed: {err}");
        }
        info!("element set refreshed from catalog (#{} @ {})", set.catalog_number(), set.epoch());
        self.held = Some(HeldElements { set, fetched_at: now });
        Ok(())
    }

    /// Tier 3: query the live single-fix source and persist the result.
    async fn live_fix_tier(&self) -> Result<GeodeticFix, TierFailure> {
        let response = LiveFixRequest {}
            .send_request(&self.live_fix_client)
            .await
            .map_err(TierFailure::SourceUnavailable)?;
        if !response.latitude().is_finite() || !response.longitude().is_finite() {
            return Err(TierFailure::SourceUnavailable(ResponseError::MalformedBody));
        }
        let fix = GeodeticFix::new(
            response.latitude(),
            wrap_longitude(response.longitude()),
            self.fallback_altitude(),
            response.timestamp(),
        );
        if !fix.is_plausible() {
            return Err(TierFailure::SourceUnavailable(ResponseError::MalformedBody));
        }
        self.persist_fix(&fix);
        Ok(fix)
    }

    /// Tier 4: advance the cached last fix with the simplified
    /// circular-orbit model. Needs no propagator and no network.
    fn extrapolate_tier(&self, now: DateTime<Utc>) -> Result<GeodeticFix, TierFailure> {
        let entry = self.fix_cache.load().map_err(TierFailure::CacheUnavailable)?;
        let amplitude = self.peak_latitude_deg();
        let period = self.period_minutes();
        let elapsed_min = (now - entry.timestamp()).num_milliseconds() as f64 / 60_000.0;

        let ratio = (entry.latitude() / amplitude).clamp(-1.0, 1.0);
        let mut phase = ratio.asin().to_degrees();
        if !entry.is_ascending() {
            phase = 180.0 - phase;
        }
        phase += elapsed_min / period * 360.0;

        let latitude = amplitude * phase.to_radians().sin();
        let orbital_rate = 360.0 / period;
        let longitude = wrap_longitude(
            entry.longitude() - elapsed_min * (orbital_rate - EARTH_ROTATION_DEG_PER_MIN),
        );
        let ascending = phase.to_radians().cos() > 0.0;

        let fix = GeodeticFix::new(latitude, longitude, self.fallback_altitude(), now);
        let new_entry =
            FixCacheEntry::new(latitude, longitude, now, phase.rem_euclid(360.0), ascending);
        if let Err(err) = self.fix_cache.store(&new_entry) {
            warn!("fix cache write failed: {err}");
        }
        Ok(fix)
    }

    /// Overwrites the fix cache after any successful tier. Propagation
    /// never reads this cache; it only feeds Tier 4 and the ascending
    /// inference window.
    fn persist_fix(&self, fix: &GeodeticFix) {
        let previous = self.fix_cache.load().ok();
        let ascending = infer_ascending(
            fix.latitude(),
            fix.longitude(),
            fix.timestamp(),
            previous.as_ref(),
        );
        let amplitude = self.peak_latitude_deg();
        let phase = orbital_phase(fix.latitude(), amplitude, ascending);
        let entry =
            FixCacheEntry::new(fix.latitude(), fix.longitude(), fix.timestamp(), phase, ascending);
        if let Err(err) = self.fix_cache.store(&entry) {
            warn!("fix cache write failed: {err}");
        }
    }

    /// Peak ground-track latitude in degrees: the inclination of the held
    /// set (mirrored for retrograde orbits), or the default.
    fn peak_latitude_deg(&self) -> f64 {
        match &self.held {
            Some(held) => {
                let inclination = held.set.inclination().to_degrees();
                if inclination <= 90.0 { inclination } else { 180.0 - inclination }
            }
            None => DEFAULT_PEAK_LATITUDE_DEG,
        }
    }

    /// Orbital period in minutes from the held set, or the default.
    fn period_minutes(&self) -> f64 {
        self.held.as_ref().map_or(DEFAULT_PERIOD_MINUTES, |h| h.set.period_minutes())
    }

    /// Altitude reported by tiers that have no altitude of their own:
    /// the held set's circular-orbit altitude, or the default.
    fn fallback_altitude(&self) -> f64 {
        match &self.held {
            Some(held) => {
                let n = held.set.mean_motion() / 60.0;
                (EARTH_MU_KM3_S2 / (n * n)).cbrt() - EARTH_EQUATORIAL_RADIUS_KM
            }
            None => DEFAULT_ALTITUDE_KM,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_held(&mut self, set: OrbitalElementSet, fetched_at: DateTime<Utc>) {
        self.held = Some(HeldElements { set, fetched_at });
    }
}

/// Reassembles a raw catalog record into parser input.
fn record_text(record: &RawElementRecord) -> String {
    match &record.name {
        Some(name) => format!("{name}\n{}\n{}", record.line1, record.line2),
        None => format!("{}\n{}", record.line1, record.line2),
    }
}

/// Infers the ascending/descending flag for a new fix. Inside the recency
/// window the previous cached latitude decides; outside it a deterministic
/// hemisphere/longitude heuristic takes over. The heuristic is a rough
/// guess near the equator and is kept as documented behavior.
pub(crate) fn infer_ascending(
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
    previous: Option<&FixCacheEntry>,
) -> bool {
    if let Some(prev) = previous {
        let gap = (timestamp - prev.timestamp()).abs();
        if gap <= TimeDelta::minutes(ASCENDING_WINDOW_MINUTES) {
            return latitude >= prev.latitude();
        }
    }
    (latitude >= 0.0) == (longitude >= 0.0)
}

/// Recovers the orbital phase angle in degrees from a latitude, the peak
/// latitude amplitude and the ascending flag.
pub(crate) fn orbital_phase(latitude: f64, amplitude: f64, ascending: bool) -> f64 {
    let ratio = (latitude / amplitude).clamp(-1.0, 1.0);
    let phase = ratio.asin().to_degrees();
    let adjusted = if ascending { phase } else { 180.0 - phase };
    adjusted.rem_euclid(360.0)
}
