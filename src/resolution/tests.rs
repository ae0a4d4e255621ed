use super::cache::{ElementCache, ElementCacheEntry, FixCache, FixCacheEntry};
use super::resolver::{infer_ascending, orbital_phase};
use super::*;
use crate::http_handler::catalog_get::CatalogResponse;
use crate::tracking::{KeplerJ2, OrbitalElementSet};
use chrono::{TimeDelta, Utc};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const ISS_NAME: &str = "ISS (ZARYA)";
const ISS_LINE1: &str = "1 25544U 98067A   25277.53072227  .00016717  00000+0  10270-3 0  9007";
const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.50103472 56356";
const SECOND_LINE1: &str = "1 49044U 21066A   25277.50000000  .00010000  00000+0 -11606-4 0  9993";
const SECOND_LINE2: &str = "2 49044  51.6400 247.0000 0004000 120.0000 240.0000 15.49000000 27104";

static TEST_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn iss_elements() -> OrbitalElementSet {
    OrbitalElementSet::parse(&format!("{ISS_NAME}\n{ISS_LINE1}\n{ISS_LINE2}")).unwrap()
}

/// A fresh scratch directory per test so the cache files never collide.
fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "orbtrack-test-{}-{}",
        std::process::id(),
        TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A config whose remote sources refuse connections immediately.
fn offline_config(dir: &Path) -> ResolverConfig {
    ResolverConfig {
        catalog_url: "http://127.0.0.1:9/".to_string(),
        live_fix_url: "http://127.0.0.1:9/".to_string(),
        catalog_timeout: Duration::from_secs(1),
        live_fix_timeout: Duration::from_secs(1),
        element_cache_path: dir.join("element_cache.json"),
        fix_cache_path: dir.join("fix_cache.json"),
        ..ResolverConfig::default()
    }
}

/// Serves exactly one HTTP response on an ephemeral local port and returns
/// the URL to request it from.
fn serve_once(body: String, content_type: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0_u8; 4096];
            let _ = stream.read(&mut request);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/")
}

#[test]
fn test_element_cache_round_trip() {
    let dir = scratch_dir();
    let cache = ElementCache::new(dir.join("elements.json"));
    assert_eq!(cache.load().unwrap_err(), CacheError::Unreadable);

    let entry = ElementCacheEntry::new(ISS_NAME, ISS_LINE1, ISS_LINE2, Utc::now());
    cache.store(&entry).unwrap();
    assert_eq!(cache.load().unwrap(), entry);

    // the cached lines must round-trip through the parser unchanged
    let set = OrbitalElementSet::parse(&entry.raw_text()).unwrap();
    assert_eq!(set.catalog_number(), 25544);
}

#[test]
fn test_corrupt_cache_file_is_a_miss() {
    let dir = scratch_dir();
    let path = dir.join("fix.json");
    std::fs::write(&path, "{ not json").unwrap();
    let cache = FixCache::new(path);
    assert_eq!(cache.load().unwrap_err(), CacheError::Unparseable);
}

#[test]
fn test_fix_cache_round_trip() {
    let dir = scratch_dir();
    let cache = FixCache::new(dir.join("fix.json"));
    let entry = FixCacheEntry::new(48.2, -122.9, Utc::now(), 211.5, false);
    cache.store(&entry).unwrap();
    let loaded = cache.load().unwrap();
    assert_eq!(loaded, entry);
    assert!(!loaded.is_ascending());
}

#[test]
fn test_infer_ascending_inside_recency_window() {
    let now = Utc::now();
    let previous = FixCacheEntry::new(10.0, 50.0, now - TimeDelta::minutes(5), 0.0, true);
    assert!(infer_ascending(12.0, 51.0, now, Some(&previous)));
    assert!(!infer_ascending(8.0, 51.0, now, Some(&previous)));
}

#[test]
fn test_infer_ascending_heuristic_outside_window() {
    let now = Utc::now();
    let stale = FixCacheEntry::new(10.0, 50.0, now - TimeDelta::hours(2), 0.0, true);
    // hemisphere/longitude-sign guess takes over
    assert!(infer_ascending(20.0, 60.0, now, Some(&stale)));
    assert!(!infer_ascending(20.0, -60.0, now, Some(&stale)));
    assert!(!infer_ascending(-20.0, 60.0, now, None));
    assert!(infer_ascending(-20.0, -60.0, now, None));
}

#[test]
fn test_orbital_phase_recovery() {
    assert!((orbital_phase(25.8, 51.6, true) - 30.0).abs() < 1e-9);
    assert!((orbital_phase(25.8, 51.6, false) - 150.0).abs() < 1e-9);
    assert!((orbital_phase(-25.8, 51.6, false) - 210.0).abs() < 1e-9);
    // latitudes beyond the amplitude clamp instead of going NaN
    assert!((orbital_phase(60.0, 51.6, true) - 90.0).abs() < 1e-9);
}

#[test]
fn test_catalog_scan_finds_records() {
    let body = format!(
        "{ISS_NAME}\n{ISS_LINE1}\n{ISS_LINE2}\nNAUKA\n{SECOND_LINE1}\n{SECOND_LINE2}\n"
    );
    let response = CatalogResponse::test(&body);

    let primary = response.find_record(25544).unwrap();
    assert_eq!(primary.name.as_deref(), Some(ISS_NAME));
    assert_eq!(primary.line1, ISS_LINE1);

    let secondary = response.find_record(49044).unwrap();
    assert_eq!(secondary.name.as_deref(), Some("NAUKA"));
    assert!(response.find_record(11111).is_none());
}

#[test]
fn test_catalog_scan_without_name_line() {
    let body = format!("{ISS_LINE1}\n{ISS_LINE2}\n");
    let response = CatalogResponse::test(&body);
    let record = response.find_record(25544).unwrap();
    assert_eq!(record.name, None);
}

#[tokio::test]
async fn test_tier1_fresh_elements_short_circuit() {
    let dir = scratch_dir();
    let config = offline_config(&dir);
    let fix_cache_path = config.fix_cache_path.clone();
    let mut resolver = PositionResolver::new(config, Box::new(KeplerJ2));
    resolver.set_held(iss_elements(), Utc::now());

    // both remote sources refuse connections, so success proves tier 1
    let fix = resolver.resolve_current_fix().await.unwrap();
    assert!(fix.is_plausible());
    assert!((350.0..=450.0).contains(&fix.altitude()), "altitude {}", fix.altitude());
    // every successful tier overwrites the fix cache
    assert!(fix_cache_path.exists());
}

#[tokio::test]
async fn test_stale_elements_and_dead_sources_reach_tier4() {
    let dir = scratch_dir();
    let config = offline_config(&dir);
    let fix_cache = FixCache::new(config.fix_cache_path.clone());
    let cached = FixCacheEntry::new(10.0, 20.0, Utc::now() - TimeDelta::minutes(30), 30.0, true);
    fix_cache.store(&cached).unwrap();

    let mut resolver = PositionResolver::new(config, Box::new(KeplerJ2));
    resolver.set_held(iss_elements(), Utc::now() - TimeDelta::hours(200));

    let fix = resolver.resolve_current_fix().await.unwrap();
    assert!(fix.is_plausible());

    // manual extrapolation with the held set's amplitude and period
    let elements = iss_elements();
    let amplitude = elements.inclination().to_degrees();
    let period = elements.period_minutes();
    let mut phase = (10.0_f64 / amplitude).asin().to_degrees();
    phase += 30.0 / period * 360.0;
    let expected_lat = amplitude * phase.to_radians().sin();
    let expected_lon = 20.0 - 30.0 * (360.0 / period - 360.985_647 / 1440.0);
    assert!((fix.latitude() - expected_lat).abs() < 0.5, "lat {}", fix.latitude());
    assert!((fix.longitude() - expected_lon).abs() < 0.5, "lon {}", fix.longitude());
}

#[tokio::test]
async fn test_no_cache_and_dead_sources_is_resolution_failed() {
    let dir = scratch_dir();
    let mut resolver = PositionResolver::new(offline_config(&dir), Box::new(KeplerJ2));
    let outcome = resolver.resolve_current_fix().await;
    assert_eq!(outcome.unwrap_err(), ResolutionFailed);
}

#[tokio::test]
async fn test_tier3_live_fix_when_catalog_is_down() {
    let dir = scratch_dir();
    let now_secs = Utc::now().timestamp();
    let payload =
        format!("{{\"latitude\": \"10.5\", \"longitude\": 20.25, \"timestamp\": {now_secs}}}");
    let mut config = offline_config(&dir);
    config.live_fix_url = serve_once(payload, "application/json");
    let fix_cache_path = config.fix_cache_path.clone();

    let mut resolver = PositionResolver::new(config, Box::new(KeplerJ2));
    let fix = resolver.resolve_current_fix().await.unwrap();
    assert!((fix.latitude() - 10.5).abs() < 1e-9);
    assert!((fix.longitude() - 20.25).abs() < 1e-9);

    let entry = FixCache::new(fix_cache_path).load().unwrap();
    assert!((entry.latitude() - 10.5).abs() < 1e-9);
    // no previous fix inside the window: hemisphere heuristic, both positive
    assert!(entry.is_ascending());
}

#[tokio::test]
async fn test_tier2_catalog_refresh_and_propagate() {
    let dir = scratch_dir();
    let body = format!("{ISS_NAME}\n{ISS_LINE1}\n{ISS_LINE2}\n");
    let mut config = offline_config(&dir);
    config.catalog_url = serve_once(body, "text/plain");
    let element_cache_path = config.element_cache_path.clone();

    let mut resolver = PositionResolver::new(config, Box::new(KeplerJ2));
    let fix = resolver.resolve_current_fix().await.unwrap();
    assert!(fix.is_plausible());
    assert!((350.0..=450.0).contains(&fix.altitude()));

    // the fetched record was persisted and the held set swapped in
    let entry = ElementCache::new(element_cache_path).load().unwrap();
    assert_eq!(entry.line1(), ISS_LINE1);
    assert_eq!(resolver.held_elements().unwrap().catalog_number(), 25544);
}

#[test]
fn test_live_fix_accepts_string_and_numeric_coordinates() {
    use crate::http_handler::live_fix_get::LiveFixResponse;
    let parsed: LiveFixResponse =
        serde_json::from_str("{\"latitude\": \"-42.75\", \"longitude\": 13.5, \"timestamp\": 1700000000}")
            .unwrap();
    assert!((parsed.latitude() + 42.75).abs() < 1e-12);
    assert!((parsed.longitude() - 13.5).abs() < 1e-12);
    assert_eq!(parsed.timestamp().timestamp(), 1_700_000_000);
}

#[test]
fn test_resolution_failed_is_displayable() {
    let message = ResolutionFailed.to_string();
    assert!(message.contains("exhausted"));
}
