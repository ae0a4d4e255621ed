//! Position-resolution core for a satellite wallpaper generator.
//!
//! Parses and validates published element sets, propagates them with a
//! single canonical Kepler + secular-J2 algorithm, converts inertial
//! positions to geodetic fixes and resolves "where is the satellite right
//! now" through a four-tier fallback engine backed by two JSON cache
//! files. Rendering, wallpaper setting and scheduling live outside this
//! crate; its consumer calls [`resolution::PositionResolver`] once per
//! generation cycle and [`tracking::classify_sunlight`] for the day/night
//! overlay.

pub mod http_handler;
pub mod logger;
pub mod resolution;
pub mod tracking;
