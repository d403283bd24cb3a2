//! # Pitch Heatmap
//!
//! Workout analytics for football referees: where on the pitch the referee was,
//! and how hard they worked.
//!
//! This library provides:
//! - GPS trace sanitization against glitches far from the field
//! - Geographic heat maps for the satellite overlay
//! - Virtual pitch heat maps, oriented automatically or from three calibration corners
//! - Heart-rate zone distribution
//! - Workout loading from an injected wearable-data source
//!
//! ## Features
//!
//! - **`health`** - Async wearable-data collaborator and workout loader (default)
//! - **`parallel`** - Enable parallel grid counting with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use pitch_heatmap::{GpsPoint, CalibrationCorners, HeatmapConfig, compute_heat_map};
//!
//! // A referee jogging back and forth near the centre circle
//! let trace: Vec<GpsPoint> = (0..200)
//!     .map(|i| GpsPoint::new(40.4525 + (i % 20) as f64 * 0.00002, -3.6879 + (i / 20) as f64 * 0.00002))
//!     .collect();
//!
//! let result = compute_heat_map(&trace, &CalibrationCorners::new(), &HeatmapConfig::default());
//! assert_eq!(result.kept_points, 200);
//! assert!(!result.geo_bins.is_empty());
//! assert!(result.virtual_bins.iter().all(|b| b.intensity > 0.0 && b.intensity <= 1.0));
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{HeatmapError, Result};

pub mod geo_utils;

pub mod sanitize;
pub use sanitize::{sanitize_trace, FIELD_RADIUS_METERS};

// Heatmap generation module
pub mod heatmap;
pub use heatmap::{
    HeatmapConfig, HeatBin, VirtualHeatBin, HeatmapResult, IntensityLevel,
    GridKey, GridCounts,
    generate_geo_heatmap, compute_heat_map,
};

pub mod orientation;

pub mod calibration;
pub use calibration::{CalibrationCorners, Corner, derive_fourth_corner};

pub mod projection;
pub use projection::{ProjectionMode, VirtualHeatmap, project_virtual};

pub mod zones;
pub use zones::{HeartRateSample, HrZoneConfig, ZoneDurations, calculate_zone_durations};

pub mod session;
pub use session::AnalysisSession;

// Wearable data access
#[cfg(feature = "health")]
pub mod health;

#[cfg(feature = "health")]
pub use health::{
    HealthDataSource, WorkoutSummary, WorkoutReport, LoadState, AnalysisSettings,
    fetch_route_trace, load_workout_report, recent_workouts,
};

pub mod sync;
pub use sync::{MatchRecord, MatchResultUpdate, apply_match_result, parse_match_result};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("PitchHeatmap")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use pitch_heatmap::GpsPoint;
/// let point = GpsPoint::new(40.4531, -3.6883); // Madrid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// ============================================================================
// Display Helpers
// ============================================================================

/// Abbreviated duration, zero units omitted: `3903.0` becomes `"1h 5m 3s"`.
///
/// Fractions of a second are dropped. Negative and non-finite input reads as `"0s"`.
///
/// ```
/// use pitch_heatmap::format_duration;
/// assert_eq!(format_duration(5_700.0), "1h 35m");
/// assert_eq!(format_duration(42.9), "42s");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);

    let parts: Vec<String> = [(h, "h"), (m, "m"), (s, "s")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::info;

    /// Run the whole heat map pipeline.
    ///
    /// `corners` holds zero to three calibration corners (top-left, top-right,
    /// bottom-left); fewer than three selects automatic orientation.
    #[uniffi::export]
    pub fn ffi_compute_heat_map(
        trace: Vec<GpsPoint>,
        corners: Vec<GpsPoint>,
        config: HeatmapConfig,
    ) -> std::result::Result<HeatmapResult, HeatmapError> {
        init_logging();
        info!(
            "[PitchHeatmap] ffi_compute_heat_map: {} points, {} corners",
            trace.len(),
            corners.len()
        );
        config.validate()?;
        Ok(compute_heat_map(&trace, &CalibrationCorners::from_points(&corners), &config))
    }

    /// Time in each heart-rate zone.
    #[uniffi::export]
    pub fn ffi_compute_zone_durations(
        samples: Vec<HeartRateSample>,
        config: HrZoneConfig,
    ) -> std::result::Result<ZoneDurations, HeatmapError> {
        init_logging();
        config.validate()?;
        Ok(calculate_zone_durations(&samples, &config))
    }

    /// Display outline of a complete calibration, empty otherwise.
    #[uniffi::export]
    pub fn ffi_calibration_outline(corners: Vec<GpsPoint>) -> Vec<GpsPoint> {
        CalibrationCorners::from_points(&corners)
            .outline()
            .map(|outline| outline.to_vec())
            .unwrap_or_default()
    }

    /// Corner the user should mark next, `None` once calibration is complete.
    #[uniffi::export]
    pub fn ffi_next_corner(corners: Vec<GpsPoint>) -> Option<Corner> {
        CalibrationCorners::from_points(&corners).next_corner()
    }

    /// Zone boundaries in bpm for the legend.
    #[uniffi::export]
    pub fn ffi_zone_bpm_bounds(config: HrZoneConfig) -> Vec<u32> {
        config.zone_bpm_bounds().to_vec()
    }

    #[uniffi::export]
    pub fn ffi_format_duration(seconds: f64) -> String {
        format_duration(seconds)
    }

    /// Get default heatmap configuration.
    #[uniffi::export]
    pub fn default_heatmap_config() -> HeatmapConfig {
        init_logging();
        info!("[PitchHeatmap] default_heatmap_config called - Rust is active!");
        HeatmapConfig::default()
    }

    /// Get default heart-rate zone configuration.
    #[uniffi::export]
    pub fn default_hr_zone_config() -> HrZoneConfig {
        HrZoneConfig::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
