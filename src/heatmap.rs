//! Heatmap generation for a single refereed match.
//!
//! Creates a sparse grid of cells from a sanitized GPS trace:
//! - A geographic grid in degree units for the map overlay
//! - A virtual pitch grid (40 x 60 cells over the unit square) for the field diagram
//!
//! Both grids share the same tone mapping: the saturation threshold is a fraction of
//! the busiest cell, floored so that sparse traces still show colour.

use std::collections::HashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationCorners;
use crate::error::{HeatmapError, Result};
use crate::projection::{project_virtual, ProjectionMode};
use crate::sanitize::{sanitize_trace, FIELD_RADIUS_METERS};
use crate::GpsPoint;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration for heatmap generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HeatmapConfig {
    /// Geographic cell size in degrees (default: 0.00002, about 2m)
    pub geo_cell_size_degrees: f64,
    /// Points farther than this from the trace centroid are dropped (default: 85m)
    pub field_radius_meters: f64,
    /// Virtual pitch columns across the width (default: 40)
    pub virtual_cols: u32,
    /// Virtual pitch rows along the length (default: 60)
    pub virtual_rows: u32,
    /// Fraction of the busiest cell at which intensity saturates (default: 0.30)
    pub saturation_ratio: f64,
    /// Lower bound of the saturation threshold (default: 2.0)
    pub min_saturation: f64,
    /// Margin around the calibrated field, in field units (default: 0.1)
    pub calibration_margin: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            geo_cell_size_degrees: 0.00002,
            field_radius_meters: FIELD_RADIUS_METERS,
            virtual_cols: 40,
            virtual_rows: 60,
            saturation_ratio: 0.30,
            min_saturation: 2.0,
            calibration_margin: 0.1,
        }
    }
}

impl HeatmapConfig {
    /// Sizes, radius and tone-mapping factors must be positive and finite, the
    /// grid non-empty and the margin non-negative.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("geo_cell_size_degrees", self.geo_cell_size_degrees),
            ("field_radius_meters", self.field_radius_meters),
            ("saturation_ratio", self.saturation_ratio),
            ("min_saturation", self.min_saturation),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(HeatmapError::InvalidHeatmapConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.virtual_cols == 0 || self.virtual_rows == 0 {
            return Err(HeatmapError::InvalidHeatmapConfig(format!(
                "virtual grid must have cells, got {} x {}",
                self.virtual_cols, self.virtual_rows
            )));
        }
        if !(self.calibration_margin.is_finite() && self.calibration_margin >= 0.0) {
            return Err(HeatmapError::InvalidHeatmapConfig(format!(
                "calibration_margin must be non-negative, got {}",
                self.calibration_margin
            )));
        }
        Ok(())
    }
}

/// Discrete cell address. Degree units on the geographic grid, column/row on the virtual grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub x: i32,
    pub y: i32,
}

impl GridKey {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Visit count per cell.
pub type GridCounts = HashMap<GridKey, u32>;

/// Display tier of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

impl IntensityLevel {
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity > 0.75 {
            IntensityLevel::High
        } else if intensity > 0.40 {
            IntensityLevel::Medium
        } else {
            IntensityLevel::Low
        }
    }
}

/// A geographic heatmap cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HeatBin {
    /// Cell center for rendering
    pub center: GpsPoint,
    /// Tone-mapped intensity (0.0-1.0)
    pub intensity: f64,
    /// Number of GPS fixes in the cell
    pub visit_count: u32,
}

impl HeatBin {
    /// Square outline of the cell, counter-clockwise from the south-west corner.
    pub fn polygon(&self, cell_size_degrees: f64) -> [GpsPoint; 4] {
        let half = cell_size_degrees / 2.0;
        let (lat, lng) = (self.center.latitude, self.center.longitude);
        [
            GpsPoint::new(lat - half, lng - half),
            GpsPoint::new(lat - half, lng + half),
            GpsPoint::new(lat + half, lng + half),
            GpsPoint::new(lat + half, lng - half),
        ]
    }

    pub fn level(&self) -> IntensityLevel {
        IntensityLevel::from_intensity(self.intensity)
    }
}

/// A cell on the normalized pitch. `x` runs across the width, `y` down the length,
/// both in [0, 1] with the origin at the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct VirtualHeatBin {
    pub col: u32,
    pub row: u32,
    pub x: f64,
    pub y: f64,
    pub intensity: f64,
    pub visit_count: u32,
}

impl VirtualHeatBin {
    pub fn level(&self) -> IntensityLevel {
        IntensityLevel::from_intensity(self.intensity)
    }
}

/// Complete heatmap result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HeatmapResult {
    /// Non-empty geographic cells only (sparse representation)
    pub geo_bins: Vec<HeatBin>,
    /// Non-empty virtual pitch cells
    pub virtual_bins: Vec<VirtualHeatBin>,
    /// How the virtual bins were oriented
    pub mode: ProjectionMode,
    /// Raw trace size
    pub input_points: u32,
    /// Points surviving sanitization
    pub kept_points: u32,
}

// ============================================================================
// Tone mapping
// ============================================================================

/// Count at which a cell reaches full intensity.
pub fn saturation_threshold(max_count: u32, config: &HeatmapConfig) -> f64 {
    (max_count as f64 * config.saturation_ratio).max(config.min_saturation)
}

/// Intensity of a cell, clamped to 1.0.
#[inline]
pub fn intensity(count: u32, saturation: f64) -> f64 {
    (count as f64 / saturation).min(1.0)
}

/// Convert counts to bins, sorted by key for stable output.
pub(crate) fn counts_to_bins<T>(
    counts: &GridCounts,
    config: &HeatmapConfig,
    mut make_bin: impl FnMut(GridKey, u32, f64) -> T,
) -> Vec<T> {
    let max_count = counts.values().copied().max().unwrap_or(0);
    let saturation = saturation_threshold(max_count, config);

    let mut keys: Vec<&GridKey> = counts.keys().collect();
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let count = counts[key];
            make_bin(*key, count, intensity(count, saturation))
        })
        .collect()
}

// ============================================================================
// Geographic grid
// ============================================================================

/// Cell address of a point on the geographic grid (floor toward negative infinity).
#[inline]
pub fn geo_cell(point: &GpsPoint, cell_size_degrees: f64) -> GridKey {
    GridKey::new(
        (point.latitude / cell_size_degrees).floor() as i32,
        (point.longitude / cell_size_degrees).floor() as i32,
    )
}

#[cfg(not(feature = "parallel"))]
fn count_geo_cells(points: &[GpsPoint], cell_size_degrees: f64) -> GridCounts {
    let mut counts = GridCounts::new();
    for p in points {
        *counts.entry(geo_cell(p, cell_size_degrees)).or_insert(0) += 1;
    }
    counts
}

#[cfg(feature = "parallel")]
fn count_geo_cells(points: &[GpsPoint], cell_size_degrees: f64) -> GridCounts {
    points
        .par_iter()
        .fold(GridCounts::new, |mut counts, p| {
            *counts.entry(geo_cell(p, cell_size_degrees)).or_insert(0) += 1;
            counts
        })
        .reduce(GridCounts::new, |mut a, b| {
            for (key, count) in b {
                *a.entry(key).or_insert(0) += count;
            }
            a
        })
}

/// Bin a sanitized trace on the geographic grid.
///
/// ```rust
/// use pitch_heatmap::{GpsPoint, HeatmapConfig, generate_geo_heatmap};
///
/// let trace = vec![GpsPoint::new(40.000001, -3.700001); 4];
/// let bins = generate_geo_heatmap(&trace, &HeatmapConfig::default());
/// assert_eq!(bins.len(), 1);
/// assert_eq!(bins[0].intensity, 1.0);
/// ```
pub fn generate_geo_heatmap(points: &[GpsPoint], config: &HeatmapConfig) -> Vec<HeatBin> {
    if points.is_empty() {
        return Vec::new();
    }

    let size = config.geo_cell_size_degrees;
    let counts = count_geo_cells(points, size);
    log_grid_summary("geo grid", &counts);

    counts_to_bins(&counts, config, |key, count, intensity| HeatBin {
        center: GpsPoint::new(
            key.x as f64 * size + size / 2.0,
            key.y as f64 * size + size / 2.0,
        ),
        intensity,
        visit_count: count,
    })
}

// ============================================================================
// Pipeline entry point
// ============================================================================

/// Run the whole pipeline: sanitize, bin geographically, project onto the pitch.
///
/// Three calibration corners select the calibrated projector; anything less uses
/// automatic orientation detection. Expects a config that passes
/// [`HeatmapConfig::validate`].
pub fn compute_heat_map(
    trace: &[GpsPoint],
    corners: &CalibrationCorners,
    config: &HeatmapConfig,
) -> HeatmapResult {
    let start = std::time::Instant::now();

    let sanitized = sanitize_trace(trace, config.field_radius_meters);
    let geo_bins = generate_geo_heatmap(&sanitized, config);
    let virtual_map = project_virtual(&sanitized, corners, config);

    info!(
        "[PitchHeatmap] compute_heat_map: {}/{} points kept, {} geo bins, {} virtual bins ({:?}) in {:?}",
        sanitized.len(),
        trace.len(),
        geo_bins.len(),
        virtual_map.bins.len(),
        virtual_map.mode,
        start.elapsed()
    );

    HeatmapResult {
        geo_bins,
        virtual_bins: virtual_map.bins,
        mode: virtual_map.mode,
        input_points: trace.len() as u32,
        kept_points: sanitized.len() as u32,
    }
}

/// Log grid size and peak count.
pub(crate) fn log_grid_summary(label: &str, counts: &GridCounts) {
    let max_count = counts.values().copied().max().unwrap_or(0);
    debug!(
        "[PitchHeatmap] {}: {} cells, max count {}",
        label,
        counts.len(),
        max_count
    );
}
