//! Analysis session state.
//!
//! One session per opened match. The sanitized trace and geographic bins are fixed
//! once built; the virtual pitch bins follow the calibration corners and are fully
//! replaced whenever the corners change. Each replacement bumps a generation number
//! so a consumer holding results from an earlier calibration can tell they are stale.

use log::info;

use crate::calibration::CalibrationCorners;
use crate::error::Result;
use crate::heatmap::{generate_geo_heatmap, HeatBin, HeatmapConfig, HeatmapResult, VirtualHeatBin};
use crate::projection::{project_virtual, ProjectionMode, VirtualHeatmap};
use crate::sanitize::sanitize_trace;
use crate::GpsPoint;

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    config: HeatmapConfig,
    input_points: u32,
    trace: Vec<GpsPoint>,
    geo_bins: Vec<HeatBin>,
    corners: CalibrationCorners,
    virtual_map: VirtualHeatmap,
    generation: u64,
}

impl AnalysisSession {
    /// Sanitize `raw_trace` and build both heat maps.
    ///
    /// Fails with [`crate::HeatmapError::InvalidHeatmapConfig`] before any work is done.
    pub fn new(raw_trace: &[GpsPoint], corners: CalibrationCorners, config: HeatmapConfig) -> Result<Self> {
        config.validate()?;

        let trace = sanitize_trace(raw_trace, config.field_radius_meters);
        let geo_bins = generate_geo_heatmap(&trace, &config);
        let virtual_map = project_virtual(&trace, &corners, &config);

        Ok(Self {
            config,
            input_points: raw_trace.len() as u32,
            trace,
            geo_bins,
            corners,
            virtual_map,
            generation: 0,
        })
    }

    /// Replace the calibration and recompute the virtual bins only.
    ///
    /// Returns the new generation.
    pub fn set_calibration_corners(&mut self, corners: &[GpsPoint]) -> u64 {
        self.corners = CalibrationCorners::from_points(corners);
        self.recompute_virtual()
    }

    /// Drop the calibration and fall back to automatic orientation.
    pub fn clear_calibration(&mut self) -> u64 {
        self.corners.clear();
        self.recompute_virtual()
    }

    fn recompute_virtual(&mut self) -> u64 {
        self.virtual_map = project_virtual(&self.trace, &self.corners, &self.config);
        self.generation += 1;
        info!(
            "[PitchHeatmap] virtual map recomputed ({:?}, {} bins), generation {}",
            self.virtual_map.mode,
            self.virtual_map.bins.len(),
            self.generation
        );
        self.generation
    }

    /// Sanitized trace, e.g. for drawing the route under the calibration picker.
    pub fn trace(&self) -> &[GpsPoint] {
        &self.trace
    }

    pub fn geo_bins(&self) -> &[HeatBin] {
        &self.geo_bins
    }

    pub fn virtual_bins(&self) -> &[VirtualHeatBin] {
        &self.virtual_map.bins
    }

    pub fn mode(&self) -> ProjectionMode {
        self.virtual_map.mode
    }

    pub fn corners(&self) -> &CalibrationCorners {
        &self.corners
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True if results tagged with `generation` still match the current calibration.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Snapshot of both heat maps.
    pub fn result(&self) -> HeatmapResult {
        HeatmapResult {
            geo_bins: self.geo_bins.clone(),
            virtual_bins: self.virtual_map.bins.clone(),
            mode: self.virtual_map.mode,
            input_points: self.input_points,
            kept_points: self.trace.len() as u32,
        }
    }
}
