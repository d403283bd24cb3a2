//! Wearable health-data collaborator and workout loading.
//!
//! The health store is injected as a [`HealthDataSource`] trait object. This module
//! provides:
//! - Route gathering: one fetch per recorded route segment, all awaited before the
//!   trace is handed to the sanitizer (a failed segment contributes zero points)
//! - Workout loading: summary, scalar statistics, heart-rate zones and heat maps,
//!   with every secondary query degrading to "metric unavailable"

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationCorners;
use crate::error::{HeatmapError, Result};
use crate::heatmap::HeatmapConfig;
use crate::session::AnalysisSession;
use crate::zones::{calculate_zone_durations, HeartRateSample, HrZoneConfig, ZoneDurations};
use crate::GpsPoint;

/// Segment fetches allowed in flight at once.
const MAX_CONCURRENT_SEGMENTS: usize = 8;

/// Default number of workouts offered for manual linking.
pub const RECENT_WORKOUTS_LIMIT: u32 = 15;

/// m/s to km/h
const MPS_TO_KMH: f64 = 3.6;

/// Progress callback type: (completed segments, total segments)
pub type ProgressCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Summary of a recorded workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub id: String,
    /// Unix timestamp in milliseconds
    pub start_ms: i64,
    /// Unix timestamp in milliseconds
    pub end_ms: i64,
    pub duration_secs: f64,
    pub total_energy_kcal: Option<f64>,
    pub total_distance_meters: Option<f64>,
}

/// Quantity queried through [`HealthDataSource::fetch_scalar_stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarMetric {
    /// bpm
    HeartRate,
    /// m/s
    RunningSpeed,
    /// count
    StepCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    Average,
    Max,
    Sum,
}

/// Read access to the wearable health store.
#[async_trait]
pub trait HealthDataSource: Send + Sync {
    /// Fails with [`HeatmapError::WorkoutNotFound`] for unknown ids.
    async fn fetch_workout_summary(&self, workout_id: &str) -> Result<WorkoutSummary>;

    /// Ids of the route segments recorded with a workout. Empty when no route exists.
    async fn list_route_segments(&self, workout_id: &str) -> Result<Vec<String>>;

    /// Ordered GPS fixes of one segment.
    async fn fetch_route_segment(&self, segment_id: &str) -> Result<Vec<GpsPoint>>;

    /// Heart-rate samples in `[start_ms, end_ms]`, ascending by time.
    async fn fetch_heart_rate_samples(&self, start_ms: i64, end_ms: i64) -> Result<Vec<HeartRateSample>>;

    /// Aggregated statistic, `None` when the store has no data for the window.
    async fn fetch_scalar_stat(
        &self,
        metric: ScalarMetric,
        aggregation: Aggregation,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Option<f64>>;

    /// Most recent workouts first.
    async fn list_recent_workouts(&self, limit: u32) -> Result<Vec<WorkoutSummary>>;
}

/// Settings for a full workout analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub heatmap: HeatmapConfig,
    pub zones: HrZoneConfig,
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        self.heatmap.validate()?;
        self.zones.validate()
    }
}

/// Everything the match detail screen shows.
#[derive(Debug, Clone)]
pub struct WorkoutReport {
    pub summary: WorkoutSummary,
    pub average_heart_rate: Option<f64>,
    pub max_speed_kmh: Option<f64>,
    pub step_count: Option<u64>,
    pub zones: ZoneDurations,
    pub session: AnalysisSession,
}

/// Outcome of loading a match's workout.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// The match has no workout linked yet; the user can link one manually.
    NoDataLinked,
    /// A workout is linked but the health store no longer has it.
    NotFound(String),
    /// The health store could not be queried, or the analysis settings are invalid.
    Unavailable(String),
    Ready(Box<WorkoutReport>),
}

/// Gather every route segment of a workout into one trace.
///
/// Segments are fetched concurrently and concatenated in segment order once all of
/// them have completed. Missing routes and failed segments yield no points.
pub async fn fetch_route_trace(
    source: &dyn HealthDataSource,
    workout_id: &str,
    on_progress: Option<ProgressCallback>,
) -> Vec<GpsPoint> {
    let segments = match source.list_route_segments(workout_id).await {
        Ok(segments) => segments,
        Err(e) => {
            warn!("[PitchHeatmap] route query for {} failed: {}", workout_id, e);
            return Vec::new();
        }
    };

    let total = segments.len() as u32;
    let completed = AtomicU32::new(0);
    let start = Instant::now();

    let parts: Vec<Vec<GpsPoint>> = stream::iter(segments)
        .map(|segment_id| {
            let completed = &completed;
            let callback = on_progress.clone();

            async move {
                let points = match source.fetch_route_segment(&segment_id).await {
                    Ok(points) => points,
                    Err(e) => {
                        warn!("[PitchHeatmap] segment {} failed, skipping: {}", segment_id, e);
                        Vec::new()
                    }
                };

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    "[PitchHeatmap] segment {} done ({}/{}): {} points",
                    segment_id,
                    done,
                    total,
                    points.len()
                );
                if let Some(ref cb) = callback {
                    cb(done, total);
                }
                points
            }
        })
        .buffered(MAX_CONCURRENT_SEGMENTS)
        .collect()
        .await;

    let trace: Vec<GpsPoint> = parts.into_iter().flatten().collect();
    info!(
        "[PitchHeatmap] route for {}: {} segments, {} points in {:?}",
        workout_id,
        total,
        trace.len(),
        start.elapsed()
    );
    trace
}

/// Recent workouts for manual linking. Empty on failure.
pub async fn recent_workouts(source: &dyn HealthDataSource, limit: u32) -> Vec<WorkoutSummary> {
    match source.list_recent_workouts(limit).await {
        Ok(workouts) => workouts,
        Err(e) => {
            warn!("[PitchHeatmap] recent workouts unavailable: {}", e);
            Vec::new()
        }
    }
}

async fn scalar_or_none(
    source: &dyn HealthDataSource,
    metric: ScalarMetric,
    aggregation: Aggregation,
    summary: &WorkoutSummary,
) -> Option<f64> {
    match source
        .fetch_scalar_stat(metric, aggregation, summary.start_ms, summary.end_ms)
        .await
    {
        Ok(value) => value,
        Err(e) => {
            warn!("[PitchHeatmap] {:?} {:?} unavailable: {}", aggregation, metric, e);
            None
        }
    }
}

async fn zone_durations(
    source: &dyn HealthDataSource,
    summary: &WorkoutSummary,
    config: &HrZoneConfig,
) -> ZoneDurations {
    match source.fetch_heart_rate_samples(summary.start_ms, summary.end_ms).await {
        Ok(samples) => calculate_zone_durations(&samples, config),
        Err(e) => {
            warn!("[PitchHeatmap] heart-rate samples unavailable: {}", e);
            ZoneDurations::default()
        }
    }
}

/// Load and analyse the workout linked to a match.
pub async fn load_workout_report(
    source: &dyn HealthDataSource,
    workout_id: Option<&str>,
    corners: CalibrationCorners,
    settings: &AnalysisSettings,
) -> LoadState {
    let Some(workout_id) = workout_id else {
        return LoadState::NoDataLinked;
    };
    if let Err(e) = settings.validate() {
        warn!("[PitchHeatmap] refusing to analyse {}: {}", workout_id, e);
        return LoadState::Unavailable(e.to_string());
    }

    let summary = match source.fetch_workout_summary(workout_id).await {
        Ok(summary) => summary,
        Err(HeatmapError::WorkoutNotFound(id)) => {
            warn!("[PitchHeatmap] workout {} not found in health store", id);
            return LoadState::NotFound(id);
        }
        Err(e) => return LoadState::Unavailable(e.to_string()),
    };

    let (average_heart_rate, max_speed, steps, zones, trace) = futures::join!(
        scalar_or_none(source, ScalarMetric::HeartRate, Aggregation::Average, &summary),
        scalar_or_none(source, ScalarMetric::RunningSpeed, Aggregation::Max, &summary),
        scalar_or_none(source, ScalarMetric::StepCount, Aggregation::Sum, &summary),
        zone_durations(source, &summary, &settings.zones),
        fetch_route_trace(source, workout_id, None),
    );

    let session = match AnalysisSession::new(&trace, corners, settings.heatmap.clone()) {
        Ok(session) => session,
        Err(e) => return LoadState::Unavailable(e.to_string()),
    };

    LoadState::Ready(Box::new(WorkoutReport {
        summary,
        average_heart_rate,
        max_speed_kmh: max_speed.map(|mps| mps * MPS_TO_KMH),
        step_count: steps.map(|s| s.max(0.0) as u64),
        zones,
        session,
    }))
}
