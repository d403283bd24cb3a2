//! Trace sanitizer.
//!
//! Drops GPS fixes that drift away from the activity. A referee stays on one pitch,
//! so anything farther than a pitch-plus-margin radius from the mean position is
//! treated as multipath noise or a warm-up lap elsewhere.

use log::{debug, warn};
use crate::geo_utils::{compute_center, haversine_distance};
use crate::GpsPoint;

/// Default rejection radius around the trace centroid, in meters.
pub const FIELD_RADIUS_METERS: f64 = 85.0;

/// Keep the points strictly closer than `radius_meters` to the trace centroid.
///
/// Fixes with non-finite or out-of-range coordinates are dropped before the
/// centroid is taken. Order preserving, no re-centering. Empty input yields empty output.
///
/// ```rust
/// use pitch_heatmap::{GpsPoint, sanitize_trace, FIELD_RADIUS_METERS};
///
/// let mut trace: Vec<GpsPoint> = (0..20)
///     .map(|i| GpsPoint::new(40.0 + i as f64 * 1e-5, -3.7))
///     .collect();
/// trace.push(GpsPoint::new(40.01, -3.7)); // ~1km away
///
/// let clean = sanitize_trace(&trace, FIELD_RADIUS_METERS);
/// assert_eq!(clean.len(), 20);
/// ```
pub fn sanitize_trace(points: &[GpsPoint], radius_meters: f64) -> Vec<GpsPoint> {
    let valid: Vec<GpsPoint> = points.iter().filter(|p| p.is_valid()).copied().collect();
    if valid.len() < points.len() {
        warn!(
            "[PitchHeatmap] sanitize_trace: dropped {} invalid fixes",
            points.len() - valid.len()
        );
    }

    let Some(center) = compute_center(&valid) else {
        return Vec::new();
    };

    let kept: Vec<GpsPoint> = valid
        .into_iter()
        .filter(|p| haversine_distance(p, &center) < radius_meters)
        .collect();

    debug!(
        "[PitchHeatmap] sanitize_trace: kept {}/{} points within {:.0}m",
        kept.len(),
        points.len(),
        radius_meters
    );

    kept
}
