//! Virtual pitch projection.
//!
//! Maps a sanitized trace onto a normalized, portrait-oriented pitch (unit square,
//! origin top-left, `x` across the width, `y` down the length) and bins it on a
//! 40 x 60 grid. Two projectors exist:
//!
//! - **Automatic**: estimates the pitch heading from the trace itself, rotates,
//!   bounds and normalizes the cloud, then forces a portrait layout.
//! - **Calibrated**: uses the three user-marked corners as an oblique basis.
//!
//! Degenerate geometry (zero-extent bounding box, zero-length basis vector) yields
//! an empty bin set instead of NaNs.

use geo::{BoundingRect, Coord, MultiPoint};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationCorners;
use crate::geo_utils::{planar_centroid, to_planar};
use crate::heatmap::{counts_to_bins, log_grid_summary, GridCounts, GridKey, HeatmapConfig, VirtualHeatBin};
use crate::orientation::{principal_axis_angle, rotate_about};
use crate::GpsPoint;

/// Bounding boxes thinner than this (planar meters) are treated as empty.
const MIN_EXTENT_METERS: f64 = 1e-6;

/// Which projector produced the virtual bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ProjectionMode {
    Automatic,
    Calibrated,
}

/// Virtual pitch bins plus the projector that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualHeatmap {
    pub mode: ProjectionMode,
    pub bins: Vec<VirtualHeatBin>,
}

/// Select the projector from the calibration state and run it.
pub fn project_virtual(
    points: &[GpsPoint],
    corners: &CalibrationCorners,
    config: &HeatmapConfig,
) -> VirtualHeatmap {
    match corners.triple() {
        Some((tl, tr, bl)) => VirtualHeatmap {
            mode: ProjectionMode::Calibrated,
            bins: project_calibrated(points, &tl, &tr, &bl, config),
        },
        None => VirtualHeatmap {
            mode: ProjectionMode::Automatic,
            bins: project_automatic(points, config),
        },
    }
}

// ============================================================================
// Shared binning
// ============================================================================

/// Cell index of a normalized coordinate, clamped onto the grid.
#[inline]
fn unit_cell(value: f64, cells: u32) -> i32 {
    let max_index = cells.saturating_sub(1) as i32;
    ((value * cells as f64).floor() as i32).clamp(0, max_index)
}

/// Bin normalized coordinates on the virtual grid.
fn bin_unit_square(
    coords: impl IntoIterator<Item = (f64, f64)>,
    config: &HeatmapConfig,
) -> Vec<VirtualHeatBin> {
    let cols = config.virtual_cols.max(1);
    let rows = config.virtual_rows.max(1);

    let mut counts = GridCounts::new();
    for (x, y) in coords {
        let key = GridKey::new(unit_cell(x, cols), unit_cell(y, rows));
        *counts.entry(key).or_insert(0) += 1;
    }
    log_grid_summary("virtual grid", &counts);

    counts_to_bins(&counts, config, |key, count, intensity| VirtualHeatBin {
        col: key.x as u32,
        row: key.y as u32,
        x: (key.x as f64 + 0.5) / cols as f64,
        y: (key.y as f64 + 0.5) / rows as f64,
        intensity,
        visit_count: count,
    })
}

// ============================================================================
// Automatic projector
// ============================================================================

/// Map normalized box coordinates to the portrait pitch frame.
///
/// A landscape cloud has its axes swapped (with inversion) so the long side runs
/// down the pitch; a portrait cloud only has `y` inverted.
#[inline]
pub fn canonicalize(nx: f64, ny: f64, landscape: bool) -> (f64, f64) {
    if landscape {
        (ny, 1.0 - nx)
    } else {
        (nx, 1.0 - ny)
    }
}

/// Project without calibration: orientation comes from the trace's second moments.
pub fn project_automatic(points: &[GpsPoint], config: &HeatmapConfig) -> Vec<VirtualHeatBin> {
    let planar: Vec<Coord<f64>> = points.iter().map(to_planar).collect();
    project_automatic_planar(&planar, config)
}

/// [`project_automatic`] over points already on the plane.
pub fn project_automatic_planar(planar: &[Coord<f64>], config: &HeatmapConfig) -> Vec<VirtualHeatBin> {
    let Some(center) = planar_centroid(planar) else {
        return Vec::new();
    };

    let angle = principal_axis_angle(planar, center);
    let rotated: Vec<Coord<f64>> = planar
        .iter()
        .map(|p| rotate_about(*p, center, angle))
        .collect();

    let Some(rect) = MultiPoint::from(rotated.clone()).bounding_rect() else {
        return Vec::new();
    };
    let width = rect.width();
    let height = rect.height();
    if width <= MIN_EXTENT_METERS || height <= MIN_EXTENT_METERS {
        debug!(
            "[PitchHeatmap] automatic projection skipped: {:.3}m x {:.3}m box",
            width, height
        );
        return Vec::new();
    }

    let landscape = width > height;
    let min = rect.min();
    debug!(
        "[PitchHeatmap] automatic projection: angle {:.3}rad, {:.1}m x {:.1}m ({})",
        angle,
        width,
        height,
        if landscape { "landscape" } else { "portrait" }
    );

    bin_unit_square(
        rotated.iter().map(|p| {
            let nx = (p.x - min.x) / width;
            let ny = (p.y - min.y) / height;
            canonicalize(nx, ny, landscape)
        }),
        config,
    )
}

// ============================================================================
// Calibrated projector
// ============================================================================

/// Pitch frame spanned by the user's corners: `U` along the width (top-left to
/// top-right), `V` along the length (top-left to bottom-left). The axes need not
/// be perpendicular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObliqueBasis {
    origin: Coord<f64>,
    u: Coord<f64>,
    v: Coord<f64>,
    u_len_sq: f64,
    v_len_sq: f64,
}

impl ObliqueBasis {
    /// `None` when either basis vector has zero length.
    pub fn from_corners(top_left: &GpsPoint, top_right: &GpsPoint, bottom_left: &GpsPoint) -> Option<Self> {
        let origin = to_planar(top_left);
        let u = to_planar(top_right) - origin;
        let v = to_planar(bottom_left) - origin;
        let u_len_sq = u.x * u.x + u.y * u.y;
        let v_len_sq = v.x * v.x + v.y * v.y;

        if u_len_sq <= 0.0 || v_len_sq <= 0.0 || !u_len_sq.is_finite() || !v_len_sq.is_finite() {
            return None;
        }
        Some(Self { origin, u, v, u_len_sq, v_len_sq })
    }

    /// Field coordinates `(projU, projV)`: `(d·U)/(U·U)` and `(d·V)/(V·V)`.
    pub fn project(&self, point: &GpsPoint) -> (f64, f64) {
        let d = to_planar(point) - self.origin;
        (
            (d.x * self.u.x + d.y * self.u.y) / self.u_len_sq,
            (d.x * self.v.x + d.y * self.v.y) / self.v_len_sq,
        )
    }
}

/// Project with the three calibration corners. Points outside the field plus
/// `calibration_margin` on any side are dropped.
pub fn project_calibrated(
    points: &[GpsPoint],
    top_left: &GpsPoint,
    top_right: &GpsPoint,
    bottom_left: &GpsPoint,
    config: &HeatmapConfig,
) -> Vec<VirtualHeatBin> {
    let Some(basis) = ObliqueBasis::from_corners(top_left, top_right, bottom_left) else {
        debug!("[PitchHeatmap] calibrated projection skipped: zero-length basis vector");
        return Vec::new();
    };

    let lo = -config.calibration_margin;
    let hi = 1.0 + config.calibration_margin;
    let inside = |v: f64| v >= lo && v <= hi;

    let accepted: Vec<(f64, f64)> = points
        .iter()
        .map(|p| basis.project(p))
        .filter(|&(u, v)| inside(u) && inside(v))
        .collect();

    debug!(
        "[PitchHeatmap] calibrated projection: {}/{} points inside field",
        accepted.len(),
        points.len()
    );

    bin_unit_square(accepted, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::from_planar;

    fn config() -> HeatmapConfig {
        HeatmapConfig::default()
    }

    /// Deterministic pseudo-random values in [0, 1).
    fn lcg(seed: &mut u64) -> f64 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (*seed >> 11) as f64 / (1u64 << 53) as f64
    }

    /// A referee-like cloud: 68m x 105m, denser along one diagonal band.
    fn referee_cloud(n: usize) -> Vec<Coord<f64>> {
        let mut seed = 42;
        (0..n)
            .map(|i| {
                let a = lcg(&mut seed);
                let b = lcg(&mut seed);
                let (x, y) = if i % 3 == 0 { (a, a * 0.8 + b * 0.2) } else { (a, b) };
                Coord { x: 1000.0 + x * 68.0, y: -5000.0 + y * 105.0 }
            })
            .collect()
    }

    fn sorted_counts(bins: &[VirtualHeatBin]) -> Vec<u32> {
        let mut counts: Vec<u32> = bins.iter().map(|b| b.visit_count).collect();
        counts.sort_unstable();
        counts
    }

    // Calibration rectangle near Madrid aligned with lat/lng.
    const TOP: f64 = 40.4530;
    const BOTTOM: f64 = 40.4520;
    const LEFT: f64 = -3.6883;
    const RIGHT: f64 = -3.6875;

    fn corners() -> (GpsPoint, GpsPoint, GpsPoint) {
        (
            GpsPoint::new(TOP, LEFT),
            GpsPoint::new(TOP, RIGHT),
            GpsPoint::new(BOTTOM, LEFT),
        )
    }

    #[test]
    fn test_empty_input() {
        assert!(project_automatic(&[], &config()).is_empty());
        let (tl, tr, bl) = corners();
        assert!(project_calibrated(&[], &tl, &tr, &bl, &config()).is_empty());
    }

    #[test]
    fn test_coincident_points_are_insufficient() {
        let pts = vec![GpsPoint::new(40.0, -3.7); 25];
        assert!(project_automatic(&pts, &config()).is_empty());
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize(0.25, 0.1, false), (0.25, 0.9));
        assert_eq!(canonicalize(0.25, 0.1, true), (0.1, 0.75));
    }

    #[test]
    fn test_automatic_bins_within_unit_square() {
        let bins = project_automatic_planar(&referee_cloud(3000), &config());
        assert!(!bins.is_empty());
        let total: u32 = bins.iter().map(|b| b.visit_count).sum();
        assert_eq!(total, 3000);
        for b in &bins {
            assert!(b.x > 0.0 && b.x < 1.0 && b.y > 0.0 && b.y < 1.0);
            assert!(b.col < 40 && b.row < 60);
            assert!(b.intensity > 0.0 && b.intensity <= 1.0);
        }
        assert!(bins.iter().any(|b| b.intensity == 1.0));
    }

    #[test]
    fn test_automatic_rotation_invariant() {
        let cloud = referee_cloud(2000);
        let center = planar_centroid(&cloud).unwrap();
        let base = sorted_counts(&project_automatic_planar(&cloud, &config()));

        for beta in [0.37, 1.2, 2.9, -0.8] {
            let turned: Vec<Coord<f64>> = cloud.iter().map(|p| rotate_about(*p, center, beta)).collect();
            let bins = project_automatic_planar(&turned, &config());
            assert_eq!(sorted_counts(&bins), base, "beta {beta}");
        }
    }

    #[test]
    fn test_calibrated_corners_round_trip() {
        let (tl, tr, bl) = corners();
        let basis = ObliqueBasis::from_corners(&tl, &tr, &bl).unwrap();
        let br = GpsPoint::new(BOTTOM, RIGHT);

        let expect = [(tl, (0.0, 0.0)), (tr, (1.0, 0.0)), (bl, (0.0, 1.0)), (br, (1.0, 1.0))];
        for (p, (u, v)) in expect {
            let (pu, pv) = basis.project(&p);
            assert!((pu - u).abs() < 1e-6, "{p:?}: u {pu}");
            assert!((pv - v).abs() < 1e-6, "{p:?}: v {pv}");
        }
    }

    #[test]
    fn test_calibrated_rectangular_grid() {
        let (tl, tr, bl) = corners();
        // 4 x 6 grid of points at virtual cell centers of a 4 x 6 layout.
        let mut pts = Vec::new();
        for i in 0..4 {
            for j in 0..6 {
                let u = (i as f64 + 0.5) / 4.0;
                let v = (j as f64 + 0.5) / 6.0;
                pts.push(GpsPoint::new(TOP + (BOTTOM - TOP) * v, LEFT + (RIGHT - LEFT) * u));
            }
        }
        let cfg = HeatmapConfig { virtual_cols: 4, virtual_rows: 6, ..config() };
        let bins = project_calibrated(&pts, &tl, &tr, &bl, &cfg);
        assert_eq!(bins.len(), 24);
        assert!(bins.iter().all(|b| b.visit_count == 1 && b.intensity == 0.5));
        // Top-left point lands in the top-left cell.
        assert!(bins.iter().any(|b| b.col == 0 && b.row == 0));
    }

    #[test]
    fn test_calibrated_margin_filter() {
        let (tl, tr, bl) = corners();
        let width = RIGHT - LEFT;
        let inside_margin = GpsPoint::new(TOP, LEFT - width * 0.05);
        let outside_margin = GpsPoint::new(TOP, LEFT - width * 0.2);
        let far_below = GpsPoint::new(BOTTOM - 0.0005, LEFT);

        let bins = project_calibrated(&[inside_margin, outside_margin, far_below], &tl, &tr, &bl, &config());
        assert_eq!(bins.len(), 1);
        // Margin points are clamped onto the edge cell.
        assert_eq!(bins[0].col, 0);
        assert_eq!(bins[0].row, 0);
    }

    #[test]
    fn test_calibrated_zero_length_basis() {
        let (tl, _, bl) = corners();
        let pts = vec![GpsPoint::new(40.4525, -3.6880)];
        assert!(project_calibrated(&pts, &tl, &tl, &bl, &config()).is_empty());
        assert!(ObliqueBasis::from_corners(&tl, &tl, &bl).is_none());
    }

    #[test]
    fn test_mode_selection() {
        let pts: Vec<GpsPoint> = (0..50)
            .map(|i| GpsPoint::new(40.4521 + (i % 10) as f64 * 8e-5, -3.6882 + (i / 10) as f64 * 1.4e-4))
            .collect();
        let (tl, tr, bl) = corners();

        let partial = CalibrationCorners::from_points(&[tl, tr]);
        assert_eq!(project_virtual(&pts, &partial, &config()).mode, ProjectionMode::Automatic);

        let full = CalibrationCorners::from_points(&[tl, tr, bl]);
        let result = project_virtual(&pts, &full, &config());
        assert_eq!(result.mode, ProjectionMode::Calibrated);
        let total: u32 = result.bins.iter().map(|b| b.visit_count).sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn test_calibrated_skewed_frame() {
        // Non-perpendicular corners built directly on the plane (y grows south).
        let origin = to_planar(&GpsPoint::new(40.4530, -3.6883));
        let u = Coord { x: 100.0, y: 20.0 };
        let v = Coord { x: 30.0, y: 80.0 };
        let tl = from_planar(origin);
        let tr = from_planar(origin + u);
        let bl = from_planar(origin + v);
        let basis = ObliqueBasis::from_corners(&tl, &tr, &bl).unwrap();

        let u_dot_v = u.x * v.x + u.y * v.y;
        let u_len_sq = u.x * u.x + u.y * u.y;
        let v_len_sq = v.x * v.x + v.y * v.y;

        // Each axis is an independent projection, so a corner leaks onto the other axis.
        let expect = [
            (tl, (0.0, 0.0)),
            (tr, (1.0, u_dot_v / v_len_sq)),
            (bl, (u_dot_v / u_len_sq, 1.0)),
            (from_planar(origin + u + v), (1.0 + u_dot_v / u_len_sq, 1.0 + u_dot_v / v_len_sq)),
        ];
        for (p, (eu, ev)) in expect {
            let (pu, pv) = basis.project(&p);
            assert!((pu - eu).abs() < 1e-6, "{p:?}: u {pu} vs {eu}");
            assert!((pv - ev).abs() < 1e-6, "{p:?}: v {pv} vs {ev}");
        }

        // Margin acceptance in the skewed frame: (1.05, 0.66) stays, (-0.15, -0.09)
        // and the derived fourth corner (1.44, 1.63) fall outside.
        let slightly_past_tr = from_planar(origin + u * 1.05);
        let behind_tl = from_planar(origin - u * 0.15);
        let far_corner = from_planar(origin + u + v);
        let bins = project_calibrated(&[slightly_past_tr, behind_tl, far_corner], &tl, &tr, &bl, &config());

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].visit_count, 1);
        // u = 1.05 clamps onto the last column; v = 1.05 * 4600 / 7300 lands in row 39.
        assert_eq!(bins[0].col, 39);
        assert_eq!(bins[0].row, 39);
    }
}
