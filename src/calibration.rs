//! Manual pitch calibration.
//!
//! The user marks three corners of the pitch on a satellite map, in order:
//! top-left, top-right, bottom-left. The fourth corner is never collected; it
//! completes the parallelogram for display. Calibration lives for one analysis
//! session and is never written to storage here.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{from_planar, to_planar};
use crate::GpsPoint;

/// Number of corners that completes a calibration.
pub const REQUIRED_CORNERS: usize = 3;

/// Which corner the user is asked to mark next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
}

/// Ordered user-picked pitch corners (0 to 3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCorners {
    corners: Vec<GpsPoint>,
}

impl CalibrationCorners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of corners. Anything past the third is ignored.
    pub fn from_points(points: &[GpsPoint]) -> Self {
        if points.len() > REQUIRED_CORNERS {
            warn!(
                "[PitchHeatmap] calibration got {} corners, keeping the first {}",
                points.len(),
                REQUIRED_CORNERS
            );
        }
        Self {
            corners: points.iter().take(REQUIRED_CORNERS).copied().collect(),
        }
    }

    /// Add the next corner. Returns `false` once calibration is already complete.
    pub fn push(&mut self, corner: GpsPoint) -> bool {
        if self.is_complete() {
            return false;
        }
        self.corners.push(corner);
        true
    }

    /// Remove the last marked corner.
    pub fn undo(&mut self) -> Option<GpsPoint> {
        self.corners.pop()
    }

    pub fn clear(&mut self) {
        self.corners.clear();
    }

    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.corners.len() == REQUIRED_CORNERS
    }

    pub fn corners(&self) -> &[GpsPoint] {
        &self.corners
    }

    /// The corner the user should mark next, or `None` when complete.
    pub fn next_corner(&self) -> Option<Corner> {
        match self.corners.len() {
            0 => Some(Corner::TopLeft),
            1 => Some(Corner::TopRight),
            2 => Some(Corner::BottomLeft),
            _ => None,
        }
    }

    /// (top-left, top-right, bottom-left) once complete.
    pub fn triple(&self) -> Option<(GpsPoint, GpsPoint, GpsPoint)> {
        match self.corners.as_slice() {
            [tl, tr, bl] => Some((*tl, *tr, *bl)),
            _ => None,
        }
    }

    /// Display outline: top-left, top-right, derived bottom-right, bottom-left.
    pub fn outline(&self) -> Option<[GpsPoint; 4]> {
        let (tl, tr, bl) = self.triple()?;
        Some([tl, tr, derive_fourth_corner(&tl, &tr, &bl), bl])
    }
}

/// Complete the parallelogram: `P3 = P2 + (P1 - P0)` in planar space.
pub fn derive_fourth_corner(top_left: &GpsPoint, top_right: &GpsPoint, bottom_left: &GpsPoint) -> GpsPoint {
    let p0 = to_planar(top_left);
    let p1 = to_planar(top_right);
    let p2 = to_planar(bottom_left);
    from_planar(p2 + (p1 - p0))
}
