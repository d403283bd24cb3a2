//! # Geographic Utilities
//!
//! Core geographic computation utilities for GPS trace analysis.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`compute_center`] | Arithmetic centroid of a GPS trace |
//! | [`to_planar`] | Project a GPS point onto the Web-Mercator plane |
//! | [`from_planar`] | Inverse of [`to_planar`] |
//! | [`planar_centroid`] | Centroid of planar points |
//!
//! ## Example
//!
//! ```rust
//! use pitch_heatmap::{GpsPoint, geo_utils};
//!
//! let corner = GpsPoint::new(40.4168, -3.7038);
//! let planar = geo_utils::to_planar(&corner);
//! let back = geo_utils::from_planar(planar);
//! assert!((back.latitude - corner.latitude).abs() < 1e-9);
//! assert!((back.longitude - corner.longitude).abs() < 1e-9);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Planar projection
//!
//! Projectors work in a spherical Web-Mercator plane measured in meters at the
//! equator. The y axis grows southward, matching the map-point convention used by
//! mobile map kits. Only ratios of lengths are consumed downstream, so the scale
//! distortion of Mercator is irrelevant at pitch size.
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).

use geo::{Coord, Distance, Haversine, Point};
use crate::GpsPoint;

/// Spherical earth radius used by the Web-Mercator projection.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters.
///
/// # Example
///
/// ```rust
/// use pitch_heatmap::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

// =============================================================================
// Center Functions
// =============================================================================

/// Compute the arithmetic centroid (mean latitude, mean longitude) of a trace.
///
/// Returns `None` for empty input. Suitable for pitch-sized areas; no attempt is
/// made to handle the antimeridian.
///
/// ```rust
/// use pitch_heatmap::{GpsPoint, geo_utils};
///
/// let trace = vec![GpsPoint::new(51.50, -0.10), GpsPoint::new(51.52, -0.12)];
/// let center = geo_utils::compute_center(&trace).unwrap();
/// assert!((center.latitude - 51.51).abs() < 1e-9);
/// ```
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();

    Some(GpsPoint::new(sum_lat / n, sum_lng / n))
}

// =============================================================================
// Planar Projection
// =============================================================================

/// Project a GPS point onto the Web-Mercator plane (x east, y south, meters).
#[inline]
pub fn to_planar(p: &GpsPoint) -> Coord<f64> {
    let lat_rad = p.latitude.to_radians();
    let x = EARTH_RADIUS_METERS * p.longitude.to_radians();
    let y = -EARTH_RADIUS_METERS * (std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan().ln();
    Coord { x, y }
}

/// Inverse of [`to_planar`].
#[inline]
pub fn from_planar(c: Coord<f64>) -> GpsPoint {
    let longitude = (c.x / EARTH_RADIUS_METERS).to_degrees();
    let latitude = (2.0 * (-c.y / EARTH_RADIUS_METERS).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    GpsPoint::new(latitude, longitude)
}

/// Mean of a set of planar points. `None` for empty input.
pub fn planar_centroid(points: &[Coord<f64>]) -> Option<Coord<f64>> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
    Some(Coord { x: sx / n, y: sy / n })
}

// =============================================================================
// Unit Tests
// =============================================================================
