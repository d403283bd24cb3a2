//! Orientation estimation for uncalibrated traces.
//!
//! A referee's trace is an elongated cloud hugging the pitch. Its second-moment
//! tensor gives the pitch direction without any user input.

use geo::Coord;

/// Principal-axis angle (radians) of a planar point cloud around `center`.
///
/// `0.5 * atan2(Σ(dx² - dy²), Σ(2·dx·dy))`. With the moment terms in this order the
/// result is `π/4 - φ` (mod π/2), where `φ` is the direction of the dominant axis, so
/// rotating the cloud by it brings the dominant axis to the same canonical direction
/// whatever the original heading. A cloud with no spread returns 0.
pub fn principal_axis_angle(points: &[Coord<f64>], center: Coord<f64>) -> f64 {
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), p| {
        let dx = p.x - center.x;
        let dy = p.y - center.y;
        (num + 2.0 * dx * dy, den + dx * dx - dy * dy)
    });

    if num == 0.0 && den == 0.0 {
        return 0.0;
    }
    0.5 * den.atan2(num)
}

/// Rotate `p` counter-clockwise by `angle` radians about `center`.
#[inline]
pub fn rotate_about(p: Coord<f64>, center: Coord<f64>, angle: f64) -> Coord<f64> {
    let (sin, cos) = angle.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Coord {
        x: center.x + dx * cos - dy * sin,
        y: center.y + dx * sin + dy * cos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::planar_centroid;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn elongated_cloud(angle: f64) -> Vec<Coord<f64>> {
        // 100m x 20m rectangle of points, rotated by `angle` around the origin.
        let mut pts = Vec::new();
        for i in 0..=50 {
            for j in 0..=10 {
                let p = Coord { x: i as f64 * 2.0 - 50.0, y: j as f64 * 2.0 - 10.0 };
                pts.push(rotate_about(p, Coord { x: 0.0, y: 0.0 }, angle));
            }
        }
        pts
    }

    /// Angles equal modulo π/2 describe the same pair of axes.
    fn same_axes(a: f64, b: f64) -> bool {
        let d = (a - b).rem_euclid(FRAC_PI_2);
        d < 1e-9 || (FRAC_PI_2 - d) < 1e-9
    }

    #[test]
    fn test_degenerate_inputs() {
        let origin = Coord { x: 0.0, y: 0.0 };
        assert_eq!(principal_axis_angle(&[], origin), 0.0);
        assert_eq!(principal_axis_angle(&[origin], origin), 0.0);
        let same = vec![Coord { x: 5.0, y: 5.0 }; 10];
        assert_eq!(principal_axis_angle(&same, Coord { x: 5.0, y: 5.0 }), 0.0);
    }

    fn second_moments(points: &[Coord<f64>], center: Coord<f64>) -> (f64, f64, f64) {
        points.iter().fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), p| {
            let dx = p.x - center.x;
            let dy = p.y - center.y;
            (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
        })
    }

    #[test]
    fn test_axis_aligned_cloud() {
        // Long axis on x: Σdxdy = 0, Σ(dx² - dy²) > 0 -> atan2(+, 0) / 2 = π/4.
        let cloud = elongated_cloud(0.0);
        let est = principal_axis_angle(&cloud, Coord { x: 0.0, y: 0.0 });
        assert!((est - FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_reaches_canonical_direction() {
        for angle in [0.0, 0.3, 1.0, -0.7, 2.5] {
            let cloud = elongated_cloud(angle);
            let center = planar_centroid(&cloud).unwrap();
            let est = principal_axis_angle(&cloud, center);

            let rotated: Vec<Coord<f64>> = cloud.iter().map(|p| rotate_about(*p, center, est)).collect();
            let (sxx, syy, sxy) = second_moments(&rotated, center);

            // Dominant axis on the diagonal: equal spread on x and y, strong cross moment.
            assert!((sxx - syy).abs() < 1e-6 * (sxx + syy), "angle {angle}");
            assert!(sxy.abs() > 0.5 * (sxx + syy) / 2.0, "angle {angle}");
        }
    }

    #[test]
    fn test_reflection_through_centroid_same_angle() {
        let cloud = elongated_cloud(0.4);
        let center = planar_centroid(&cloud).unwrap();
        let reflected: Vec<Coord<f64>> = cloud
            .iter()
            .map(|p| Coord { x: 2.0 * center.x - p.x, y: 2.0 * center.y - p.y })
            .collect();

        let a = principal_axis_angle(&cloud, center);
        let b = principal_axis_angle(&reflected, center);
        assert!(((a - b).rem_euclid(PI)).min(PI - (a - b).rem_euclid(PI)) < 1e-9);
    }

    #[test]
    fn test_rotating_cloud_shifts_estimate() {
        let base = elongated_cloud(0.0);
        let turned = elongated_cloud(0.5);
        let origin = Coord { x: 0.0, y: 0.0 };
        let a = principal_axis_angle(&base, origin);
        let b = principal_axis_angle(&turned, origin);
        // Turning the cloud by θ turns the estimate by -θ (mod π/2).
        assert!(same_axes(b, a - 0.5));
    }

    #[test]
    fn test_rotate_about_quarter_turn() {
        let p = rotate_about(Coord { x: 2.0, y: 1.0 }, Coord { x: 1.0, y: 1.0 }, FRAC_PI_2);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }
}
