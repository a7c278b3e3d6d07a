//! Cubic curves for smoothing polylines.

use serde::{Deserialize, Serialize};

use super::{Point, Rect};

/// Cubic Bézier segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    /// Start point.
    pub start: Point,
    /// First control point.
    pub control1: Point,
    /// Second control point.
    pub control2: Point,
    /// End point.
    pub end: Point,
}

impl CubicBezier {
    /// Evaluates the curve at `t` in `[0, 1]`.
    #[must_use]
    pub fn at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        self.start * (u * u * u)
            + self.control1 * (3.0 * u * u * t)
            + self.control2 * (3.0 * u * t * t)
            + self.end * (t * t * t)
    }

    /// Samples `steps + 1` evenly spaced points, both ends included.
    #[must_use]
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.at(i as f64 / steps as f64))
            .collect()
    }

    /// Bounding box of the control hull, which always contains the curve.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.start, self.end)
            .including(self.control1)
            .including(self.control2)
    }
}

/// Fits a Catmull-Rom style chain of cubic segments through `points`.
///
/// Each segment `p1 -> p2` takes its control points from the neighbors:
/// `c1 = p1 + (p2 - p0) * s/2` and `c2 = p2 - (p3 - p1) * s/2`, where the
/// missing neighbor at either end is the endpoint itself. `smoothness` of
/// `1/3` gives the classic uniform Catmull-Rom spline; `0` gives straight
/// segments.
#[must_use]
pub fn catmull_rom(points: &[Point], smoothness: f64) -> Vec<CubicBezier> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let k = smoothness * 0.5;
    (0..n - 1)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(n - 1)];
            CubicBezier {
                start: p1,
                control1: p1 + (p2 - p0) * k,
                control2: p2 - (p3 - p1) * k,
                end: p2,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_passes_through_points() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(20.0, -3.0),
            Point::new(30.0, 0.0),
        ];
        let curves = catmull_rom(&pts, 0.5);
        assert_eq!(curves.len(), 3);
        for (i, c) in curves.iter().enumerate() {
            assert_eq!(c.at(0.0), pts[i]);
            assert_eq!(c.at(1.0), pts[i + 1]);
        }
    }

    #[test]
    fn test_zero_smoothness_is_straight() {
        let pts = [Point::new(0.0, 0.0), Point::new(4.0, 4.0), Point::new(8.0, 0.0)];
        let curve = catmull_rom(&pts, 0.0)[0];
        let mid = curve.at(0.5);
        assert!((mid.x - 2.0).abs() < 1e-9 && (mid.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_flatten_stays_in_hull() {
        let pts = [Point::new(0.0, 0.0), Point::new(5.0, 9.0), Point::new(10.0, 0.0)];
        for curve in catmull_rom(&pts, 0.8) {
            let hull = curve.bounding_box();
            let samples = curve.flatten(16);
            assert_eq!(samples.len(), 17);
            assert!(samples.iter().all(|&p| hull.expanded(1e-9).contains(p)));
        }
    }

    #[test]
    fn test_degenerate_input() {
        assert!(catmull_rom(&[], 0.5).is_empty());
        assert!(catmull_rom(&[Point::ZERO], 0.5).is_empty());
    }
}
