//! # Geometry
//!
//! Planar geometry on the world's X/Z plane.
//!
//! - [`WorldPos`]: integer world position (site centers, junctions, road points)
//! - [`Point`]: continuous position used while building shapes
//! - [`Rect`]: axis-aligned rectangle (tile bounds, tower footprints)
//! - [`Shape`] / [`Area`]: blocking shapes and their union
//! - [`CubicBezier`]: smoothed road pieces

mod curve;
mod shape;

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

pub use curve::{catmull_rom, CubicBezier};
pub use shape::{Area, Circle, Polygon, Shape, Stroke};

/// Integer world position on the X/Z plane.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WorldPos {
    /// World X.
    pub x: i32,
    /// World Z.
    pub z: i32,
}

impl WorldPos {
    /// Creates a new world position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Squared distance, exact in integer arithmetic.
    #[inline]
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dz = self.z as i64 - other.z as i64;
        dx * dx + dz * dz
    }

    /// Euclidean distance.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Converts to a continuous point.
    #[inline]
    #[must_use]
    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.z))
    }
}

/// Continuous position (or vector) on the X/Z plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// World X.
    pub x: f64,
    /// World Z.
    pub z: f64,
}

impl Point {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    /// Creates a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Unit vector at `angle` radians from +X toward +Z.
    #[inline]
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.z * other.z
    }

    /// 2D cross product (z component of the 3D cross).
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.z - self.z * other.x
    }

    /// Vector length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Squared distance to another point.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let d = self - other;
        d.dot(d)
    }

    /// Distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Unit-length copy, or zero for the zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Rotated 90° counter-clockwise.
    #[inline]
    #[must_use]
    pub fn perpendicular(self) -> Self {
        Self::new(-self.z, self.x)
    }

    /// Linear interpolation toward `other`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    /// Rounds to the nearest integer world position.
    #[inline]
    #[must_use]
    pub fn round(self) -> WorldPos {
        WorldPos::new(self.x.round() as i32, self.z.round() as i32)
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.z * rhs)
    }
}

impl From<WorldPos> for Point {
    fn from(pos: WorldPos) -> Self {
        pos.to_point()
    }
}

/// Axis-aligned rectangle. `min` is inclusive, `max` is the far corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner.
    pub min: Point,
    /// Maximum corner.
    pub max: Point,
}

impl Rect {
    /// Creates a rectangle from two corners in any order.
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.z.max(b.z)),
        }
    }

    /// Square of the given half extent around a center.
    #[must_use]
    pub fn centered(center: Point, half_extent: f64) -> Self {
        let half = Point::new(half_extent, half_extent);
        Self::new(center - half, center + half)
    }

    /// Smallest rectangle containing every point, or `None` for no points.
    #[must_use]
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |rect, p| rect.including(p)))
    }

    /// Grows the rectangle to include a point.
    #[must_use]
    pub fn including(self, p: Point) -> Self {
        Self {
            min: Point::new(self.min.x.min(p.x), self.min.z.min(p.z)),
            max: Point::new(self.max.x.max(p.x), self.max.z.max(p.z)),
        }
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.including(other.min).including(other.max)
    }

    /// Grows every side by `margin`.
    #[must_use]
    pub fn expanded(self, margin: f64) -> Self {
        let m = Point::new(margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Width along X.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Depth along Z.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }

    /// Center point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point {
        self.min.lerp(self.max, 0.5)
    }

    /// True if the point is inside or on the border.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    /// True if the rectangles overlap or touch.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    /// The four corners, counter-clockwise from `min`.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.z),
            self.max,
            Point::new(self.min.x, self.max.z),
        ]
    }

    /// Closest point of the rectangle to `p`.
    #[inline]
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.min.x, self.max.x),
            p.z.clamp(self.min.z, self.max.z),
        )
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn segment_distance_squared(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// True if segments `a`-`b` and `c`-`d` share at least one point.
#[must_use]
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    fn orient(p: Point, q: Point, r: Point) -> f64 {
        (q - p).cross(r - p)
    }
    fn on_segment(p: Point, q: Point, r: Point) -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.z >= p.z.min(q.z) && r.z <= p.z.max(q.z)
    }

    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

/// Squared distance between segment `a`-`b` and a rectangle (zero if they touch).
#[must_use]
pub fn segment_rect_distance_squared(a: Point, b: Point, rect: &Rect) -> f64 {
    if rect.contains(a) || rect.contains(b) {
        return 0.0;
    }
    let corners = rect.corners();
    let mut best = f64::INFINITY;
    for i in 0..4 {
        let (c, d) = (corners[i], corners[(i + 1) % 4]);
        if segments_intersect(a, b, c, d) {
            return 0.0;
        }
        best = best.min(segment_distance_squared(c, a, b));
    }
    best.min(a.distance_squared(rect.clamp(a)))
        .min(b.distance_squared(rect.clamp(b)))
}
