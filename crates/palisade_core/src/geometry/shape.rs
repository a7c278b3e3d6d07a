//! Blocking shapes and their union.

use serde::{Deserialize, Serialize};

use super::{segment_distance_squared, segment_rect_distance_squared, segments_intersect, Point, Rect};

/// Filled circle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center point.
    pub center: Point,
    /// Radius in world units.
    pub radius: f64,
}

impl Circle {
    /// Creates a new circle.
    #[inline]
    #[must_use]
    pub const fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// True if the point is inside or on the circle.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.center.distance_squared(p) <= self.radius * self.radius
    }

    /// True if the circle overlaps the rectangle.
    #[inline]
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.contains(rect.clamp(self.center))
    }

    /// Bounding rectangle.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::centered(self.center, self.radius)
    }
}

/// Simple polygon (even-odd fill).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices in order; the last connects back to the first.
    pub vertices: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon from its vertices.
    #[must_use]
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// A polygon needs at least 3 vertices to enclose anything.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Iterates the closed edge loop.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Ray-casting point test.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        if !self.is_closed() {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.z > p.z) != (b.z > p.z) && p.x < (b.x - a.x) * (p.z - a.z) / (b.z - a.z) + a.x {
                inside = !inside;
            }
        }
        inside
    }

    /// True if the polygon overlaps the rectangle.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        if !self.is_closed() || !self.bounding_box().is_some_and(|b| b.intersects(rect)) {
            return false;
        }
        if self.vertices.iter().any(|&v| rect.contains(v)) {
            return true;
        }
        let corners = rect.corners();
        if corners.iter().any(|&c| self.contains(c)) {
            return true;
        }
        self.edges().any(|(a, b)| {
            (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
        })
    }

    /// Bounding rectangle, `None` for an empty polygon.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        Rect::bounding(self.vertices.iter().copied())
    }
}

/// Polyline stroked with round caps and joins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Polyline points.
    pub points: Vec<Point>,
    /// Half of the stroke width.
    pub half_width: f64,
}

impl Stroke {
    /// Creates a stroke of the given full width.
    #[must_use]
    pub fn new(points: Vec<Point>, width: f64) -> Self {
        Self {
            points,
            half_width: width * 0.5,
        }
    }

    fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let single = (self.points.len() == 1).then(|| (self.points[0], self.points[0]));
        self.points.windows(2).map(|w| (w[0], w[1])).chain(single)
    }

    /// True if the point lies within `half_width` of the polyline.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let limit = self.half_width * self.half_width;
        self.segments().any(|(a, b)| segment_distance_squared(p, a, b) <= limit)
    }

    /// True if the stroked area overlaps the rectangle.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        if !self.bounding_box().is_some_and(|b| b.intersects(rect)) {
            return false;
        }
        let limit = self.half_width * self.half_width;
        self.segments()
            .any(|(a, b)| segment_rect_distance_squared(a, b, rect) <= limit)
    }

    /// Bounding rectangle including the stroke width.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        Rect::bounding(self.points.iter().copied()).map(|r| r.expanded(self.half_width))
    }
}

/// One blocking shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Circle.
    Circle(Circle),
    /// Polygon.
    Polygon(Polygon),
    /// Stroked polyline.
    Stroke(Stroke),
}

impl Shape {
    /// True if the point is covered by the shape.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Self::Rect(r) => r.contains(p),
            Self::Circle(c) => c.contains(p),
            Self::Polygon(poly) => poly.contains(p),
            Self::Stroke(s) => s.contains(p),
        }
    }

    /// True if the shape overlaps the rectangle.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        match self {
            Self::Rect(r) => r.intersects(rect),
            Self::Circle(c) => c.intersects_rect(rect),
            Self::Polygon(poly) => poly.intersects_rect(rect),
            Self::Stroke(s) => s.intersects_rect(rect),
        }
    }

    /// Bounding rectangle, `None` for a degenerate shape with no points.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),
            Self::Circle(c) => Some(c.bounding_box()),
            Self::Polygon(poly) => poly.bounding_box(),
            Self::Stroke(s) => s.bounding_box(),
        }
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Self::Polygon(polygon)
    }
}

impl From<Stroke> for Shape {
    fn from(stroke: Stroke) -> Self {
        Self::Stroke(stroke)
    }
}

/// Union of shapes.
///
/// Shapes are only ever added; an area answers "is this covered" against the
/// union of everything added so far.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    shapes: Vec<Shape>,
}

impl Area {
    /// Creates an empty area.
    #[must_use]
    pub const fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Adds a shape to the union.
    pub fn push(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    /// Adds every shape of another area.
    pub fn extend(&mut self, other: &Self) {
        self.shapes.extend(other.shapes.iter().cloned());
    }

    /// The shapes making up the union, in insertion order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// True if nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True if any shape covers the point.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.shapes.iter().any(|s| s.contains(p))
    }

    /// True if any shape overlaps the rectangle.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.shapes.iter().any(|s| s.intersects_rect(rect))
    }

    /// Bounding rectangle of the whole union.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .filter_map(Shape::bounding_box)
            .reduce(Rect::union)
    }
}

impl FromIterator<Shape> for Area {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect_at(x: f64, z: f64) -> Rect {
        Rect::new(Point::new(x, z), Point::new(x + 1.0, z + 1.0))
    }

    #[test]
    fn test_circle_rect() {
        let c = Circle::new(Point::new(0.0, 0.0), 2.0);
        assert!(c.intersects_rect(&unit_rect_at(1.0, 1.0)));
        assert!(!c.intersects_rect(&unit_rect_at(2.0, 2.0)));
    }

    #[test]
    fn test_polygon_contains_and_intersects() {
        let tri = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ]);
        assert!(tri.contains(Point::new(2.0, 2.0)));
        assert!(!tri.contains(Point::new(8.0, 8.0)));
        // Rectangle fully inside, no vertices inside the rect
        assert!(tri.intersects_rect(&unit_rect_at(1.0, 1.0)));
        // Rectangle straddling the hypotenuse
        assert!(tri.intersects_rect(&unit_rect_at(4.8, 4.8)));
        assert!(!tri.intersects_rect(&unit_rect_at(6.0, 6.0)));
    }

    #[test]
    fn test_stroke_contains() {
        let road = Stroke::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)], 4.0);
        assert!(road.contains(Point::new(5.0, 1.9)));
        assert!(!road.contains(Point::new(5.0, 2.1)));
        assert!(road.contains(Point::new(-1.5, 0.0)), "Round caps extend past the ends");
        assert!(road.intersects_rect(&unit_rect_at(4.0, 2.5).expanded(0.6)));
        assert!(!road.intersects_rect(&unit_rect_at(4.0, 3.0)));
    }

    #[test]
    fn test_area_union() {
        let mut area = Area::new();
        assert!(area.is_empty());
        assert!(!area.contains(Point::ZERO));

        area.push(Circle::new(Point::ZERO, 1.0));
        area.push(unit_rect_at(5.0, 5.0));
        assert_eq!(area.len(), 2);
        assert!(area.contains(Point::ZERO));
        assert!(area.contains(Point::new(5.5, 5.5)));
        assert!(!area.contains(Point::new(3.0, 3.0)));

        let bounds = area.bounding_box().unwrap();
        assert_eq!(bounds.min, Point::new(-1.0, -1.0));
        assert_eq!(bounds.max, Point::new(6.0, 6.0));
    }
}
