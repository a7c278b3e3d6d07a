//! # Blocking Oracle
//!
//! Answers "is this usable land" for a generation scope. A position is
//! blocked if the terrain there is not land, or if it is covered by any shape
//! reserved in the scope (roads, settlement discs, ...).
//!
//! ## Lifecycle
//!
//! ```text
//!   BlockedAreaBuilder ──add()──> ... ──freeze()──> BlockedArea (read-only, Send + Sync)
//! ```
//!
//! Shapes are only ever added, so every query becomes monotonically more
//! restrictive while the builder grows. Queries only happen on the frozen
//! value, which forces callers to finish all additions first.

use std::sync::Arc;

use palisade_core::{Area, Point, Rect, Shape, WorldPos};

use crate::terrain::{TerrainClass, TerrainClassifier};

/// Append-only accumulator of reserved shapes for one scope.
#[derive(Debug)]
pub struct BlockedAreaBuilder {
    terrain: TerrainClassifier,
    area: Area,
}

impl BlockedAreaBuilder {
    /// Creates an empty scope over the given terrain.
    #[must_use]
    pub fn new(terrain: TerrainClassifier) -> Self {
        Self {
            terrain,
            area: Area::new(),
        }
    }

    /// Reserves a shape.
    pub fn add(&mut self, shape: impl Into<Shape>) -> &mut Self {
        self.area.push(shape);
        self
    }

    /// Reserves every shape of an area.
    pub fn add_area(&mut self, area: &Area) -> &mut Self {
        self.area.extend(area);
        self
    }

    /// Reserves the shapes of an area that pass `keep`.
    pub fn add_area_where(&mut self, area: &Area, mut keep: impl FnMut(&Shape) -> bool) -> &mut Self {
        for shape in area.shapes().iter().filter(|s| keep(s)) {
            self.area.push(shape.clone());
        }
        self
    }

    /// Number of reserved shapes so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.area.len()
    }

    /// True if no shape has been reserved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area.is_empty()
    }

    /// Finishes the scope.
    #[must_use]
    pub fn freeze(self) -> BlockedArea {
        BlockedArea {
            terrain: self.terrain,
            area: Arc::new(self.area),
        }
    }
}

/// Frozen blocking scope.
///
/// Cloning is cheap; clones share the reserved shapes.
#[derive(Clone, Debug)]
pub struct BlockedArea {
    terrain: TerrainClassifier,
    area: Arc<Area>,
}

impl BlockedArea {
    /// A scope with no reserved shapes, blocking on terrain only.
    #[must_use]
    pub fn terrain_only(terrain: TerrainClassifier) -> Self {
        BlockedAreaBuilder::new(terrain).freeze()
    }

    /// Terrain class of the column at `(x, z)`.
    #[must_use]
    pub fn classify(&self, x: i32, z: i32) -> TerrainClass {
        self.terrain.classify(x, z)
    }

    /// Terrain height of the column at `(x, z)`.
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        self.terrain.height_at(x, z)
    }

    /// The reserved shapes.
    #[must_use]
    pub fn reserved(&self) -> &Area {
        &self.area
    }

    /// True if the position is not land or lies inside a reserved shape.
    #[must_use]
    pub fn is_blocked(&self, pos: WorldPos) -> bool {
        !self.classify(pos.x, pos.z).is_land() || self.area.contains(pos.to_point())
    }

    /// True if the continuous point is blocked.
    #[must_use]
    pub fn is_point_blocked(&self, p: Point) -> bool {
        self.is_blocked(p.round())
    }

    /// True if any column inside the rectangle is not land, or the rectangle
    /// overlaps a reserved shape.
    ///
    /// Scans every integer column of the rectangle.
    #[must_use]
    pub fn is_rect_blocked(&self, rect: &Rect) -> bool {
        if self.area.intersects_rect(rect) {
            return true;
        }
        let (x0, x1) = (rect.min.x.floor() as i32, rect.max.x.ceil() as i32);
        let (z0, z1) = (rect.min.z.floor() as i32, rect.max.z.ceil() as i32);
        (x0..=x1).any(|x| (z0..=z1).any(|z| !self.classify(x, z).is_land()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatTerrain;
    use palisade_core::{Circle, Stroke};

    fn land() -> TerrainClassifier {
        TerrainClassifier::new(Arc::new(FlatTerrain(10)), 0, 180)
    }

    #[test]
    fn test_terrain_only_blocks_water() {
        // Water for x < 0.
        let terrain = TerrainClassifier::new(Arc::new(|x: i32, _z: i32| if x < 0 { -1 } else { 10 }), 0, 180);
        let blocked = BlockedArea::terrain_only(terrain);

        assert!(blocked.is_blocked(WorldPos::new(-1, 0)));
        assert!(!blocked.is_blocked(WorldPos::new(0, 0)));
        assert!(
            blocked.is_rect_blocked(&Rect::new(Point::new(-0.5, 0.0), Point::new(5.0, 5.0))),
            "A rect reaching into water must be blocked"
        );
        assert!(!blocked.is_rect_blocked(&Rect::new(Point::new(1.0, 0.0), Point::new(5.0, 5.0))));
    }

    #[test]
    fn test_reserved_shapes_block() {
        let mut builder = BlockedAreaBuilder::new(land());
        builder
            .add(Circle::new(Point::new(100.0, 100.0), 10.0))
            .add(Stroke::new(vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)], 4.0));
        assert_eq!(builder.len(), 2);
        let blocked = builder.freeze();

        assert!(blocked.is_blocked(WorldPos::new(105, 100)));
        assert!(blocked.is_blocked(WorldPos::new(25, 1)));
        assert!(!blocked.is_blocked(WorldPos::new(25, 5)));
        assert!(blocked.is_rect_blocked(&Rect::centered(Point::new(25.0, 4.0), 2.5)));
        assert!(!blocked.is_rect_blocked(&Rect::centered(Point::new(200.0, 200.0), 3.0)));
    }

    #[test]
    fn test_adding_shapes_is_monotonic() {
        let query = Rect::centered(Point::new(10.0, 10.0), 3.0);
        let mut builder = BlockedAreaBuilder::new(land());
        let before = BlockedAreaBuilder::new(land()).freeze().is_rect_blocked(&query);

        builder.add(Rect::new(Point::new(0.0, 0.0), Point::new(8.0, 8.0)));
        let after = builder.freeze().is_rect_blocked(&query);

        assert!(!before);
        assert!(after, "Adding a shape can only make queries more restrictive");
    }

    #[test]
    fn test_frozen_area_is_shareable() {
        let mut builder = BlockedAreaBuilder::new(land());
        builder.add(Circle::new(Point::ZERO, 5.0));
        let blocked = builder.freeze();
        let clone = blocked.clone();

        std::thread::scope(|s| {
            s.spawn(|| assert!(clone.is_blocked(WorldPos::new(1, 1))));
        });
        assert!(blocked.is_blocked(WorldPos::new(1, 1)));
    }
}
