//! # Tile Grid
//!
//! The world is infinite and partitioned into square tiles of a fixed edge
//! length. Every generation stage is keyed by tile, so tile lookup must be
//! exact for negative coordinates too: `tile_at(-1, -1)` is tile `(-1, -1)`,
//! never `(0, 0)`.
//!
//! ## Interning
//!
//! `TileGrid` owns an interning table so equal coordinates always resolve to
//! the same shared [`Tile`] handle for the lifetime of the grid. The table is
//! explicit and owned by the generation context rather than process-global.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Default tile edge length in world units.
pub const DEFAULT_TILE_SIZE: i32 = 1024;

/// Tile coordinate (identifies a tile in the world grid).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    /// X coordinate (in tiles, not world units).
    pub x: i32,
    /// Z coordinate (in tiles, not world units).
    pub z: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world coordinates to the containing tile.
    ///
    /// Floors toward negative infinity.
    #[inline]
    #[must_use]
    pub const fn containing(world_x: i32, world_z: i32, tile_size: i32) -> Self {
        Self {
            x: world_x.div_euclid(tile_size),
            z: world_z.div_euclid(tile_size),
        }
    }

    /// Returns the neighboring tile in the given direction.
    ///
    /// Saturates at the edge of the coordinate range.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        let (dx, dz) = direction.offset();
        Self::new(self.x.saturating_add(dx), self.z.saturating_add(dz))
    }

    /// Returns the 8 surrounding tiles, in [`Direction::ALL`] order.
    #[must_use]
    pub fn neighbors(self) -> [Self; 8] {
        Direction::ALL.map(|direction| self.neighbor(direction))
    }

    /// Every tile within `radius` tiles on both axes, row by row.
    ///
    /// Near the edge of the coordinate range the saturated edge tile may
    /// repeat.
    pub fn square(self, radius: i32) -> impl Iterator<Item = Self> {
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius)
                .map(move |dx| Self::new(self.x.saturating_add(dx), self.z.saturating_add(dz)))
        })
    }

    /// Returns this tile followed by its 8 neighbors (the 3×3 block).
    #[must_use]
    pub fn neighborhood(self) -> [Self; 9] {
        let mut block = [self; 9];
        block[1..].copy_from_slice(&self.neighbors());
        block
    }

    /// World X of the tile's origin corner, clamped to the `i32` range.
    #[inline]
    #[must_use]
    pub const fn origin_x(self, tile_size: i32) -> i32 {
        self.x.saturating_mul(tile_size)
    }

    /// World Z of the tile's origin corner, clamped to the `i32` range.
    #[inline]
    #[must_use]
    pub const fn origin_z(self, tile_size: i32) -> i32 {
        self.z.saturating_mul(tile_size)
    }

    /// World X range covered by the tile, inclusive, clipped to `i32`.
    #[must_use]
    pub fn span_x(self, tile_size: i32) -> (i32, i32) {
        span(self.x, tile_size)
    }

    /// World Z range covered by the tile, inclusive, clipped to `i32`.
    #[must_use]
    pub fn span_z(self, tile_size: i32) -> (i32, i32) {
        span(self.z, tile_size)
    }

    /// The tile square in world space.
    #[must_use]
    pub fn bounds(self, tile_size: i32) -> Rect {
        let min = Point::new(
            f64::from(self.origin_x(tile_size)),
            f64::from(self.origin_z(tile_size)),
        );
        Rect::new(min, min + Point::new(f64::from(tile_size), f64::from(tile_size)))
    }
}

fn span(index: i32, tile_size: i32) -> (i32, i32) {
    let low = i64::from(index) * i64::from(tile_size);
    let high = low + i64::from(tile_size) - 1;
    let clip = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    (clip(low), clip(high))
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// The 8 neighbor directions: 4 cardinal and 4 diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -Z
    North,
    /// +X -Z
    NorthEast,
    /// +X
    East,
    /// +X +Z
    SouthEast,
    /// +Z
    South,
    /// -X +Z
    SouthWest,
    /// -X
    West,
    /// -X -Z
    NorthWest,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Tile offset `(dx, dz)` for this direction.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }
}

/// Canonical shared handle to an interned tile.
///
/// Cloning is cheap. Two handles from the same [`TileGrid`] with equal
/// coordinates point at the same allocation.
#[derive(Clone, Debug)]
pub struct Tile(Arc<TileData>);

#[derive(Debug)]
struct TileData {
    coord: TileCoord,
    size: i32,
}

impl Tile {
    /// Tile coordinate.
    #[inline]
    #[must_use]
    pub fn coord(&self) -> TileCoord {
        self.0.coord
    }

    /// Edge length in world units.
    #[inline]
    #[must_use]
    pub fn size(&self) -> i32 {
        self.0.size
    }

    /// The tile square in world space.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.0.coord.bounds(self.0.size)
    }

    /// True if both handles are the same interned allocation.
    #[inline]
    #[must_use]
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.same_handle(other) || (self.coord() == other.coord() && self.size() == other.size())
    }
}

impl Eq for Tile {}

impl From<&Tile> for TileCoord {
    fn from(tile: &Tile) -> Self {
        tile.coord()
    }
}

impl std::hash::Hash for Tile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.coord().hash(state);
    }
}

/// Infinite tile grid with an interning table.
#[derive(Debug)]
pub struct TileGrid {
    /// Tile edge length in world units.
    tile_size: i32,
    /// Interned tiles by coordinate.
    tiles: RwLock<HashMap<TileCoord, Tile>>,
}

impl TileGrid {
    /// Creates a grid with the given tile edge length.
    ///
    /// # Panics
    ///
    /// Panics if `tile_size` is not positive.
    #[must_use]
    pub fn new(tile_size: i32) -> Self {
        assert!(tile_size > 0, "tile size must be positive, got {tile_size}");
        Self {
            tile_size,
            tiles: RwLock::new(HashMap::new()),
        }
    }

    /// Tile edge length in world units.
    #[inline]
    #[must_use]
    pub const fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Coordinate of the tile containing a world position.
    #[inline]
    #[must_use]
    pub const fn coord_at(&self, world_x: i32, world_z: i32) -> TileCoord {
        TileCoord::containing(world_x, world_z, self.tile_size)
    }

    /// Returns the canonical handle for a coordinate, interning it on first use.
    #[must_use]
    pub fn tile(&self, coord: TileCoord) -> Tile {
        if let Some(tile) = self.tiles.read().get(&coord) {
            return tile.clone();
        }
        self.tiles
            .write()
            .entry(coord)
            .or_insert_with(|| {
                Tile(Arc::new(TileData {
                    coord,
                    size: self.tile_size,
                }))
            })
            .clone()
    }

    /// Returns the tile containing a world position.
    #[must_use]
    pub fn tile_at(&self, world_x: i32, world_z: i32) -> Tile {
        self.tile(self.coord_at(world_x, world_z))
    }

    /// Returns the neighbor of a tile in the given direction.
    #[must_use]
    pub fn neighbor(&self, tile: &Tile, direction: Direction) -> Tile {
        self.tile(tile.coord().neighbor(direction))
    }

    /// Number of interned tiles.
    #[must_use]
    pub fn interned_count(&self) -> usize {
        self.tiles.read().len()
    }

    /// Drops every interned tile. Outstanding handles stay valid.
    pub fn clear(&self) {
        self.tiles.write().clear();
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}
