//! # Palisade Core
//!
//! Deterministic building blocks for settlement generation on an infinite,
//! tile-partitioned world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: every random stream is derived from a `WorldSeed`
//!    plus the coordinates being generated, never from query order
//! 2. **Tiled**: the world is an infinite grid of square tiles
//! 3. **Memoized**: every pipeline stage can sit behind a `MemoCache`
//!
//! ## Core Components
//!
//! - `WorldSeed`: seed mixing and reproducible `ChaCha8Rng` streams
//! - `TileGrid`: tile lookup, neighbors and interning
//! - `geometry`: points, rectangles, blocking shapes and curves
//! - `MemoCache` / `Memoized`: bounded thread-safe memoization
//!
//! ## Example
//!
//! ```rust,ignore
//! use palisade_core::{TileGrid, WorldSeed, seed::purpose};
//!
//! let grid = TileGrid::new(1024);
//! let tile = grid.tile_at(-5, 2048);
//! let mut rng = WorldSeed::from_phrase("asd")
//!     .derive(purpose::SITES)
//!     .mix(&[tile.coord().x.into(), tile.coord().z.into()])
//!     .rng();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod geometry;
pub mod memo;
pub mod seed;
pub mod tile;

pub use geometry::{Area, Circle, CubicBezier, Point, Polygon, Rect, Shape, Stroke, WorldPos};
pub use memo::{CacheStats, MemoCache, Memoized};
pub use seed::WorldSeed;
pub use tile::{Direction, Tile, TileCoord, TileGrid, DEFAULT_TILE_SIZE};
