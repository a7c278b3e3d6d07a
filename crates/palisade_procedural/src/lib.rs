//! # Palisade Procedural
//!
//! Deterministic settlement layout for an infinite, tiled world: where
//! settlements sit, which of them are linked by roads, what those roads
//! look like, and how each settlement is walled in.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: a seed and a tile coordinate fully determine the
//!    output, whatever order tiles are queried in
//! 2. **Lazy**: nothing is generated until asked for, then cached
//! 3. **Degrading, not failing**: crowded tiles, isolated sites and walls
//!    cut off by water are valid, if smaller, results
//!
//! ## Core Components
//!
//! - `SettlementGenerator`: the cached pipeline, entry point for callers
//! - `place_sites`: seeded rejection sampling of sites per tile
//! - `site_connections` / `tile_connections`: which sites get roads
//! - `synthesize_road` / `road_area`: road polylines and their shapes
//! - `generate_wall`: tower and gate ring around a settlement
//! - `BlockedArea`: terrain plus reserved shapes, the "is this usable" oracle
//!
//! ## Example
//!
//! ```rust,ignore
//! use palisade_procedural::{FlatTerrain, SettlementConfig, SettlementGenerator};
//! use palisade_core::{TileCoord, WorldSeed};
//!
//! let generator = SettlementGenerator::new(
//!     WorldSeed::from_phrase("asd"),
//!     SettlementConfig::default(),
//!     FlatTerrain(10),
//! )?;
//!
//! for site in generator.place_sites(TileCoord::new(0, 0)).iter() {
//!     let settlement = generator.settlement(site);
//!     // Roads and water can leave a ring open or empty.
//!     if settlement.is_walled() {
//!         println!("{} towers, {} gates", settlement.wall.towers.len(), settlement.wall.gate_segments().count());
//!     }
//! }
//! let roads = generator.road_area(TileCoord::new(0, 0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod blocked;
pub mod config;
pub mod connection;
pub mod error;
pub mod generator;
pub mod road;
pub mod road_shape;
pub mod settlement;
pub mod site;
pub mod terrain;
pub mod wall;

pub use blocked::{BlockedArea, BlockedAreaBuilder};
pub use config::{RoadConfig, SettlementConfig, WallConfig};
pub use connection::{site_connections, tile_connections, UnorderedConnection};
pub use error::{SettlementError, SettlementResult};
pub use generator::{GeneratorStats, SettlementGenerator, SiteLink};
pub use road::{synthesize_road, Junction, JunctionTable, Road};
pub use road_shape::{road_area, road_curves, road_touches};
pub use settlement::Settlement;
pub use site::{place_sites, Site};
pub use terrain::{FlatTerrain, HeightSampler, NoiseTerrain, TerrainClass, TerrainClassifier};
pub use wall::{generate_wall, Tower, TowerKind, TownWall, WallSegment, WallSpan};
