//! # Settlement Generator
//!
//! The generation context. Owns the seed, configuration, terrain, tile
//! interning table, junction table and one memo cache per stage boundary.
//!
//! ## Pipeline
//!
//! ```text
//!   tile ──> sites ──> site links ──> tile links ──> roads ──> tile roads ──> road area
//!                                                                                 │
//!   site ─────────────────────────────────────────── blocked scope (terrain + road areas)
//!                                                                                 │
//!                                                                                 ▼
//!                                                                   settlement (town wall)
//! ```
//!
//! Every stage is a pure function of its key plus the stages below it, so
//! results do not depend on which tile is asked for first. Stages call each
//! other through the caches; computations run outside the cache locks, so
//! a stage may freely re-enter the caches below it from any thread.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use palisade_core::{Area, CacheStats, MemoCache, Shape, Tile, TileCoord, TileGrid, WorldSeed};
use tracing::debug;

use crate::blocked::{BlockedArea, BlockedAreaBuilder};
use crate::config::SettlementConfig;
use crate::connection::{site_connections, tile_connections, UnorderedConnection};
use crate::error::SettlementResult;
use crate::road::{synthesize_road, JunctionTable, Road};
use crate::road_shape::{road_area, road_touches};
use crate::settlement::Settlement;
use crate::site::{place_sites, Site};
use crate::terrain::{HeightSampler, TerrainClassifier};
use crate::wall::TownWall;

/// Undirected link between two sites.
pub type SiteLink = UnorderedConnection<Site>;

/// Snapshot of every stage cache.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeneratorStats {
    /// Tile → sites.
    pub sites: CacheStats,
    /// Site → linked sites.
    pub site_links: CacheStats,
    /// Tile → links touching it.
    pub tile_links: CacheStats,
    /// Link → road.
    pub roads: CacheStats,
    /// Tile → roads crossing it.
    pub tile_roads: CacheStats,
    /// Tile → road area.
    pub road_areas: CacheStats,
    /// Site → settlement.
    pub settlements: CacheStats,
    /// Junctions created.
    pub junctions: usize,
    /// Tiles interned.
    pub tiles: usize,
}

impl GeneratorStats {
    fn caches(&self) -> [CacheStats; 7] {
        [
            self.sites,
            self.site_links,
            self.tile_links,
            self.roads,
            self.tile_roads,
            self.road_areas,
            self.settlements,
        ]
    }

    /// Computations run across all stages.
    #[must_use]
    pub fn total_misses(&self) -> u64 {
        self.caches().iter().map(|c| c.misses).sum()
    }

    /// Lookups answered from cache across all stages.
    #[must_use]
    pub fn total_hits(&self) -> u64 {
        self.caches().iter().map(|c| c.hits).sum()
    }
}

/// Deterministic, memoized settlement generation over an infinite world.
///
/// `SettlementGenerator` is `Send + Sync`; share it behind an `Arc` to
/// generate tiles from many threads.
pub struct SettlementGenerator {
    seed: WorldSeed,
    config: SettlementConfig,
    terrain: TerrainClassifier,
    grid: TileGrid,
    junctions: JunctionTable,
    /// Tiles searched around a tile for roads that may cross it.
    road_reach: i32,

    sites: MemoCache<TileCoord, Arc<[Site]>>,
    site_links: MemoCache<Site, Arc<[Site]>>,
    tile_links: MemoCache<TileCoord, Arc<BTreeSet<SiteLink>>>,
    roads: MemoCache<SiteLink, Road>,
    tile_roads: MemoCache<TileCoord, Arc<[Road]>>,
    road_areas: MemoCache<TileCoord, Arc<Area>>,
    settlements: MemoCache<Site, Arc<Settlement>>,
}

impl SettlementGenerator {
    /// Creates a generator over the given terrain.
    ///
    /// # Errors
    ///
    /// Returns the first configuration rule `config` violates.
    pub fn new(
        seed: WorldSeed,
        config: SettlementConfig,
        sampler: impl HeightSampler + 'static,
    ) -> SettlementResult<Self> {
        Self::with_sampler(seed, config, Arc::new(sampler))
    }

    /// Creates a generator over a shared terrain sampler.
    ///
    /// # Errors
    ///
    /// Returns the first configuration rule `config` violates.
    pub fn with_sampler(
        seed: WorldSeed,
        config: SettlementConfig,
        sampler: Arc<dyn HeightSampler>,
    ) -> SettlementResult<Self> {
        config.validate()?;

        let capacity = config.cache_capacity;
        let generator = Self {
            seed,
            terrain: TerrainClassifier::from_config(sampler, &config),
            grid: TileGrid::new(config.tile_size),
            junctions: JunctionTable::new(),
            road_reach: road_reach(&config),
            sites: MemoCache::with_capacity(capacity),
            site_links: MemoCache::with_capacity(capacity),
            tile_links: MemoCache::with_capacity(capacity),
            roads: MemoCache::with_capacity(capacity),
            tile_roads: MemoCache::with_capacity(capacity),
            road_areas: MemoCache::with_capacity(capacity),
            settlements: MemoCache::with_capacity(capacity),
            config,
        };
        debug!(seed = generator.seed.value(), road_reach = generator.road_reach, "Settlement generator ready");
        Ok(generator)
    }

    /// The world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// The terrain classifier.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainClassifier {
        &self.terrain
    }

    /// The tile interning table.
    #[must_use]
    pub const fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// The junction table.
    #[must_use]
    pub const fn junctions(&self) -> &JunctionTable {
        &self.junctions
    }

    /// Canonical handle of the tile containing a world position.
    #[must_use]
    pub fn tile_at(&self, x: i32, z: i32) -> Tile {
        self.grid.tile_at(x, z)
    }

    /// Sites of a tile, in placement order.
    pub fn place_sites(&self, tile: impl Into<TileCoord>) -> Arc<[Site]> {
        self.sites.get_or_compute(&tile.into(), |&coord| {
            let tile = self.grid.tile(coord);
            let blocked = BlockedArea::terrain_only(self.terrain.clone());
            let sites = place_sites(tile.coord(), self.seed, &self.config, &blocked);
            debug!(tile = %coord, count = sites.len(), "Placed sites");
            sites.into()
        })
    }

    /// Sites `site` is linked to, sorted.
    pub fn connections(&self, site: &Site) -> Arc<[Site]> {
        self.site_links.get_or_compute(site, |site| {
            let linked = site_connections(
                site,
                self.config.tile_size,
                self.config.max_connect_distance,
                |coord| self.place_sites(coord),
            );
            debug!(center = ?site.center(), count = linked.len(), "Linked site");
            linked.into()
        })
    }

    /// Every link with at least one endpoint in the tile.
    pub fn connections_for_tile(&self, tile: impl Into<TileCoord>) -> Arc<BTreeSet<SiteLink>> {
        self.tile_links.get_or_compute(&tile.into(), |&coord| {
            let links = tile_connections(
                coord,
                self.config.tile_size,
                |c| self.place_sites(c),
                |site| self.connections(site),
            );
            debug!(tile = %coord, count = links.len(), "Collected tile links");
            Arc::new(links)
        })
    }

    /// The road of a link, running from its lower site to its higher one.
    pub fn road(&self, link: &SiteLink) -> Road {
        self.roads.get_or_compute(link, |link| {
            let road = synthesize_road(link, self.seed, &self.config.road, &self.junctions);
            debug!(
                start = ?road.start().pos(),
                end = ?road.end().pos(),
                points = road.interior().len(),
                "Synthesized road"
            );
            road
        })
    }

    /// The road between two sites, running from `from` to `to`.
    pub fn road_between(&self, from: &Site, to: &Site) -> Road {
        let road = self.road(&UnorderedConnection::new(*from, *to));
        if road.start().pos() == from.center() {
            road
        } else {
            road.reversed()
        }
    }

    /// Every road whose stroked bounds reach into the tile.
    pub fn roads_for_tile(&self, tile: impl Into<TileCoord>) -> Arc<[Road]> {
        self.tile_roads.get_or_compute(&tile.into(), |&coord| {
            let bounds = coord.bounds(self.config.tile_size);
            let mut links = BTreeSet::new();
            for nearby in coord.square(self.road_reach) {
                links.extend(self.connections_for_tile(nearby).iter().copied());
            }
            let roads: Vec<Road> = links
                .iter()
                .map(|link| self.road(link))
                .filter(|road| road_touches(road, self.config.road.smoothness, &bounds))
                .collect();
            debug!(tile = %coord, count = roads.len(), "Collected tile roads");
            roads.into()
        })
    }

    /// The road area of a tile.
    pub fn road_area(&self, tile: impl Into<TileCoord>) -> Arc<Area> {
        self.road_areas.get_or_compute(&tile.into(), |&coord| {
            let roads = self.roads_for_tile(coord);
            let area = road_area(&coord.bounds(self.config.tile_size), &roads, &self.config.road);
            debug!(tile = %coord, shapes = area.len(), "Built road area");
            Arc::new(area)
        })
    }

    /// The blocked scope a site's wall is built against: terrain plus the
    /// road areas of every tile the site overlaps.
    ///
    /// The plaza at the site's own center is left out. It lies inside the
    /// wall, and on a small site it would cover every tower candidate.
    #[must_use]
    pub fn settlement_blocked_area(&self, site: &Site) -> BlockedArea {
        let center = site.center().to_point();
        let size = self.config.tile_size;
        let bounds = site.bounds();
        let low = TileCoord::containing(bounds.min.x.floor() as i32, bounds.min.z.floor() as i32, size);
        let high = TileCoord::containing(bounds.max.x.ceil() as i32, bounds.max.z.ceil() as i32, size);

        let mut builder = BlockedAreaBuilder::new(self.terrain.clone());
        for z in low.z..=high.z {
            for x in low.x..=high.x {
                builder.add_area_where(&self.road_area(TileCoord::new(x, z)), |shape| {
                    !matches!(shape, Shape::Circle(plaza) if plaza.center == center)
                });
            }
        }
        builder.freeze()
    }

    /// The finished settlement of a site.
    pub fn settlement(&self, site: &Site) -> Arc<Settlement> {
        self.settlements.get_or_compute(site, |site| {
            let blocked = self.settlement_blocked_area(site);
            let settlement = Settlement::build(*site, self.seed, &self.config.wall, &blocked);
            debug!(
                center = ?site.center(),
                towers = settlement.wall.towers.len(),
                gates = settlement.wall.gate_segments().count(),
                closed = settlement.is_walled(),
                "Built settlement"
            );
            Arc::new(settlement)
        })
    }

    /// The town wall of a site.
    pub fn town_wall(&self, site: &Site) -> TownWall {
        self.settlement(site).wall.clone()
    }

    /// Settlements of every site in a tile, in placement order.
    pub fn settlements_for_tile(&self, tile: impl Into<TileCoord>) -> Vec<Arc<Settlement>> {
        self.place_sites(tile)
            .iter()
            .map(|site| self.settlement(site))
            .collect()
    }

    /// Drops every cached result, junction and interned tile.
    pub fn expunge_cache(&self) {
        self.sites.invalidate_all();
        self.site_links.invalidate_all();
        self.tile_links.invalidate_all();
        self.roads.invalidate_all();
        self.tile_roads.invalidate_all();
        self.road_areas.invalidate_all();
        self.settlements.invalidate_all();
        self.junctions.clear();
        self.grid.clear();
        debug!("Expunged settlement caches");
    }

    /// Snapshot of every stage cache.
    #[must_use]
    pub fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            sites: self.sites.stats(),
            site_links: self.site_links.stats(),
            tile_links: self.tile_links.stats(),
            roads: self.roads.stats(),
            tile_roads: self.tile_roads.stats(),
            road_areas: self.road_areas.stats(),
            settlements: self.settlements.stats(),
            junctions: self.junctions.len(),
            tiles: self.grid.interned_count(),
        }
    }
}

impl fmt::Debug for SettlementGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettlementGenerator")
            .field("seed", &self.seed)
            .field("tile_size", &self.config.tile_size)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Tiles to search around a tile for roads that may cross it.
///
/// Linked sites sit in adjacent tiles, so a road spans at most two tiles
/// per axis before jitter. Its lateral swing is bounded by 1.5 × length ×
/// randomness; the reach adds whole tiles until that swing plus the widest
/// plaza fits.
fn road_reach(config: &SettlementConfig) -> i32 {
    let size = f64::from(config.tile_size);
    let longest = 2.0 * size * std::f64::consts::SQRT_2;
    let road = &config.road;
    let swing = 1.5 * longest * road.randomness + road.max_width * road.plaza_factor.max(0.5);
    1 + (swing / size).ceil() as i32
}
