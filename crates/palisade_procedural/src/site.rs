//! # Site Placement
//!
//! Seeded rejection sampling of settlement sites, one tile at a time.
//!
//! ## Algorithm
//!
//! ```text
//!   rng = ChaCha8(seed ⊕ SITES ⊕ (tx, tz))
//!   count ~ U[min_sites, max_sites]
//!   for each slot (count times):
//!       up to max_tries:
//!           center ~ U(tile square)
//!           u ~ U[√min_radius, √max_radius];  radius = u²
//!           accept if far enough from accepted sites and center is unblocked
//!       (slot dropped if every try fails)
//! ```
//!
//! Squaring a uniform draw over the square roots biases radii toward small
//! settlements. The result depends only on the seed and the tile coordinate.

use palisade_core::seed::purpose;
use palisade_core::{Circle, Rect, TileCoord, WorldPos, WorldSeed};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::blocked::BlockedArea;
use crate::config::SettlementConfig;

/// A placed settlement seed.
///
/// Identity is by value: two sites with the same center and radius are the
/// same site. Ordering is by center, then radius.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Site {
    center: WorldPos,
    radius: u32,
}

impl Site {
    /// Creates a site.
    #[inline]
    #[must_use]
    pub const fn new(center: WorldPos, radius: u32) -> Self {
        Self { center, radius }
    }

    /// World-space center.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> WorldPos {
        self.center
    }

    /// Radius in world units.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Diameter in world units, saturating at `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn diameter(&self) -> u32 {
        self.radius.saturating_mul(2)
    }

    /// Tile containing the center.
    #[inline]
    #[must_use]
    pub const fn tile(&self, tile_size: i32) -> TileCoord {
        TileCoord::containing(self.center.x, self.center.z, tile_size)
    }

    /// Squared distance between centers.
    #[inline]
    #[must_use]
    pub const fn distance_squared(&self, other: &Self) -> i64 {
        self.center.distance_squared(other.center)
    }

    /// Distance between centers.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.center.distance(other.center)
    }

    /// The settlement disc.
    #[must_use]
    pub fn disc(&self) -> Circle {
        Circle::new(self.center.to_point(), f64::from(self.radius))
    }

    /// Bounding square of the settlement disc.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.center.to_point(), f64::from(self.radius))
    }
}

/// Places the sites of one tile.
///
/// `blocked` is consulted for the site centers only. Returns sites in
/// placement order; the list may be shorter than the drawn slot count, or
/// empty.
#[must_use]
pub fn place_sites(
    tile: TileCoord,
    seed: WorldSeed,
    config: &SettlementConfig,
    blocked: &BlockedArea,
) -> Vec<Site> {
    let mut rng = seed
        .derive(purpose::SITES)
        .mix(&[i64::from(tile.x), i64::from(tile.z)])
        .rng();

    let (x_range, z_range) = (tile.span_x(config.tile_size), tile.span_z(config.tile_size));
    let min_distance_sq = i64::from(config.min_site_distance).pow(2);
    let sqrt_min = f64::from(config.min_radius).sqrt();
    let sqrt_max = f64::from(config.max_radius).sqrt();

    let count = rng.gen_range(config.min_sites_per_tile..=config.max_sites_per_tile);
    let mut sites: Vec<Site> = Vec::with_capacity(count as usize);

    for slot in 0..count {
        let mut placed = false;
        for _ in 0..config.max_placement_tries {
            let center = WorldPos::new(
                rng.gen_range(x_range.0..=x_range.1),
                rng.gen_range(z_range.0..=z_range.1),
            );
            let u = rng.gen_range(sqrt_min..=sqrt_max);
            let radius = ((u * u).round() as u32).clamp(config.min_radius, config.max_radius);

            let spaced = sites
                .iter()
                .all(|s| s.center.distance_squared(center) >= min_distance_sq);
            if spaced && !blocked.is_blocked(center) {
                sites.push(Site::new(center, radius));
                placed = true;
                break;
            }
        }
        if !placed {
            trace!(%tile, slot, "Placement slot dropped after {} tries", config.max_placement_tries);
        }
    }

    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{FlatTerrain, TerrainClassifier};
    use std::sync::Arc;

    fn flat_land() -> BlockedArea {
        BlockedArea::terrain_only(TerrainClassifier::new(Arc::new(FlatTerrain(10)), 0, 180))
    }

    #[test]
    fn test_site_tile_floors_negative() {
        let site = Site::new(WorldPos::new(-1, 1023), 10);
        assert_eq!(site.tile(1024), TileCoord::new(-1, 0));
        assert_eq!(site.diameter(), 20);
    }

    #[test]
    fn test_diameter_saturates() {
        let site = Site::new(WorldPos::new(0, 0), u32::MAX);
        assert_eq!(site.diameter(), u32::MAX);
    }

    #[test]
    fn test_edge_of_world_tiles_place_inside() {
        let config = SettlementConfig::default();
        let corners = [
            (i32::MAX, i32::MAX),
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MIN),
        ];
        for (x, z) in corners {
            let tile = TileCoord::containing(x, z, config.tile_size);
            let sites = place_sites(tile, WorldSeed::new(12), &config, &flat_land());
            assert!(!sites.is_empty(), "Edge tile {tile} should still hold sites");
            for site in &sites {
                assert_eq!(site.tile(config.tile_size), tile, "Site must lie in edge tile {tile}");
            }
        }
    }

    #[test]
    fn test_placement_is_deterministic() {
        let config = SettlementConfig::default();
        let seed = WorldSeed::from_phrase("asd");
        let a = place_sites(TileCoord::new(0, 0), seed, &config, &flat_land());
        let b = place_sites(TileCoord::new(0, 0), seed, &config, &flat_land());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sites_respect_bounds() {
        let config = SettlementConfig::default();
        let seed = WorldSeed::new(99);
        for tx in -3..3 {
            for tz in -3..3 {
                let tile = TileCoord::new(tx, tz);
                let sites = place_sites(tile, seed, &config, &flat_land());
                assert!(!sites.is_empty(), "Flat land with 3 tries should place something");
                assert!(sites.len() <= config.max_sites_per_tile as usize);
                for site in &sites {
                    assert_eq!(site.tile(config.tile_size), tile, "Site must lie in its tile");
                    assert!((config.min_radius..=config.max_radius).contains(&site.radius()));
                }
                for (i, a) in sites.iter().enumerate() {
                    for b in &sites[i + 1..] {
                        assert!(a.distance(b) >= f64::from(config.min_site_distance));
                    }
                }
            }
        }
    }

    #[test]
    fn test_fully_blocked_tile_is_empty() {
        let water = BlockedArea::terrain_only(TerrainClassifier::new(Arc::new(FlatTerrain(-5)), 0, 180));
        let sites = place_sites(TileCoord::new(2, 2), WorldSeed::new(1), &SettlementConfig::default(), &water);
        assert!(sites.is_empty());
    }

    #[test]
    fn test_radius_bias_toward_small() {
        let config = SettlementConfig {
            min_site_distance: 1,
            min_sites_per_tile: 3,
            max_sites_per_tile: 3,
            ..SettlementConfig::default()
        };
        let midpoint = (config.min_radius + config.max_radius) / 2;
        let (mut small, mut large) = (0, 0);
        for tx in 0..100 {
            for site in place_sites(TileCoord::new(tx, 0), WorldSeed::new(5), &config, &flat_land()) {
                if site.radius() < midpoint {
                    small += 1;
                } else {
                    large += 1;
                }
            }
        }
        assert!(small > large, "Square-root sampling favors small radii ({small} vs {large})");
    }

    #[test]
    fn test_degenerate_ranges_are_constant() {
        let config = SettlementConfig {
            min_sites_per_tile: 2,
            max_sites_per_tile: 2,
            min_radius: 40,
            max_radius: 40,
            min_site_distance: 1,
            ..SettlementConfig::default()
        };
        let sites = place_sites(TileCoord::new(0, 0), WorldSeed::new(3), &config, &flat_land());
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().all(|s| s.radius() == 40));
    }
}
