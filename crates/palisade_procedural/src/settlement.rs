//! Finished settlements: a site with its town wall and reserved ground.

use palisade_core::{Area, WorldSeed};
use serde::{Deserialize, Serialize};

use crate::blocked::BlockedArea;
use crate::config::WallConfig;
use crate::site::Site;
use crate::wall::{generate_wall, TownWall};

/// A site with everything generated around it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// The placed site.
    pub site: Site,
    /// Its town wall, possibly incomplete.
    pub wall: TownWall,
    /// Ground later stages must treat as blocked (the settlement disc).
    pub reserved: Area,
}

impl Settlement {
    /// Walls in the site against `blocked` and reserves its disc.
    ///
    /// `blocked` must already hold the roads around the site.
    #[must_use]
    pub fn build(site: Site, seed: WorldSeed, config: &WallConfig, blocked: &BlockedArea) -> Self {
        let wall = generate_wall(&site, seed, config, blocked);
        let mut reserved = Area::new();
        reserved.push(site.disc());
        Self { site, wall, reserved }
    }

    /// True if the wall forms a closed ring.
    #[must_use]
    pub fn is_walled(&self) -> bool {
        self.wall.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{FlatTerrain, TerrainClassifier};
    use palisade_core::{Point, WorldPos};
    use std::sync::Arc;

    #[test]
    fn test_build_reserves_disc() {
        let site = Site::new(WorldPos::new(300, 300), 40);
        let blocked = BlockedArea::terrain_only(TerrainClassifier::new(Arc::new(FlatTerrain(20)), 0, 180));
        let settlement = Settlement::build(site, WorldSeed::new(1), &WallConfig::default(), &blocked);

        assert!(settlement.is_walled());
        assert!(settlement.reserved.contains(Point::new(300.0, 339.0)));
        assert!(!settlement.reserved.contains(Point::new(300.0, 341.0)));
        for tower in &settlement.wall.towers {
            assert!(settlement.reserved.contains(tower.center), "Towers stand on reserved ground");
        }
    }
}
