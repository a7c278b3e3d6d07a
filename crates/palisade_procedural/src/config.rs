//! # Settlement Configuration
//!
//! All tunables for site placement, roads and town walls, loaded once from
//! TOML and validated eagerly. The sampling routines trust these bounds, so
//! an out-of-order range is rejected here rather than degrading silently.
//!
//! ## Example
//!
//! ```toml
//! tile_size = 1024
//! min_sites_per_tile = 1
//! max_sites_per_tile = 3
//! min_radius = 10
//! max_radius = 100
//!
//! [road]
//! average_segment_length = 40.0
//!
//! [wall]
//! angle_step_degrees = 5.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SettlementError, SettlementResult};

/// Top-level generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Tile edge length in world units.
    pub tile_size: i32,
    /// Terrain at or below this height is water.
    pub sea_level: i32,
    /// Terrain at or above this height is snow.
    pub snow_line: i32,
    /// Fewest placement slots drawn per tile.
    pub min_sites_per_tile: u32,
    /// Most placement slots drawn per tile.
    pub max_sites_per_tile: u32,
    /// Smallest settlement radius.
    pub min_radius: u32,
    /// Largest settlement radius.
    pub max_radius: u32,
    /// Minimum center distance between two sites of the same tile.
    pub min_site_distance: u32,
    /// Attempts per placement slot before the slot is dropped.
    pub max_placement_tries: u32,
    /// Sites closer than this are linked by a road.
    pub max_connect_distance: u32,
    /// Approximate entries kept per stage cache.
    pub cache_capacity: usize,
    /// Road synthesis and shaping.
    pub road: RoadConfig,
    /// Town wall generation.
    pub wall: WallConfig,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            tile_size: 1024,
            sea_level: 0,
            snow_line: 180,
            min_sites_per_tile: 1,
            max_sites_per_tile: 3,
            min_radius: 10,
            max_radius: 100,
            min_site_distance: 250,
            max_placement_tries: 3,
            max_connect_distance: 800,
            cache_capacity: 512,
            road: RoadConfig::default(),
            wall: WallConfig::default(),
        }
    }
}

/// Road synthesis and shaping settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Target distance between consecutive road points.
    pub average_segment_length: f64,
    /// Lateral jitter per unit of road length.
    pub randomness: f64,
    /// Curve smoothness in `(0, 1)`.
    pub smoothness: f64,
    /// Road width per unit of the smaller endpoint radius.
    pub width_factor: f64,
    /// Narrowest road.
    pub min_width: f64,
    /// Widest road.
    pub max_width: f64,
    /// Junction plaza radius as a multiple of the widest road meeting there.
    pub plaza_factor: f64,
    /// Straight pieces each curve segment is flattened into.
    pub curve_steps: usize,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            average_segment_length: 40.0,
            randomness: 0.1,
            smoothness: 0.5,
            width_factor: 0.1,
            min_width: 3.0,
            max_width: 9.0,
            plaza_factor: 1.5,
            curve_steps: 8,
        }
    }
}

/// Town wall settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Thickness of a regular wall segment.
    pub max_thickness: f64,
    /// Thickness of a gate segment.
    pub gate_thickness: f64,
    /// Angular step between tower candidates.
    pub angle_step_degrees: f64,
    /// Maximum angular jitter per candidate.
    pub angle_jitter_degrees: f64,
    /// Maximum inward radial jitter per candidate.
    pub radial_jitter: f64,
    /// Candidates skipped between regular towers.
    pub tower_run: usize,
    /// Edge length of a square tower footprint.
    pub tower_size: f64,
    /// Tower height above its base.
    pub tower_height: i32,
    /// Regular wall height above the base.
    pub wall_height: i32,
    /// Gate segment height above the base.
    pub gate_height: i32,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            max_thickness: 5.0,
            gate_thickness: 2.0,
            angle_step_degrees: 5.0,
            angle_jitter_degrees: 1.0,
            radial_jitter: 2.0,
            tower_run: 5,
            tower_size: 7.0,
            tower_height: 16,
            wall_height: 10,
            gate_height: 4,
        }
    }
}

impl SettlementConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Parse`] for malformed TOML and any
    /// validation error from [`SettlementConfig::validate`].
    pub fn from_toml_str(source: &str) -> SettlementResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`SettlementConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> SettlementResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks every bound the generation stages rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> SettlementResult<()> {
        positive("tile_size", f64::from(self.tile_size))?;
        ordered(
            "sites_per_tile",
            f64::from(self.min_sites_per_tile),
            f64::from(self.max_sites_per_tile),
        )?;
        positive("min_radius", f64::from(self.min_radius))?;
        ordered("radius", f64::from(self.min_radius), f64::from(self.max_radius))?;
        ordered("terrain_height", f64::from(self.sea_level), f64::from(self.snow_line))?;
        if self.sea_level == self.snow_line {
            return Err(SettlementError::Inconsistent(format!(
                "sea_level and snow_line are both {}, leaving no land",
                self.sea_level
            )));
        }
        positive("max_placement_tries", f64::from(self.max_placement_tries))?;
        positive("max_connect_distance", f64::from(self.max_connect_distance))?;
        positive("cache_capacity", self.cache_capacity as f64)?;
        self.road.validate()?;
        self.wall.validate()?;

        if 2.0 * f64::from(self.min_radius) <= self.wall.max_thickness {
            return Err(SettlementError::Inconsistent(format!(
                "min_radius {} leaves no room for walls {} thick",
                self.min_radius, self.wall.max_thickness
            )));
        }
        if i64::from(self.max_radius) > i64::from(self.tile_size) {
            return Err(SettlementError::Inconsistent(format!(
                "max_radius {} exceeds tile_size {}",
                self.max_radius, self.tile_size
            )));
        }
        Ok(())
    }
}

impl RoadConfig {
    fn validate(&self) -> SettlementResult<()> {
        positive("road.average_segment_length", self.average_segment_length)?;
        non_negative("road.randomness", self.randomness)?;
        fraction("road.smoothness", self.smoothness)?;
        non_negative("road.width_factor", self.width_factor)?;
        positive("road.min_width", self.min_width)?;
        ordered("road.width", self.min_width, self.max_width)?;
        non_negative("road.plaza_factor", self.plaza_factor)?;
        positive("road.curve_steps", self.curve_steps as f64)
    }
}

impl WallConfig {
    fn validate(&self) -> SettlementResult<()> {
        positive("wall.max_thickness", self.max_thickness)?;
        positive("wall.gate_thickness", self.gate_thickness)?;
        positive("wall.angle_step_degrees", self.angle_step_degrees)?;
        non_negative("wall.angle_jitter_degrees", self.angle_jitter_degrees)?;
        if self.angle_jitter_degrees * 2.0 >= self.angle_step_degrees {
            return Err(SettlementError::Inconsistent(format!(
                "wall.angle_jitter_degrees {} lets tower candidates overtake each other at step {}",
                self.angle_jitter_degrees, self.angle_step_degrees
            )));
        }
        non_negative("wall.radial_jitter", self.radial_jitter)?;
        positive("wall.tower_size", self.tower_size)?;
        non_negative("wall.tower_height", f64::from(self.tower_height))?;
        non_negative("wall.wall_height", f64::from(self.wall_height))?;
        non_negative("wall.gate_height", f64::from(self.gate_height))
    }

    /// Angular step between tower candidates, in radians.
    #[must_use]
    pub fn angle_step(&self) -> f64 {
        self.angle_step_degrees.to_radians()
    }

    /// Maximum angular jitter, in radians.
    #[must_use]
    pub fn angle_jitter(&self) -> f64 {
        self.angle_jitter_degrees.to_radians()
    }
}

fn positive(field: &'static str, value: f64) -> SettlementResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SettlementError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> SettlementResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SettlementError::NonPositive { field, value })
    }
}

fn fraction(field: &'static str, value: f64) -> SettlementResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SettlementError::InvalidFraction { field, value })
    }
}

fn ordered(field: &'static str, min: f64, max: f64) -> SettlementResult<()> {
    if min <= max {
        Ok(())
    } else {
        Err(SettlementError::InvalidRange { field, min, max })
    }
}
