//! # Terrain Classification
//!
//! Terrain sampling is an external collaborator: settlement generation only
//! needs a height per column. `TerrainClassifier` turns that height into
//! land, water or snow against the configured sea level and snow line.
//!
//! Two samplers ship with the crate: `FlatTerrain` for controlled tests and
//! `NoiseTerrain`, a 2D simplex heightfield for demos and benchmarks. Any
//! `Fn(i32, i32) -> i32` closure is a sampler too.

use std::fmt;
use std::sync::Arc;

use palisade_core::seed::purpose;
use palisade_core::WorldSeed;

use crate::config::SettlementConfig;

/// Terrain height source.
pub trait HeightSampler: Send + Sync {
    /// Terrain height of the column at world `(x, z)`.
    fn height_at(&self, x: i32, z: i32) -> i32;
}

impl<F> HeightSampler for F
where
    F: Fn(i32, i32) -> i32 + Send + Sync,
{
    fn height_at(&self, x: i32, z: i32) -> i32 {
        self(x, z)
    }
}

/// Terrain of constant height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatTerrain(pub i32);

impl HeightSampler for FlatTerrain {
    fn height_at(&self, _x: i32, _z: i32) -> i32 {
        self.0
    }
}

/// Coarse terrain class of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainClass {
    /// Buildable land.
    Land,
    /// At or below sea level.
    Water,
    /// At or above the snow line.
    Snow,
}

impl TerrainClass {
    /// Only land can carry settlements.
    #[inline]
    #[must_use]
    pub const fn is_land(self) -> bool {
        matches!(self, Self::Land)
    }
}

/// Classifies columns from a shared height sampler.
#[derive(Clone)]
pub struct TerrainClassifier {
    sampler: Arc<dyn HeightSampler>,
    sea_level: i32,
    snow_line: i32,
}

impl TerrainClassifier {
    /// Creates a classifier with explicit thresholds.
    #[must_use]
    pub fn new(sampler: Arc<dyn HeightSampler>, sea_level: i32, snow_line: i32) -> Self {
        Self {
            sampler,
            sea_level,
            snow_line,
        }
    }

    /// Creates a classifier using the thresholds of a configuration.
    #[must_use]
    pub fn from_config(sampler: Arc<dyn HeightSampler>, config: &SettlementConfig) -> Self {
        Self::new(sampler, config.sea_level, config.snow_line)
    }

    /// Raw terrain height.
    #[inline]
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        self.sampler.height_at(x, z)
    }

    /// Classifies the column at world `(x, z)`.
    #[must_use]
    pub fn classify(&self, x: i32, z: i32) -> TerrainClass {
        let height = self.height_at(x, z);
        if height <= self.sea_level {
            TerrainClass::Water
        } else if height >= self.snow_line {
            TerrainClass::Snow
        } else {
            TerrainClass::Land
        }
    }
}

impl fmt::Debug for TerrainClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerrainClassifier")
            .field("sea_level", &self.sea_level)
            .field("snow_line", &self.snow_line)
            .finish_non_exhaustive()
    }
}

/// Rolling heightfield from octaved 2D simplex noise.
pub struct NoiseTerrain {
    noise: SimplexNoise,
    /// Mean height.
    base: f64,
    /// Height swing above and below `base`.
    amplitude: f64,
    /// Feature size in world units.
    scale: f64,
}

impl NoiseTerrain {
    /// Octaves summed per sample.
    const OCTAVES: u32 = 4;

    /// Creates a heightfield of the given mean, swing and feature size.
    #[must_use]
    pub fn new(seed: WorldSeed, base: f64, amplitude: f64, scale: f64) -> Self {
        Self {
            noise: SimplexNoise::new(seed.derive(purpose::TERRAIN)),
            base,
            amplitude,
            scale: scale.max(1.0),
        }
    }

    /// Unscaled noise in `[-1, 1]` at world `(x, z)`.
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let (mut total, mut amplitude, mut frequency, mut norm) = (0.0, 1.0, 1.0, 0.0);
        for _ in 0..Self::OCTAVES {
            total += self.noise.sample(x / self.scale * frequency, z / self.scale * frequency) * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / norm
    }
}

impl HeightSampler for NoiseTerrain {
    fn height_at(&self, x: i32, z: i32) -> i32 {
        (self.base + self.sample(f64::from(x), f64::from(z)) * self.amplitude).round() as i32
    }
}

impl fmt::Debug for NoiseTerrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseTerrain")
            .field("base", &self.base)
            .field("amplitude", &self.amplitude)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// 2D simplex noise over a seeded permutation table.
struct SimplexNoise {
    perm: [u8; 512],
}

impl SimplexNoise {
    /// Skewing factor, (sqrt(3) - 1) / 2.
    const F2: f64 = 0.366_025_403_784_438_6;
    /// Unskewing factor, (3 - sqrt(3)) / 6.
    const G2: f64 = 0.211_324_865_405_187_1;
    /// Gradient directions.
    const GRADIENTS: [(f64, f64); 8] = [
        (1.0, 0.0),
        (1.0, 1.0),
        (0.0, 1.0),
        (-1.0, 1.0),
        (-1.0, 0.0),
        (-1.0, -1.0),
        (0.0, -1.0),
        (1.0, -1.0),
    ];

    fn new(seed: WorldSeed) -> Self {
        use rand::seq::SliceRandom;

        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
        table.shuffle(&mut seed.rng());

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&table);
        perm[256..].copy_from_slice(&table);
        Self { perm }
    }

    fn hash(&self, i: i32, j: i32) -> usize {
        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        usize::from(self.perm[ii + usize::from(self.perm[jj])])
    }

    fn corner(&self, x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            return 0.0;
        }
        let (gx, gy) = Self::GRADIENTS[hash & 7];
        let t2 = t * t;
        t2 * t2 * (gx * x + gy * y)
    }

    /// Noise in `[-1, 1]`.
    fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = (x + skew).floor() as i32;
        let j = (y + skew).floor() as i32;

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let n0 = self.corner(x0, y0, self.hash(i, j));
        let n1 = self.corner(x1, y1, self.hash(i + i1, j + j1));
        let n2 = self.corner(x2, y2, self.hash(i + 1, j + 1));

        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }
}
