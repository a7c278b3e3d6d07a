//! # Road Synthesis
//!
//! Turns a linked site pair into a jittered polyline.
//!
//! ## Algorithm
//!
//! ```text
//!   start ●────·────·────·────·────● end        N = round(distance / avg_len)
//!               ↕    ↕    ↕    ↕                 N - 1 interior points at t = k/N
//!          lateral offset = Σ wave_i(t) · distance · randomness · weight_i
//! ```
//!
//! Three "hat" waves (frequencies 1, 1/2, 1/4; weights 1, 1/2, 1/4) each
//! carry 1 to 4 random control values in `[-0.5, 0.5]`. Every wave fades out
//! toward both ends, so the road leaves and enters its junctions straight.
//!
//! ## Orientation
//!
//! A road is always synthesized from its lower endpoint (by site ordering)
//! to its higher one, with the random stream keyed by both endpoints in that
//! order. Asking for the same pair the other way round yields the same points
//! in reverse.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use palisade_core::seed::purpose;
use palisade_core::{Memoized, WorldPos, WorldSeed};
use parking_lot::Mutex;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::RoadConfig;
use crate::connection::UnorderedConnection;
use crate::site::Site;

/// Frequency and weight of each superposed wave.
const WAVES: [(f64, f64); 3] = [(1.0, 1.0), (0.5, 0.5), (0.25, 0.25)];

/// Shared road endpoint.
///
/// Records the far end of every road registered at it.
#[derive(Debug)]
pub struct Junction {
    pos: WorldPos,
    roads: Mutex<BTreeSet<WorldPos>>,
}

impl Junction {
    /// Creates a junction with no roads.
    #[must_use]
    pub fn new(pos: WorldPos) -> Self {
        Self {
            pos,
            roads: Mutex::new(BTreeSet::new()),
        }
    }

    /// World position.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> WorldPos {
        self.pos
    }

    /// Records a road from here to `far_end`.
    pub fn register(&self, far_end: WorldPos) {
        self.roads.lock().insert(far_end);
    }

    /// Number of roads registered here.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.roads.lock().len()
    }

    /// Far ends of the registered roads, sorted.
    #[must_use]
    pub fn neighbors(&self) -> Vec<WorldPos> {
        self.roads.lock().iter().copied().collect()
    }
}

type JunctionFn = fn(&WorldPos) -> Arc<Junction>;

fn shared_junction(pos: &WorldPos) -> Arc<Junction> {
    Arc::new(Junction::new(*pos))
}

/// Junctions by position, one shared instance per position.
///
/// Unbounded: identity must hold for the whole run.
pub struct JunctionTable {
    junctions: Memoized<WorldPos, Arc<Junction>, JunctionFn>,
}

impl JunctionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            junctions: Memoized::new(usize::MAX, shared_junction as JunctionFn),
        }
    }

    /// The junction at `pos`, created on first request.
    #[must_use]
    pub fn junction(&self, pos: WorldPos) -> Arc<Junction> {
        self.junctions.apply(&pos)
    }

    /// Number of junctions created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.junctions.cache().len()
    }

    /// True if no junction exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.junctions.cache().is_empty()
    }

    /// Forgets every junction.
    pub fn clear(&self) {
        self.junctions.invalidate_all();
    }
}

impl Default for JunctionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JunctionTable").field("junctions", &self.len()).finish()
    }
}

/// Polyline between two junctions.
#[derive(Clone, Debug)]
pub struct Road {
    start: Arc<Junction>,
    end: Arc<Junction>,
    interior: Vec<WorldPos>,
    width: f64,
}

impl Road {
    /// Start junction.
    #[must_use]
    pub fn start(&self) -> &Arc<Junction> {
        &self.start
    }

    /// End junction.
    #[must_use]
    pub fn end(&self) -> &Arc<Junction> {
        &self.end
    }

    /// Interior points from start to end, endpoints excluded.
    #[must_use]
    pub fn interior(&self) -> &[WorldPos] {
        &self.interior
    }

    /// Road width, always positive.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Every point from start to end, endpoints included.
    #[must_use]
    pub fn polyline(&self) -> Vec<WorldPos> {
        let mut points = Vec::with_capacity(self.interior.len() + 2);
        points.push(self.start.pos());
        points.extend_from_slice(&self.interior);
        points.push(self.end.pos());
        points
    }

    /// Polyline length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.polyline().windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// The same road traversed from end to start.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            start: Arc::clone(&self.end),
            end: Arc::clone(&self.start),
            interior: self.interior.iter().rev().copied().collect(),
            width: self.width,
        }
    }
}

impl PartialEq for Road {
    fn eq(&self, other: &Self) -> bool {
        self.start.pos() == other.start.pos()
            && self.end.pos() == other.end.pos()
            && self.interior == other.interior
            && self.width == other.width
    }
}

/// Synthesizes the road of a connection, from its lower site to its higher.
///
/// Both junctions are fetched from `junctions` and record the new road.
#[must_use]
pub fn synthesize_road(
    connection: &UnorderedConnection<Site>,
    seed: WorldSeed,
    config: &RoadConfig,
    junctions: &JunctionTable,
) -> Road {
    let (from, to) = connection.canonical();
    let (start, end) = (from.center(), to.center());

    let mut rng = seed
        .derive(purpose::ROADS)
        .mix(&[
            i64::from(start.x),
            i64::from(start.z),
            i64::from(end.x),
            i64::from(end.z),
        ])
        .rng();
    let waves = WAVES.map(|(frequency, weight)| (HatWave::random(&mut rng, frequency), weight));

    let distance = start.distance(end);
    let segments = (distance / config.average_segment_length).round() as usize;
    let length_factor = distance * config.randomness;
    let (a, b) = (start.to_point(), end.to_point());
    let normal = (b - a).normalized().perpendicular();

    let interior = (1..segments)
        .map(|k| {
            let t = k as f64 / segments as f64;
            let offset: f64 = waves
                .iter()
                .map(|(wave, weight)| wave.at(t) * length_factor * weight)
                .sum();
            (a.lerp(b, t) - normal * offset).round()
        })
        .collect();

    let narrower = from.radius().min(to.radius());
    let width = (f64::from(narrower) * config.width_factor).clamp(config.min_width, config.max_width);

    let (start_junction, end_junction) = (junctions.junction(start), junctions.junction(end));
    start_junction.register(end);
    end_junction.register(start);

    Road {
        start: start_junction,
        end: end_junction,
        interior,
        width,
    }
}

/// Piecewise-linear bump train with random amplitudes.
#[derive(Debug)]
struct HatWave {
    controls: Vec<f64>,
    frequency: f64,
}

impl HatWave {
    fn random(rng: &mut ChaCha8Rng, frequency: f64) -> Self {
        let count = rng.gen_range(1..=4);
        let controls = (0..count).map(|_| rng.gen_range(-0.5..=0.5)).collect();
        Self { controls, frequency }
    }

    /// Wave value at `t` in `[0, 1]`; zero at both ends.
    fn at(&self, t: f64) -> f64 {
        let knots = (self.controls.len() + 1) as f64;
        let raw: f64 = self
            .controls
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let knot = (k + 1) as f64 / knots;
                let hat = (1.0 - (t - knot).abs() * knots * self.frequency).max(0.0);
                c * hat
            })
            .sum();
        4.0 * t * (1.0 - t) * raw
    }
}
