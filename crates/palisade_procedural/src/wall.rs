//! # Town Walls
//!
//! Rings a settlement with towers and wall segments, opening gates wherever
//! the ring would cross blocked ground (usually a road).
//!
//! ## Algorithm
//!
//! ```text
//!   1. candidates: walk the circle of radius (diameter - max_thickness) / 2
//!      from a random angle in ~5° steps, jittering angle and radius
//!   2. blocked[i] = tower footprint at candidate i hits the blocked area
//!   3. walk candidates in order (cyclic neighbors):
//!
//!        ····■■■■■■····        ■ blocked candidate
//!           G      G           G gate tower, placed on both edges of a gap
//!          ─┘      └═══        ═ gate segment spans the gap
//!
//!      - blocked:               skip
//!      - previous blocked:      gate tower, gate segment from the last tower
//!      - next blocked:          gate tower, plain segment from the last tower
//!      - run since last tower
//!        (and before first)
//!        exceeds tower_run:     regular tower, plain segment
//!   4. with at least 2 towers, close the ring back to the first tower
//! ```
//!
//! A wall with fewer than 2 towers is left open; callers must accept an
//! incomplete ring.

use std::f64::consts::TAU;

use palisade_core::seed::purpose;
use palisade_core::{Point, Rect, WorldSeed};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::blocked::BlockedArea;
use crate::config::WallConfig;
use crate::site::Site;

/// Tower variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Tower along an unbroken stretch of wall.
    Regular,
    /// Tower flanking a gate.
    Gate,
}

/// A wall tower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    /// Regular or gate tower.
    pub kind: TowerKind,
    /// Footprint center.
    pub center: Point,
    /// Edge length of the square footprint.
    pub size: f64,
    /// Terrain height under the center.
    pub base_height: i32,
    /// Height above the base.
    pub height: i32,
}

impl Tower {
    /// Square footprint.
    #[must_use]
    pub fn footprint(&self) -> Rect {
        Rect::centered(self.center, self.size * 0.5)
    }

    /// True for gate towers.
    #[inline]
    #[must_use]
    pub const fn is_gate(&self) -> bool {
        matches!(self.kind, TowerKind::Gate)
    }
}

/// Geometry shared by both segment variants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallSpan {
    /// Index of the tower the span starts at.
    pub from: usize,
    /// Index of the tower the span ends at.
    pub to: usize,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Wall thickness.
    pub thickness: f64,
    /// Terrain height the span is built on.
    pub base_height: i32,
    /// Height above the base.
    pub height: i32,
}

impl WallSpan {
    /// Straight-line length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// A stretch of wall between two towers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WallSegment {
    /// Full-height wall.
    Plain(WallSpan),
    /// Thin, low passage through the ring.
    Gate(WallSpan),
}

impl WallSegment {
    /// The segment geometry.
    #[must_use]
    pub const fn span(&self) -> &WallSpan {
        match self {
            Self::Plain(span) | Self::Gate(span) => span,
        }
    }

    /// True for gate segments.
    #[must_use]
    pub const fn is_gate(&self) -> bool {
        matches!(self, Self::Gate(_))
    }
}

/// Towers and wall segments around one settlement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TownWall {
    /// Towers in placement order.
    pub towers: Vec<Tower>,
    /// Segments in placement order; the last one closes the ring.
    pub segments: Vec<WallSegment>,
}

impl TownWall {
    /// True if no tower was placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towers.is_empty()
    }

    /// Number of segments ending at tower `index`.
    #[must_use]
    pub fn tower_degree(&self, index: usize) -> usize {
        self.segments
            .iter()
            .map(WallSegment::span)
            .map(|span| usize::from(span.from == index) + usize::from(span.to == index))
            .sum()
    }

    /// True if the segments form one cycle through every tower.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.towers.len() >= 2
            && self.segments.len() == self.towers.len()
            && (0..self.towers.len()).all(|i| self.tower_degree(i) == 2)
    }

    /// Gate towers.
    pub fn gate_towers(&self) -> impl Iterator<Item = &Tower> + '_ {
        self.towers.iter().filter(|t| t.is_gate())
    }

    /// Gate segments.
    pub fn gate_segments(&self) -> impl Iterator<Item = &WallSpan> + '_ {
        self.segments.iter().filter_map(|s| match s {
            WallSegment::Gate(span) => Some(span),
            WallSegment::Plain(_) => None,
        })
    }

    /// Total segment length.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.segments.iter().map(|s| s.span().length()).sum()
    }
}

/// Builds the town wall of a site.
///
/// `blocked` must already contain everything the wall has to avoid. The
/// random stream depends only on the seed and the site center.
#[must_use]
pub fn generate_wall(site: &Site, seed: WorldSeed, config: &WallConfig, blocked: &BlockedArea) -> TownWall {
    let center = site.center();
    let mut rng = seed
        .derive(purpose::WALLS)
        .mix(&[i64::from(center.x), i64::from(center.z)])
        .rng();

    let max_radius = (f64::from(site.diameter()) - config.max_thickness) * 0.5;
    let step = config.angle_step();
    let jitter = config.angle_jitter();
    let count = ((TAU / step).round() as usize).max(1);
    let start_angle = rng.gen_range(0.0..TAU);

    let candidates: Vec<Point> = (0..count)
        .map(|i| {
            let angle = start_angle + i as f64 * step + rng.gen_range(-jitter..=jitter);
            let radius = max_radius - rng.gen_range(0.0..=config.radial_jitter);
            center.to_point() + Point::from_angle(angle) * radius
        })
        .collect();
    let half = config.tower_size * 0.5;
    let blocked_at: Vec<bool> = candidates
        .iter()
        .map(|&p| blocked.is_rect_blocked(&Rect::centered(p, half)))
        .collect();

    let mut builder = WallBuilder {
        config,
        blocked,
        wall: TownWall::default(),
    };
    let mut first: Option<usize> = None;
    let mut last: Option<usize> = None;

    for i in 0..count {
        if blocked_at[i] {
            continue;
        }
        let previous_blocked = blocked_at[(i + count - 1) % count];
        let next_blocked = blocked_at[(i + 1) % count];

        let placement = if previous_blocked {
            trace!(candidate = i, "Gate closes a blocked run");
            Some((TowerKind::Gate, true))
        } else if next_blocked {
            trace!(candidate = i, "Gate opens a blocked run");
            Some((TowerKind::Gate, false))
        } else {
            let after_last = last.map_or(true, |l| i - l > config.tower_run);
            let before_first = first.map_or(true, |f| f + count - i > config.tower_run);
            (after_last && before_first).then_some((TowerKind::Regular, false))
        };

        if let Some((kind, gate_segment)) = placement {
            builder.place(kind, candidates[i], gate_segment);
            first.get_or_insert(i);
            last = Some(i);
        }
    }

    if let Some(last) = last {
        if builder.wall.towers.len() >= 2 {
            builder.close(blocked_at[(last + 1) % count]);
        }
    }

    builder.wall
}

struct WallBuilder<'a> {
    config: &'a WallConfig,
    blocked: &'a BlockedArea,
    wall: TownWall,
}

impl WallBuilder<'_> {
    fn place(&mut self, kind: TowerKind, center: Point, gate_segment: bool) {
        let index = self.wall.towers.len();
        let base = center.round();
        self.wall.towers.push(Tower {
            kind,
            center,
            size: self.config.tower_size,
            base_height: self.blocked.height_at(base.x, base.z),
            height: self.config.tower_height,
        });
        if index > 0 {
            self.connect(index - 1, index, gate_segment);
        }
    }

    fn close(&mut self, gate_segment: bool) {
        let last = self.wall.towers.len() - 1;
        self.connect(last, 0, gate_segment);
    }

    fn connect(&mut self, from: usize, to: usize, gate_segment: bool) {
        let (a, b) = (self.wall.towers[from], self.wall.towers[to]);
        let (thickness, height) = if gate_segment {
            (self.config.gate_thickness, self.config.gate_height)
        } else {
            (self.config.max_thickness, self.config.wall_height)
        };
        let span = WallSpan {
            from,
            to,
            start: a.center,
            end: b.center,
            thickness,
            base_height: a.base_height.max(b.base_height),
            height,
        };
        self.wall.segments.push(if gate_segment {
            WallSegment::Gate(span)
        } else {
            WallSegment::Plain(span)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocked::BlockedAreaBuilder;
    use crate::terrain::{FlatTerrain, TerrainClassifier};
    use palisade_core::{Circle, Polygon, Stroke, WorldPos};
    use std::sync::Arc;

    fn terrain() -> TerrainClassifier {
        TerrainClassifier::new(Arc::new(FlatTerrain(10)), 0, 180)
    }

    fn site() -> Site {
        Site::new(WorldPos::new(2000, -300), 50)
    }

    fn wedge(site: &Site, from_degrees: f64, to_degrees: f64) -> Polygon {
        let c = site.center().to_point();
        let reach = f64::from(site.radius()) * 3.0;
        let mut vertices = vec![c];
        let steps = 8;
        for k in 0..=steps {
            let angle = (from_degrees + (to_degrees - from_degrees) * f64::from(k) / f64::from(steps)).to_radians();
            vertices.push(c + Point::from_angle(angle) * reach);
        }
        Polygon::new(vertices)
    }

    #[test]
    fn test_open_ground_closed_ring() {
        let config = WallConfig::default();
        let wall = generate_wall(&site(), WorldSeed::new(1), &config, &BlockedArea::terrain_only(terrain()));

        assert!(wall.is_closed(), "Unobstructed ring must close");
        assert_eq!(wall.gate_towers().count(), 0);
        assert_eq!(wall.gate_segments().count(), 0);
        assert_eq!(wall.towers.len(), 12, "72 candidates, one tower every 6");
        assert!(wall.towers.iter().all(|t| t.base_height == 10 && t.height == config.tower_height));

        let expected = TAU * (100.0 - config.max_thickness) * 0.5;
        assert!(
            (wall.perimeter() - expected).abs() < expected * 0.1,
            "Perimeter {} should approximate the circle {expected}",
            wall.perimeter()
        );
    }

    #[test]
    fn test_forty_degree_gap_gets_two_gate_towers() {
        let config = WallConfig::default();
        let site = site();
        for (seed, from) in [(1, 0.0), (2, 100.0), (3, 215.0), (4, 330.0)] {
            let mut builder = BlockedAreaBuilder::new(terrain());
            builder.add(wedge(&site, from, from + 40.0));
            let wall = generate_wall(&site, WorldSeed::new(seed), &config, &builder.freeze());

            assert!(wall.is_closed(), "seed {seed}: ring must close across the gap");
            assert_eq!(wall.gate_towers().count(), 2, "seed {seed}: exactly two gate towers");
            assert_eq!(wall.gate_segments().count(), 1, "seed {seed}: exactly one gate segment");

            let gate = wall.gate_segments().next().expect("gate segment");
            assert!(wall.towers[gate.from].is_gate() && wall.towers[gate.to].is_gate());
        }
    }

    #[test]
    fn test_road_through_town_opens_two_gates() {
        let config = WallConfig::default();
        let site = site();
        let c = site.center().to_point();
        let mut builder = BlockedAreaBuilder::new(terrain());
        builder.add(Stroke::new(vec![c - Point::new(200.0, 0.0), c + Point::new(200.0, 0.0)], 6.0));
        let wall = generate_wall(&site, WorldSeed::new(9), &config, &builder.freeze());

        assert!(wall.is_closed());
        assert_eq!(wall.gate_segments().count(), 2, "A road crossing the ring makes two gates");
        assert_eq!(wall.gate_towers().count(), 4);
        for gate in wall.gate_segments() {
            assert!((gate.thickness - config.gate_thickness).abs() < 1e-9);
            assert_eq!(gate.height, config.gate_height);
        }
    }

    #[test]
    fn test_small_site_with_one_road_gets_a_gate() {
        let config = WallConfig {
            radial_jitter: 0.0,
            ..WallConfig::default()
        };
        let site = Site::new(WorldPos::new(-40, 90), 10);
        let c = site.center().to_point();
        let road = Stroke::new(vec![c, c + Point::new(300.0, 0.0)], 3.0);

        let mut builder = BlockedAreaBuilder::new(terrain());
        builder.add(road.clone());
        let wall = generate_wall(&site, WorldSeed::new(4), &config, &builder.freeze());
        assert!(wall.is_closed(), "The ring closes across the road");
        assert_eq!(wall.gate_segments().count(), 1);
        assert_eq!(wall.gate_towers().count(), 2);

        // A plaza at the center reaches every candidate footprint of a small ring.
        let mut builder = BlockedAreaBuilder::new(terrain());
        builder.add(road).add(Circle::new(c, 4.5));
        let wall = generate_wall(&site, WorldSeed::new(4), &config, &builder.freeze());
        assert!(wall.is_empty());
    }

    #[test]
    fn test_fully_blocked_ring_is_empty() {
        let water = TerrainClassifier::new(Arc::new(FlatTerrain(-1)), 0, 180);
        let wall = generate_wall(&site(), WorldSeed::new(1), &WallConfig::default(), &BlockedArea::terrain_only(water));
        assert!(wall.is_empty());
        assert!(wall.segments.is_empty());
        assert!(!wall.is_closed());
    }

    #[test]
    fn test_single_opening_is_degenerate() {
        // Land only in a narrow slot north of the center, too narrow for two towers.
        let site = site();
        let (cx, cz) = (f64::from(site.center().x), f64::from(site.center().z));
        let slot = move |x: i32, z: i32| {
            let angle = (f64::from(z) - cz).atan2(f64::from(x) - cx).to_degrees();
            if (angle - 90.0).abs() <= 6.0 {
                10
            } else {
                -1
            }
        };
        let blocked = BlockedArea::terrain_only(TerrainClassifier::new(Arc::new(slot), 0, 180));
        let wall = generate_wall(&site, WorldSeed::new(1), &WallConfig::default(), &blocked);

        assert!(wall.towers.len() <= 1);
        assert!(wall.towers.iter().all(Tower::is_gate));
        assert!(wall.segments.is_empty(), "Fewer than two towers leaves the ring open");
        assert!(!wall.is_closed());
    }

    #[test]
    fn test_wall_is_deterministic() {
        let blocked = BlockedArea::terrain_only(terrain());
        let config = WallConfig::default();
        let a = generate_wall(&site(), WorldSeed::new(5), &config, &blocked);
        let b = generate_wall(&site(), WorldSeed::new(5), &config, &blocked);
        assert_eq!(a, b);
    }

    #[test]
    fn test_towers_sit_inside_the_site() {
        let site = site();
        let config = WallConfig::default();
        let wall = generate_wall(&site, WorldSeed::new(6), &config, &BlockedArea::terrain_only(terrain()));
        let max_radius = (f64::from(site.diameter()) - config.max_thickness) * 0.5;
        for tower in &wall.towers {
            let r = tower.center.distance(site.center().to_point());
            assert!(r <= max_radius + 1e-9 && r >= max_radius - config.radial_jitter - 1e-9);
        }
    }
}
