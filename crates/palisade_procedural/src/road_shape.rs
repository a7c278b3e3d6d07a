//! # Road Shapes
//!
//! Converts a tile's roads into the area a rasterizer fills.
//!
//! Each road polyline is smoothed into a chain of cubic curves, every curve
//! is flattened and stroked with the road width, and only strokes whose
//! bounds reach into the tile are kept. Every junction gets a round plaza
//! sized by the widest road meeting there.

use std::collections::BTreeMap;

use palisade_core::geometry::catmull_rom;
use palisade_core::{Area, Circle, CubicBezier, Point, Rect, Stroke, WorldPos};

use crate::config::RoadConfig;
use crate::road::Road;

/// The smoothed curve chain of a road, start to end.
#[must_use]
pub fn road_curves(road: &Road, smoothness: f64) -> Vec<CubicBezier> {
    let points: Vec<Point> = road.polyline().into_iter().map(WorldPos::to_point).collect();
    catmull_rom(&points, smoothness)
}

/// True if any stroked curve piece of the road reaches into `rect`.
#[must_use]
pub fn road_touches(road: &Road, smoothness: f64, rect: &Rect) -> bool {
    let half_width = road.width() * 0.5;
    road_curves(road, smoothness)
        .iter()
        .any(|curve| curve.bounding_box().expanded(half_width).intersects(rect))
}

/// Builds the road area of one tile from the roads touching it.
///
/// Returns an empty area when no piece of any road reaches the tile.
#[must_use]
pub fn road_area(tile_bounds: &Rect, roads: &[Road], config: &RoadConfig) -> Area {
    let mut area = Area::new();
    let mut plazas: BTreeMap<WorldPos, f64> = BTreeMap::new();

    for road in roads {
        let half_width = road.width() * 0.5;
        for curve in road_curves(road, config.smoothness) {
            if curve.bounding_box().expanded(half_width).intersects(tile_bounds) {
                area.push(Stroke::new(curve.flatten(config.curve_steps), road.width()));
            }
        }
        for junction in [road.start(), road.end()] {
            let widest = plazas.entry(junction.pos()).or_insert(0.0);
            *widest = widest.max(road.width());
        }
    }

    for (pos, width) in plazas {
        let plaza = Circle::new(pos.to_point(), width * config.plaza_factor);
        if plaza.intersects_rect(tile_bounds) {
            area.push(plaza);
        }
    }

    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::UnorderedConnection;
    use crate::road::{synthesize_road, JunctionTable};
    use crate::site::Site;
    use palisade_core::{Shape, TileCoord, WorldSeed};

    fn road(a: (i32, i32), b: (i32, i32), junctions: &JunctionTable) -> Road {
        let connection = UnorderedConnection::new(
            Site::new(WorldPos::new(a.0, a.1), 40),
            Site::new(WorldPos::new(b.0, b.1), 60),
        );
        synthesize_road(&connection, WorldSeed::new(11), &RoadConfig::default(), junctions)
    }

    #[test]
    fn test_no_roads_no_area() {
        let area = road_area(&TileCoord::new(0, 0).bounds(1024), &[], &RoadConfig::default());
        assert!(area.is_empty());
    }

    #[test]
    fn test_road_area_covers_polyline() {
        let junctions = JunctionTable::new();
        let road = road((100, 100), (900, 700), &junctions);
        let area = road_area(&TileCoord::new(0, 0).bounds(1024), std::slice::from_ref(&road), &RoadConfig::default());

        for p in road.polyline() {
            assert!(area.contains(p.to_point()), "Road point {p:?} must be covered");
        }
        let plazas = area.shapes().iter().filter(|s| matches!(s, Shape::Circle(_))).count();
        assert_eq!(plazas, 2, "Both junctions get a plaza");
    }

    #[test]
    fn test_pieces_outside_tile_are_dropped() {
        let junctions = JunctionTable::new();
        let config = RoadConfig::default();
        // Crosses from tile (0, 0) into tile (1, 0).
        let road = road((500, 500), (1700, 500), &junctions);
        let total = road_curves(&road, config.smoothness).len();

        let left = road_area(&TileCoord::new(0, 0).bounds(1024), std::slice::from_ref(&road), &config);
        let strokes = left.shapes().iter().filter(|s| matches!(s, Shape::Stroke(_))).count();
        assert!(strokes > 0 && strokes < total, "{strokes} of {total} pieces kept");
        assert!(!left.contains(Point::new(1600.0, 500.0)));

        let far = road_area(&TileCoord::new(5, 5).bounds(1024), std::slice::from_ref(&road), &config);
        assert!(far.is_empty());
    }

    #[test]
    fn test_plaza_uses_widest_road() {
        let junctions = JunctionTable::new();
        let config = RoadConfig::default();
        let narrow = road((500, 500), (800, 500), &junctions);
        let wide = {
            let connection = UnorderedConnection::new(
                Site::new(WorldPos::new(500, 500), 90),
                Site::new(WorldPos::new(500, 850), 90),
            );
            synthesize_road(&connection, WorldSeed::new(11), &config, &junctions)
        };
        let area = road_area(&TileCoord::new(0, 0).bounds(1024), &[narrow, wide.clone()], &config);

        let hub = area
            .shapes()
            .iter()
            .find_map(|s| match s {
                Shape::Circle(c) if c.center == Point::new(500.0, 500.0) => Some(*c),
                _ => None,
            })
            .expect("hub plaza");
        assert!((hub.radius - wide.width() * config.plaza_factor).abs() < 1e-9);
    }

    #[test]
    fn test_road_touches() {
        let junctions = JunctionTable::new();
        let road = road((100, 100), (700, 400), &junctions);
        assert!(road_touches(&road, 0.5, &TileCoord::new(0, 0).bounds(1024)));
        assert!(!road_touches(&road, 0.5, &TileCoord::new(0, 1).bounds(1024)));
        assert!(!road_touches(&road, 0.5, &TileCoord::new(-1, -1).bounds(1024)));
    }
}
