//! # Site Connections
//!
//! Decides which sites are linked by roads.
//!
//! A site links to every other site of its 3×3 tile neighborhood closer than
//! `max_connect_distance`. If none is in range it links to the single closest
//! one instead, so a site is only isolated when its whole neighborhood is
//! empty. Links are undirected: [`UnorderedConnection`] compares equal under
//! swap, so a link reported from both ends is counted once.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use palisade_core::TileCoord;
use serde::{Deserialize, Serialize};

use crate::site::Site;

/// Undirected pair: `(a, b) == (b, a)`, with equal hashes.
///
/// The pair remembers the order it was created in, but equality, hashing
/// and ordering only see the canonical `(min, max)` order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct UnorderedConnection<T> {
    first: T,
    second: T,
}

impl<T: Ord> UnorderedConnection<T> {
    /// Creates a connection.
    #[must_use]
    pub const fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    /// The endpoint given first.
    #[must_use]
    pub const fn first(&self) -> &T {
        &self.first
    }

    /// The endpoint given second.
    #[must_use]
    pub const fn second(&self) -> &T {
        &self.second
    }

    /// Both endpoints, smaller first.
    #[must_use]
    pub fn canonical(&self) -> (&T, &T) {
        if self.first <= self.second {
            (&self.first, &self.second)
        } else {
            (&self.second, &self.first)
        }
    }

    /// True if `value` is either endpoint.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.first == *value || self.second == *value
    }

    /// The endpoint opposite `value`, if `value` is an endpoint.
    #[must_use]
    pub fn other(&self, value: &T) -> Option<&T> {
        if self.first == *value {
            Some(&self.second)
        } else if self.second == *value {
            Some(&self.first)
        } else {
            None
        }
    }
}

impl<T: Ord> PartialEq for UnorderedConnection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl<T: Ord> Eq for UnorderedConnection<T> {}

impl<T: Ord + Hash> Hash for UnorderedConnection<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl<T: Ord> PartialOrd for UnorderedConnection<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for UnorderedConnection<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

/// Sites `site` should be linked to, sorted.
///
/// `sites_of` returns the sites of one tile. Candidates are the sites of the
/// 3×3 neighborhood around `site`'s tile, minus `site` itself. When nothing
/// is in range the closest candidate is returned; equally close candidates
/// are ordered by center, then radius, and the smallest wins.
pub fn site_connections<S, F>(
    site: &Site,
    tile_size: i32,
    max_connect_distance: u32,
    mut sites_of: F,
) -> Vec<Site>
where
    S: AsRef<[Site]>,
    F: FnMut(TileCoord) -> S,
{
    let mut candidates = BTreeSet::new();
    for coord in site.tile(tile_size).neighborhood() {
        let sites = sites_of(coord);
        candidates.extend(sites.as_ref().iter().filter(|other| *other != site).copied());
    }

    let limit = i64::from(max_connect_distance).pow(2);
    let in_range: Vec<Site> = candidates
        .iter()
        .filter(|other| site.distance_squared(other) < limit)
        .copied()
        .collect();
    if !in_range.is_empty() {
        return in_range;
    }

    candidates
        .into_iter()
        .min_by_key(|other| (site.distance_squared(other), *other))
        .into_iter()
        .collect()
}

/// Every connection with at least one endpoint in `tile`.
///
/// Links only ever span a 3×3 neighborhood, so the sites of `tile` and its 8
/// neighbors cover every connection touching it. A link chosen by only one of
/// its endpoints (a closest-site fallback) is still reported for both tiles.
pub fn tile_connections<S, C, F, G>(
    tile: TileCoord,
    tile_size: i32,
    mut sites_of: F,
    mut connections_of: G,
) -> BTreeSet<UnorderedConnection<Site>>
where
    S: AsRef<[Site]>,
    C: AsRef<[Site]>,
    F: FnMut(TileCoord) -> S,
    G: FnMut(&Site) -> C,
{
    let mut connections = BTreeSet::new();
    for coord in tile.neighborhood() {
        let sites = sites_of(coord);
        for site in sites.as_ref() {
            let local = coord == tile;
            let linked = connections_of(site);
            connections.extend(
                linked
                    .as_ref()
                    .iter()
                    .filter(|other| local || other.tile(tile_size) == tile)
                    .map(|other| UnorderedConnection::new(*site, *other)),
            );
        }
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::WorldPos;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashMap;

    const SIZE: i32 = 1024;

    fn site(x: i32, z: i32) -> Site {
        Site::new(WorldPos::new(x, z), 20)
    }

    fn world(sites: &[Site]) -> HashMap<TileCoord, Vec<Site>> {
        let mut by_tile: HashMap<TileCoord, Vec<Site>> = HashMap::new();
        for s in sites {
            by_tile.entry(s.tile(SIZE)).or_default().push(*s);
        }
        by_tile
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_unordered_connection_symmetry() {
        let (a, b) = (site(0, 0), site(500, 0));
        let ab = UnorderedConnection::new(a, b);
        let ba = UnorderedConnection::new(b, a);

        assert_eq!(ab, ba);
        assert_eq!(hash_of(&ab), hash_of(&ba), "Swapped pairs must hash identically");
        assert_eq!(ab.cmp(&ba), Ordering::Equal);
        assert_eq!(ab.canonical(), ba.canonical());
        assert_eq!(ab.first(), &a);
        assert_eq!(ba.first(), &b);
        assert_eq!(ab.other(&a), Some(&b));
        assert_eq!(ab.other(&site(1, 1)), None);
    }

    #[test]
    fn test_in_range_sites_are_linked() {
        let sites = [site(100, 100), site(600, 100), site(1500, 100), site(3000, 100)];
        let by_tile = world(&sites);
        let sites_of = |c: TileCoord| by_tile.get(&c).cloned().unwrap_or_default();

        let linked = site_connections(&sites[0], SIZE, 800, sites_of);
        assert_eq!(linked, vec![sites[1]], "Only the site within 800 should be linked");
    }

    #[test]
    fn test_closest_fallback() {
        let sites = [site(100, 100), site(1100, 100), site(2000, 1900)];
        let by_tile = world(&sites);
        let sites_of = |c: TileCoord| by_tile.get(&c).cloned().unwrap_or_default();

        let linked = site_connections(&sites[0], SIZE, 800, sites_of);
        assert_eq!(linked, vec![sites[1]], "Out of range, the closest neighbor is linked");
    }

    #[test]
    fn test_isolated_when_neighborhood_empty() {
        let sites = [site(100, 100), site(5000, 5000)];
        let by_tile = world(&sites);
        let sites_of = |c: TileCoord| by_tile.get(&c).cloned().unwrap_or_default();

        assert!(site_connections(&sites[0], SIZE, 800, sites_of).is_empty());
    }

    #[test]
    fn test_fallback_tie_break_is_deterministic() {
        let origin = site(1000, 1000);
        let equidistant = [site(1000, 2000), site(2000, 1000), site(1000, 0), site(0, 1000)];
        let mut all = vec![origin];
        all.extend(equidistant);
        let by_tile = world(&all);
        let sites_of = |c: TileCoord| by_tile.get(&c).cloned().unwrap_or_default();

        let linked = site_connections(&origin, SIZE, 800, sites_of);
        assert_eq!(linked, vec![site(0, 1000)], "Ties resolve to the smallest site");
    }

    #[test]
    fn test_tile_connections_include_one_sided_links() {
        // `far` falls back to `near`, but `near` has a closer partner.
        let near = site(1000, 500);
        let partner = site(500, 500);
        let far = site(2040, 500);
        let by_tile = world(&[near, partner, far]);
        let sites_of = |c: TileCoord| by_tile.get(&c).cloned().unwrap_or_default();
        let connections_of = |s: &Site| site_connections(s, SIZE, 800, sites_of);

        assert_eq!(connections_of(&near), vec![partner]);
        assert_eq!(connections_of(&far), vec![near]);

        let local = tile_connections(TileCoord::new(0, 0), SIZE, sites_of, connections_of);
        assert!(local.contains(&UnorderedConnection::new(near, partner)));
        assert!(
            local.contains(&UnorderedConnection::new(near, far)),
            "A link touching the tile must be reported even if only the far end chose it"
        );

        let remote = tile_connections(TileCoord::new(1, 0), SIZE, sites_of, connections_of);
        assert_eq!(remote.len(), 1);
        assert!(remote.contains(&UnorderedConnection::new(far, near)));
    }

    #[test]
    fn test_tile_connections_are_deduplicated() {
        let sites = [site(100, 100), site(400, 100), site(700, 100)];
        let by_tile = world(&sites);
        let sites_of = |c: TileCoord| by_tile.get(&c).cloned().unwrap_or_default();
        let connections_of = |s: &Site| site_connections(s, SIZE, 800, sites_of);

        let connections = tile_connections(TileCoord::new(0, 0), SIZE, sites_of, connections_of);
        assert_eq!(connections.len(), 3, "Each pair is counted once from either end");
    }
}
