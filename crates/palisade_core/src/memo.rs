//! # Memo Cache
//!
//! Compute-once, read-many evaluation for pure functions of a key.
//!
//! ## Contract
//!
//! - `get_or_compute(key, f)` runs `f` only if the key is not cached.
//! - The computation runs **outside** the lock, so `f` may itself query
//!   other caches (or this one, for different keys) without deadlocking.
//! - If two threads race on the same key, both may compute, but only the
//!   first insert is kept and every caller gets that value. A value handed
//!   out for a key never changes until the key is evicted or invalidated.
//! - Eviction is approximate LRU: once the map grows past twice its
//!   capacity, entries not touched within the last `capacity` accesses are
//!   dropped.
//!
//! ```text
//!   caller ──> [lock: lookup] ──hit──> clone value
//!                   │
//!                  miss
//!                   ▼
//!              f(key) (unlocked) ──> [lock: insert-if-absent] ──> clone stored value
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Growth factor over capacity that triggers an eviction sweep.
const CACHE_BLOAT_RATE: usize = 2;

/// Hit/miss counters of one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the computation.
    pub misses: u64,
    /// Entries currently stored.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheInner<K, V> {
    /// Value plus the access stamp it was last touched at.
    map: HashMap<K, (u64, V)>,
    /// Monotonic access counter.
    counter: u64,
}

/// Bounded, thread-safe memo cache.
pub struct MemoCache<K, V> {
    capacity: usize,
    inner: Mutex<CacheInner<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache that keeps roughly `capacity` recently used entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "memo cache capacity must be positive");
        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                counter: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for `key`, computing it with `f` on a miss.
    pub fn get_or_compute<F>(&self, key: &K, f: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.lookup(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let computed = f(key);

        let mut inner = self.inner.lock();
        self.maintain(&mut inner);
        inner.counter += 1;
        let stamp = inner.counter;
        let entry = inner
            .map
            .entry(key.clone())
            .or_insert((stamp, computed));
        entry.0 = stamp;
        entry.1.clone()
    }

    /// Returns the cached value without computing anything.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.lookup(key)
    }

    /// True if the key is currently cached.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    /// Removes one key. Returns true if it was cached.
    pub fn invalidate(&self, key: &K) -> bool {
        self.inner.lock().map.remove(key).is_some()
    }

    /// Removes every entry and resets the counters.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.counter = 0;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Target capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn lookup(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        inner.counter += 1;
        let stamp = inner.counter;
        inner.map.get_mut(key).map(|entry| {
            entry.0 = stamp;
            entry.1.clone()
        })
    }

    fn maintain(&self, inner: &mut CacheInner<K, V>) {
        if inner.map.len() > self.capacity.saturating_mul(CACHE_BLOAT_RATE) {
            let (capacity, counter) = (self.capacity as u64, inner.counter);
            inner.map.retain(|_, (stamp, _)| *stamp + capacity > counter);
        }
    }
}

impl<K, V> fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("capacity", &self.capacity)
            .field("entries", &self.inner.lock().map.len())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

/// A pure function wrapped with its own [`MemoCache`].
///
/// ```rust,ignore
/// let squares = Memoized::new(64, |n: &u64| n * n);
/// assert_eq!(squares.apply(&12), 144);
/// ```
pub struct Memoized<K, V, F> {
    function: F,
    cache: MemoCache<K, V>,
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Hash + Eq + Clone,
    V: Clone,
    F: Fn(&K) -> V,
{
    /// Wraps `function` with a cache of the given capacity.
    #[must_use]
    pub fn new(capacity: usize, function: F) -> Self {
        Self {
            function,
            cache: MemoCache::with_capacity(capacity),
        }
    }

    /// Returns `function(key)`, computing it at most once while cached.
    pub fn apply(&self, key: &K) -> V {
        self.cache.get_or_compute(key, &self.function)
    }

    /// Forgets one key.
    pub fn invalidate(&self, key: &K) -> bool {
        self.cache.invalidate(key)
    }

    /// Forgets every key.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &MemoCache<K, V> {
        &self.cache
    }
}

impl<K, V, F> fmt::Debug for Memoized<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized").field("cache", &self.cache).finish()
    }
}
