//! Content-fingerprint memoization.
//!
//! Every expensive stage of the engine (resolved subpaths, offset fields,
//! named point-sets) is keyed by a structural fingerprint of its inputs:
//! coordinate bit patterns are hashed, never object identity. Two chains
//! that resolve to the same geometry therefore share cache entries, and a
//! drag only recomputes the entries whose inputs actually moved.

use std::hash::Hasher;

use ahash::{AHashMap, RandomState};

use crate::math::{Point2, Vector2};

/// Structural content fingerprint of a geometric input.
pub type Fingerprint = u64;

// Fixed seeds so fingerprints are stable for the lifetime of the process
// and across registry instances.
const SEEDS: (u64, u64, u64, u64) = (
    0x9e37_79b9_7f4a_7c15,
    0xf39c_c060_5ced_c834,
    0x1082_276b_f3a2_7251,
    0x7109_870e_cba5_2cfb,
);

/// Incremental fingerprint builder over geometric content.
pub struct FingerprintBuilder {
    hasher: ahash::AHasher,
}

impl FingerprintBuilder {
    #[must_use]
    pub fn new() -> Self {
        let state = RandomState::with_seeds(SEEDS.0, SEEDS.1, SEEDS.2, SEEDS.3);
        Self {
            hasher: std::hash::BuildHasher::build_hasher(&state),
        }
    }

    pub fn write_f64(&mut self, value: f64) {
        self.hasher.write_u64(value.to_bits());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.hasher.write_u64(value);
    }

    pub fn write_point(&mut self, p: &Point2) {
        self.write_f64(p.x);
        self.write_f64(p.y);
    }

    pub fn write_vector(&mut self, v: &Vector2) {
        self.write_f64(v.x);
        self.write_f64(v.y);
    }

    pub fn write_points(&mut self, points: &[Point2]) {
        self.write_u64(points.len() as u64);
        for p in points {
            self.write_point(p);
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.hasher.write(s.as_bytes());
        self.hasher.write_u8(0xff);
    }

    #[must_use]
    pub fn finish(self) -> Fingerprint {
        self.hasher.finish()
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprints a bare point list.
#[must_use]
pub fn fingerprint_points(points: &[Point2]) -> Fingerprint {
    let mut fp = FingerprintBuilder::new();
    fp.write_points(points);
    fp.finish()
}

/// One memoization layer: fingerprint → cached value.
///
/// Hit/miss counters make recomputation observable in tests without
/// instrumenting the computation itself.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: AHashMap<Fingerprint, V>,
    hits: u64,
    misses: u64,
}

impl<V> MemoCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(&mut self, key: Fingerprint, compute: impl FnOnce() -> V) -> &V {
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.entries.insert(key, compute());
        }
        // Entry is guaranteed present by either branch above.
        &self.entries[&key]
    }

    /// Fallible variant of [`MemoCache::get_or_insert_with`]. Nothing is
    /// cached when `compute` fails.
    pub fn try_get_or_insert_with<E>(
        &mut self,
        key: Fingerprint,
        compute: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<&V, E> {
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.entries.insert(key, compute()?);
        }
        Ok(&self.entries[&key])
    }

    #[must_use]
    pub fn get(&self, key: Fingerprint) -> Option<&V> {
        self.entries.get(&key)
    }

    /// Drops every cached entry. Counters are preserved.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
