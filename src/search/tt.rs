//! Transposition caches keyed by position
//!
//! The store keeps three families of derived data per position: the
//! heuristic totals, the ordered candidate list of each color, and the
//! per-cell score map of each color used to reorder children incrementally.
//!
//! Keys are value snapshots, never live positions, so an entry stays valid
//! while the searched position keeps changing. Lookups take a read lock;
//! inserts take the write lock of one cache only.
//!
//! # Example
//!
//! ```
//! use gomoku::board::{Pos, Position, Stone};
//! use gomoku::eval::Heuristic;
//! use gomoku::search::{EqualityMode, TranspositionStore};
//!
//! let store = TranspositionStore::new(EqualityMode::Exact, 1024);
//! let mut position = Position::new(15).unwrap();
//! position.place(Pos::new(7, 7), Stone::Black).unwrap();
//!
//! store.put_heuristic(&position, Heuristic { black: 10, white: 0 });
//! assert_eq!(store.get_heuristic(&position).map(|h| h.black), Some(10));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::trace;
use parking_lot::RwLock;

use crate::board::{Move, Position, Snapshot, Stone};
use crate::eval::Heuristic;

/// How a cache hit is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EqualityMode {
    /// Compare the stored snapshot cell by cell. Always correct.
    #[default]
    Exact,
    /// Trust the 64-bit hash alone. Faster; a collision returns another
    /// position's data.
    HashOnly,
}

struct Slot<V> {
    /// `None` in hash-only mode
    snapshot: Option<Snapshot>,
    value: V,
}

struct Buckets<V> {
    map: HashMap<u64, Vec<Slot<V>>>,
    len: usize,
}

/// One hash-keyed cache with its own lock and counters.
struct Cache<V> {
    name: &'static str,
    buckets: RwLock<Buckets<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Cache<V> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            buckets: RwLock::new(Buckets {
                map: HashMap::new(),
                len: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn get(&self, position: &Position, mode: EqualityMode) -> Option<V> {
        let found = {
            let buckets = self.buckets.read();
            buckets.map.get(&position.hash()).and_then(|bucket| {
                bucket
                    .iter()
                    .find(|slot| match (mode, &slot.snapshot) {
                        (EqualityMode::HashOnly, _) | (_, None) => true,
                        (EqualityMode::Exact, Some(snap)) => snap.matches(position),
                    })
                    .map(|slot| slot.value.clone())
            })
        };
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn put(&self, position: &Position, value: V, mode: EqualityMode, capacity: usize) {
        let mut buckets = self.buckets.write();
        if buckets.len >= capacity {
            trace!("{} cache full at {} entries, flushing", self.name, buckets.len);
            buckets.map.clear();
            buckets.len = 0;
        }

        let bucket = buckets.map.entry(position.hash()).or_default();
        let added = match mode {
            EqualityMode::HashOnly => {
                let was_empty = bucket.is_empty();
                bucket.clear();
                bucket.push(Slot {
                    snapshot: None,
                    value,
                });
                was_empty
            }
            EqualityMode::Exact => {
                if let Some(slot) = bucket
                    .iter_mut()
                    .find(|s| s.snapshot.as_ref().is_some_and(|snap| snap.matches(position)))
                {
                    slot.value = value;
                    false
                } else {
                    bucket.push(Slot {
                        snapshot: Some(position.snapshot()),
                        value,
                    });
                    true
                }
            }
        };
        if added {
            buckets.len += 1;
        }
    }

    fn clear(&self) {
        let mut buckets = self.buckets.write();
        buckets.map.clear();
        buckets.len = 0;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self, capacity: usize) -> CacheStats {
        let entries = self.buckets.read().len;
        CacheStats {
            entries,
            capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Usage counters of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    /// Entries currently stored
    pub entries: usize,
    /// Entries allowed before the cache is flushed
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Percentage of lookups that hit (0-100)
    pub fn hit_percent(&self) -> u8 {
        let total = self.hits + self.misses;
        if total == 0 {
            0
        } else {
            (self.hits * 100 / total) as u8
        }
    }
}

/// Counters of every cache in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreStats {
    pub heuristics: CacheStats,
    pub moves: CacheStats,
    pub scores: CacheStats,
}

/// Caches of derived position data shared by every search.
///
/// The equality mode is fixed at construction.
pub struct TranspositionStore {
    mode: EqualityMode,
    capacity: usize,
    heuristics: Cache<Heuristic>,
    moves: [Cache<Arc<[Move]>>; 2],
    scores: [Cache<Arc<[Option<i64>]>>; 2],
}

impl TranspositionStore {
    /// # Arguments
    ///
    /// * `mode` - How hits are confirmed
    /// * `capacity` - Entries per cache before that cache is flushed
    #[must_use]
    pub fn new(mode: EqualityMode, capacity: usize) -> Self {
        Self {
            mode,
            capacity: capacity.max(1),
            heuristics: Cache::new("heuristic"),
            moves: [Cache::new("black moves"), Cache::new("white moves")],
            scores: [Cache::new("black scores"), Cache::new("white scores")],
        }
    }

    #[inline]
    pub fn mode(&self) -> EqualityMode {
        self.mode
    }

    pub fn get_heuristic(&self, position: &Position) -> Option<Heuristic> {
        self.heuristics.get(position, self.mode)
    }

    pub fn put_heuristic(&self, position: &Position, value: Heuristic) {
        self.heuristics.put(position, value, self.mode, self.capacity);
    }

    /// Full ordered move list of `player`, best first.
    pub fn get_moves(&self, position: &Position, player: Stone) -> Option<Arc<[Move]>> {
        self.moves[player.index()].get(position, self.mode)
    }

    pub fn put_moves(&self, position: &Position, player: Stone, moves: Arc<[Move]>) {
        self.moves[player.index()].put(position, moves, self.mode, self.capacity);
    }

    /// Row-major score map of `player`; `None` marks cells that were not
    /// candidates.
    pub fn get_scores(&self, position: &Position, player: Stone) -> Option<Arc<[Option<i64>]>> {
        self.scores[player.index()].get(position, self.mode)
    }

    pub fn put_scores(&self, position: &Position, player: Stone, scores: Arc<[Option<i64>]>) {
        self.scores[player.index()].put(position, scores, self.mode, self.capacity);
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.heuristics.clear();
        for cache in &self.moves {
            cache.clear();
        }
        for cache in &self.scores {
            cache.clear();
        }
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let merge = |a: CacheStats, b: CacheStats| CacheStats {
            entries: a.entries + b.entries,
            capacity: a.capacity + b.capacity,
            hits: a.hits + b.hits,
            misses: a.misses + b.misses,
        };
        StoreStats {
            heuristics: self.heuristics.stats(self.capacity),
            moves: merge(
                self.moves[0].stats(self.capacity),
                self.moves[1].stats(self.capacity),
            ),
            scores: merge(
                self.scores[0].stats(self.capacity),
                self.scores[1].stats(self.capacity),
            ),
        }
    }
}
