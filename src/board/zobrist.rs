//! Zobrist hashing for position identification
//!
//! Zobrist hashing allows O(1) incremental hash updates when placing/removing stones.
//! Each board dimension gets its own table of two keys per cell (one per color),
//! built once per process and shared by every position of that dimension.
//!
//! # Example
//!
//! ```
//! use gomoku::board::{Pos, Stone, ZobristTable};
//!
//! let zt = ZobristTable::for_dim(15);
//! let pos = Pos::new(7, 7);
//!
//! // XOR is its own inverse: placing then removing restores the hash
//! let h = zt.toggle(0, pos, Stone::Black);
//! assert_ne!(h, 0);
//! assert_eq!(zt.toggle(h, pos, Stone::Black), 0);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{Pos, Stone};

/// Seed mixed with the dimension so every table differs but is reproducible.
const TABLE_SEED: u64 = 0x1234_5678_9ABC_DEF0;

static TABLES: Lazy<Mutex<HashMap<usize, Arc<ZobristTable>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Zobrist hash table for position hashing.
///
/// Uses XOR-based hashing with precomputed random values for each
/// (cell, stone color) combination.
#[derive(Debug)]
pub struct ZobristTable {
    dim: usize,
    /// Random values for black stones at each cell
    black: Vec<u64>,
    /// Random values for white stones at each cell
    white: Vec<u64>,
}

impl ZobristTable {
    /// Build a fresh table for `dim`.
    ///
    /// Keys come from ChaCha8, so the 2 x dim² keys carry no exploitable
    /// structure while staying reproducible across runs.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(TABLE_SEED ^ (dim as u64).rotate_left(32));
        let cells = dim * dim;
        let mut black = Vec::with_capacity(cells);
        let mut white = Vec::with_capacity(cells);
        for _ in 0..cells {
            black.push(rng.next_u64());
            white.push(rng.next_u64());
        }
        Self { dim, black, white }
    }

    /// Shared table for `dim`, built on first use.
    #[must_use]
    pub fn for_dim(dim: usize) -> Arc<ZobristTable> {
        let mut tables = TABLES.lock();
        Arc::clone(
            tables
                .entry(dim)
                .or_insert_with(|| Arc::new(ZobristTable::new(dim))),
        )
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Key for `stone` at `pos` (zero for `Empty`).
    #[inline]
    pub fn key(&self, pos: Pos, stone: Stone) -> u64 {
        let idx = pos.to_index(self.dim);
        match stone {
            Stone::Black => self.black[idx],
            Stone::White => self.white[idx],
            Stone::Empty => 0,
        }
    }

    /// XOR `stone` at `pos` into `hash`. Placing and removing are the same
    /// operation.
    #[inline]
    #[must_use]
    pub fn toggle(&self, hash: u64, pos: Pos, stone: Stone) -> u64 {
        hash ^ self.key(pos, stone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Bitboard;

    #[test]
    fn test_zobrist_deterministic() {
        let zt1 = ZobristTable::new(15);
        let zt2 = ZobristTable::new(15);
        let pos = Pos::new(3, 4);
        assert_eq!(zt1.key(pos, Stone::Black), zt2.key(pos, Stone::Black));
    }

    #[test]
    fn test_zobrist_shared_per_dim() {
        let a = ZobristTable::for_dim(9);
        let b = ZobristTable::for_dim(9);
        let c = ZobristTable::for_dim(11);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.dim(), 11);
    }

    #[test]
    fn test_zobrist_keys_distinct() {
        let zt = ZobristTable::new(19);
        let mut keys: Vec<u64> = zt.black.iter().chain(zt.white.iter()).copied().collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert!(!keys.contains(&0));
    }

    #[test]
    fn test_zobrist_colors_differ() {
        let zt = ZobristTable::new(15);
        let pos = Pos::new(7, 7);
        assert_ne!(zt.key(pos, Stone::Black), zt.key(pos, Stone::White));
        assert_eq!(zt.key(pos, Stone::Empty), 0);
    }

    #[test]
    fn test_zobrist_full_hash_matches_toggles() {
        let zt = ZobristTable::new(15);
        let mut black = Bitboard::new(15);
        let mut white = Bitboard::new(15);
        black.set(Pos::new(7, 7));
        white.set(Pos::new(7, 8));
        black.set(Pos::new(0, 14));

        let mut h = 0;
        h = zt.toggle(h, Pos::new(7, 8), Stone::White);
        h = zt.toggle(h, Pos::new(0, 14), Stone::Black);
        h = zt.toggle(h, Pos::new(7, 7), Stone::Black);
        let full = black
            .iter_ones()
            .map(|pos| zt.key(pos, Stone::Black))
            .chain(white.iter_ones().map(|pos| zt.key(pos, Stone::White)))
            .fold(0, |acc, key| acc ^ key);
        assert_eq!(h, full);
    }
}
