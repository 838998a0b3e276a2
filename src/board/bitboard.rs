//! Bitboard implementation for occupancy sets

use super::Pos;

/// One bit per cell of a `dim` x `dim` board, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bitboard {
    bits: Vec<u64>,
    dim: usize,
}

impl Bitboard {
    /// Create empty bitboard
    pub fn new(dim: usize) -> Self {
        let words = (dim * dim).div_ceil(64);
        Self {
            bits: vec![0; words],
            dim,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Set a bit at position
    #[inline]
    pub fn set(&mut self, pos: Pos) {
        let idx = pos.to_index(self.dim);
        self.bits[idx / 64] |= 1u64 << (idx % 64);
    }

    /// Clear a bit at position
    #[inline]
    pub fn clear(&mut self, pos: Pos) {
        let idx = pos.to_index(self.dim);
        self.bits[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Check if bit is set at position
    #[inline]
    pub fn get(&self, pos: Pos) -> bool {
        let idx = pos.to_index(self.dim);
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Count total set bits (popcount)
    #[inline]
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Iterate over set bit positions
    pub fn iter_ones(&self) -> BitboardIter<'_> {
        BitboardIter {
            board: self,
            word_idx: 0,
            current_word: self.bits.first().copied().unwrap_or(0),
        }
    }
}

/// Iterator over set bits in a Bitboard
pub struct BitboardIter<'a> {
    board: &'a Bitboard,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for BitboardIter<'_> {
    type Item = Pos;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current_word == 0 {
            self.word_idx += 1;
            if self.word_idx >= self.board.bits.len() {
                return None;
            }
            self.current_word = self.board.bits[self.word_idx];
        }

        let bit_pos = self.current_word.trailing_zeros() as usize;
        let idx = self.word_idx * 64 + bit_pos;

        // Clear the bit we just found
        self.current_word &= self.current_word - 1;

        let dim = self.board.dim;
        if idx < dim * dim {
            Some(Pos::from_index(idx, dim))
        } else {
            None
        }
    }
}
