//! Board representation for Gomoku

pub mod bitboard;
pub mod position;
pub mod zobrist;

use std::fmt;
use std::str::FromStr;

use crate::error::GomokuError;

// Re-exports
pub use bitboard::Bitboard;
pub use position::{Position, Scratch, Snapshot};
pub use zobrist::ZobristTable;

/// Smallest supported board (a line of five must fit)
pub const MIN_DIM: usize = 5;
/// Largest supported board
pub const MAX_DIM: usize = 64;

/// The four line axes: horizontal, vertical and the two diagonals
pub const DIRECTIONS: [(i32, i32); 4] = [
    (0, 1),  // Horizontal
    (1, 0),  // Vertical
    (1, 1),  // Diagonal SE
    (1, -1), // Diagonal SW
];

/// Stone colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stone {
    Empty,
    Black,
    White,
}

impl Stone {
    /// Get opponent color.
    ///
    /// `Empty` has no opponent; callers must only ask for players.
    #[inline]
    pub fn opponent(self) -> Stone {
        debug_assert_ne!(self, Stone::Empty, "opponent of an empty cell");
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            Stone::Empty => Stone::Empty,
        }
    }

    /// Slot used by per-color tables (Black = 0, White = 1)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Stone::White => 1,
            _ => 0,
        }
    }

    #[inline]
    pub fn is_player(self) -> bool {
        self != Stone::Empty
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Empty => write!(f, "empty"),
            Stone::Black => write!(f, "black"),
            Stone::White => write!(f, "white"),
        }
    }
}

/// Position on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pos {
    pub row: u8,
    pub col: u8,
}

impl Pos {
    #[inline]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn to_index(self, dim: usize) -> usize {
        self.row as usize * dim + self.col as usize
    }

    #[inline]
    pub fn from_index(idx: usize, dim: usize) -> Self {
        Self {
            row: (idx / dim) as u8,
            col: (idx % dim) as u8,
        }
    }

    #[inline]
    pub fn is_valid(row: i32, col: i32, dim: usize) -> bool {
        row >= 0 && row < dim as i32 && col >= 0 && col < dim as i32
    }

    /// Step `k` cells along `(dr, dc)`, or `None` past the edge.
    #[inline]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn offset(self, dr: i32, dc: i32, k: i32, dim: usize) -> Option<Pos> {
        let r = i32::from(self.row) + dr * k;
        let c = i32::from(self.col) + dc * k;
        if Pos::is_valid(r, c, dim) {
            Some(Pos::new(r as u8, c as u8))
        } else {
            None
        }
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.row, self.col).cmp(&(other.row, other.col))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Parses `"row,col"`, e.g. `"7,8"`.
impl FromStr for Pos {
    type Err = GomokuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .trim()
            .split_once(',')
            .ok_or_else(|| GomokuError::ParsePos(s.to_string()))?;
        let row = row
            .trim()
            .parse::<u8>()
            .map_err(|_| GomokuError::ParsePos(s.to_string()))?;
        let col = col
            .trim()
            .parse::<u8>()
            .map_err(|_| GomokuError::ParsePos(s.to_string()))?;
        Ok(Pos::new(row, col))
    }
}

/// A candidate or chosen move with its score.
///
/// The score is from the perspective of the side making the move unless the
/// producer documents otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    pub pos: Pos,
    pub score: i64,
}

impl Move {
    #[inline]
    pub const fn new(pos: Pos, score: i64) -> Self {
        Self { pos, score }
    }
}
