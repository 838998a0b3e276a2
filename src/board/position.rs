//! Mutable game position with incremental hashing
//!
//! `Position` is the only board type in the crate. Search mutates it in place
//! with `make`/`undo` in strict stack order; the [`Scratch`] guard rewinds
//! every move made through it when it goes out of scope, including early
//! returns on pruning or timeout.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use super::{Bitboard, Pos, Stone, ZobristTable, MAX_DIM, MIN_DIM};
use crate::error::{GomokuError, Result};

/// Cells within this Chebyshev distance of a stone are candidates.
pub const ACTIVE_RADIUS: i32 = 2;

/// N x N grid of stones plus a rolling Zobrist hash.
#[derive(Clone)]
pub struct Position {
    dim: usize,
    cells: Vec<Stone>,
    black: Bitboard,
    white: Bitboard,
    /// Occupied cells within `ACTIVE_RADIUS` of each cell
    neighbors: Vec<u16>,
    hash: u64,
    zobrist: Arc<ZobristTable>,
    history: Vec<(Pos, Stone)>,
}

impl Position {
    /// Empty `dim` x `dim` position.
    pub fn new(dim: usize) -> Result<Self> {
        if !(MIN_DIM..=MAX_DIM).contains(&dim) {
            return Err(GomokuError::InvalidDimension(dim));
        }
        Ok(Self {
            dim,
            cells: vec![Stone::Empty; dim * dim],
            black: Bitboard::new(dim),
            white: Bitboard::new(dim),
            neighbors: vec![0; dim * dim],
            hash: 0,
            zobrist: ZobristTable::for_dim(dim),
            history: Vec::with_capacity(dim * dim),
        })
    }

    /// Load a square grid of stones (row-major). Stones enter the history in
    /// row-major order, so `last_move` is only meaningful for replayed games.
    pub fn from_grid(grid: &[Vec<Stone>]) -> Result<Self> {
        let mut position = Self::new(grid.len())?;
        for (r, row) in grid.iter().enumerate() {
            if row.len() != grid.len() {
                return Err(GomokuError::InvalidDimension(row.len()));
            }
            for (c, &stone) in row.iter().enumerate() {
                if stone.is_player() {
                    position.make(Pos::new(r as u8, c as u8), stone);
                }
            }
        }
        Ok(position)
    }

    /// Replay an ordered move history.
    pub fn from_history(dim: usize, moves: &[(Pos, Stone)]) -> Result<Self> {
        let mut position = Self::new(dim)?;
        for &(pos, stone) in moves {
            position.place(pos, stone)?;
        }
        Ok(position)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Current Zobrist hash
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Stone {
        self.cells[pos.to_index(self.dim)]
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.get(pos) == Stone::Empty
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        (pos.row as usize) < self.dim && (pos.col as usize) < self.dim
    }

    /// Occupancy of one color.
    #[inline]
    pub fn stones(&self, stone: Stone) -> &Bitboard {
        debug_assert!(stone.is_player());
        match stone {
            Stone::White => &self.white,
            _ => &self.black,
        }
    }

    #[inline]
    pub fn stone_count(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_board_empty(&self) -> bool {
        self.history.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.history.len() == self.dim * self.dim
    }

    /// Moves in the order they were made
    #[inline]
    pub fn history(&self) -> &[(Pos, Stone)] {
        &self.history
    }

    #[inline]
    pub fn last_move(&self) -> Option<(Pos, Stone)> {
        self.history.last().copied()
    }

    #[inline]
    pub fn center(&self) -> Pos {
        let mid = (self.dim / 2) as u8;
        Pos::new(mid, mid)
    }

    /// Place a stone after validating the request.
    pub fn place(&mut self, pos: Pos, stone: Stone) -> Result<()> {
        if !stone.is_player() {
            return Err(GomokuError::NotAPlayer);
        }
        self.check_bounds(pos)?;
        if !self.is_empty(pos) {
            return Err(GomokuError::Occupied {
                row: pos.row,
                col: pos.col,
            });
        }
        self.make(pos, stone);
        Ok(())
    }

    /// Remove the stone at `pos`, returning its color.
    ///
    /// Removing anything but the most recent stone is allowed; the history
    /// entry for that cell is dropped wherever it sits.
    pub fn remove(&mut self, pos: Pos) -> Result<Stone> {
        self.check_bounds(pos)?;
        let stone = self.get(pos);
        if stone == Stone::Empty {
            return Err(GomokuError::Vacant {
                row: pos.row,
                col: pos.col,
            });
        }
        if let Some(at) = self.history.iter().rposition(|&(p, _)| p == pos) {
            self.history.remove(at);
        }
        self.toggle(pos, stone, false);
        Ok(stone)
    }

    /// Take back the most recent move.
    pub fn undo(&mut self) -> Option<(Pos, Stone)> {
        let (pos, stone) = self.history.pop()?;
        self.toggle(pos, stone, false);
        Some((pos, stone))
    }

    /// Unchecked placement for search.
    #[inline]
    pub(crate) fn make(&mut self, pos: Pos, stone: Stone) {
        debug_assert!(self.contains(pos), "move {} off the board", pos);
        debug_assert!(self.is_empty(pos), "move {} onto an occupied cell", pos);
        debug_assert!(stone.is_player());
        self.history.push((pos, stone));
        self.toggle(pos, stone, true);
    }

    /// Undo moves until only `len` remain.
    pub fn rewind_to(&mut self, len: usize) {
        while self.history.len() > len {
            self.undo();
        }
    }

    /// Guard that rewinds every move made through it on drop.
    pub fn scratch(&mut self) -> Scratch<'_> {
        let mark = self.history.len();
        Scratch {
            position: self,
            mark,
        }
    }

    /// Value copy used as a transposition key.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            hash: self.hash,
            black: self.black.clone(),
            white: self.white.clone(),
        }
    }

    /// Empty cell near play (within `ACTIVE_RADIUS` of some stone).
    #[inline]
    pub fn is_active(&self, pos: Pos) -> bool {
        let idx = pos.to_index(self.dim);
        self.cells[idx] == Stone::Empty && self.neighbors[idx] > 0
    }

    /// All active cells in row-major order.
    pub fn active_cells(&self) -> Vec<Pos> {
        (0..self.dim * self.dim)
            .filter(|&idx| self.cells[idx] == Stone::Empty && self.neighbors[idx] > 0)
            .map(|idx| Pos::from_index(idx, self.dim))
            .collect()
    }

    /// Active cells as an occupancy set, for overlays.
    pub fn active_map(&self) -> Bitboard {
        let mut map = Bitboard::new(self.dim);
        for pos in self.active_cells() {
            map.set(pos);
        }
        map
    }

    /// Copy of the grid, row by row.
    pub fn grid(&self) -> Vec<Vec<Stone>> {
        self.cells.chunks(self.dim).map(<[Stone]>::to_vec).collect()
    }

    /// Empty cell closest to the centre (ties in row-major order).
    pub fn empty_nearest_center(&self) -> Option<Pos> {
        let center = self.center();
        (0..self.dim * self.dim)
            .filter(|&idx| self.cells[idx] == Stone::Empty)
            .map(|idx| Pos::from_index(idx, self.dim))
            .min_by_key(|p| {
                let dr = i32::from(p.row) - i32::from(center.row);
                let dc = i32::from(p.col) - i32::from(center.col);
                dr * dr + dc * dc
            })
    }

    fn check_bounds(&self, pos: Pos) -> Result<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(GomokuError::OutOfBounds {
                row: i32::from(pos.row),
                col: i32::from(pos.col),
                dim: self.dim,
            })
        }
    }

    /// Flip `stone` at `pos` in cells, bitboards, hash and neighbor counts.
    fn toggle(&mut self, pos: Pos, stone: Stone, placing: bool) {
        let idx = pos.to_index(self.dim);
        let board = match stone {
            Stone::White => &mut self.white,
            _ => &mut self.black,
        };
        if placing {
            self.cells[idx] = stone;
            board.set(pos);
        } else {
            self.cells[idx] = Stone::Empty;
            board.clear(pos);
        }
        self.hash = self.zobrist.toggle(self.hash, pos, stone);

        for dr in -ACTIVE_RADIUS..=ACTIVE_RADIUS {
            for dc in -ACTIVE_RADIUS..=ACTIVE_RADIUS {
                if dr == 0 && dc == 0 {
                    continue;
                }
                if let Some(n) = pos.offset(dr, dc, 1, self.dim) {
                    let count = &mut self.neighbors[n.to_index(self.dim)];
                    if placing {
                        *count += 1;
                    } else {
                        *count -= 1;
                    }
                }
            }
        }
    }
}

/// Cell-by-cell comparison; history order is ignored.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.cells == other.cells
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("dim", &self.dim)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("stones", &self.history.len())
            .finish()
    }
}

/// `- ` empty, `* ` black, `o ` white, one row per line.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.dim) {
            for stone in row {
                let glyph = match stone {
                    Stone::Empty => "- ",
                    Stone::Black => "* ",
                    Stone::White => "o ",
                };
                f.write_str(glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Scoped make/unmake. Derefs to the position; moves made through it are
/// undone when it drops.
pub struct Scratch<'a> {
    position: &'a mut Position,
    mark: usize,
}

impl Scratch<'_> {
    /// Number of moves made through this guard so far.
    #[inline]
    pub fn depth(&self) -> usize {
        self.position.history.len() - self.mark
    }

    #[inline]
    pub(crate) fn play(&mut self, pos: Pos, stone: Stone) {
        self.position.make(pos, stone);
    }
}

impl Deref for Scratch<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.position
    }
}

impl DerefMut for Scratch<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        self.position
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        self.position.rewind_to(self.mark);
    }
}

/// Value copy of a position used to confirm transposition hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    hash: u64,
    black: Bitboard,
    white: Bitboard,
}

impl Snapshot {
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Exact comparison against a live position.
    pub fn matches(&self, position: &Position) -> bool {
        self.hash == position.hash && self.black == position.black && self.white == position.white
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_dimension() {
        assert_eq!(Position::new(4).unwrap_err(), GomokuError::InvalidDimension(4));
        assert_eq!(Position::new(65).unwrap_err(), GomokuError::InvalidDimension(65));
        assert!(Position::new(5).is_ok());
    }

    #[test]
    fn test_place_remove_restores_hash() {
        let mut p = Position::new(15).unwrap();
        p.place(Pos::new(7, 7), Stone::Black).unwrap();
        let h = p.hash();
        p.place(Pos::new(7, 8), Stone::White).unwrap();
        assert_ne!(p.hash(), h);
        assert_eq!(p.remove(Pos::new(7, 8)).unwrap(), Stone::White);
        assert_eq!(p.hash(), h);
        p.undo();
        assert_eq!(p.hash(), 0);
    }

    #[test]
    fn test_place_validation() {
        let mut p = Position::new(9).unwrap();
        assert_eq!(
            p.place(Pos::new(9, 0), Stone::Black),
            Err(GomokuError::OutOfBounds { row: 9, col: 0, dim: 9 })
        );
        assert_eq!(p.place(Pos::new(1, 1), Stone::Empty), Err(GomokuError::NotAPlayer));
        p.place(Pos::new(1, 1), Stone::Black).unwrap();
        assert_eq!(
            p.place(Pos::new(1, 1), Stone::White),
            Err(GomokuError::Occupied { row: 1, col: 1 })
        );
        assert_eq!(p.remove(Pos::new(2, 2)), Err(GomokuError::Vacant { row: 2, col: 2 }));
    }

    #[test]
    fn test_scratch_rewinds_on_drop() {
        let mut p = Position::new(15).unwrap();
        p.place(Pos::new(7, 7), Stone::Black).unwrap();
        let before = p.clone();
        {
            let mut s = p.scratch();
            s.play(Pos::new(7, 8), Stone::White);
            s.play(Pos::new(8, 8), Stone::Black);
            assert_eq!(s.depth(), 2);
            assert_eq!(s.stone_count(), 3);
        }
        assert_eq!(p, before);
        assert_eq!(p.hash(), before.hash());
        assert_eq!(p.active_cells(), before.active_cells());
    }

    #[test]
    fn test_active_cells_radius() {
        let mut p = Position::new(15).unwrap();
        assert!(p.active_cells().is_empty());
        p.place(Pos::new(7, 7), Stone::Black).unwrap();
        let active = p.active_cells();
        assert_eq!(active.len(), 24);
        assert!(p.is_active(Pos::new(5, 9)));
        assert!(!p.is_active(Pos::new(4, 7)));
        assert!(!p.is_active(Pos::new(7, 7)));
    }

    #[test]
    fn test_active_cells_clipped_at_corner() {
        let mut p = Position::new(7).unwrap();
        p.place(Pos::new(0, 0), Stone::White).unwrap();
        assert_eq!(p.active_cells().len(), 8);
        p.undo();
        assert!(p.active_cells().is_empty());
    }

    #[test]
    fn test_snapshot_matches() {
        let mut p = Position::new(9).unwrap();
        p.place(Pos::new(4, 4), Stone::Black).unwrap();
        let snap = p.snapshot();
        assert!(snap.matches(&p));
        p.place(Pos::new(4, 5), Stone::White).unwrap();
        assert!(!snap.matches(&p));
    }

    #[test]
    fn test_from_grid_and_history_agree() {
        let moves = [
            (Pos::new(2, 2), Stone::Black),
            (Pos::new(2, 3), Stone::White),
            (Pos::new(3, 3), Stone::Black),
        ];
        let replayed = Position::from_history(7, &moves).unwrap();
        let loaded = Position::from_grid(&replayed.grid()).unwrap();
        assert_eq!(replayed, loaded);
        assert_eq!(replayed.hash(), loaded.hash());
        assert_eq!(replayed.last_move(), Some((Pos::new(3, 3), Stone::Black)));
    }

    #[test]
    fn test_display() {
        let mut p = Position::new(5).unwrap();
        p.place(Pos::new(0, 0), Stone::Black).unwrap();
        p.place(Pos::new(0, 1), Stone::White).unwrap();
        let text = p.to_string();
        assert_eq!(text.lines().next(), Some("* o - - - "));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_empty_nearest_center() {
        let mut p = Position::new(5).unwrap();
        assert_eq!(p.empty_nearest_center(), Some(Pos::new(2, 2)));
        p.place(Pos::new(2, 2), Stone::Black).unwrap();
        assert_eq!(p.empty_nearest_center(), Some(Pos::new(1, 2)));
    }
}
