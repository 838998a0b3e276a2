//! Line threat recognition
//!
//! For a cell and a player, the four lines through the cell are cut into
//! short windows, each window is classified into [`Threat`] categories, and
//! the cell's score is the sum of their weights. Classification is a pure
//! function of the window, so results are memoized per window content.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::patterns::Threat;
use crate::board::{Pos, Position, Stone, DIRECTIONS};

/// Cells explored on each side of the center.
pub const REACH: i32 = 5;
/// Longest window: both reaches plus the center.
pub const MAX_LINE: usize = 2 * REACH as usize + 1;

/// Window of stones along one axis, centered on the evaluated cell.
///
/// The board edge shows up as an opponent stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    cells: [Stone; MAX_LINE],
    len: u8,
}

impl Line {
    fn new() -> Self {
        Self {
            cells: [Stone::Empty; MAX_LINE],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, stone: Stone) {
        self.cells[self.len as usize] = stone;
        self.len += 1;
    }

    #[inline]
    pub fn as_slice(&self) -> &[Stone] {
        &self.cells[..self.len as usize]
    }
}

/// Compact cache key: window length plus two bits per cell, relative to the
/// player (0 empty, 1 own, 2 opponent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineKey(u32);

impl LineKey {
    pub fn new(line: &[Stone], player: Stone) -> Self {
        debug_assert!(line.len() <= MAX_LINE);
        let mut bits = (line.len() as u32) << (2 * MAX_LINE);
        for (i, &stone) in line.iter().enumerate() {
            let code = match stone {
                Stone::Empty => 0,
                s if s == player => 1,
                _ => 2,
            };
            bits |= code << (2 * i);
        }
        LineKey(bits)
    }
}

/// Scores cells by the threats they take part in, with a shared window cache.
///
/// Readers take the read lock only for the lookup; a miss is classified
/// outside any lock and inserted under a short write lock. Two threads
/// missing on the same window both compute the same result, and the second
/// insert is a no-op.
#[derive(Debug, Default)]
pub struct ThreatEvaluator {
    lines: RwLock<HashMap<LineKey, Arc<[Threat]>>>,
}

impl ThreatEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four windows through `pos` as seen by `player`, one per axis.
    ///
    /// Each side walks up to [`REACH`] cells and stops after an opponent
    /// stone, the edge (recorded as an opponent stone), or the second empty
    /// cell on that side. The center always reads as `player`.
    pub fn linearize(position: &Position, player: Stone, pos: Pos) -> [Line; 4] {
        let opponent = player.opponent();
        let dim = position.dim();

        let explore = |dr: i32, dc: i32, out: &mut [Stone; REACH as usize]| -> usize {
            let mut n = 0;
            let mut seen_empty = false;
            for k in 1..=REACH {
                let Some(p) = pos.offset(dr, dc, k, dim) else {
                    out[n] = opponent;
                    n += 1;
                    break;
                };
                let stone = position.get(p);
                out[n] = stone;
                n += 1;
                if stone == Stone::Empty {
                    if seen_empty {
                        break;
                    }
                    seen_empty = true;
                } else if stone == opponent {
                    break;
                }
            }
            n
        };

        let mut lines = [Line::new(); 4];
        for (line, &(dr, dc)) in lines.iter_mut().zip(DIRECTIONS.iter()) {
            let mut side = [Stone::Empty; REACH as usize];
            let n = explore(-dr, -dc, &mut side);
            for &stone in side[..n].iter().rev() {
                line.push(stone);
            }
            line.push(player);
            let n = explore(dr, dc, &mut side);
            for &stone in &side[..n] {
                line.push(stone);
            }
        }
        lines
    }

    /// Classify one window for `player`.
    ///
    /// Stones are grouped into contiguous runs. Two runs separated by exactly
    /// one empty cell are linked, and every linked pair forms one gapped
    /// ("poked") run, so a chain of three runs yields two overlapping poked
    /// runs. Runs touching an opponent-capped end are blocked. Windows capped
    /// on both ends with fewer than five open cells hold no threat at all.
    pub fn classify(line: &[Stone], player: Stone) -> Vec<Threat> {
        let n = line.len();
        if n == 0 {
            return Vec::new();
        }
        let opponent = player.opponent();
        let left_blocked = line[0] == opponent;
        let right_blocked = line[n - 1] == opponent;

        if left_blocked && right_blocked && n < 7 {
            return vec![Threat::None];
        }

        let a = usize::from(left_blocked);
        let b = if right_blocked { n - 2 } else { n - 1 };

        // Contiguous groups of own stones, inclusive bounds
        let mut groups: Vec<(usize, usize)> = Vec::new();
        let mut i = a;
        while i <= b {
            if line[i] == player {
                let start = i;
                while i < b && line[i + 1] == player {
                    i += 1;
                }
                groups.push((start, i));
            }
            i += 1;
        }

        let linked = |l: (usize, usize), r: (usize, usize)| {
            r.0 == l.1 + 2 && line[l.1 + 1] == Stone::Empty
        };
        let size = |g: (usize, usize)| g.1 - g.0 + 1;

        // (start, end, stones, poked)
        let mut runs: Vec<(usize, usize, usize, bool)> = Vec::new();
        for k in 0..groups.len() {
            let g = groups[k];
            let to_next = k + 1 < groups.len() && linked(g, groups[k + 1]);
            let from_prev = k > 0 && linked(groups[k - 1], g);
            if to_next {
                let h = groups[k + 1];
                runs.push((g.0, h.1, size(g) + size(h), true));
            }
            // A five survives even when a gapped neighbour is attached
            if (!to_next && !from_prev) || size(g) >= 5 {
                runs.push((g.0, g.1, size(g), false));
            }
        }

        runs.into_iter()
            .filter_map(|(start, end, same, poked)| {
                let blocked = (left_blocked && start == a) || (right_blocked && end == b);
                Threat::from_run(same, poked, blocked)
            })
            .collect()
    }

    /// Threats of one window, served from the cache when possible.
    pub fn line_threats(&self, line: &[Stone], player: Stone) -> Arc<[Threat]> {
        let key = LineKey::new(line, player);
        if let Some(hit) = self.lines.read().get(&key) {
            return Arc::clone(hit);
        }
        let threats: Arc<[Threat]> = Self::classify(line, player).into();
        Arc::clone(self.lines.write().entry(key).or_insert(threats))
    }

    /// All threats `player` would hold at `pos`, across the four axes.
    pub fn analyze(&self, position: &Position, player: Stone, pos: Pos) -> Vec<Threat> {
        Self::linearize(position, player, pos)
            .iter()
            .flat_map(|line| self.line_threats(line.as_slice(), player).to_vec())
            .collect()
    }

    /// Score of `pos` for `player`: the summed weight of its threats.
    pub fn evaluate(&self, position: &Position, player: Stone, pos: Pos) -> i64 {
        Self::linearize(position, player, pos)
            .iter()
            .map(|line| {
                self.line_threats(line.as_slice(), player)
                    .iter()
                    .map(|t| t.weight())
                    .sum::<i64>()
            })
            .sum()
    }

    /// Number of distinct windows classified so far.
    pub fn cached_lines(&self) -> usize {
        self.lines.read().len()
    }

    pub fn clear(&self) {
        self.lines.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::patterns::WIN;

    const B: Stone = Stone::Black;
    const W: Stone = Stone::White;
    const E: Stone = Stone::Empty;

    fn place_all(p: &mut Position, cells: &[(u8, u8)], stone: Stone) {
        for &(r, c) in cells {
            p.place(Pos::new(r, c), stone).unwrap();
        }
    }

    #[test]
    fn test_linearize_stops_after_second_empty() {
        let mut p = Position::new(15).unwrap();
        place_all(&mut p, &[(7, 8), (7, 10)], B);
        let lines = ThreatEvaluator::linearize(&p, B, Pos::new(7, 7));
        // left: two empties then stop; right: B E B E
        assert_eq!(lines[0].as_slice(), &[E, E, B, B, E, B, E]);
    }

    #[test]
    fn test_linearize_edge_counts_as_opponent() {
        let p = Position::new(15).unwrap();
        let lines = ThreatEvaluator::linearize(&p, W, Pos::new(0, 0));
        // vertical axis: nothing above row 0
        assert_eq!(lines[1].as_slice(), &[B, W, E, E]);
        let lines = ThreatEvaluator::linearize(&p, B, Pos::new(0, 1));
        assert_eq!(lines[0].as_slice(), &[W, E, B, E, E]);
    }

    #[test]
    fn test_linearize_stops_at_opponent() {
        let mut p = Position::new(15).unwrap();
        place_all(&mut p, &[(7, 9)], W);
        place_all(&mut p, &[(7, 8)], B);
        let lines = ThreatEvaluator::linearize(&p, B, Pos::new(7, 7));
        assert_eq!(lines[0].as_slice(), &[E, E, B, B, W]);
    }

    #[test]
    fn test_classify_straight_four() {
        let line = [E, E, B, B, B, B, E, E];
        assert_eq!(ThreatEvaluator::classify(&line, B), vec![Threat::StraightFour]);
    }

    #[test]
    fn test_classify_blocked_four() {
        let line = [W, B, B, B, B, E, E];
        assert_eq!(ThreatEvaluator::classify(&line, B), vec![Threat::BlockedFour]);
    }

    #[test]
    fn test_classify_blocked_needs_contact() {
        // Opponent cap is one empty away from the run
        let line = [W, E, B, B, B, E, E];
        assert_eq!(ThreatEvaluator::classify(&line, B), vec![Threat::StraightThree]);
    }

    #[test]
    fn test_classify_dead_window() {
        let line = [W, B, B, B, B, W];
        assert_eq!(ThreatEvaluator::classify(&line, B), vec![Threat::None]);
    }

    #[test]
    fn test_classify_overlapping_poked_runs() {
        let line = [E, B, E, B, B, E, B, E, E];
        assert_eq!(
            ThreatEvaluator::classify(&line, B),
            vec![Threat::StraightPokedThree, Threat::StraightPokedThree]
        );
    }

    #[test]
    fn test_classify_single_stone_is_nothing() {
        let line = [E, E, B, E, E];
        assert!(ThreatEvaluator::classify(&line, B).is_empty());
    }

    #[test]
    fn test_classify_five_with_gapped_neighbour() {
        let line = [W, B, B, B, B, B, E, B, E];
        let threats = ThreatEvaluator::classify(&line, B);
        assert_eq!(threats, vec![Threat::Five]);
    }

    #[test]
    fn test_classify_is_color_symmetric() {
        let black = [E, B, B, E, B, W];
        let white = [E, W, W, E, W, B];
        assert_eq!(
            ThreatEvaluator::classify(&black, B),
            ThreatEvaluator::classify(&white, W)
        );
        assert_eq!(LineKey::new(&black, B), LineKey::new(&white, W));
    }

    #[test]
    fn test_evaluate_straight_four_scenario() {
        let mut p = Position::new(15).unwrap();
        place_all(&mut p, &[(7, 7), (7, 8), (7, 9), (7, 10)], B);
        let ev = ThreatEvaluator::new();
        let threats = ev.analyze(&p, B, Pos::new(7, 7));
        assert_eq!(threats, vec![Threat::StraightFour]);
        assert_eq!(ev.evaluate(&p, B, Pos::new(7, 7)), Threat::StraightFour.weight());
    }

    #[test]
    fn test_evaluate_five_reaches_win() {
        let ev = ThreatEvaluator::new();
        for &(dr, dc) in &DIRECTIONS {
            let mut p = Position::new(15).unwrap();
            let origin = Pos::new(7, 7);
            for k in 0..5 {
                let cell = origin.offset(dr, dc, k, 15).unwrap();
                p.place(cell, W).unwrap();
            }
            assert!(ev.evaluate(&p, W, origin) >= WIN);
        }
    }

    #[test]
    fn test_cache_fills_once_per_window() {
        let mut p = Position::new(15).unwrap();
        place_all(&mut p, &[(7, 7), (7, 8)], B);
        let ev = ThreatEvaluator::new();
        let first = ev.evaluate(&p, B, Pos::new(7, 9));
        let filled = ev.cached_lines();
        assert!(filled > 0);
        assert_eq!(ev.evaluate(&p, B, Pos::new(7, 9)), first);
        assert_eq!(ev.cached_lines(), filled);
        ev.clear();
        assert_eq!(ev.cached_lines(), 0);
    }
}
