//! Candidate move generation
//!
//! Only active cells (empty, within two cells of a stone) are ever scored.
//! Ordered lists and score maps are cached per position and color. When the
//! parent position's score map is cached, only the cells whose line windows
//! can see the last stone are rescored.

use std::sync::Arc;

use crate::board::{Bitboard, Move, Pos, Position, Stone};
use crate::eval::threat::REACH;

use super::SharedState;

const RAYS: [(i32, i32); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
];

/// Every active cell with its score for `player`, best first.
///
/// Ties keep row-major order, so the result is deterministic.
pub fn sorted_moves(shared: &SharedState, position: &mut Position, player: Stone) -> Arc<[Move]> {
    let store = &shared.store;
    if let Some(moves) = store.get_moves(position, player) {
        return moves;
    }

    let dim = position.dim();
    let mut scores = parent_scores(shared, position, player).unwrap_or_else(|| vec![None; dim * dim]);

    let mut moves = Vec::new();
    let mut fresh = vec![None; dim * dim];
    for pos in position.active_cells() {
        let idx = pos.to_index(dim);
        let score = match scores[idx].take() {
            Some(s) => s,
            None => shared.evaluator.evaluate(position, player, pos),
        };
        fresh[idx] = Some(score);
        moves.push(Move::new(pos, score));
    }
    moves.sort_by(|a, b| b.score.cmp(&a.score));

    let moves: Arc<[Move]> = moves.into();
    store.put_scores(position, player, fresh.into());
    store.put_moves(position, player, Arc::clone(&moves));
    moves
}

/// Score map of the position before the last move, with every cell that
/// move could have changed cleared.
fn parent_scores(shared: &SharedState, position: &mut Position, player: Stone) -> Option<Vec<Option<i64>>> {
    let (last, color) = position.last_move()?;
    position.undo();
    let parent = shared.store.get_scores(position, player);
    position.make(last, color);

    let mut scores = parent?.to_vec();
    if scores.len() != position.dim() * position.dim() {
        return None;
    }
    invalidate_rays(&mut scores, position, player, last);
    Some(scores)
}

/// Clear the cells whose windows for `player` reach `origin`.
///
/// Walking out from `origin`, a cell sees it while no opponent stone and at
/// most one empty cell lie strictly between them.
fn invalidate_rays(scores: &mut [Option<i64>], position: &Position, player: Stone, origin: Pos) {
    let dim = position.dim();
    let opponent = player.opponent();
    scores[origin.to_index(dim)] = None;

    for &(dr, dc) in &RAYS {
        let mut empties = 0;
        for k in 1..=REACH {
            let Some(cell) = origin.offset(dr, dc, k, dim) else {
                break;
            };
            let stone = position.get(cell);
            if stone == opponent {
                break;
            }
            if stone == Stone::Empty {
                scores[cell.to_index(dim)] = None;
                empties += 1;
                if empties >= 2 {
                    break;
                }
            }
        }
    }
}

/// Top `num` cells for either color: both ordered lists are cut to `num`,
/// merged keeping each cell's higher score, and cut to `num` again.
pub fn candidates(shared: &SharedState, position: &mut Position, num: usize) -> Vec<Move> {
    let black = sorted_moves(shared, position, Stone::Black);
    let white = sorted_moves(shared, position, Stone::White);

    let mut merged: Vec<Move> = black
        .iter()
        .take(num)
        .chain(white.iter().take(num))
        .copied()
        .collect();
    merged.sort_by(|a, b| b.score.cmp(&a.score).then(a.pos.cmp(&b.pos)));

    let mut seen = Bitboard::new(position.dim());
    merged.retain(|m| {
        if seen.get(m.pos) {
            false
        } else {
            seen.set(m.pos);
            true
        }
    });
    merged.truncate(num);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::EqualityMode;

    fn setup(stones: &[(u8, u8, Stone)]) -> Position {
        let mut p = Position::new(15).unwrap();
        for &(r, c, s) in stones {
            p.place(Pos::new(r, c), s).unwrap();
        }
        p
    }

    fn full_rescore(p: &Position, player: Stone) -> Vec<Move> {
        let shared = SharedState::new(EqualityMode::Exact, 1024);
        let mut p = p.clone();
        sorted_moves(&shared, &mut p, player).to_vec()
    }

    #[test]
    fn test_sorted_moves_only_active_cells() {
        let shared = SharedState::default();
        let mut p = setup(&[(7, 7, Stone::Black)]);
        let moves = sorted_moves(&shared, &mut p, Stone::Black);
        assert_eq!(moves.len(), 24);
        assert!(moves.iter().all(|m| p.is_active(m.pos)));
        assert!(moves.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_sorted_moves_empty_board() {
        let shared = SharedState::default();
        let mut p = Position::new(9).unwrap();
        assert!(sorted_moves(&shared, &mut p, Stone::White).is_empty());
        assert!(candidates(&shared, &mut p, 5).is_empty());
    }

    #[test]
    fn test_incremental_matches_full_rescore() {
        let shared = SharedState::default();
        let mut p = setup(&[
            (7, 7, Stone::Black),
            (7, 8, Stone::White),
            (8, 8, Stone::Black),
        ]);
        for player in [Stone::Black, Stone::White] {
            let _ = sorted_moves(&shared, &mut p, player);
        }
        let line = [(6, 6, Stone::White), (9, 9, Stone::Black), (6, 9, Stone::White)];
        for &(r, c, s) in &line {
            p.place(Pos::new(r, c), s).unwrap();
            for player in [Stone::Black, Stone::White] {
                let incremental = sorted_moves(&shared, &mut p, player).to_vec();
                assert_eq!(incremental, full_rescore(&p, player));
            }
        }
    }

    #[test]
    fn test_parent_lookup_restores_position() {
        let shared = SharedState::default();
        let mut p = setup(&[(7, 7, Stone::Black), (7, 8, Stone::White)]);
        let before = p.clone();
        let _ = sorted_moves(&shared, &mut p, Stone::Black);
        assert_eq!(p, before);
        assert_eq!(p.history(), before.history());
    }

    #[test]
    fn test_candidates_merge_both_sides() {
        let shared = SharedState::default();
        let mut p = setup(&[
            (7, 5, Stone::Black),
            (7, 6, Stone::Black),
            (7, 7, Stone::Black),
            (2, 2, Stone::White),
            (2, 3, Stone::White),
        ]);
        let cands = candidates(&shared, &mut p, 4);
        assert_eq!(cands.len(), 4);
        let mut cells: Vec<Pos> = cands.iter().map(|m| m.pos).collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 4);
        // Black's open three extension points lead
        assert!(cands[..2]
            .iter()
            .all(|m| m.pos == Pos::new(7, 4) || m.pos == Pos::new(7, 8)));
        assert!(cands.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_candidates_keep_higher_score() {
        let shared = SharedState::default();
        let mut p = setup(&[(7, 7, Stone::Black), (7, 9, Stone::White)]);
        let black = sorted_moves(&shared, &mut p, Stone::Black);
        let white = sorted_moves(&shared, &mut p, Stone::White);
        let cands = candidates(&shared, &mut p, 100);
        for m in &cands {
            let b = black.iter().find(|x| x.pos == m.pos).map_or(i64::MIN, |x| x.score);
            let w = white.iter().find(|x| x.pos == m.pos).map_or(i64::MIN, |x| x.score);
            assert_eq!(m.score, b.max(w));
        }
    }
}
