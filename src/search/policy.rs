//! One-ply greedy policy
//!
//! Picks the best cell for the mover and the best cell for the opponent and
//! plays whichever matters more: a winning cell first, then a block of the
//! opponent's winning cell, then the higher score (ties go to defence).

use crate::board::{Move, Position, Stone};
use crate::eval::WIN;

use super::{SearchContext, Strategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicPolicy;

impl BasicPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Greedy move for `player`, or `None` on a full board.
    ///
    /// The empty board gets the centre. A board whose empty cells are all
    /// out of reach of play gets the empty cell closest to the centre.
    pub fn choose(ctx: &SearchContext<'_>, position: &mut Position, player: Stone) -> Option<Move> {
        if position.is_board_empty() {
            return Some(Move::new(position.center(), 0));
        }

        let offense = ctx.sorted_moves(position, player).first().copied();
        let defense = ctx.sorted_moves(position, player.opponent()).first().copied();

        match (offense, defense) {
            (Some(o), Some(d)) => Some(if o.score >= WIN {
                o
            } else if d.score >= o.score {
                // Blocking: the score is the opponent's threat, against us
                Move::new(d.pos, -d.score)
            } else {
                o
            }),
            (Some(m), None) => Some(m),
            (None, Some(d)) => Some(Move::new(d.pos, -d.score)),
            (None, None) => position.empty_nearest_center().map(|pos| Move::new(pos, 0)),
        }
    }
}

impl Strategy for BasicPolicy {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn get_move(&mut self, ctx: &SearchContext<'_>, position: &mut Position, player: Stone) -> Move {
        Self::choose(ctx, position, player).unwrap_or_else(|| Move::new(position.center(), 0))
    }
}
