//! Leaf hooks for alpha-beta search
//!
//! A fixed-depth search trusts the static value at its leaves and cannot
//! see a four that completes one ply later. A [`HorizonHook`] inspects each
//! leaf and may ask the search to keep going with a narrow rollout instead.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::{Position, Stone};
use crate::eval::INTERESTING;

use super::SearchContext;

/// What the search should do at a depth-0 node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafDecision {
    /// Use the static heuristic value.
    Static,
    /// Search `depth` more plies, considering only candidates scoring above
    /// `min_candidate_score`, and use that result instead.
    Rollout { depth: usize, min_candidate_score: i64 },
}

pub trait HorizonHook {
    fn at_leaf(&mut self, ctx: &SearchContext<'_>, position: &mut Position) -> LeafDecision;
}

/// Plain alpha-beta: leaves keep their static value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticHorizon;

impl HorizonHook for StaticHorizon {
    #[inline]
    fn at_leaf(&mut self, _ctx: &SearchContext<'_>, _position: &mut Position) -> LeafDecision {
        LeafDecision::Static
    }
}

/// Randomly extends leaves reached through a sharp move.
///
/// The move that produced the leaf is scored for both colors on the board as
/// it stood before that move; if its strongest threat weighs more than
/// `threshold`, a rollout happens with `probability` percent chance.
#[derive(Debug, Clone)]
pub struct HorizonExtension {
    probability: u8,
    threshold: i64,
    depth: usize,
    rng: SmallRng,
}

impl HorizonExtension {
    /// # Arguments
    /// * `probability` - Rollout chance in percent, clamped to 0-100
    /// * `threshold` - Minimum threat weight of the last move
    /// * `depth` - Plies searched by a rollout
    /// * `seed` - Fixed seed for reproducible runs, entropy otherwise
    pub fn new(probability: u8, threshold: i64, depth: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        Self {
            probability: probability.min(100),
            threshold,
            depth,
            rng,
        }
    }

    /// Weight of the strongest threat either color had at the last move's
    /// cell, or `None` on an empty board.
    pub fn last_move_magnitude(ctx: &SearchContext<'_>, position: &mut Position) -> Option<i64> {
        let (last, color) = position.last_move()?;
        position.undo();
        let evaluator = &ctx.shared().evaluator;
        let magnitude = [Stone::Black, Stone::White]
            .iter()
            .flat_map(|&c| evaluator.analyze(position, c, last))
            .map(|t| t.weight())
            .max()
            .unwrap_or(0);
        position.make(last, color);
        Some(magnitude)
    }
}

impl Default for HorizonExtension {
    fn default() -> Self {
        Self::new(10, INTERESTING, 10, None)
    }
}

impl HorizonHook for HorizonExtension {
    fn at_leaf(&mut self, ctx: &SearchContext<'_>, position: &mut Position) -> LeafDecision {
        if self.probability == 0 {
            return LeafDecision::Static;
        }
        let roll = self.rng.gen_range(0..100u8);
        let Some(magnitude) = Self::last_move_magnitude(ctx, position) else {
            return LeafDecision::Static;
        };
        if magnitude > self.threshold && roll < self.probability {
            LeafDecision::Rollout {
                depth: self.depth,
                min_candidate_score: self.threshold,
            }
        } else {
            LeafDecision::Static
        }
    }
}
