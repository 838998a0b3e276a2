//! Alpha-Beta search with a pluggable horizon hook
//!
//! Fixed-depth, breadth-limited minimax seen from the searching side
//! (the *identity*): nodes where the identity moves maximize, the others
//! minimize. Board changes go through the position's scratch guard, so every
//! exit path (cutoff, win, timeout) leaves the position untouched.
//!
//! # Example
//!
//! ```
//! use gomoku::board::{Pos, Position, Stone};
//! use gomoku::search::{AlphaBetaSearch, Deadline, SearchContext, SharedState, Strategy};
//!
//! let shared = SharedState::default();
//! let ctx = SearchContext::new(&shared, Deadline::unbounded());
//! let mut position = Position::new(15).unwrap();
//! for c in 3..7 {
//!     position.place(Pos::new(7, c), Stone::Black).unwrap();
//! }
//!
//! let mut search = AlphaBetaSearch::plain(2, 6);
//! let mv = search.get_move(&ctx, &mut position, Stone::Black);
//! assert!(mv.pos == Pos::new(7, 2) || mv.pos == Pos::new(7, 7));
//! ```

use log::{trace, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::{Move, Pos, Position, Stone};
use crate::eval::WIN;

use super::horizon::{HorizonHook, LeafDecision, StaticHorizon};
use super::policy::BasicPolicy;
use super::{SearchContext, SearchStats, Strategy};

/// Result of one node: the move that achieved `score`, if any.
#[derive(Debug, Clone, Copy)]
struct Outcome {
    best: Option<Pos>,
    score: i64,
}

impl Outcome {
    #[inline]
    fn leaf(score: i64) -> Self {
        Self { best: None, score }
    }
}

pub struct AlphaBetaSearch<H: HorizonHook = StaticHorizon> {
    depth: usize,
    breadth: usize,
    horizon: H,
    identity: Stone,
    /// Candidate floor while a rollout is in flight; no nested rollouts.
    narrow: Option<i64>,
    /// Noise added to non-terminal node values to vary play between games
    jitter: Option<SmallRng>,
    timed_out: bool,
    stats: SearchStats,
}

impl AlphaBetaSearch<StaticHorizon> {
    /// Alpha-beta without leaf extensions.
    pub fn plain(depth: usize, breadth: usize) -> Self {
        Self::new(depth, breadth, StaticHorizon)
    }
}

impl<H: HorizonHook> AlphaBetaSearch<H> {
    pub fn new(depth: usize, breadth: usize, horizon: H) -> Self {
        Self {
            depth: depth.max(1),
            breadth: breadth.max(1),
            horizon,
            identity: Stone::Black,
            narrow: None,
            jitter: None,
            timed_out: false,
            stats: SearchStats::default(),
        }
    }

    /// Add 0-9 to every non-terminal node value, so that near-equal moves
    /// are picked at random.
    pub fn with_jitter(mut self, seed: Option<u64>) -> Self {
        self.jitter = Some(match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        });
        self
    }

    /// True if the last search ran out of time before finishing.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Search from the root and return the chosen move with its value, or
    /// `None` when the root has nothing to choose from.
    pub fn search(
        &mut self,
        ctx: &SearchContext<'_>,
        position: &mut Position,
        player: Stone,
    ) -> Option<Move> {
        self.identity = player;
        self.narrow = None;
        self.timed_out = false;
        self.stats = SearchStats::default();

        let root = self.minimax(ctx, position, self.depth, player, i64::MIN, i64::MAX);
        root.best.map(|pos| Move::new(pos, root.score))
    }

    fn candidates(&self, ctx: &SearchContext<'_>, position: &mut Position) -> Vec<Move> {
        let mut moves = ctx.candidates(position, self.breadth);
        if let Some(floor) = self.narrow {
            moves.retain(|m| m.score > floor);
        }
        moves
    }

    fn minimax(
        &mut self,
        ctx: &SearchContext<'_>,
        position: &mut Position,
        depth: usize,
        player: Stone,
        mut alpha: i64,
        mut beta: i64,
    ) -> Outcome {
        self.stats.nodes += 1;

        let mut value = ctx.value(position, self.identity);
        if value.abs() >= WIN {
            return Outcome::leaf(value);
        }
        if let Some(rng) = self.jitter.as_mut() {
            value += rng.gen_range(0..10);
        }
        if depth == 0 {
            return Outcome::leaf(self.beyond_horizon(ctx, position, player, value, alpha, beta));
        }

        let candidates = self.candidates(ctx, position);
        if candidates.is_empty() {
            return Outcome::leaf(value);
        }

        let maximizing = player == self.identity;
        let mut best = Outcome {
            best: None,
            score: if maximizing { i64::MIN } else { i64::MAX },
        };

        for mv in &candidates {
            let score = {
                let mut scratch = position.scratch();
                scratch.play(mv.pos, player);
                self.minimax(ctx, &mut scratch, depth - 1, player.opponent(), alpha, beta)
                    .score
            };

            if maximizing {
                if score > best.score {
                    best = Outcome {
                        best: Some(mv.pos),
                        score,
                    };
                    if score >= WIN {
                        return best;
                    }
                    alpha = alpha.max(score);
                    if beta <= alpha {
                        self.stats.beta_cuts += 1;
                        self.stats.cut_depth_total += depth as u64;
                        best.score = alpha;
                        return best;
                    }
                }
            } else if score < best.score {
                best = Outcome {
                    best: Some(mv.pos),
                    score,
                };
                if score <= -WIN {
                    return best;
                }
                beta = beta.min(score);
                if beta <= alpha {
                    self.stats.alpha_cuts += 1;
                    self.stats.cut_depth_total += depth as u64;
                    best.score = beta;
                    return best;
                }
            }

            if ctx.is_timed_out() {
                self.timed_out = true;
                return best;
            }
        }

        // Every reply loses: at least point at the most urgent cell
        if maximizing && best.score <= -WIN {
            best.best = Some(candidates[0].pos);
        }
        best
    }

    fn beyond_horizon(
        &mut self,
        ctx: &SearchContext<'_>,
        position: &mut Position,
        player: Stone,
        value: i64,
        alpha: i64,
        beta: i64,
    ) -> i64 {
        if self.narrow.is_some() {
            return value;
        }
        match self.horizon.at_leaf(ctx, position) {
            LeafDecision::Static => value,
            LeafDecision::Rollout {
                depth,
                min_candidate_score,
            } => {
                self.stats.rollouts += 1;
                trace!("horizon rollout: depth {depth}, static value {value}");
                self.narrow = Some(min_candidate_score);
                let rolled = self.minimax(ctx, position, depth, player, alpha, beta);
                self.narrow = None;
                rolled.score
            }
        }
    }
}

impl<H: HorizonHook> Strategy for AlphaBetaSearch<H> {
    fn name(&self) -> &'static str {
        "alpha-beta"
    }

    fn get_move(&mut self, ctx: &SearchContext<'_>, position: &mut Position, player: Stone) -> Move {
        if position.is_board_empty() {
            return Move::new(position.center(), 0);
        }
        match self.search(ctx, position, player) {
            Some(mv) if mv.score > -WIN => mv,
            Some(lost) => {
                warn!("alpha-beta found only losing moves for {player}, using basic policy");
                let fallback = BasicPolicy.get_move(ctx, position, player);
                Move::new(fallback.pos, lost.score)
            }
            None => {
                warn!("alpha-beta found no move for {player}, using basic policy");
                BasicPolicy.get_move(ctx, position, player)
            }
        }
    }

    fn stats(&self) -> SearchStats {
        self.stats
    }
}
