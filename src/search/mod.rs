//! Search module for Gomoku AI
//!
//! Contains:
//! - Transposition caches keyed by position snapshots
//! - Candidate generation with incremental score maps
//! - A one-ply greedy policy used as fallback and rollout policy
//! - Alpha-beta search with a pluggable horizon hook
//! - Monte Carlo tree search with UCB1 selection
//!
//! Every strategy runs against a [`SearchContext`], which bundles the shared
//! caches with the deadline of the current request.

pub mod alphabeta;
pub mod horizon;
pub mod mcts;
pub mod movegen;
pub mod policy;
pub mod tree;
pub mod tt;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::{Move, Pos, Position, Stone};
use crate::eval::{Heuristic, ThreatEvaluator};

pub use alphabeta::AlphaBetaSearch;
pub use horizon::{HorizonExtension, HorizonHook, LeafDecision, StaticHorizon};
pub use mcts::MonteCarloSearch;
pub use policy::BasicPolicy;
pub use tree::{ChildStats, TreeSnapshot};
pub use tt::{CacheStats, EqualityMode, StoreStats, TranspositionStore};

/// Default entries per transposition cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 20;

/// Caches shared by every search of a process or engine.
///
/// Nothing here is global: an engine owns one behind an `Arc` and hands it
/// to each request, so tests can run against a private instance.
pub struct SharedState {
    pub evaluator: ThreatEvaluator,
    pub store: TranspositionStore,
}

impl SharedState {
    #[must_use]
    pub fn new(mode: EqualityMode, capacity: usize) -> Self {
        Self {
            evaluator: ThreatEvaluator::new(),
            store: TranspositionStore::new(mode, capacity),
        }
    }

    /// Drop all cached data.
    pub fn clear(&self) {
        self.evaluator.clear();
        self.store.clear();
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(EqualityMode::Exact, DEFAULT_CACHE_CAPACITY)
    }
}

/// Wall-clock limit of one request, checked cooperatively.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Never expires. Used when an iteration cap bounds the work instead.
    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            budget: None,
        }
    }

    #[inline]
    pub fn is_past(&self) -> bool {
        self.budget.is_some_and(|b| self.start.elapsed() >= b)
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Diagnostics collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Nodes visited (alpha-beta) or simulated (Monte Carlo)
    pub nodes: u64,
    /// Cutoffs at minimizing nodes
    pub alpha_cuts: u64,
    /// Cutoffs at maximizing nodes
    pub beta_cuts: u64,
    /// Sum of remaining depth over all cutoffs
    pub cut_depth_total: u64,
    /// Horizon rollouts triggered at leaves
    pub rollouts: u64,
    /// Monte Carlo iterations completed
    pub iterations: u64,
}

impl SearchStats {
    /// Mean remaining depth at which cutoffs happened
    pub fn average_cut_depth(&self) -> f64 {
        let cuts = self.alpha_cuts + self.beta_cuts;
        if cuts == 0 {
            0.0
        } else {
            self.cut_depth_total as f64 / cuts as f64
        }
    }

    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.alpha_cuts += other.alpha_cuts;
        self.beta_cuts += other.beta_cuts;
        self.cut_depth_total += other.cut_depth_total;
        self.rollouts += other.rollouts;
        self.iterations += other.iterations;
    }
}

/// Shared caches plus the deadline of the running request.
#[derive(Clone, Copy)]
pub struct SearchContext<'s> {
    shared: &'s SharedState,
    deadline: Deadline,
}

impl<'s> SearchContext<'s> {
    pub fn new(shared: &'s SharedState, deadline: Deadline) -> Self {
        Self { shared, deadline }
    }

    #[inline]
    pub fn shared(&self) -> &'s SharedState {
        self.shared
    }

    #[inline]
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    #[inline]
    pub fn is_timed_out(&self) -> bool {
        self.deadline.is_past()
    }

    /// Threat totals of both colors, cached per position.
    pub fn heuristic(&self, position: &Position) -> Heuristic {
        if let Some(h) = self.shared.store.get_heuristic(position) {
            return h;
        }
        let h = Heuristic::compute(&self.shared.evaluator, position);
        self.shared.store.put_heuristic(position, h);
        h
    }

    /// Heuristic value seen from `perspective`.
    #[inline]
    pub fn value(&self, position: &Position, perspective: Stone) -> i64 {
        self.heuristic(position).value(perspective)
    }

    #[inline]
    pub fn winner(&self, position: &Position) -> Option<Stone> {
        self.heuristic(position).winner()
    }

    /// Score of `pos` for `player` straight from the evaluator.
    #[inline]
    pub fn evaluate(&self, position: &Position, player: Stone, pos: Pos) -> i64 {
        self.shared.evaluator.evaluate(position, player, pos)
    }

    /// Every active cell ordered by its score for `player`.
    pub fn sorted_moves(&self, position: &mut Position, player: Stone) -> Arc<[Move]> {
        movegen::sorted_moves(self.shared, position, player)
    }

    /// Best `num` cells for either side.
    pub fn candidates(&self, position: &mut Position, num: usize) -> Vec<Move> {
        movegen::candidates(self.shared, position, num)
    }

    /// Play the basic policy for up to `depth` plies starting with `player`
    /// and report who holds a five afterwards, stopping at the first one.
    /// The position is restored before returning.
    pub fn playout(&self, position: &mut Position, player: Stone, depth: usize) -> Option<Stone> {
        let mut scratch = position.scratch();
        let mut to_move = player;
        for _ in 0..depth {
            if let Some(winner) = self.winner(&scratch) {
                return Some(winner);
            }
            let mv = BasicPolicy::choose(self, &mut scratch, to_move)?;
            scratch.play(mv.pos, to_move);
            to_move = to_move.opponent();
        }
        self.winner(&scratch)
    }
}

/// A move-selection algorithm.
///
/// Strategies mutate the position freely during `get_move` but must hand it
/// back exactly as they received it.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn get_move(&mut self, ctx: &SearchContext<'_>, position: &mut Position, player: Stone)
        -> Move;

    fn stats(&self) -> SearchStats {
        SearchStats::default()
    }

    /// Root statistics of the last tree search, for overlays.
    fn tree_snapshot(&self) -> Option<TreeSnapshot> {
        None
    }
}
