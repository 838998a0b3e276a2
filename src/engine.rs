//! Move requests
//!
//! The engine owns the shared caches and turns a request (position, color,
//! time budget, search kind, parameters) into a move. Every request builds a
//! fresh strategy; only the caches carry over between requests.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use gomoku::board::{Pos, Position, Stone};
//! use gomoku::{Engine, SearchKind, SearchParams};
//!
//! let engine = Engine::new();
//! let mut position = Position::new(15).unwrap();
//! position.place(Pos::new(7, 7), Stone::Black).unwrap();
//!
//! let params = SearchParams::default().with_depth(2).with_breadth(4);
//! let result = engine
//!     .request_move(&mut position, Stone::White, Duration::from_millis(500), SearchKind::AlphaBeta, &params)
//!     .unwrap();
//! assert!(position.is_empty(result.mv.pos));
//! println!("{} plays {} in {}ms", result.kind, result.mv.pos, result.time_ms);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::board::{Move, Position, Stone};
use crate::config::{EngineConfig, SearchParams};
use crate::error::{GomokuError, Result};
use crate::search::{
    AlphaBetaSearch, BasicPolicy, Deadline, HorizonExtension, MonteCarloSearch, SearchContext,
    SearchStats, SharedState, StoreStats, Strategy, TreeSnapshot,
};

/// Algorithm used to answer a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchKind {
    /// One-ply greedy attack/defence
    Basic,
    /// Fixed-depth alpha-beta
    AlphaBeta,
    /// Alpha-beta with random rollouts at sharp leaves
    AlphaBetaWithHorizon,
    /// Monte Carlo tree search
    MonteCarlo,
}

impl SearchKind {
    pub const ALL: [SearchKind; 4] = [
        SearchKind::Basic,
        SearchKind::AlphaBeta,
        SearchKind::AlphaBetaWithHorizon,
        SearchKind::MonteCarlo,
    ];

    fn strategy(self, params: &SearchParams) -> Box<dyn Strategy> {
        match self {
            SearchKind::Basic => Box::new(BasicPolicy::new()),
            SearchKind::AlphaBeta => {
                let search = AlphaBetaSearch::plain(params.depth, params.breadth);
                if params.randomized_selection {
                    Box::new(search.with_jitter(params.seed))
                } else {
                    Box::new(search)
                }
            }
            SearchKind::AlphaBetaWithHorizon => {
                let hook = HorizonExtension::new(
                    params.rollout_probability,
                    params.rollout_threshold,
                    params.rollout_depth,
                    params.seed,
                );
                let search = AlphaBetaSearch::new(params.depth, params.breadth, hook);
                if params.randomized_selection {
                    Box::new(search.with_jitter(params.seed))
                } else {
                    Box::new(search)
                }
            }
            SearchKind::MonteCarlo => {
                let mut mcts = MonteCarloSearch::new(params.mc_breadth, params.mc_simulation_depth)
                    .with_random_expansion(params.mc_random_expansion)
                    .with_max_iterations(params.max_iterations);
                if let Some(seed) = params.seed {
                    mcts = mcts.with_seed(seed);
                }
                Box::new(mcts)
            }
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchKind::Basic => "basic",
            SearchKind::AlphaBeta => "alpha-beta",
            SearchKind::AlphaBetaWithHorizon => "horizon",
            SearchKind::MonteCarlo => "monte-carlo",
        };
        f.write_str(name)
    }
}

/// Parses the names printed by `Display`.
impl FromStr for SearchKind {
    type Err = GomokuError;

    fn from_str(s: &str) -> Result<Self> {
        SearchKind::ALL
            .into_iter()
            .find(|k| k.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GomokuError::UnknownSearchKind(s.to_string()))
    }
}

/// Result of a move request with its search statistics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Chosen move; the score's meaning depends on `kind`
    pub mv: Move,
    pub kind: SearchKind,
    /// Time taken in milliseconds
    pub time_ms: u64,
    pub stats: SearchStats,
    /// Root statistics, Monte Carlo only
    pub tree: Option<TreeSnapshot>,
}

/// Shared caches plus the request entry point.
///
/// Cloning an engine shares its caches.
#[derive(Clone, Default)]
pub struct Engine {
    shared: Arc<SharedState>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_shared(Arc::new(SharedState::new(config.equality, config.cache_capacity)))
    }

    /// Engine over caches owned elsewhere.
    #[must_use]
    pub fn with_shared(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Pick a move for `player` within roughly `budget`.
    ///
    /// The position is used as scratch space and handed back unchanged. A
    /// zero budget still yields a move. A full board is reported as
    /// [`GomokuError::BoardFull`], which callers treat as a draw.
    pub fn request_move(
        &self,
        position: &mut Position,
        player: Stone,
        budget: Duration,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<MoveResult> {
        if !player.is_player() {
            return Err(GomokuError::NotAPlayer);
        }
        if position.is_full() {
            return Err(GomokuError::BoardFull);
        }

        let deadline = Deadline::after(budget);
        let ctx = SearchContext::new(&self.shared, deadline);
        let mut strategy = kind.strategy(params);
        let mv = strategy.get_move(&ctx, position, player);
        let elapsed = deadline.elapsed();

        let stats = strategy.stats();
        debug!(
            "{}: {} plays {} (score {}) in {:?}; nodes {}, cuts {}/{} avg depth {:.2}, rollouts {}, iterations {}",
            strategy.name(),
            player,
            mv.pos,
            mv.score,
            elapsed,
            stats.nodes,
            stats.alpha_cuts,
            stats.beta_cuts,
            stats.average_cut_depth(),
            stats.rollouts,
            stats.iterations
        );
        let cache = self.shared.store.stats();
        debug!(
            "caches: heuristics {} ({:.1}% hit), moves {}, scores {}, lines {}",
            cache.heuristics.entries,
            cache.heuristics.hit_percent(),
            cache.moves.entries,
            cache.scores.entries,
            self.shared.evaluator.cached_lines()
        );

        Ok(MoveResult {
            mv,
            kind,
            time_ms: elapsed.as_millis() as u64,
            stats,
            tree: strategy.tree_snapshot(),
        })
    }

    pub fn cache_stats(&self) -> StoreStats {
        self.shared.store.stats()
    }

    /// Drop everything cached so far.
    pub fn clear_cache(&self) {
        self.shared.clear();
    }
}
