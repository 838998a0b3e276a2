//! Engine and per-request search configuration

use crate::eval::INTERESTING;
use crate::search::{EqualityMode, DEFAULT_CACHE_CAPACITY};

/// Tunables of one move request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchParams {
    /// Alpha-beta plies
    pub depth: usize,
    /// Candidates per alpha-beta node
    pub breadth: usize,
    /// Add 0-9 to alpha-beta node values so games vary
    pub randomized_selection: bool,
    /// Chance of a horizon rollout at a sharp leaf, in percent
    pub rollout_probability: u8,
    /// Threat weight a leaf's last move must exceed to be rolled out
    pub rollout_threshold: i64,
    /// Plies searched by a horizon rollout
    pub rollout_depth: usize,
    /// Children per Monte Carlo node
    pub mc_breadth: usize,
    /// Plies per Monte Carlo playout
    pub mc_simulation_depth: usize,
    /// Shuffle candidates before Monte Carlo expansion
    pub mc_random_expansion: bool,
    /// Monte Carlo iteration cap; the time budget alone when `None`
    pub max_iterations: Option<u64>,
    /// Seed for every random choice; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: 4,
            breadth: 8,
            randomized_selection: false,
            rollout_probability: 10,
            rollout_threshold: INTERESTING,
            rollout_depth: 10,
            mc_breadth: 10,
            mc_simulation_depth: 5,
            mc_random_expansion: false,
            max_iterations: None,
            seed: None,
        }
    }
}

impl SearchParams {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_breadth(mut self, breadth: usize) -> Self {
        self.breadth = breadth;
        self
    }

    pub fn with_randomized_selection(mut self, on: bool) -> Self {
        self.randomized_selection = on;
        self
    }

    /// Set rollout probability, threshold and depth together.
    pub fn with_rollout(mut self, probability: u8, threshold: i64, depth: usize) -> Self {
        self.rollout_probability = probability.min(100);
        self.rollout_threshold = threshold;
        self.rollout_depth = depth;
        self
    }

    pub fn with_mc_breadth(mut self, breadth: usize) -> Self {
        self.mc_breadth = breadth;
        self
    }

    pub fn with_mc_simulation_depth(mut self, depth: usize) -> Self {
        self.mc_simulation_depth = depth;
        self
    }

    pub fn with_mc_random_expansion(mut self, on: bool) -> Self {
        self.mc_random_expansion = on;
        self
    }

    pub fn with_max_iterations(mut self, cap: u64) -> Self {
        self.max_iterations = Some(cap);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Settings fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How cache hits are confirmed
    pub equality: EqualityMode,
    /// Entries per cache before it is flushed
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            equality: EqualityMode::Exact,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let p = SearchParams::default();
        assert_eq!((p.depth, p.breadth), (4, 8));
        assert_eq!(p.rollout_threshold, INTERESTING);
        assert_eq!(p.max_iterations, None);
        assert!(!p.randomized_selection);
    }

    #[test]
    fn test_builders() {
        let p = SearchParams::default()
            .with_depth(2)
            .with_rollout(150, 0, 3)
            .with_max_iterations(100)
            .with_seed(42);
        assert_eq!(p.depth, 2);
        assert_eq!(p.rollout_probability, 100);
        assert_eq!((p.rollout_threshold, p.rollout_depth), (0, 3));
        assert_eq!((p.max_iterations, p.seed), (Some(100), Some(42)));
    }

    #[test]
    fn test_engine_config_is_exact() {
        assert_eq!(EngineConfig::default().equality, EqualityMode::Exact);
    }
}
