//! Monte Carlo tree search
//!
//! Each iteration selects a node by UCB1, replays its path on the live
//! position, expands one untried candidate, plays the basic policy for a few
//! plies, and backpropagates the simulated winner. The returned move is the
//! root child with the most visits.

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::board::{Move, Position, Stone};

use super::policy::BasicPolicy;
use super::tree::{NodeId, Tree, TreeSnapshot};
use super::{SearchContext, SearchStats, Strategy};

/// UCB1 exploration constant, √2.
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

pub struct MonteCarloSearch {
    breadth: usize,
    simulation_depth: usize,
    random_expansion: bool,
    max_iterations: Option<u64>,
    rng: ChaCha8Rng,
    stats: SearchStats,
    snapshot: Option<TreeSnapshot>,
}

impl MonteCarloSearch {
    /// # Arguments
    /// * `breadth` - Children per node
    /// * `simulation_depth` - Plies per playout
    pub fn new(breadth: usize, simulation_depth: usize) -> Self {
        Self {
            breadth: breadth.max(1),
            simulation_depth,
            random_expansion: false,
            max_iterations: None,
            rng: ChaCha8Rng::from_entropy(),
            stats: SearchStats::default(),
            snapshot: None,
        }
    }

    /// Shuffle each node's candidates before expanding them.
    pub fn with_random_expansion(mut self, on: bool) -> Self {
        self.random_expansion = on;
        self
    }

    /// Stop after this many iterations even if time remains.
    pub fn with_max_iterations(mut self, cap: Option<u64>) -> Self {
        self.max_iterations = cap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    fn ucb1(tree: &Tree, id: NodeId) -> f64 {
        let node = tree.get(id);
        let parent_visits = node.parent.map_or(0, |p| tree.get(p).visits);
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let visits = f64::from(node.visits);
        node.win_rate() + EXPLORATION * (f64::from(parent_visits).ln() / visits).sqrt()
    }

    /// Descend through fully expanded nodes by UCB1.
    fn select(tree: &Tree) -> NodeId {
        let mut current = NodeId::ROOT;
        loop {
            let node = tree.get(current);
            if !node.is_fully_expanded() || node.children.is_empty() {
                return current;
            }
            let mut best = node.children[0];
            let mut best_ucb = Self::ucb1(tree, best);
            for &child in &node.children[1..] {
                let ucb = Self::ucb1(tree, child);
                if ucb > best_ucb {
                    best = child;
                    best_ucb = ucb;
                }
            }
            current = best;
        }
    }

    /// Materialize the next untried candidate of `id`, if any remain.
    fn expand(
        &mut self,
        ctx: &SearchContext<'_>,
        tree: &mut Tree,
        id: NodeId,
        position: &mut Position,
    ) -> Option<NodeId> {
        if tree.get(id).untried.is_none() {
            let mut moves = ctx.candidates(position, self.breadth);
            if self.random_expansion {
                moves.shuffle(&mut self.rng);
            }
            moves.reverse();
            tree.get_mut(id).untried = Some(moves);
        }
        let mv = tree.get_mut(id).untried.as_mut()?.pop()?;
        Some(tree.add_child(id, mv.pos))
    }

    fn iterate(&mut self, ctx: &SearchContext<'_>, tree: &mut Tree, position: &mut Position) {
        let leaf = Self::select(tree);
        let mut scratch = position.scratch();
        for (pos, color) in tree.path(leaf) {
            scratch.play(pos, color);
        }

        if let Some(winner) = ctx.winner(&scratch) {
            tree.backpropagate(leaf, Some(winner));
            return;
        }

        let target = match self.expand(ctx, tree, leaf, &mut scratch) {
            Some(child) => {
                let pos = tree.get(child).pos;
                if let Some(pos) = pos {
                    scratch.play(pos, tree.get(leaf).player);
                }
                child
            }
            None => leaf,
        };
        let winner = ctx.playout(&mut scratch, tree.get(target).player, self.simulation_depth);
        tree.backpropagate(target, winner);
    }
}

impl Default for MonteCarloSearch {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl Strategy for MonteCarloSearch {
    fn name(&self) -> &'static str {
        "monte-carlo"
    }

    fn get_move(&mut self, ctx: &SearchContext<'_>, position: &mut Position, player: Stone) -> Move {
        self.stats = SearchStats::default();
        self.snapshot = None;
        if position.is_board_empty() {
            return Move::new(position.center(), 0);
        }

        let mut tree = Tree::new(player);
        loop {
            self.iterate(ctx, &mut tree, position);
            self.stats.iterations += 1;
            let capped = self.max_iterations.is_some_and(|cap| self.stats.iterations >= cap);
            if capped || ctx.is_timed_out() {
                break;
            }
        }
        self.stats.nodes = tree.len() as u64;

        let snapshot = tree.snapshot();
        debug!(
            "monte-carlo: {} iterations, {} nodes, root visits {}",
            self.stats.iterations, snapshot.nodes, snapshot.visits
        );
        let best = snapshot.most_visited().copied();
        self.snapshot = Some(snapshot);

        match best {
            Some(child) => Move::new(child.pos, i64::from(child.visits)),
            None => {
                warn!("monte-carlo root has no children, using basic policy");
                BasicPolicy.get_move(ctx, position, player)
            }
        }
    }

    fn stats(&self) -> SearchStats {
        self.stats
    }

    fn tree_snapshot(&self) -> Option<TreeSnapshot> {
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Pos;
    use crate::search::{Deadline, SharedState};

    fn position(stones: &[(u8, u8, Stone)]) -> Position {
        let mut p = Position::new(11).unwrap();
        for &(r, c, s) in stones {
            p.place(Pos::new(r, c), s).unwrap();
        }
        p
    }

    #[test]
    fn test_runs_at_least_one_iteration() {
        let shared = SharedState::default();
        let ctx = SearchContext::new(&shared, Deadline::after(std::time::Duration::ZERO));
        let mut p = position(&[(5, 5, Stone::Black)]);
        let mut mcts = MonteCarloSearch::new(4, 2).with_seed(3);
        let mv = mcts.get_move(&ctx, &mut p, Stone::White);
        assert_eq!(mcts.stats().iterations, 1);
        assert!(p.is_empty(mv.pos));
        assert_eq!(mv.score, 1);
    }

    #[test]
    fn test_iteration_cap_and_restore() {
        let shared = SharedState::default();
        let ctx = SearchContext::new(&shared, Deadline::unbounded());
        let mut p = position(&[(5, 5, Stone::Black), (5, 6, Stone::White)]);
        let before = p.clone();
        let mut mcts = MonteCarloSearch::new(5, 3).with_seed(11).with_max_iterations(Some(40));
        let _ = mcts.get_move(&ctx, &mut p, Stone::Black);
        assert_eq!(p, before);
        assert_eq!(p.history(), before.history());
        assert_eq!(mcts.stats().iterations, 40);

        let snap = mcts.tree_snapshot().unwrap();
        assert_eq!(snap.visits, 40);
        assert_eq!(snap.children.len(), 5);
        assert_eq!(snap.children.iter().map(|c| c.visits).sum::<u32>(), 40);
    }

    #[test]
    fn test_terminal_child_is_not_expanded() {
        let shared = SharedState::default();
        let ctx = SearchContext::new(&shared, Deadline::unbounded());
        let mut p = position(&[
            (5, 1, Stone::Black),
            (5, 2, Stone::Black),
            (5, 3, Stone::Black),
            (5, 4, Stone::Black),
            (5, 0, Stone::White),
        ]);
        let mut tree = Tree::new(Stone::Black);
        let mut mcts = MonteCarloSearch::new(3, 2).with_seed(5);
        // First iteration expands the winning cell (best candidate)
        mcts.iterate(&ctx, &mut tree, &mut p);
        let child = tree.root().children[0];
        assert_eq!(tree.get(child).pos, Some(Pos::new(5, 5)));
        assert_eq!(tree.get(child).wins, 1);

        // Revisit the terminal child directly
        let before = tree.len();
        tree.get_mut(NodeId::ROOT).untried = Some(Vec::new());
        mcts.iterate(&ctx, &mut tree, &mut p);
        assert_eq!(tree.len(), before);
        assert!(tree.get(child).untried.is_none());
        assert_eq!((tree.get(child).wins, tree.get(child).visits), (2, 2));
    }

    #[test]
    fn test_random_expansion_still_covers_candidates() {
        let shared = SharedState::default();
        let ctx = SearchContext::new(&shared, Deadline::unbounded());
        let mut p = position(&[(5, 5, Stone::Black), (4, 4, Stone::White)]);
        let mut mcts = MonteCarloSearch::new(6, 2)
            .with_seed(9)
            .with_random_expansion(true)
            .with_max_iterations(Some(6));
        let _ = mcts.get_move(&ctx, &mut p, Stone::Black);
        let snap = mcts.tree_snapshot().unwrap();
        let mut cells: Vec<Pos> = snap.children.iter().map(|c| c.pos).collect();
        cells.sort();
        let mut expected: Vec<Pos> = ctx.candidates(&mut p, 6).iter().map(|m| m.pos).collect();
        expected.sort();
        assert_eq!(cells, expected);
    }
}
