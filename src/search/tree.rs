//! Arena-allocated Monte Carlo tree.
//!
//! Nodes live in one vector and refer to each other by index. The tree
//! stores coordinates and statistics only; positions are rebuilt by
//! replaying the path from the root.

use crate::board::{Move, Pos, Stone};

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// A node of the search tree.
#[derive(Clone, Debug)]
pub struct Node {
    /// Color about to move from this node.
    pub player: Stone,
    /// Cell played to reach this node (`None` for the root).
    pub pos: Option<Pos>,
    /// Simulations won by the side that moved into this node.
    pub wins: u32,
    pub visits: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Untried moves, best last. `None` until the node is first expanded.
    pub untried: Option<Vec<Move>>,
}

impl Node {
    pub fn new(player: Stone, pos: Option<Pos>, parent: Option<NodeId>) -> Self {
        Self {
            player,
            pos,
            wins: 0,
            visits: 0,
            parent,
            children: Vec::new(),
            untried: None,
        }
    }

    /// True once every candidate has become a child.
    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.as_ref().is_some_and(Vec::is_empty)
    }

    /// Fraction of simulations won (0 when unvisited).
    #[inline]
    pub fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.visits)
        }
    }
}

#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Tree holding only a root where `player` is to move.
    pub fn new(player: Stone) -> Self {
        Self {
            nodes: vec![Node::new(player, None, None)],
        }
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[inline]
    pub fn root(&self) -> &Node {
        self.get(NodeId::ROOT)
    }

    /// Attach a child reached by `pos`; the opponent of the parent's player
    /// moves next.
    pub fn add_child(&mut self, parent: NodeId, pos: Pos) -> NodeId {
        let player = self.get(parent).player.opponent();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(player, Some(pos), Some(parent)));
        self.get_mut(parent).children.push(id);
        id
    }

    /// Moves from the root down to `id` (root excluded), with the color
    /// that played each.
    pub fn path(&self, id: NodeId) -> Vec<(Pos, Stone)> {
        let mut path = Vec::new();
        let mut current = id;
        while let (Some(parent), Some(pos)) = (self.get(current).parent, self.get(current).pos) {
            path.push((pos, self.get(parent).player));
            current = parent;
        }
        path.reverse();
        path
    }

    /// Record one simulation from `id` up to the root.
    ///
    /// A node is credited when the winner is not the color to move there,
    /// i.e. when the move into the node belonged to the winner.
    pub fn backpropagate(&mut self, id: NodeId, winner: Option<Stone>) {
        let mut current = Some(id);
        while let Some(nid) = current {
            let node = self.get_mut(nid);
            node.visits += 1;
            if winner.is_some_and(|w| w != node.player) {
                node.wins += 1;
            }
            current = node.parent;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let root = self.root();
        TreeSnapshot {
            player: root.player,
            visits: root.visits,
            nodes: self.nodes.len(),
            children: root
                .children
                .iter()
                .filter_map(|&id| {
                    let child = self.get(id);
                    child.pos.map(|pos| ChildStats {
                        pos,
                        wins: child.wins,
                        visits: child.visits,
                    })
                })
                .collect(),
        }
    }
}

/// Statistics of one root child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildStats {
    pub pos: Pos,
    pub wins: u32,
    pub visits: u32,
}

/// Root-level view of a finished tree search, for overlays and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeSnapshot {
    /// Color to move at the root
    pub player: Stone,
    pub visits: u32,
    /// Total nodes allocated
    pub nodes: usize,
    pub children: Vec<ChildStats>,
}

impl TreeSnapshot {
    /// Child with the most visits.
    pub fn most_visited(&self) -> Option<&ChildStats> {
        self.children.iter().max_by_key(|c| c.visits)
    }
}
