//! MCTS node structure.
//!
//! Nodes live in an arena (`MCTSTree`) and refer to each other by `NodeId`.
//! A node owns its children through the arena; the parent link is a plain
//! index and never keeps anything alive.

use smallvec::SmallVec;

/// Index into the MCTSTree node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A node in the MCTS tree.
///
/// `value_sum` is kept from the perspective of the player who made the move
/// into this node, so a parent ranks its children by their own Q directly.
#[derive(Clone, Debug)]
pub struct MCTSNode<S, A> {
    /// Snapshot of the position this node represents.
    pub state: S,

    /// Parent node (NONE for root).
    pub parent: NodeId,

    /// Action that produced this node from its parent (None for root).
    pub action: Option<A>,

    /// Children, in expansion order.
    /// SmallVec optimizes for small branching factors.
    pub children: SmallVec<[NodeId; 8]>,

    /// Total visits to this node.
    pub visit_count: u32,

    /// Sum of backpropagated values.
    pub value_sum: f32,

    /// Prior probability assigned when the parent was expanded.
    /// Unused for the root.
    pub prior: f32,

    /// Depth in tree (root = 0).
    pub depth: u16,
}

impl<S, A> MCTSNode<S, A> {
    /// Create a new node.
    pub fn new(
        state: S,
        parent: NodeId,
        action: Option<A>,
        prior: f32,
        visit_count: u32,
        depth: u16,
    ) -> Self {
        Self {
            state,
            parent,
            action,
            children: SmallVec::new(),
            visit_count,
            value_sum: 0.0,
            prior,
            depth,
        }
    }

    /// Create a root node.
    ///
    /// Roots start with one visit so the exploration term is live on the
    /// very first selection.
    pub fn root(state: S) -> Self {
        Self::new(state, NodeId::NONE, None, 0.0, 1, 0)
    }

    /// Check if this node has been expanded.
    ///
    /// True as soon as the node has any child; it does not mean every child
    /// has been visited.
    #[inline]
    #[must_use]
    pub fn is_fully_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this is the root.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Mean backpropagated value, 0 for an unvisited node.
    #[must_use]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    /// Mean value remapped from `[-1, 1]` to `[0, 1]`; 0 for unvisited nodes.
    #[must_use]
    pub fn q_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            (self.mean_value() + 1.0) / 2.0
        }
    }

    /// PUCT score of this node as a child of a parent with `parent_visits`.
    #[must_use]
    pub fn puct_score(&self, parent_visits: u32, exploration_constant: f32) -> f32 {
        self.q_value()
            + self.prior * exploration_constant * (parent_visits as f32).sqrt()
                / (1.0 + self.visit_count as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(5);
        assert_eq!(id.raw(), 5);
        assert!(!id.is_none());
        assert_eq!(format!("{}", id), "NodeId(5)");

        assert!(NodeId::NONE.is_none());
        assert_eq!(format!("{}", NodeId::NONE), "NodeId(NONE)");
    }

    #[test]
    fn test_node_root() {
        let node: MCTSNode<u8, u8> = MCTSNode::root(0);

        assert!(node.is_root());
        assert_eq!(node.depth, 0);
        assert_eq!(node.visit_count, 1);
        assert!(node.action.is_none());
        assert!(!node.is_fully_expanded());
    }

    #[test]
    fn test_node_expansion_state() {
        let mut node: MCTSNode<u8, u8> = MCTSNode::root(0);
        assert!(!node.is_fully_expanded());

        node.children.push(NodeId::new(1));
        assert!(node.is_fully_expanded());
    }

    #[test]
    fn test_q_value_remap() {
        let mut node: MCTSNode<u8, u8> = MCTSNode::new(0, NodeId::new(0), Some(1), 0.5, 0, 1);
        assert_eq!(node.q_value(), 0.0);

        node.visit_count = 4;
        node.value_sum = 4.0;
        assert_eq!(node.q_value(), 1.0);

        node.value_sum = -4.0;
        assert_eq!(node.q_value(), 0.0);

        node.value_sum = 0.0;
        assert_eq!(node.q_value(), 0.5);
    }

    #[test]
    fn test_puct_score() {
        let mut node: MCTSNode<u8, u8> = MCTSNode::new(0, NodeId::new(0), Some(1), 0.5, 0, 1);

        // Unvisited: Q = 0, U = 0.5 * 2 * sqrt(16) / 1
        assert!((node.puct_score(16, 2.0) - 4.0).abs() < 1e-6);

        // Visited once with value 1: Q = 1, U = 0.5 * 2 * 4 / 2
        node.visit_count = 1;
        node.value_sum = 1.0;
        assert!((node.puct_score(16, 2.0) - 3.0).abs() < 1e-6);
    }
}
