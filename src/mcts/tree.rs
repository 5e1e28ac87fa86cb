//! Arena-based MCTS tree.
//!
//! Uses a flat `Vec<MCTSNode>` with index-based references. Children are
//! owned through the arena and parents are back-references by index, so
//! dropping or resetting the tree releases every node at once.

use std::fmt::Debug;

use tracing::trace;

use super::node::{MCTSNode, NodeId};
use crate::rules::RulesEngine;

/// Arena-based MCTS tree.
///
/// Nodes are stored in a flat vector and referenced by `NodeId` indices.
#[derive(Clone, Debug)]
pub struct MCTSTree<S, A> {
    /// All nodes in the tree.
    nodes: Vec<MCTSNode<S, A>>,

    /// The root node ID (always 0).
    root: NodeId,

    /// Exploration constant shared by every node.
    exploration_constant: f32,
}

impl<S, A> MCTSTree<S, A> {
    /// Create a new tree with a root node for `root_state`.
    pub fn new(root_state: S, exploration_constant: f32) -> Self {
        Self::with_capacity(root_state, exploration_constant, 1024)
    }

    /// Create a tree with custom initial capacity.
    pub fn with_capacity(root_state: S, exploration_constant: f32, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(MCTSNode::root(root_state));
        Self {
            nodes,
            root: NodeId::new(0),
            exploration_constant,
        }
    }

    /// Get the root node ID.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &MCTSNode<S, A> {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MCTSNode<S, A> {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node, returning its ID.
    pub fn alloc(&mut self, node: MCTSNode<S, A>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Exploration constant used by `select`.
    #[must_use]
    pub fn exploration_constant(&self) -> f32 {
        self.exploration_constant
    }

    /// Change the exploration constant for subsequent selections.
    pub fn set_exploration_constant(&mut self, exploration_constant: f32) {
        self.exploration_constant = exploration_constant;
    }

    /// Get the root node.
    #[must_use]
    pub fn root_node(&self) -> &MCTSNode<S, A> {
        self.get(self.root)
    }

    /// Check if a node has been expanded.
    #[inline]
    #[must_use]
    pub fn is_fully_expanded(&self, id: NodeId) -> bool {
        self.get(id).is_fully_expanded()
    }

    /// Select the child with the highest PUCT score.
    ///
    /// Ties keep the first maximal child in expansion order. Returns `None`
    /// for an unexpanded node; callers gate on `is_fully_expanded`.
    #[must_use]
    pub fn select(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(NodeId, f32)> = None;

        for &child in &node.children {
            let score = self
                .get(child)
                .puct_score(node.visit_count, self.exploration_constant);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((child, score));
            }
        }

        best.map(|(child, _)| child)
    }

    /// Follow `select` from `id` down to the first unexpanded node.
    #[must_use]
    pub fn descend(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.select(current) {
            current = child;
        }
        current
    }

    /// Add `value` to `id` and every ancestor, flipping sign at each hop.
    ///
    /// Walks parent links iteratively, so depth is bounded only by the arena.
    pub fn backpropagate(&mut self, id: NodeId, value: f32) {
        let mut current = id;
        let mut value = value;

        while !current.is_none() {
            let node = self.get_mut(current);
            node.visit_count += 1;
            node.value_sum += value;
            value = -value;
            current = node.parent;
        }
    }

    /// Reset the tree to a single root for `root_state`.
    ///
    /// Every previous node is dropped; the arena keeps its capacity.
    pub fn reset(&mut self, root_state: S) {
        self.nodes.clear();
        self.nodes.push(MCTSNode::root(root_state));
        self.root = NodeId::new(0);
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MCTSNode<S, A>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i as u32), n))
    }

    /// Get statistics about the tree.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            node_count: self.nodes.len(),
            expanded_count: self.nodes.iter().filter(|n| n.is_fully_expanded()).count(),
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }
}

impl<S: Clone, A: Clone + Debug> MCTSTree<S, A> {
    /// Expand `id` with one child per decoded action that replays legally.
    ///
    /// `policy` must already be masked and normalized; each accepted child
    /// takes its probability as prior. Decoded actions the engine rejects
    /// are dropped. Must be called at most once per node.
    ///
    /// Returns the number of children created.
    pub fn expand<E>(&mut self, engine: &E, id: NodeId, policy: &[f32], legal_mask: &[f32]) -> usize
    where
        E: RulesEngine<State = S, Action = A> + ?Sized,
    {
        debug_assert!(!self.is_fully_expanded(id), "{id} expanded twice");

        let node = self.get(id);
        let depth = node.depth.saturating_add(1);
        let children: Vec<_> = engine
            .decode_actions(&node.state, policy, legal_mask)
            .into_iter()
            .filter_map(|(action, prior)| match engine.apply_action(&node.state, &action) {
                Some(next) => Some((next, action, prior)),
                None => {
                    trace!(?action, "dropping decoded action that does not replay legally");
                    None
                }
            })
            .collect();

        let count = children.len();
        for (state, action, prior) in children {
            let child = self.alloc(MCTSNode::new(state, id, Some(action), prior, 0, depth));
            self.get_mut(id).children.push(child);
        }
        count
    }

    /// Root actions with their visit counts (for training).
    pub fn action_visits(&self) -> Vec<(A, u32)> {
        self.root_children()
            .filter_map(|child| child.action.clone().map(|a| (a, child.visit_count)))
            .collect()
    }

    /// Root actions with visit-count probabilities (for training).
    ///
    /// Returns (action, probability) pairs where probabilities sum to ~1.0.
    /// Falls back to uniform when no child has been visited yet.
    pub fn action_probabilities(&self) -> Vec<(A, f32)> {
        let visits = self.action_visits();
        let total: u32 = visits.iter().map(|(_, v)| v).sum();

        if total == 0 {
            let uniform = 1.0 / visits.len().max(1) as f32;
            return visits.into_iter().map(|(a, _)| (a, uniform)).collect();
        }

        visits
            .into_iter()
            .map(|(a, v)| (a, v as f32 / total as f32))
            .collect()
    }

    /// Root visit distribution scattered into the engine's action space.
    ///
    /// This is the policy training target for the root position.
    pub fn policy_target<E>(&self, engine: &E) -> Vec<f32>
    where
        E: RulesEngine<State = S, Action = A> + ?Sized,
    {
        let mut target = vec![0.0; engine.action_space_size()];
        let root_state = &self.root_node().state;

        for (action, prob) in self.action_probabilities() {
            if let Some(slot) = engine
                .encode_action(root_state, &action)
                .and_then(|index| target.get_mut(index))
            {
                *slot += prob;
            }
        }
        target
    }

    fn root_children(&self) -> impl Iterator<Item = &MCTSNode<S, A>> {
        self.root_node().children.iter().map(|&id| self.get(id))
    }
}

/// Statistics about the MCTS tree.
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    /// Total number of nodes.
    pub node_count: usize,

    /// Nodes with at least one child.
    pub expanded_count: usize,

    /// Maximum depth reached.
    pub max_depth: u16,
}

impl TreeStats {
    /// Average children per expanded node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.expanded_count == 0 {
            0.0
        } else {
            (self.node_count - 1) as f64 / self.expanded_count as f64
        }
    }
}
