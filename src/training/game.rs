//! Per-game search context for batched self-play.
//!
//! A `SelfPlayGame` is one independent game in a batch: the shared rules
//! engine, the position actually reached, the search tree rooted at that
//! position, and the scratch state the orchestrator needs between the
//! selection and expansion phases of a round.

use std::sync::Arc;

use crate::mcts::{MCTSTree, NodeId};
use crate::nn::EncodedState;
use crate::rules::{Outcome, RepetitionHistory, RulesEngine};

/// Exploration constant of a tree that has not been searched yet.
/// `begin_search` installs the configured value.
const UNSEARCHED_EXPLORATION: f32 = 0.0;

/// One searched position of a game, kept until the game's outcome is known.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionRecord {
    /// Encoded position at the root of the search.
    pub state: EncodedState,

    /// Root visit distribution over the action space.
    pub policy: Vec<f32>,

    /// Ply at which the position occurred.
    pub ply: u32,
}

/// Search context for one self-play game (SPG).
pub struct SelfPlayGame<E: RulesEngine> {
    engine: Arc<E>,
    game_id: u64,
    state: E::State,
    history: RepetitionHistory<E::State>,
    tree: MCTSTree<E::State, E::Action>,
    pending: Option<NodeId>,
    memory: Vec<PositionRecord>,
    ply: u32,
}

impl<E: RulesEngine> SelfPlayGame<E> {
    /// Start a game from the engine's initial state.
    pub fn new(engine: Arc<E>, game_id: u64) -> Self {
        let state = engine.initial_state();
        Self::with_state(engine, game_id, state)
    }

    /// Start a game from an arbitrary position.
    pub fn with_state(engine: Arc<E>, game_id: u64, state: E::State) -> Self {
        let mut history = RepetitionHistory::new();
        history.record(&state);
        let tree = MCTSTree::new(state.clone(), UNSEARCHED_EXPLORATION);

        Self {
            engine,
            game_id,
            state,
            history,
            tree,
            pending: None,
            memory: Vec::new(),
            ply: 0,
        }
    }

    /// The rules engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Identifier of the game currently played in this slot.
    pub fn game_id(&self) -> u64 {
        self.game_id
    }

    /// The position actually reached in the game.
    pub fn state(&self) -> &E::State {
        &self.state
    }

    /// Positions seen so far in the game.
    pub fn history(&self) -> &RepetitionHistory<E::State> {
        &self.history
    }

    /// Moves played so far.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    /// Search tree rooted at the current position.
    pub fn tree(&self) -> &MCTSTree<E::State, E::Action> {
        &self.tree
    }

    /// Leaf awaiting evaluation in the current round, if any.
    pub fn pending_leaf(&self) -> Option<NodeId> {
        self.pending
    }

    /// Positions recorded since the game started.
    pub fn memory(&self) -> &[PositionRecord] {
        &self.memory
    }

    /// Terminal status of the current position.
    pub fn outcome(&self) -> Outcome {
        self.engine.value_and_terminated(&self.state, &self.history)
    }

    /// Record the current root's visit distribution as a training position.
    ///
    /// Returns the recorded policy target.
    pub fn record_root(&mut self) -> &[f32] {
        let record = PositionRecord {
            state: self.engine.encode_state(&self.state),
            policy: self.tree.policy_target(&*self.engine),
            ply: self.ply,
        };
        self.memory.push(record);
        &self.memory[self.memory.len() - 1].policy
    }

    /// Play `action` in the real game.
    ///
    /// Replaces the search tree with an unexpanded root at the new position
    /// and returns the new position's outcome, or `None` if the action is
    /// illegal (the game is left unchanged).
    pub fn play(&mut self, action: &E::Action) -> Option<Outcome> {
        let next = self.engine.apply_action(&self.state, action)?;

        self.history.record(&next);
        self.tree.reset(next.clone());
        self.pending = None;
        self.state = next;
        self.ply += 1;

        Some(self.outcome())
    }

    /// Drain the recorded positions.
    pub fn take_memory(&mut self) -> Vec<PositionRecord> {
        std::mem::take(&mut self.memory)
    }

    /// Reuse this slot for a new game from the initial state.
    ///
    /// Drops the whole previous tree.
    pub fn reset(&mut self, game_id: u64) {
        self.state = self.engine.initial_state();
        self.history.clear();
        self.history.record(&self.state);
        self.tree.reset(self.state.clone());
        self.pending = None;
        self.memory.clear();
        self.ply = 0;
        self.game_id = game_id;
    }

    // === Orchestrator hooks ===

    /// Replace the tree with a fresh root at the current position.
    pub(crate) fn begin_search(&mut self, exploration_constant: f32) {
        self.tree.reset(self.state.clone());
        self.tree.set_exploration_constant(exploration_constant);
        self.pending = None;
    }

    pub(crate) fn set_pending(&mut self, leaf: NodeId) {
        self.pending = Some(leaf);
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Descend from the root to the first unexpanded node.
    pub(crate) fn select_leaf(&self) -> NodeId {
        self.tree.descend(self.tree.root())
    }

    /// Terminal status of a tree node, judged against this game's history.
    pub(crate) fn node_outcome(&self, id: NodeId) -> Outcome {
        self.engine
            .value_and_terminated(&self.tree.get(id).state, &self.history)
    }

    pub(crate) fn encode_node(&self, id: NodeId) -> EncodedState {
        self.engine.encode_state(&self.tree.get(id).state)
    }

    pub(crate) fn legal_mask(&self, id: NodeId) -> Vec<f32> {
        self.engine.legal_mask(&self.tree.get(id).state)
    }

    pub(crate) fn expand(&mut self, id: NodeId, priors: &[f32], legal_mask: &[f32]) -> usize {
        self.tree.expand(&*self.engine, id, priors, legal_mask)
    }

    pub(crate) fn backpropagate(&mut self, id: NodeId, value: f32) {
        self.tree.backpropagate(id, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{TicTacToe, TicTacToeState};

    fn new_game() -> SelfPlayGame<TicTacToe> {
        SelfPlayGame::new(Arc::new(TicTacToe), 0)
    }

    #[test]
    fn test_new_game() {
        let game = new_game();

        assert_eq!(game.ply(), 0);
        assert_eq!(game.game_id(), 0);
        assert_eq!(*game.state(), TicTacToeState::new());
        assert_eq!(game.history().count(game.state()), 1);
        assert_eq!(game.tree().len(), 1);
        assert!(game.pending_leaf().is_none());
        assert!(!game.outcome().terminated);
    }

    #[test]
    fn test_begin_search_installs_exploration_constant() {
        let mut game = new_game();
        assert_eq!(game.tree().exploration_constant(), UNSEARCHED_EXPLORATION);

        game.begin_search(1.25);
        assert_eq!(game.tree().exploration_constant(), 1.25);
    }

    #[test]
    fn test_play_advances_and_resets_tree() {
        let mut game = new_game();
        game.begin_search(1.5);
        let root = game.tree().root();
        let mask = game.legal_mask(root);
        game.expand(root, &[1.0 / 9.0; 9], &mask);
        game.set_pending(NodeId::new(1));
        assert_eq!(game.tree().len(), 10);

        let outcome = game.play(&4).unwrap();

        assert!(!outcome.terminated);
        assert_eq!(game.ply(), 1);
        assert_eq!(game.tree().len(), 1);
        assert_eq!(game.tree().root_node().state, *game.state());
        assert_eq!(game.tree().exploration_constant(), 1.5);
        assert!(game.pending_leaf().is_none());
    }

    #[test]
    fn test_play_illegal_leaves_game_unchanged() {
        let mut game = new_game();
        game.play(&4).unwrap();

        assert!(game.play(&4).is_none());
        assert_eq!(game.ply(), 1);
    }

    #[test]
    fn test_play_to_terminal() {
        let mut game = new_game();
        for cell in [0, 3, 1, 4] {
            assert!(!game.play(&cell).unwrap().terminated);
        }
        let outcome = game.play(&2).unwrap();

        assert_eq!(outcome, Outcome::terminal(-1.0));
    }

    #[test]
    fn test_record_root_and_take_memory() {
        let mut game = new_game();
        game.begin_search(2.0);
        let root = game.tree().root();
        let mask = game.legal_mask(root);
        game.expand(root, &[1.0 / 9.0; 9], &mask);
        game.backpropagate(NodeId::new(5), 0.0);

        let policy = game.record_root().to_vec();
        assert_eq!(policy.len(), 9);
        assert_eq!(policy[4], 1.0);

        game.play(&4).unwrap();
        let memory = game.take_memory();
        assert_eq!(memory.len(), 1);
        assert_eq!(memory[0].ply, 0);
        assert_eq!(memory[0].state.shape, vec![3, 3, 3]);
        assert!(game.memory().is_empty());
    }

    #[test]
    fn test_reset_reuses_slot() {
        let mut game = new_game();
        game.play(&0).unwrap();
        game.begin_search(2.0);
        game.record_root();

        game.reset(7);

        assert_eq!(game.game_id(), 7);
        assert_eq!(game.ply(), 0);
        assert_eq!(*game.state(), TicTacToeState::new());
        assert_eq!(game.history().len(), 1);
        assert!(game.memory().is_empty());
        assert_eq!(game.tree().len(), 1);
    }
}
