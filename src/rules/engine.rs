//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define their rules:
//! - What actions are legal
//! - How actions produce new states
//! - Terminal detection and outcome values
//! - How states and actions map to network tensors
//!
//! States are immutable values: applying an action returns a new state, so
//! search never has to mutate and then revert a shared board.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::nn::EncodedState;

/// Terminal status and value of a state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outcome {
    /// Whether the game is over.
    pub terminated: bool,

    /// Value from the perspective of the player to move in the state.
    /// -1.0 means that player has lost, 0.0 is a draw or unfinished game.
    pub value: f32,
}

impl Outcome {
    /// A game that continues.
    pub const ONGOING: Outcome = Outcome {
        terminated: false,
        value: 0.0,
    };

    /// A finished game with the given value for the player to move.
    #[must_use]
    pub const fn terminal(value: f32) -> Self {
        Self {
            terminated: true,
            value,
        }
    }
}

/// Counts of previously seen states in one played game.
///
/// Passed to `value_and_terminated` so engines can score repetition draws.
#[derive(Clone, Debug)]
pub struct RepetitionHistory<S: Eq + Hash> {
    counts: FxHashMap<S, u32>,
}

impl<S: Eq + Hash> Default for RepetitionHistory<S> {
    fn default() -> Self {
        Self {
            counts: FxHashMap::default(),
        }
    }
}

impl<S: Eq + Hash + Clone> RepetitionHistory<S> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more occurrence of `state`.
    pub fn record(&mut self, state: &S) {
        *self.counts.entry(state.clone()).or_insert(0) += 1;
    }

    /// How many times `state` has been recorded.
    #[must_use]
    pub fn count(&self, state: &S) -> u32 {
        self.counts.get(state).copied().unwrap_or(0)
    }

    /// Number of distinct states recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Forget every recorded state.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Rules engine trait.
///
/// The search only ever talks to a game through this trait.
///
/// ## Implementation Notes
///
/// - `apply_action`: Return `None` for illegal actions; must be deterministic
/// - `encode_action`/`decode_action`: Map actions to indices in
///   `0..action_space_size()`, matching the evaluator's policy head
/// - `value_and_terminated`: Value is for the player to move in `state`
pub trait RulesEngine {
    /// Game position.
    type State: Clone + Eq + Hash + Debug;

    /// Move label.
    type Action: Clone + PartialEq + Debug;

    /// Starting position of a new game.
    fn initial_state(&self) -> Self::State;

    /// Width of the policy head.
    fn action_space_size(&self) -> usize;

    /// Shape of one encoded state.
    fn state_shape(&self) -> Vec<usize>;

    /// Legal actions in `state`.
    ///
    /// Returns empty if the player to move has no legal actions.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Apply an action, returning the resulting state or `None` if illegal.
    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Option<Self::State>;

    /// Terminal status and value of `state`, given the states already seen
    /// in the played game.
    fn value_and_terminated(
        &self,
        state: &Self::State,
        history: &RepetitionHistory<Self::State>,
    ) -> Outcome;

    /// Encode a state for the evaluator.
    fn encode_state(&self, state: &Self::State) -> EncodedState;

    /// Policy index of an action, if it has one.
    fn encode_action(&self, state: &Self::State, action: &Self::Action) -> Option<usize>;

    /// Action at a policy index, if the index names one.
    fn decode_action(&self, state: &Self::State, index: usize) -> Option<Self::Action>;

    // === Convenience Methods ===

    /// Legal-move mask over the action space: 1.0 at every legal action's
    /// index, 0.0 elsewhere.
    fn legal_mask(&self, state: &Self::State) -> Vec<f32> {
        let mut mask = vec![0.0; self.action_space_size()];
        for action in self.legal_actions(state) {
            if let Some(slot) = self
                .encode_action(state, &action)
                .and_then(|index| mask.get_mut(index))
            {
                *slot = 1.0;
            }
        }
        mask
    }

    /// Decode a policy into `(action, probability)` pairs.
    ///
    /// Yields every index with a positive mask entry whose action decodes.
    /// Decoded actions are not checked for legality here.
    fn decode_actions(
        &self,
        state: &Self::State,
        policy: &[f32],
        legal_mask: &[f32],
    ) -> Vec<(Self::Action, f32)> {
        policy
            .iter()
            .zip(legal_mask)
            .enumerate()
            .filter(|&(_, (_, mask))| *mask > 0.0)
            .filter_map(|(index, (&prob, _))| {
                self.decode_action(state, index).map(|action| (action, prob))
            })
            .collect()
    }
}
