//! # batch-zero
//!
//! Batched Monte Carlo Tree Search for AlphaZero-style self-play.
//!
//! ## Design Principles
//!
//! 1. **One evaluator call per round**: Every game in a batch is walked to a
//!    leaf before the network runs, so inference is always batched.
//!
//! 2. **Game-Agnostic**: Search only talks to games through `RulesEngine`
//!    and to networks through `Evaluator`.
//!
//! 3. **Reproducible**: All randomness flows from explicit seeds.
//!
//! ## Architecture
//!
//! - **Arena trees**: Nodes live in a flat vector addressed by `NodeId`;
//!   backpropagation walks parent indices iteratively.
//!
//! - **Immutable states**: Applying an action returns a new state, so
//!   expansion validates moves without mutating anything.
//!
//! ## Modules
//!
//! - `core`: Seeded, forkable RNG
//! - `rules`: RulesEngine trait for game implementations
//! - `nn`: Encoded tensors and the batched Evaluator trait
//! - `mcts`: Batched Monte Carlo Tree Search
//! - `training`: Self-play games, replay buffer, self-play driver
//! - `games`: Reference games (tic-tac-toe)
//! - `python`: PyO3 bindings (feature `python`)

pub mod core;
pub mod rules;
pub mod nn;
pub mod mcts;
pub mod training;
pub mod games;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::GameRng;

pub use crate::rules::{Outcome, RepetitionHistory, RulesEngine};

pub use crate::nn::{
    EncodedBatch, EncodedState, Evaluator, EvaluatorError, EvaluatorOutput, UniformEvaluator,
};

pub use crate::mcts::{
    ConfigError, MCTSConfig, MCTSNode, MCTSSearch, MCTSTree, NodeId, PolicyError, SearchError,
    SearchStats, TreeStats,
};

pub use crate::training::{
    BufferError, PositionRecord, ReplayBuffer, SampleBatch, SampleView, SelfPlayConfig,
    SelfPlayError, SelfPlayGame, SelfPlayReport, SelfPlayRunner,
};
