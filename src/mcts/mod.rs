//! Batched Monte Carlo Tree Search.
//!
//! ## Overview
//!
//! Searches many independent games at once and funnels every position that
//! needs a network evaluation into one batched `Evaluator` call per round:
//!
//! - **Arena trees**: `MCTSTree` stores nodes in a flat vector addressed by
//!   `NodeId`; parents are back-references, teardown is a single clear
//! - **PUCT selection**: prior-weighted exploration with values remapped
//!   into `[0, 1]`
//! - **Root noise**: Dirichlet noise mixed into root priors from a seeded RNG
//! - **Batching**: one evaluator call for the roots, then at most one per round
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use batch_zero::games::TicTacToe;
//! use batch_zero::mcts::{MCTSConfig, MCTSSearch};
//! use batch_zero::nn::UniformEvaluator;
//! use batch_zero::training::SelfPlayGame;
//!
//! let engine = Arc::new(TicTacToe);
//! let mut games: Vec<_> = (0..4)
//!     .map(|id| SelfPlayGame::new(Arc::clone(&engine), id))
//!     .collect();
//!
//! let mut search = MCTSSearch::new(MCTSConfig::default().with_num_searches(50)).unwrap();
//! search.search(&mut games, &UniformEvaluator::new(9)).unwrap();
//!
//! for game in &games {
//!     let target = game.tree().policy_target(game.engine());
//!     assert!((target.iter().sum::<f32>() - 1.0).abs() < 1e-4);
//! }
//! ```

pub mod config;
pub mod node;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use config::{ConfigError, MCTSConfig};
pub use node::{MCTSNode, NodeId};
pub use policy::{mask_and_normalize, mix_noise, PolicyError};
pub use search::{MCTSSearch, SearchError};
pub use stats::SearchStats;
pub use tree::{MCTSTree, TreeStats};
