//! Self-play and training data.
//!
//! This module turns batched searches into training samples for an
//! AlphaZero-style pipeline.
//!
//! ## Overview
//!
//! - **SelfPlayGame**: One game's search context inside a batch
//! - **ReplayBuffer**: Fixed-capacity ring buffer of (state, policy, value)
//! - **SelfPlayRunner**: Plays batches of games and harvests finished ones
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use batch_zero::core::GameRng;
//! use batch_zero::games::TicTacToe;
//! use batch_zero::mcts::MCTSConfig;
//! use batch_zero::nn::UniformEvaluator;
//! use batch_zero::training::{ReplayBuffer, SelfPlayConfig, SelfPlayRunner};
//!
//! let config = SelfPlayConfig::default()
//!     .with_parallel_games(4)
//!     .with_games_per_run(4)
//!     .with_mcts(MCTSConfig::default().with_num_searches(16));
//!
//! let mut runner = SelfPlayRunner::new(Arc::new(TicTacToe), config).unwrap();
//! let mut buffer = ReplayBuffer::new(4096, vec![3, 3, 3], 9).unwrap();
//! let report = runner.play(&UniformEvaluator::new(9), &mut buffer).unwrap();
//! assert_eq!(report.games, 4);
//!
//! let batch = buffer.sample(8, &mut GameRng::new(0)).unwrap();
//! assert_eq!(batch.state_shape, vec![8, 3, 3, 3]);
//! ```

pub mod game;
pub mod replay_buffer;
pub mod self_play;

// Re-export main types
pub use game::{PositionRecord, SelfPlayGame};
pub use replay_buffer::{BufferError, ReplayBuffer, SampleBatch, SampleView};
pub use self_play::{SelfPlayConfig, SelfPlayError, SelfPlayReport, SelfPlayRunner};
