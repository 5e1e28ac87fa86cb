//! Python bindings for batch-zero.
//!
//! This module provides PyO3 bindings for driving batched self-play from a
//! Python training loop.
//!
//! # Quick Start
//!
//! ```python
//! import numpy as np
//! import batch_zero as bz
//!
//! def net(states):
//!     n = states.shape[0]
//!     return np.zeros((n, 9), np.float32), np.zeros(n, np.float32)
//!
//! config = bz.SelfPlayConfig(parallel_games=8, games_per_run=32,
//!                            mcts=bz.MCTSConfig(num_searches=64))
//! runner = bz.TicTacToeSelfPlay(config)
//! buffer = bz.ReplayBuffer(10_000, [3, 3, 3], 9)
//!
//! report = runner.play(bz.Evaluator(net, 9), buffer)
//! states, policies, values = buffer.sample(256)
//! ```

use pyo3::prelude::*;

mod py_nn;
mod py_self_play;
mod py_training;

pub use py_nn::*;
pub use py_self_play::*;
pub use py_training::*;

/// batch-zero: batched MCTS self-play for AlphaZero-style training.
///
/// This module provides:
/// - Evaluators wrapping a Python network callable
/// - A replay buffer with numpy sampling
/// - Batched self-play for tic-tac-toe
#[pymodule]
fn batch_zero(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Neural network types
    m.add_class::<PyEvaluator>()?;

    // Training types
    m.add_class::<PyReplayBuffer>()?;

    // Self-play
    m.add_class::<PyMCTSConfig>()?;
    m.add_class::<PySelfPlayConfig>()?;
    m.add_class::<PySelfPlayReport>()?;
    m.add_class::<PyTicTacToeSelfPlay>()?;

    Ok(())
}
