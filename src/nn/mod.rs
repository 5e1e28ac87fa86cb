//! Neural network integration.
//!
//! This module defines the boundary between search and the network:
//!
//! - **Tensors**: `EncodedState` for one position, `EncodedBatch` for a
//!   stacked batch
//! - **Evaluator**: `Evaluator` trait with a single batched `forward`
//! - **Baseline**: `UniformEvaluator` for testing
//!
//! ## Usage
//!
//! ```rust
//! use batch_zero::nn::{EncodedBatch, EncodedState, Evaluator, UniformEvaluator};
//!
//! let evaluator = UniformEvaluator::new(9);
//! let state = EncodedState::zeros(vec![3, 3, 3]);
//! let batch = EncodedBatch::stack([&state, &state]).unwrap();
//!
//! let mut output = evaluator.forward(&batch).unwrap();
//! output.softmax_policy();
//! assert_eq!(output.batch_size(), 2);
//! ```

pub mod evaluator;
pub mod tensor;

// Re-export main types
pub use evaluator::{
    softmax_in_place, Evaluator, EvaluatorError, EvaluatorOutput, UniformEvaluator,
};
pub use tensor::{EncodedBatch, EncodedState};
