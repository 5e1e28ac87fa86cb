//! Batched evaluator interface.
//!
//! The evaluator is the neural network seen as a black box: one call maps a
//! stacked batch of encoded states to policy logits and value estimates.
//! The search issues at most one call per round for a whole batch of games,
//! so implementations should treat `forward` as the expensive operation.

use thiserror::Error;

use super::tensor::EncodedBatch;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Cannot evaluate an empty batch")]
    EmptyBatch,

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Raw output of one batched forward pass.
#[derive(Clone, Debug)]
pub struct EvaluatorOutput {
    /// Policy logits, `[batch, action_space]` in row-major order.
    pub policy: Vec<f32>,

    /// Value estimates, one per batch item, from the perspective of the
    /// player who made the move into that item's state. Range: -1.0 to +1.0.
    pub value: Vec<f32>,

    /// Width of one policy row.
    pub action_space: usize,
}

impl EvaluatorOutput {
    /// Check that the output covers `batch_size` items of `action_space` logits.
    pub fn validate(&self, batch_size: usize, action_space: usize) -> Result<(), EvaluatorError> {
        if self.action_space != action_space || self.policy.len() != batch_size * action_space {
            return Err(EvaluatorError::ShapeMismatch {
                expected: vec![batch_size, action_space],
                actual: vec![self.policy.len() / self.action_space.max(1), self.action_space],
            });
        }
        if self.value.len() != batch_size {
            return Err(EvaluatorError::ShapeMismatch {
                expected: vec![batch_size],
                actual: vec![self.value.len()],
            });
        }
        Ok(())
    }

    /// Number of items in the output.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.value.len()
    }

    /// Policy row for item `index`.
    #[must_use]
    pub fn policy_row(&self, index: usize) -> &[f32] {
        let start = index * self.action_space;
        &self.policy[start..start + self.action_space]
    }

    /// Replace every policy row's logits with its softmax.
    pub fn softmax_policy(&mut self) {
        if self.action_space == 0 {
            return;
        }
        for row in self.policy.chunks_mut(self.action_space) {
            softmax_in_place(row);
        }
    }
}

/// Numerically stable softmax over one row.
pub fn softmax_in_place(row: &mut [f32]) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return;
    }

    let mut sum = 0.0;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in row.iter_mut() {
        *x /= sum;
    }
}

/// Trait for batched position evaluators.
///
/// Implementations could be:
/// - UniformEvaluator: zero logits and zero value (for testing)
/// - A Python callable wrapping a network (see the `python` feature)
pub trait Evaluator: Send + Sync {
    /// Size of the policy head's action space.
    fn action_space(&self) -> usize;

    /// Evaluate a batch of encoded states.
    ///
    /// Returns policy logits `[batch, action_space]` and values `[batch]`,
    /// in the same order as the batch items. No gradient tracking is needed.
    fn forward(&self, batch: &EncodedBatch) -> Result<EvaluatorOutput, EvaluatorError>;
}

/// Uniform evaluator: equal logits for every action and a neutral value.
/// Useful for testing search without a model.
#[derive(Clone, Debug, Default)]
pub struct UniformEvaluator {
    action_space: usize,
}

impl UniformEvaluator {
    /// Create a new uniform evaluator.
    pub fn new(action_space: usize) -> Self {
        Self { action_space }
    }
}

impl Evaluator for UniformEvaluator {
    fn action_space(&self) -> usize {
        self.action_space
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<EvaluatorOutput, EvaluatorError> {
        let n = batch.batch_size();
        Ok(EvaluatorOutput {
            policy: vec![0.0; n * self.action_space],
            value: vec![0.0; n],
            action_space: self.action_space,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::EncodedState;

    #[test]
    fn test_softmax_sums_to_one() {
        let mut row = vec![1.0, 2.0, 3.0];
        softmax_in_place(&mut row);

        assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(row[2] > row[1] && row[1] > row[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let mut row = vec![1000.0, 1000.0];
        softmax_in_place(&mut row);
        assert!((row[0] - 0.5).abs() < 1e-6);
        assert!((row[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_evaluator() {
        let evaluator = UniformEvaluator::new(4);
        let state = EncodedState::zeros(vec![10]);
        let batch = EncodedBatch::stack([&state, &state]).unwrap();

        let mut output = evaluator.forward(&batch).unwrap();
        output.validate(2, 4).unwrap();
        output.softmax_policy();

        assert_eq!(output.batch_size(), 2);
        for i in 0..2 {
            assert!(output.policy_row(i).iter().all(|&p| (p - 0.25).abs() < 1e-6));
        }
        assert!(output.value.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_validate_rejects_wrong_width() {
        let output = EvaluatorOutput {
            policy: vec![0.0; 6],
            value: vec![0.0; 2],
            action_space: 3,
        };

        assert!(output.validate(2, 3).is_ok());
        assert!(matches!(
            output.validate(2, 4),
            Err(EvaluatorError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            output.validate(3, 3),
            Err(EvaluatorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_wrong_value_len() {
        let output = EvaluatorOutput {
            policy: vec![0.0; 6],
            value: vec![0.0; 1],
            action_space: 3,
        };

        assert!(output.validate(2, 3).is_err());
    }
}
