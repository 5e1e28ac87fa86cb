//! Flat tensors passed between the rules engine, the evaluator and the
//! replay buffer.

use serde::{Deserialize, Serialize};

use super::evaluator::EvaluatorError;

/// Encoded game state as a flat tensor for neural network input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor (e.g., [channels, height, width] or [features]).
    pub shape: Vec<usize>,
}

impl EncodedState {
    /// Create a new encoded state.
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// Create a zero-filled encoded state with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    /// Check if the tensor is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }
}

/// A batch of encoded states stacked along a leading batch dimension.
///
/// `shape` is `[batch, ..item_shape]`; `data` is row-major, one item after
/// another in the order they were pushed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedBatch {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl EncodedBatch {
    /// Create an empty batch whose items have the given shape.
    pub fn with_item_shape(item_shape: Vec<usize>, capacity: usize) -> Self {
        let item_len: usize = item_shape.iter().product();
        let mut shape = Vec::with_capacity(item_shape.len() + 1);
        shape.push(0);
        shape.extend(item_shape);
        Self {
            data: Vec::with_capacity(item_len * capacity),
            shape,
        }
    }

    /// Stack encoded states into one batch, preserving order.
    ///
    /// Every item must share the first item's shape.
    pub fn stack<'a, I>(states: I) -> Result<Self, EvaluatorError>
    where
        I: IntoIterator<Item = &'a EncodedState>,
    {
        let mut iter = states.into_iter().peekable();
        let item_shape = match iter.peek() {
            Some(first) => first.shape.clone(),
            None => return Err(EvaluatorError::EmptyBatch),
        };

        let mut batch = Self::with_item_shape(item_shape, iter.size_hint().0);
        for state in iter {
            batch.push(state)?;
        }
        Ok(batch)
    }

    /// Append one encoded state.
    pub fn push(&mut self, state: &EncodedState) -> Result<(), EvaluatorError> {
        if state.shape[..] != self.shape[1..] {
            return Err(EvaluatorError::ShapeMismatch {
                expected: self.shape[1..].to_vec(),
                actual: state.shape.clone(),
            });
        }
        self.data.extend_from_slice(&state.tensor);
        self.shape[0] += 1;
        Ok(())
    }

    /// Number of items in the batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    /// Check if the batch holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch_size() == 0
    }

    /// Shape of a single item.
    #[must_use]
    pub fn item_shape(&self) -> &[usize] {
        &self.shape[1..]
    }

    /// Number of elements in a single item.
    #[must_use]
    pub fn item_len(&self) -> usize {
        self.item_shape().iter().product()
    }

    /// Full shape including the batch dimension.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Borrow item `index` as a flat slice.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&[f32]> {
        let len = self.item_len();
        let start = index.checked_mul(len)?;
        self.data.get(start..start + len)
    }
}
