//! Fixed-capacity ring buffer of training samples.
//!
//! Samples are stored in flat preallocated `f32` arrays so a sampled batch
//! can be handed to a training loop as contiguous tensors. Once the buffer
//! is full, each new sample overwrites the oldest one.

use thiserror::Error;

use crate::core::GameRng;

/// Errors that can occur in the replay buffer.
#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("Replay buffer capacity must be positive")]
    ZeroCapacity,

    #[error("Cannot sample {requested} items from a buffer holding {available}")]
    InsufficientSamples { requested: usize, available: usize },

    #[error("{what} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Borrowed view of one stored sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleView<'a> {
    pub state: &'a [f32],
    pub policy: &'a [f32],
    pub value: f32,
    pub game_id: u64,
}

/// An owned batch of samples, flattened row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBatch {
    /// `[batch, ..state_shape]`
    pub states: Vec<f32>,

    /// `[batch, action_space]`
    pub policies: Vec<f32>,

    /// `[batch]`
    pub values: Vec<f32>,

    /// Shape of `states`, batch dimension first.
    pub state_shape: Vec<usize>,

    /// Width of one policy row.
    pub action_space: usize,
}

impl SampleBatch {
    /// Number of samples in the batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.values.len()
    }
}

/// Ring buffer of (state, policy target, value target) samples.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    capacity: usize,
    state_shape: Vec<usize>,
    state_len: usize,
    action_space: usize,

    states: Vec<f32>,
    policies: Vec<f32>,
    values: Vec<f32>,
    game_ids: Vec<u64>,

    /// Slot the next sample is written to.
    cursor: usize,

    /// Set once the cursor has wrapped for the first time.
    full: bool,

    current_game_id: u64,
}

impl ReplayBuffer {
    /// Create an empty buffer for `capacity` samples.
    pub fn new(capacity: usize, state_shape: Vec<usize>, action_space: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let state_len = state_shape.iter().product();

        Ok(Self {
            capacity,
            state_shape,
            state_len,
            action_space,
            states: vec![0.0; capacity * state_len],
            policies: vec![0.0; capacity * action_space],
            values: vec![0.0; capacity],
            game_ids: vec![0; capacity],
            cursor: 0,
            full: false,
            current_game_id: 0,
        })
    }

    /// Write one sample at the cursor, tagged with the current game id.
    pub fn add(&mut self, state: &[f32], policy: &[f32], value: f32) -> Result<(), BufferError> {
        if state.len() != self.state_len {
            return Err(BufferError::ShapeMismatch {
                what: "state",
                expected: self.state_len,
                actual: state.len(),
            });
        }
        if policy.len() != self.action_space {
            return Err(BufferError::ShapeMismatch {
                what: "policy",
                expected: self.action_space,
                actual: policy.len(),
            });
        }

        let slot = self.cursor;
        self.states[slot * self.state_len..(slot + 1) * self.state_len].copy_from_slice(state);
        self.policies[slot * self.action_space..(slot + 1) * self.action_space].copy_from_slice(policy);
        self.values[slot] = value;
        self.game_ids[slot] = self.current_game_id;

        self.cursor += 1;
        if self.cursor == self.capacity {
            self.cursor = 0;
            self.full = true;
        }
        Ok(())
    }

    /// Draw `batch_size` distinct samples uniformly from the held range.
    pub fn sample(&self, batch_size: usize, rng: &mut GameRng) -> Result<SampleBatch, BufferError> {
        let available = self.size();
        if batch_size > available {
            return Err(BufferError::InsufficientSamples {
                requested: batch_size,
                available,
            });
        }

        let mut batch = SampleBatch {
            states: Vec::with_capacity(batch_size * self.state_len),
            policies: Vec::with_capacity(batch_size * self.action_space),
            values: Vec::with_capacity(batch_size),
            state_shape: std::iter::once(batch_size)
                .chain(self.state_shape.iter().copied())
                .collect(),
            action_space: self.action_space,
        };

        for slot in rng.sample_indices(available, batch_size) {
            batch.states.extend_from_slice(self.state_slot(slot));
            batch.policies.extend_from_slice(self.policy_slot(slot));
            batch.values.push(self.values[slot]);
        }
        Ok(batch)
    }

    /// Borrow the sample in slot `index`, if it is held.
    ///
    /// Slots are in storage order, not insertion order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<SampleView<'_>> {
        (index < self.size()).then(|| SampleView {
            state: self.state_slot(index),
            policy: self.policy_slot(index),
            value: self.values[index],
            game_id: self.game_ids[index],
        })
    }

    /// Iterate over every held sample in slot order.
    pub fn iter(&self) -> impl Iterator<Item = SampleView<'_>> {
        (0..self.size()).filter_map(move |i| self.get(i))
    }

    /// Number of samples held, capped at capacity.
    #[must_use]
    pub fn size(&self) -> usize {
        if self.full {
            self.capacity
        } else {
            self.cursor
        }
    }

    /// Check if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if the cursor has wrapped at least once.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[must_use]
    pub fn state_shape(&self) -> &[usize] {
        &self.state_shape
    }

    #[must_use]
    pub fn action_space(&self) -> usize {
        self.action_space
    }

    /// Drop every sample. Capacity and the game id counter are kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.full = false;
    }

    /// Start tagging samples with the next game id.
    pub fn advance_game_id(&mut self) -> u64 {
        self.current_game_id += 1;
        self.current_game_id
    }

    /// Game id that new samples are tagged with.
    #[must_use]
    pub fn current_game_id(&self) -> u64 {
        self.current_game_id
    }

    fn state_slot(&self, slot: usize) -> &[f32] {
        &self.states[slot * self.state_len..(slot + 1) * self.state_len]
    }

    fn policy_slot(&self, slot: usize) -> &[f32] {
        &self.policies[slot * self.action_space..(slot + 1) * self.action_space]
    }
}
