//! Replay buffer bindings for Python.

use numpy::{PyArray1, PyArray2, PyArrayDyn, PyArrayMethods, PyReadonlyArray1, PyReadonlyArrayDyn};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::core::GameRng;
use crate::training::{BufferError, ReplayBuffer};

pub(crate) fn buffer_error(e: BufferError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python wrapper for ReplayBuffer.
///
/// Owns its own sampling RNG so draws are reproducible from `seed`.
#[pyclass(name = "ReplayBuffer")]
pub struct PyReplayBuffer {
    pub(crate) inner: ReplayBuffer,
    rng: GameRng,
}

#[pymethods]
impl PyReplayBuffer {
    /// Create an empty buffer.
    ///
    /// # Arguments
    /// - capacity: Maximum number of samples held
    /// - state_shape: Shape of one encoded state
    /// - action_space: Length of one policy target
    /// - seed: Seed of the sampling RNG (default: 0)
    #[new]
    #[pyo3(signature = (capacity, state_shape, action_space, seed = 0))]
    fn new(capacity: usize, state_shape: Vec<usize>, action_space: usize, seed: u64) -> PyResult<Self> {
        Ok(Self {
            inner: ReplayBuffer::new(capacity, state_shape, action_space).map_err(buffer_error)?,
            rng: GameRng::new(seed),
        })
    }

    /// Add one sample tagged with the current game id.
    fn add(
        &mut self,
        state: PyReadonlyArrayDyn<'_, f32>,
        policy: PyReadonlyArray1<'_, f32>,
        value: f32,
    ) -> PyResult<()> {
        let state: Vec<f32> = state.as_array().iter().copied().collect();
        let policy: Vec<f32> = policy.as_array().iter().copied().collect();
        self.inner.add(&state, &policy, value).map_err(buffer_error)
    }

    /// Draw a batch without replacement.
    ///
    /// Returns (states, policies, values) as numpy arrays:
    /// - states: [N, ...state_shape] float32
    /// - policies: [N, action_space] float32
    /// - values: [N] float32
    fn sample<'py>(
        &mut self,
        py: Python<'py>,
        batch_size: usize,
    ) -> PyResult<(
        Bound<'py, PyArrayDyn<f32>>,
        Bound<'py, PyArray2<f32>>,
        Bound<'py, PyArray1<f32>>,
    )> {
        let batch = self.inner.sample(batch_size, &mut self.rng).map_err(buffer_error)?;
        let n = batch.batch_size();

        let states = PyArray1::from_vec_bound(py, batch.states).reshape(batch.state_shape)?;
        let policies = PyArray1::from_vec_bound(py, batch.policies).reshape([n, batch.action_space])?;
        let values = PyArray1::from_vec_bound(py, batch.values);

        Ok((states, policies, values))
    }

    /// Number of samples held.
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn __len__(&self) -> usize {
        self.inner.size()
    }

    #[getter]
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Drop every sample.
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Start tagging samples with the next game id and return it.
    fn advance_game_id(&mut self) -> u64 {
        self.inner.advance_game_id()
    }

    fn current_game_id(&self) -> u64 {
        self.inner.current_game_id()
    }

    fn __repr__(&self) -> String {
        format!(
            "ReplayBuffer(size={}, capacity={})",
            self.inner.size(),
            self.inner.capacity()
        )
    }
}
