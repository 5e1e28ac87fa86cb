//! Evaluator bindings for Python.

use numpy::{PyArray1, PyArrayMethods, PyReadonlyArrayDyn};
use pyo3::prelude::*;
use tracing::warn;

use crate::nn::{EncodedBatch, Evaluator, EvaluatorError, EvaluatorOutput, UniformEvaluator};

enum EvaluatorKind {
    Callback { callback: PyObject, action_space: usize },
    Uniform(UniformEvaluator),
}

/// Batched evaluator backed by a Python callable.
///
/// The callable receives one float32 array of shape `[batch, ...]` and must
/// return `(policy_logits, values)` as float32 arrays of shape
/// `[batch, action_space]` and `[batch]`. Each value is for the player who
/// moved into that position.
#[pyclass(name = "Evaluator")]
pub struct PyEvaluator {
    kind: EvaluatorKind,
}

#[pymethods]
impl PyEvaluator {
    /// Wrap a Python callable.
    #[new]
    fn new(callback: PyObject, action_space: usize) -> Self {
        Self {
            kind: EvaluatorKind::Callback {
                callback,
                action_space,
            },
        }
    }

    /// Evaluator returning equal logits and zero values (for testing).
    #[staticmethod]
    fn uniform(action_space: usize) -> Self {
        Self {
            kind: EvaluatorKind::Uniform(UniformEvaluator::new(action_space)),
        }
    }

    #[getter(action_space)]
    fn py_action_space(&self) -> usize {
        Evaluator::action_space(self)
    }

    fn __repr__(&self) -> String {
        match &self.kind {
            EvaluatorKind::Callback { action_space, .. } => {
                format!("Evaluator(callback, action_space={action_space})")
            }
            EvaluatorKind::Uniform(u) => format!("Evaluator(uniform, action_space={})", u.action_space()),
        }
    }
}

impl PyEvaluator {
    fn call_python(
        py: Python<'_>,
        callback: &PyObject,
        action_space: usize,
        batch: &EncodedBatch,
    ) -> PyResult<EvaluatorOutput> {
        let states = PyArray1::from_slice_bound(py, batch.data()).reshape(batch.shape().to_vec())?;
        let result = callback.bind(py).call1((states,))?;
        let (policy, value): (PyReadonlyArrayDyn<'_, f32>, PyReadonlyArrayDyn<'_, f32>) = result.extract()?;

        Ok(EvaluatorOutput {
            policy: policy.as_array().iter().copied().collect(),
            value: value.as_array().iter().copied().collect(),
            action_space,
        })
    }
}

impl Evaluator for PyEvaluator {
    fn action_space(&self) -> usize {
        match &self.kind {
            EvaluatorKind::Callback { action_space, .. } => *action_space,
            EvaluatorKind::Uniform(u) => u.action_space(),
        }
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<EvaluatorOutput, EvaluatorError> {
        match &self.kind {
            EvaluatorKind::Uniform(u) => u.forward(batch),
            EvaluatorKind::Callback {
                callback,
                action_space,
            } => Python::with_gil(|py| Self::call_python(py, callback, *action_space, batch)).map_err(|e| {
                warn!(error = %e, batch = batch.batch_size(), "python evaluator failed");
                EvaluatorError::EvaluationFailed(e.to_string())
            }),
        }
    }
}
