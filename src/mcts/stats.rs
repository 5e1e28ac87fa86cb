//! Batched search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Statistics collected during one or more batched searches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Search rounds performed (excluding root evaluation).
    pub rounds: u32,

    /// Evaluator calls, root evaluation included.
    pub evaluator_calls: u32,

    /// Positions sent to the evaluator across all calls.
    pub evaluated_positions: u64,

    /// Largest batch sent in a single call.
    pub max_batch: usize,

    /// Leaves resolved from a terminal state without the evaluator.
    pub terminal_leaves: u64,

    /// Children created by expansion.
    pub nodes_expanded: u64,

    /// Total time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one evaluator call of `batch` positions.
    pub fn record_call(&mut self, batch: usize) {
        self.evaluator_calls += 1;
        self.evaluated_positions += batch as u64;
        self.max_batch = self.max_batch.max(batch);
    }

    /// Fold another set of statistics into this one.
    pub fn merge(&mut self, other: &SearchStats) {
        self.rounds += other.rounds;
        self.evaluator_calls += other.evaluator_calls;
        self.evaluated_positions += other.evaluated_positions;
        self.max_batch = self.max_batch.max(other.max_batch);
        self.terminal_leaves += other.terminal_leaves;
        self.nodes_expanded += other.nodes_expanded;
        self.time_us += other.time_us;
    }

    /// Average positions per evaluator call.
    #[must_use]
    pub fn avg_batch_size(&self) -> f64 {
        if self.evaluator_calls == 0 {
            0.0
        } else {
            self.evaluated_positions as f64 / self.evaluator_calls as f64
        }
    }

    /// Evaluated positions per second.
    #[must_use]
    pub fn positions_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.evaluated_positions as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }
}
