//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
}

/// MCTS configuration parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSConfig {
    /// Select/evaluate/expand/backpropagate rounds per `search` call.
    pub num_searches: u32,

    /// PUCT exploration constant `C`, shared by every node of a tree.
    /// Higher values favor the prior over observed values.
    pub exploration_constant: f32,

    /// Concentration of the root Dirichlet noise.
    pub dirichlet_alpha: f32,

    /// Weight of the root noise: `(1 - eps) * policy + eps * noise`.
    /// 0.0 disables noise entirely.
    pub dirichlet_epsilon: f32,

    /// Random seed for root noise.
    /// Same seed produces deterministic searches.
    pub seed: u64,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            num_searches: 100,
            exploration_constant: 2.0,
            dirichlet_alpha: 0.3,
            dirichlet_epsilon: 0.25,
            seed: 42,
        }
    }
}

impl MCTSConfig {
    /// Set the number of search rounds.
    pub fn with_num_searches(mut self, n: u32) -> Self {
        self.num_searches = n;
        self
    }

    /// Set the exploration constant.
    pub fn with_exploration(mut self, c: f32) -> Self {
        self.exploration_constant = c;
        self
    }

    /// Set the Dirichlet noise parameters.
    pub fn with_dirichlet(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    /// Disable root noise.
    pub fn without_noise(mut self) -> Self {
        self.dirichlet_epsilon = 0.0;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.exploration_constant > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "exploration_constant",
                value: f64::from(self.exploration_constant),
            });
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(ConfigError::OutOfUnitRange {
                name: "dirichlet_epsilon",
                value: f64::from(self.dirichlet_epsilon),
            });
        }
        if self.dirichlet_epsilon > 0.0 && !(self.dirichlet_alpha > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "dirichlet_alpha",
                value: f64::from(self.dirichlet_alpha),
            });
        }
        Ok(())
    }
}
