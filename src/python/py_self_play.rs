//! Self-play bindings for Python.

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::games::TicTacToe;
use crate::mcts::MCTSConfig;
use crate::training::{SelfPlayConfig, SelfPlayError, SelfPlayReport, SelfPlayRunner};

use super::py_nn::PyEvaluator;
use super::py_training::{buffer_error, PyReplayBuffer};

fn self_play_error(e: SelfPlayError) -> PyErr {
    match e {
        SelfPlayError::Config(e) => PyValueError::new_err(e.to_string()),
        SelfPlayError::Buffer(e) => buffer_error(e),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Python wrapper for MCTSConfig.
#[pyclass(name = "MCTSConfig")]
#[derive(Clone)]
pub struct PyMCTSConfig(pub MCTSConfig);

#[pymethods]
impl PyMCTSConfig {
    /// Create a new search configuration.
    ///
    /// # Arguments
    /// - num_searches: Search rounds per move (default: 100)
    /// - exploration_constant: PUCT constant C (default: 2.0)
    /// - dirichlet_alpha: Root noise concentration (default: 0.3)
    /// - dirichlet_epsilon: Root noise weight, 0 disables noise (default: 0.25)
    /// - seed: Noise RNG seed (default: 42)
    #[new]
    #[pyo3(signature = (
        num_searches = 100,
        exploration_constant = 2.0,
        dirichlet_alpha = 0.3,
        dirichlet_epsilon = 0.25,
        seed = 42
    ))]
    fn new(
        num_searches: u32,
        exploration_constant: f32,
        dirichlet_alpha: f32,
        dirichlet_epsilon: f32,
        seed: u64,
    ) -> PyResult<Self> {
        let config = MCTSConfig::default()
            .with_num_searches(num_searches)
            .with_exploration(exploration_constant)
            .with_dirichlet(dirichlet_alpha, dirichlet_epsilon)
            .with_seed(seed);
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self(config))
    }

    #[getter]
    fn num_searches(&self) -> u32 {
        self.0.num_searches
    }

    #[getter]
    fn exploration_constant(&self) -> f32 {
        self.0.exploration_constant
    }

    #[getter]
    fn dirichlet_alpha(&self) -> f32 {
        self.0.dirichlet_alpha
    }

    #[getter]
    fn dirichlet_epsilon(&self) -> f32 {
        self.0.dirichlet_epsilon
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.0.seed
    }

    fn __repr__(&self) -> String {
        format!(
            "MCTSConfig(num_searches={}, c={}, alpha={}, eps={}, seed={})",
            self.0.num_searches,
            self.0.exploration_constant,
            self.0.dirichlet_alpha,
            self.0.dirichlet_epsilon,
            self.0.seed
        )
    }
}

/// Python wrapper for SelfPlayConfig.
#[pyclass(name = "SelfPlayConfig")]
#[derive(Clone)]
pub struct PySelfPlayConfig(pub SelfPlayConfig);

#[pymethods]
impl PySelfPlayConfig {
    /// Create a new self-play configuration.
    ///
    /// # Arguments
    /// - parallel_games: Games searched together in one batch (default: 16)
    /// - games_per_run: Games played per `play` call (default: 16)
    /// - temperature: Visit-count sampling temperature (default: 1.0)
    /// - temperature_threshold: Ply after which moves are greedy (default: 30)
    /// - max_moves: Maximum plies before a game is stopped (default: 512)
    /// - mcts: Search configuration (default: MCTSConfig())
    #[new]
    #[pyo3(signature = (
        parallel_games = 16,
        games_per_run = 16,
        temperature = 1.0,
        temperature_threshold = 30,
        max_moves = 512,
        mcts = None
    ))]
    fn new(
        parallel_games: usize,
        games_per_run: usize,
        temperature: f32,
        temperature_threshold: u32,
        max_moves: u32,
        mcts: Option<PyMCTSConfig>,
    ) -> PyResult<Self> {
        let config = SelfPlayConfig::default()
            .with_parallel_games(parallel_games)
            .with_games_per_run(games_per_run)
            .with_temperature(temperature)
            .with_temperature_threshold(temperature_threshold)
            .with_max_moves(max_moves)
            .with_mcts(mcts.map(|m| m.0).unwrap_or_default());
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self(config))
    }

    #[getter]
    fn parallel_games(&self) -> usize {
        self.0.parallel_games
    }

    #[getter]
    fn games_per_run(&self) -> usize {
        self.0.games_per_run
    }

    #[getter]
    fn temperature(&self) -> f32 {
        self.0.temperature
    }

    #[getter]
    fn temperature_threshold(&self) -> u32 {
        self.0.temperature_threshold
    }

    #[getter]
    fn max_moves(&self) -> u32 {
        self.0.max_moves
    }

    #[getter]
    fn mcts(&self) -> PyMCTSConfig {
        PyMCTSConfig(self.0.mcts.clone())
    }

    fn __repr__(&self) -> String {
        format!(
            "SelfPlayConfig(parallel={}, games={}, temp={}, threshold={}, max_moves={})",
            self.0.parallel_games,
            self.0.games_per_run,
            self.0.temperature,
            self.0.temperature_threshold,
            self.0.max_moves
        )
    }
}

/// Summary of one self-play run.
#[pyclass(name = "SelfPlayReport")]
#[derive(Clone)]
pub struct PySelfPlayReport {
    #[pyo3(get)]
    games: usize,
    #[pyo3(get)]
    samples: usize,
    #[pyo3(get)]
    moves: u64,
    #[pyo3(get)]
    decisive: usize,
    #[pyo3(get)]
    draws: usize,
    #[pyo3(get)]
    truncated: usize,
    #[pyo3(get)]
    evaluator_calls: u32,
    #[pyo3(get)]
    evaluated_positions: u64,
    #[pyo3(get)]
    search_time_us: u64,
}

impl From<SelfPlayReport> for PySelfPlayReport {
    fn from(report: SelfPlayReport) -> Self {
        Self {
            games: report.games,
            samples: report.samples,
            moves: report.moves,
            decisive: report.decisive,
            draws: report.draws,
            truncated: report.truncated,
            evaluator_calls: report.search.evaluator_calls,
            evaluated_positions: report.search.evaluated_positions,
            search_time_us: report.search.time_us,
        }
    }
}

#[pymethods]
impl PySelfPlayReport {
    fn __repr__(&self) -> String {
        format!(
            "SelfPlayReport(games={}, samples={}, decisive={}, draws={}, truncated={})",
            self.games, self.samples, self.decisive, self.draws, self.truncated
        )
    }
}

/// Batched self-play for tic-tac-toe.
///
/// This is a concrete runner that avoids generic type issues with PyO3.
#[pyclass(name = "TicTacToeSelfPlay")]
pub struct PyTicTacToeSelfPlay {
    runner: SelfPlayRunner<TicTacToe>,
}

#[pymethods]
impl PyTicTacToeSelfPlay {
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<PySelfPlayConfig>) -> PyResult<Self> {
        let config = config.map(|c| c.0).unwrap_or_default();
        let runner = SelfPlayRunner::new(Arc::new(TicTacToe), config).map_err(self_play_error)?;
        Ok(Self { runner })
    }

    /// Play one run of games, writing samples into `buffer`.
    fn play(
        &mut self,
        evaluator: PyRef<'_, PyEvaluator>,
        mut buffer: PyRefMut<'_, PyReplayBuffer>,
    ) -> PyResult<PySelfPlayReport> {
        let report = self
            .runner
            .play(&*evaluator, &mut buffer.inner)
            .map_err(self_play_error)?;
        Ok(report.into())
    }

    /// Shape of one encoded state: [3, 3, 3].
    #[staticmethod]
    fn state_shape() -> Vec<usize> {
        vec![3, 3, 3]
    }

    /// Number of policy entries: 9.
    #[staticmethod]
    fn action_space() -> usize {
        9
    }

    #[getter]
    fn config(&self) -> PySelfPlayConfig {
        PySelfPlayConfig(self.runner.config().clone())
    }
}
