//! Self-play loop for generating training data.
//!
//! Runs many games side by side so that every move of every active game is
//! searched by one batched `MCTSSearch::search` call. Finished games are
//! harvested into a `ReplayBuffer` and their slots reused for new games
//! until the configured number of games has been played.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::GameRng;
use crate::mcts::{ConfigError, MCTSConfig, MCTSSearch, SearchError, SearchStats};
use crate::nn::Evaluator;
use crate::rules::RulesEngine;

use super::game::SelfPlayGame;
use super::replay_buffer::{BufferError, ReplayBuffer};

/// Errors that abort a self-play run.
#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Replay buffer rejected a sample: {0}")]
    Buffer(#[from] BufferError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Game {game_id}: search produced no root children")]
    NoMoves { game_id: u64 },

    #[error("Game {game_id}: chosen action {action} was rejected by the rules engine")]
    IllegalAction { game_id: u64, action: String },
}

/// Configuration for self-play.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfPlayConfig {
    /// Games searched together in one batch.
    pub parallel_games: usize,

    /// Total games played by one `play` call.
    pub games_per_run: usize,

    /// Temperature for visit-count action sampling during the early game.
    /// Higher = more exploration, 0 = greedy.
    pub temperature: f32,

    /// Ply at which to switch to greedy (temperature = 0).
    /// 0 = always use temperature.
    pub temperature_threshold: u32,

    /// Maximum plies per game; longer games are stopped and scored 0.
    pub max_moves: u32,

    /// Search parameters used for every move.
    pub mcts: MCTSConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            parallel_games: 16,
            games_per_run: 16,
            temperature: 1.0,
            temperature_threshold: 30,
            max_moves: 512,
            mcts: MCTSConfig::default(),
        }
    }
}

impl SelfPlayConfig {
    /// Create a new self-play config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of concurrently searched games.
    pub fn with_parallel_games(mut self, n: usize) -> Self {
        self.parallel_games = n;
        self
    }

    /// Set the number of games per run.
    pub fn with_games_per_run(mut self, n: usize) -> Self {
        self.games_per_run = n;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    /// Set the ply after which moves are chosen greedily.
    pub fn with_temperature_threshold(mut self, threshold: u32) -> Self {
        self.temperature_threshold = threshold;
        self
    }

    /// Set maximum plies per game.
    pub fn with_max_moves(mut self, max: u32) -> Self {
        self.max_moves = max;
        self
    }

    /// Set the search parameters.
    pub fn with_mcts(mut self, mcts: MCTSConfig) -> Self {
        self.mcts = mcts;
        self
    }

    /// Get the temperature for a given ply.
    pub fn effective_temperature(&self, ply: u32) -> f32 {
        if self.temperature_threshold > 0 && ply >= self.temperature_threshold {
            0.0
        } else {
            self.temperature
        }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallel_games == 0 {
            return Err(ConfigError::NotPositive {
                name: "parallel_games",
                value: 0.0,
            });
        }
        if self.games_per_run == 0 {
            return Err(ConfigError::NotPositive {
                name: "games_per_run",
                value: 0.0,
            });
        }
        if self.max_moves == 0 {
            return Err(ConfigError::NotPositive {
                name: "max_moves",
                value: 0.0,
            });
        }
        if !(self.temperature >= 0.0) {
            return Err(ConfigError::Negative {
                name: "temperature",
                value: f64::from(self.temperature),
            });
        }
        self.mcts.validate()
    }
}

/// Summary of one self-play run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelfPlayReport {
    /// Games completed (finished or truncated).
    pub games: usize,

    /// Samples written to the buffer.
    pub samples: usize,

    /// Moves played across all games.
    pub moves: u64,

    /// Games that ended with a winner.
    pub decisive: usize,

    /// Games that ended in a draw.
    pub draws: usize,

    /// Games stopped at `max_moves`.
    pub truncated: usize,

    /// Accumulated statistics of every batched search.
    pub search: SearchStats,
}

/// How a game left its slot.
#[derive(Clone, Copy, Debug, PartialEq)]
enum GameEnd {
    /// Terminal position; value for the player to move in it.
    Finished(f32),

    /// Stopped at the move limit.
    Truncated,
}

/// Drives batched self-play for one rules engine.
pub struct SelfPlayRunner<E: RulesEngine> {
    engine: Arc<E>,
    config: SelfPlayConfig,
    search: MCTSSearch,

    /// RNG for move sampling.
    rng: GameRng,
}

impl<E: RulesEngine> SelfPlayRunner<E> {
    /// Create a runner, validating the configuration.
    pub fn new(engine: Arc<E>, config: SelfPlayConfig) -> Result<Self, SelfPlayError> {
        config.validate()?;
        let search = MCTSSearch::new(config.mcts.clone())?;
        let rng = GameRng::new(config.mcts.seed).fork();

        Ok(Self {
            engine,
            config,
            search,
            rng,
        })
    }

    /// Play `games_per_run` games and write their samples into `buffer`.
    pub fn play<V>(&mut self, evaluator: &V, buffer: &mut ReplayBuffer) -> Result<SelfPlayReport, SelfPlayError>
    where
        V: Evaluator + ?Sized,
    {
        let total = self.config.games_per_run as u64;
        let width = self.config.parallel_games.min(self.config.games_per_run);

        let mut games: Vec<SelfPlayGame<E>> = (0..width as u64)
            .map(|id| SelfPlayGame::new(Arc::clone(&self.engine), id))
            .collect();
        let mut next_id = width as u64;
        let mut report = SelfPlayReport::default();

        while !games.is_empty() {
            self.search.search(&mut games, evaluator)?;
            report.search.merge(self.search.stats());

            let mut index = 0;
            while index < games.len() {
                let game = &mut games[index];
                let end = self.step(game)?;
                report.moves += 1;

                let Some(end) = end else {
                    index += 1;
                    continue;
                };

                let samples = harvest(game, end, buffer)?;
                report.record(end, samples);
                debug!(
                    game_id = game.game_id(),
                    plies = game.ply(),
                    ?end,
                    samples,
                    "game finished"
                );

                if next_id < total {
                    game.reset(next_id);
                    next_id += 1;
                    index += 1;
                } else {
                    games.swap_remove(index);
                }
            }
        }

        info!(
            games = report.games,
            samples = report.samples,
            moves = report.moves,
            decisive = report.decisive,
            draws = report.draws,
            truncated = report.truncated,
            "self-play run complete"
        );
        Ok(report)
    }

    /// Record the searched root, choose and play a move.
    fn step(&mut self, game: &mut SelfPlayGame<E>) -> Result<Option<GameEnd>, SelfPlayError> {
        let game_id = game.game_id();
        let visits = game.tree().action_visits();
        game.record_root();

        let temperature = self.config.effective_temperature(game.ply());
        let choice = self
            .choose(&visits, temperature)
            .ok_or(SelfPlayError::NoMoves { game_id })?;
        let action = &visits[choice].0;

        let outcome = game
            .play(action)
            .ok_or_else(|| SelfPlayError::IllegalAction {
                game_id,
                action: format!("{action:?}"),
            })?;

        Ok(if outcome.terminated {
            Some(GameEnd::Finished(outcome.value))
        } else if game.ply() >= self.config.max_moves {
            Some(GameEnd::Truncated)
        } else {
            None
        })
    }

    /// Pick a root child by visit count.
    ///
    /// Temperature 0 takes the first most-visited child; otherwise sample
    /// proportionally to `visits^(1/T)`.
    fn choose<A>(&mut self, visits: &[(A, u32)], temperature: f32) -> Option<usize> {
        let max = visits.iter().map(|(_, v)| *v).max()?;
        let greedy = visits.iter().position(|(_, v)| *v == max);

        if temperature == 0.0 || max == 0 {
            return greedy;
        }

        let weights: Vec<f32> = visits
            .iter()
            .map(|(_, v)| (*v as f32 / max as f32).powf(1.0 / temperature))
            .collect();
        self.rng.choose_weighted(&weights).or(greedy)
    }

    /// Statistics of the most recent batched search.
    pub fn last_search_stats(&self) -> &SearchStats {
        self.search.stats()
    }

    /// Get the configuration.
    pub fn config(&self) -> &SelfPlayConfig {
        &self.config
    }
}

impl SelfPlayReport {
    fn record(&mut self, end: GameEnd, samples: usize) {
        self.games += 1;
        self.samples += samples;
        match end {
            GameEnd::Finished(value) if value != 0.0 => self.decisive += 1,
            GameEnd::Finished(_) => self.draws += 1,
            GameEnd::Truncated => self.truncated += 1,
        }
    }
}

/// Write every recorded position of a finished game into the buffer.
///
/// Each position's value target is the final outcome seen from the player
/// who moved into that position, matching what evaluators predict. The
/// final value is for the player to move at the end, so the target is its
/// negation at even ply distances and the value itself at odd ones.
fn harvest<E: RulesEngine>(
    game: &mut SelfPlayGame<E>,
    end: GameEnd,
    buffer: &mut ReplayBuffer,
) -> Result<usize, BufferError> {
    let final_ply = game.ply();
    let final_value = match end {
        GameEnd::Finished(value) => value,
        GameEnd::Truncated => 0.0,
    };

    buffer.advance_game_id();
    let memory = game.take_memory();
    for record in &memory {
        let value = if final_value == 0.0 {
            0.0
        } else if (final_ply - record.ply) % 2 == 0 {
            -final_value
        } else {
            final_value
        };
        buffer.add(&record.state.tensor, &record.policy, value)?;
    }
    Ok(memory.len())
}
