//! Batched MCTS search across many self-play games.
//!
//! One `search` call runs the same number of rounds on every game in the
//! batch. Each round walks every tree down to a leaf, resolves terminal
//! leaves on the spot, and sends all remaining leaves to the evaluator in a
//! single call. Inference cost is therefore paid once per round for the
//! whole batch instead of once per game.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::GameRng;
use crate::nn::{EncodedBatch, EncodedState, Evaluator, EvaluatorError, EvaluatorOutput};
use crate::rules::RulesEngine;
use crate::training::SelfPlayGame;

use super::config::{ConfigError, MCTSConfig};
use super::policy::{mask_and_normalize, mix_noise, PolicyError};
use super::stats::SearchStats;

/// Errors that abort a batched search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Policy for game {game} is unusable: {source}")]
    Policy {
        game: usize,
        #[source]
        source: PolicyError,
    },

    #[error("Cannot sample Dirichlet noise with alpha {alpha}")]
    InvalidNoise { alpha: f32 },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Batched MCTS orchestrator.
///
/// Holds only configuration, the noise RNG and the statistics of the last
/// search. Games are borrowed for the duration of a call and keep their
/// populated trees afterwards.
pub struct MCTSSearch {
    /// Search configuration.
    config: MCTSConfig,

    /// RNG for root noise.
    rng: GameRng,

    /// Statistics of the last `search` call.
    stats: SearchStats,
}

impl MCTSSearch {
    /// Create a new orchestrator.
    pub fn new(config: MCTSConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = GameRng::new(config.seed);

        Ok(Self {
            config,
            rng,
            stats: SearchStats::default(),
        })
    }

    /// Run a full batched search on every game.
    ///
    /// Every game must be at a non-terminal position. On return each game's
    /// tree is rooted at its current position and holds the visit counts of
    /// `num_searches` rounds.
    pub fn search<E, V>(
        &mut self,
        games: &mut [SelfPlayGame<E>],
        evaluator: &V,
    ) -> Result<(), SearchError>
    where
        E: RulesEngine,
        V: Evaluator + ?Sized,
    {
        self.stats.reset();
        if games.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        self.expand_roots(games, evaluator)?;

        for round in 0..self.config.num_searches {
            self.run_round(games, evaluator, round)?;
            self.stats.rounds += 1;
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            games = games.len(),
            rounds = self.stats.rounds,
            evaluator_calls = self.stats.evaluator_calls,
            positions = self.stats.evaluated_positions,
            terminal_leaves = self.stats.terminal_leaves,
            time_us = self.stats.time_us,
            "batched search complete"
        );
        Ok(())
    }

    /// Evaluate every root in one call, add noise, and expand.
    fn expand_roots<E, V>(&mut self, games: &mut [SelfPlayGame<E>], evaluator: &V) -> Result<(), SearchError>
    where
        E: RulesEngine,
        V: Evaluator + ?Sized,
    {
        let encoded: Vec<EncodedState> = games
            .iter()
            .map(|game| game.engine().encode_state(game.state()))
            .collect();
        let output = self.evaluate(evaluator, &encoded, games[0].engine().action_space_size())?;

        let epsilon = self.config.dirichlet_epsilon;
        for (index, game) in games.iter_mut().enumerate() {
            game.begin_search(self.config.exploration_constant);
            let root = game.tree().root();

            let mut policy = output.policy_row(index).to_vec();
            if epsilon > 0.0 {
                let alpha = self.config.dirichlet_alpha;
                let noise = self
                    .rng
                    .dirichlet(alpha, policy.len())
                    .ok_or(SearchError::InvalidNoise { alpha })?;
                mix_noise(&mut policy, &noise, epsilon);
            }

            let mask = game.legal_mask(root);
            let priors = mask_and_normalize(&policy, &mask)
                .map_err(|source| SearchError::Policy { game: index, source })?;
            self.stats.nodes_expanded += game.expand(root, &priors, &mask) as u64;
        }
        Ok(())
    }

    /// One select / evaluate / expand+backpropagate round over the batch.
    fn run_round<E, V>(
        &mut self,
        games: &mut [SelfPlayGame<E>],
        evaluator: &V,
        round: u32,
    ) -> Result<(), SearchError>
    where
        E: RulesEngine,
        V: Evaluator + ?Sized,
    {
        // Selection. Terminal leaves are scored immediately.
        let mut waiting = Vec::with_capacity(games.len());
        for (index, game) in games.iter_mut().enumerate() {
            game.clear_pending();
            let leaf = game.select_leaf();
            let outcome = game.node_outcome(leaf);

            if outcome.terminated {
                // Outcome is for the side to move at the leaf.
                game.backpropagate(leaf, -outcome.value);
                self.stats.terminal_leaves += 1;
            } else {
                game.set_pending(leaf);
                waiting.push(index);
            }
        }

        trace!(round, pending = waiting.len(), terminal = games.len() - waiting.len(), "selection done");
        if waiting.is_empty() {
            return Ok(());
        }

        // One evaluator call for every pending leaf.
        let encoded: Vec<EncodedState> = waiting
            .iter()
            .filter_map(|&index| {
                let game = &games[index];
                game.pending_leaf().map(|leaf| game.encode_node(leaf))
            })
            .collect();
        let output = self.evaluate(evaluator, &encoded, games[0].engine().action_space_size())?;

        // Expand and backpropagate in batch order.
        for (row, &index) in waiting.iter().enumerate() {
            let game = &mut games[index];
            let Some(leaf) = game.pending_leaf() else {
                continue;
            };

            let mask = game.legal_mask(leaf);
            let priors = mask_and_normalize(output.policy_row(row), &mask)
                .map_err(|source| SearchError::Policy { game: index, source })?;
            self.stats.nodes_expanded += game.expand(leaf, &priors, &mask) as u64;
            // Evaluator values are for the player who moved into the leaf.
            game.backpropagate(leaf, output.value[row]);
        }
        Ok(())
    }

    /// Stack, evaluate, validate and softmax one batch.
    fn evaluate<V: Evaluator + ?Sized>(
        &mut self,
        evaluator: &V,
        encoded: &[EncodedState],
        action_space: usize,
    ) -> Result<EvaluatorOutput, SearchError> {
        let batch = EncodedBatch::stack(encoded)?;
        let mut output = evaluator.forward(&batch)?;
        output.validate(batch.batch_size(), action_space)?;
        output.softmax_policy();

        self.stats.record_call(batch.batch_size());
        Ok(output)
    }

    /// Statistics of the last search.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Get the configuration.
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::games::{TicTacToe, TicTacToeState};
    use crate::nn::UniformEvaluator;

    fn games(count: usize) -> Vec<SelfPlayGame<TicTacToe>> {
        let engine = Arc::new(TicTacToe);
        (0..count)
            .map(|id| SelfPlayGame::new(Arc::clone(&engine), id as u64))
            .collect()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MCTSConfig::default().with_exploration(-1.0);
        assert!(matches!(
            MCTSSearch::new(config),
            Err(SearchError::Config(ConfigError::NotPositive { .. }))
        ));
    }

    #[test]
    fn test_search_visit_counts() {
        let mut search = MCTSSearch::new(MCTSConfig::default().with_num_searches(20)).unwrap();
        let mut batch = games(2);

        search.search(&mut batch, &UniformEvaluator::new(9)).unwrap();

        for game in &batch {
            let root = game.tree().root_node();
            // Root starts at one visit; every round adds exactly one.
            assert_eq!(root.visit_count, 21);
            assert_eq!(root.children.len(), 9);
            let child_visits: u32 = game.tree().action_visits().iter().map(|(_, v)| v).sum();
            assert_eq!(child_visits, 20);
        }

        let stats = search.stats();
        assert_eq!(stats.rounds, 20);
        assert_eq!(stats.evaluator_calls, 21);
        assert_eq!(stats.max_batch, 2);
    }

    #[test]
    fn test_search_empty_batch() {
        let mut search = MCTSSearch::new(MCTSConfig::default()).unwrap();
        let mut batch: Vec<SelfPlayGame<TicTacToe>> = Vec::new();

        search.search(&mut batch, &UniformEvaluator::new(9)).unwrap();
        assert_eq!(search.stats().evaluator_calls, 0);
    }

    #[test]
    fn test_search_zero_rounds_expands_root() {
        let config = MCTSConfig::default().with_num_searches(0).without_noise();
        let mut search = MCTSSearch::new(config).unwrap();
        let mut batch = games(1);

        search.search(&mut batch, &UniformEvaluator::new(9)).unwrap();

        let tree = batch[0].tree();
        assert_eq!(tree.root_node().children.len(), 9);
        for (_, node) in tree.iter().skip(1) {
            assert!((node.prior - 1.0 / 9.0).abs() < 1e-6);
            assert_eq!(node.visit_count, 0);
        }
        assert_eq!(search.stats().evaluator_calls, 1);
    }

    #[test]
    fn test_search_deterministic() {
        let run = || {
            let mut search = MCTSSearch::new(MCTSConfig::default().with_num_searches(30)).unwrap();
            let mut batch = games(3);
            search.search(&mut batch, &UniformEvaluator::new(9)).unwrap();
            batch
                .iter()
                .map(|g| g.tree().action_visits())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_search_rejects_wrong_action_space() {
        let mut search = MCTSSearch::new(MCTSConfig::default()).unwrap();
        let mut batch = games(1);

        let err = search.search(&mut batch, &UniformEvaluator::new(4)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Evaluator(EvaluatorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_search_terminal_root_has_no_legal_mass() {
        let mut search = MCTSSearch::new(MCTSConfig::default().without_noise()).unwrap();
        let state = TicTacToeState::from_moves(&[0, 3, 1, 4, 2]).unwrap();
        let mut batch = vec![SelfPlayGame::with_state(Arc::new(TicTacToe), 0, state)];

        let err = search.search(&mut batch, &UniformEvaluator::new(9)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Policy {
                game: 0,
                source: PolicyError::NoLegalMass { legal: 0 }
            }
        ));
    }
}
