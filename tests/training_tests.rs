//! Replay buffer and self-play integration tests.

use std::sync::Arc;

use batch_zero::core::GameRng;
use batch_zero::games::TicTacToe;
use batch_zero::mcts::MCTSConfig;
use batch_zero::nn::{EncodedBatch, Evaluator, EvaluatorError, EvaluatorOutput, UniformEvaluator};
use batch_zero::training::{BufferError, ReplayBuffer, SelfPlayConfig, SelfPlayError, SelfPlayRunner};

fn sample(tag: f32) -> (Vec<f32>, Vec<f32>, f32) {
    (vec![tag; 4], vec![tag, 1.0 - tag], tag)
}

// =============================================================================
// ReplayBuffer
// =============================================================================

#[test]
fn test_capacity_two_keeps_newest() {
    let mut buffer = ReplayBuffer::new(2, vec![4], 2).unwrap();
    for tag in [0.1, 0.2, 0.3] {
        let (state, policy, value) = sample(tag);
        buffer.add(&state, &policy, value).unwrap();
    }

    assert_eq!(buffer.size(), 2);

    let mut held: Vec<f32> = buffer.iter().map(|s| s.value).collect();
    held.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(held, vec![0.2, 0.3]);

    let batch = buffer.sample(2, &mut GameRng::new(9)).unwrap();
    let mut values = batch.values.clone();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(values, vec![0.2, 0.3]);

    // Each sampled row stays aligned with its own state and policy.
    for (i, value) in batch.values.iter().enumerate() {
        assert_eq!(&batch.states[i * 4..(i + 1) * 4], &[*value; 4]);
        assert_eq!(batch.policies[i * 2], *value);
    }
}

#[test]
fn test_sample_more_than_held_is_an_error() {
    let mut buffer = ReplayBuffer::new(8, vec![4], 2).unwrap();
    let (state, policy, value) = sample(0.5);
    buffer.add(&state, &policy, value).unwrap();

    assert!(matches!(
        buffer.sample(3, &mut GameRng::new(0)),
        Err(BufferError::InsufficientSamples {
            requested: 3,
            available: 1
        })
    ));
}

#[test]
fn test_sampling_is_reproducible() {
    let mut buffer = ReplayBuffer::new(32, vec![4], 2).unwrap();
    for i in 0..32 {
        let (state, policy, value) = sample(i as f32);
        buffer.add(&state, &policy, value).unwrap();
    }

    let a = buffer.sample(8, &mut GameRng::new(5)).unwrap();
    let b = buffer.sample(8, &mut GameRng::new(5)).unwrap();
    assert_eq!(a, b);
}

// =============================================================================
// Self-play
// =============================================================================

#[test]
fn test_self_play_run() {
    let config = SelfPlayConfig::default()
        .with_parallel_games(4)
        .with_games_per_run(10)
        .with_mcts(MCTSConfig::default().with_num_searches(16));
    let mut runner = SelfPlayRunner::new(Arc::new(TicTacToe), config).unwrap();
    let mut buffer = ReplayBuffer::new(4096, vec![3, 3, 3], 9).unwrap();

    let report = runner.play(&UniformEvaluator::new(9), &mut buffer).unwrap();

    assert_eq!(report.games, 10);
    assert_eq!(report.decisive + report.draws, 10);
    assert_eq!(buffer.size(), report.samples);
    assert_eq!(buffer.current_game_id(), 10);
    // Tic-tac-toe games last between 5 and 9 plies.
    assert!((50..=90).contains(&report.samples));
    // Never more positions per call than concurrent games.
    assert!(report.search.max_batch <= 4);

    let batch = buffer.sample(32, &mut GameRng::new(1)).unwrap();
    assert_eq!(batch.state_shape, vec![32, 3, 3, 3]);
    assert_eq!(batch.policies.len(), 32 * 9);
}

#[test]
fn test_self_play_is_deterministic() {
    let run = || {
        let config = SelfPlayConfig::default()
            .with_parallel_games(3)
            .with_games_per_run(5)
            .with_mcts(MCTSConfig::default().with_num_searches(12).with_seed(11));
        let mut runner = SelfPlayRunner::new(Arc::new(TicTacToe), config).unwrap();
        let mut buffer = ReplayBuffer::new(256, vec![3, 3, 3], 9).unwrap();
        runner.play(&UniformEvaluator::new(9), &mut buffer).unwrap();
        buffer.iter().map(|s| (s.value, s.game_id)).collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_self_play_rejects_mismatched_buffer() {
    let config = SelfPlayConfig::default()
        .with_parallel_games(1)
        .with_games_per_run(1)
        .with_mcts(MCTSConfig::default().with_num_searches(4));
    let mut runner = SelfPlayRunner::new(Arc::new(TicTacToe), config).unwrap();
    let mut buffer = ReplayBuffer::new(64, vec![9], 4).unwrap();

    let err = runner.play(&UniformEvaluator::new(9), &mut buffer).unwrap_err();
    assert!(matches!(err, SelfPlayError::Buffer(BufferError::ShapeMismatch { .. })));
}

#[test]
fn test_self_play_with_value_bias() {
    /// Values every position as lost for the player who moved into it.
    struct Pessimist;

    impl Evaluator for Pessimist {
        fn action_space(&self) -> usize {
            9
        }

        fn forward(&self, batch: &EncodedBatch) -> Result<EvaluatorOutput, EvaluatorError> {
            let n = batch.batch_size();
            Ok(EvaluatorOutput {
                policy: vec![0.0; n * 9],
                value: vec![-1.0; n],
                action_space: 9,
            })
        }
    }

    let config = SelfPlayConfig::default()
        .with_parallel_games(2)
        .with_games_per_run(2)
        .with_mcts(MCTSConfig::default().with_num_searches(8));
    let mut runner = SelfPlayRunner::new(Arc::new(TicTacToe), config).unwrap();
    let mut buffer = ReplayBuffer::new(64, vec![3, 3, 3], 9).unwrap();

    let report = runner.play(&Pessimist, &mut buffer).unwrap();
    assert_eq!(report.games, 2);
    assert!(buffer.iter().all(|s| [-1.0, 0.0, 1.0].contains(&s.value)));
}
