//! Deterministic random number generation with forking for self-play.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Forkable**: Independent branches for per-game or per-run streams
//! - **Explicit**: Threaded through search and self-play, never global
//!
//! ## Usage
//!
//! ```
//! use batch_zero::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//!
//! // Fork for an independent stream
//! let mut noise_rng = rng.fork();
//!
//! // Forks are seeded differently from their parent
//! assert_ne!(rng.seed(), noise_rng.seed());
//! let _ = noise_rng.gen_range_usize(0..1000);
//!
//! // Dirichlet sample over four actions sums to one
//! let noise = rng.dirichlet(0.3, 4).unwrap();
//! assert!((noise.iter().sum::<f32>() - 1.0).abs() < 1e-4);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma};

/// Deterministic RNG with forking.
///
/// Uses ChaCha8 for speed while keeping runs reproducible from a seed.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Fork this RNG to create an independent branch.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self {
            inner: ChaCha8Rng::seed_from_u64(fork_seed),
            seed: fork_seed,
            fork_counter: 0,
        }
    }

    /// Seed this RNG was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Choose an index with weighted probability.
    ///
    /// Weights do not need to sum to 1.0.
    /// Returns `None` if weights are empty or all zero.
    pub fn choose_weighted(&mut self, weights: &[f32]) -> Option<usize> {
        let total: f32 = weights.iter().sum();
        if weights.is_empty() || total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut threshold = self.inner.gen::<f32>() * total;

        for (i, &weight) in weights.iter().enumerate() {
            threshold -= weight;
            if threshold <= 0.0 && weight > 0.0 {
                return Some(i);
            }
        }

        // Floating point edge case - return last non-zero weight
        weights.iter().rposition(|&w| w > 0.0)
    }

    /// Draw `amount` distinct indices uniformly from `0..len`.
    ///
    /// # Panics
    /// Panics if `amount > len`; callers check sizes first.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.inner, len, amount).into_vec()
    }

    /// Draw one sample from a symmetric Dirichlet distribution.
    ///
    /// Samples `x_i ~ Gamma(alpha, 1)` and normalizes. Returns `None` when
    /// `alpha` is not a valid Gamma shape.
    pub fn dirichlet(&mut self, alpha: f32, len: usize) -> Option<Vec<f32>> {
        let gamma = Gamma::new(f64::from(alpha), 1.0).ok()?;

        let mut noise: Vec<f64> = (0..len).map(|_| gamma.sample(&mut self.inner)).collect();
        let sum: f64 = noise.iter().sum();

        if sum > 0.0 {
            for x in &mut noise {
                *x /= sum;
            }
        } else if len > 0 {
            // Every draw underflowed; fall back to the distribution mean.
            noise.iter_mut().for_each(|x| *x = 1.0 / len as f64);
        }

        Some(noise.into_iter().map(|x| x as f32).collect())
    }
}
