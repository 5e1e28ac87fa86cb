//! Policy preparation between the evaluator and tree expansion.
//!
//! The evaluator returns raw logits over the whole action space. Before a
//! node is expanded its row goes through:
//! - softmax (batched, see `EvaluatorOutput::softmax_policy`)
//! - root only: Dirichlet mixing `(1 - eps) * p + eps * noise`
//! - legal-move masking and renormalization

use thiserror::Error;

/// Errors raised while turning a policy row into expansion priors.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    /// The legal mask removed all probability mass.
    #[error("no probability mass on legal actions ({legal} legal entries)")]
    NoLegalMass { legal: usize },

    /// The policy row contained NaN or infinite entries.
    #[error("policy row is not finite")]
    NonFinite,

    #[error("policy length {policy} does not match mask length {mask}")]
    LengthMismatch { policy: usize, mask: usize },
}

/// Blend `noise` into `policy` in place: `(1 - eps) * p + eps * noise`.
///
/// `eps == 0` leaves the policy untouched.
pub fn mix_noise(policy: &mut [f32], noise: &[f32], epsilon: f32) {
    if epsilon == 0.0 {
        return;
    }
    for (p, &n) in policy.iter_mut().zip(noise) {
        *p = (1.0 - epsilon) * *p + epsilon * n;
    }
}

/// Zero out illegal entries and renormalize the rest to sum to 1.
///
/// Fails instead of producing NaN when no legal entry carries mass.
pub fn mask_and_normalize(policy: &[f32], legal_mask: &[f32]) -> Result<Vec<f32>, PolicyError> {
    if policy.len() != legal_mask.len() {
        return Err(PolicyError::LengthMismatch {
            policy: policy.len(),
            mask: legal_mask.len(),
        });
    }
    if policy.iter().any(|p| !p.is_finite()) {
        return Err(PolicyError::NonFinite);
    }

    let mut masked: Vec<f32> = policy
        .iter()
        .zip(legal_mask)
        .map(|(&p, &m)| p * m)
        .collect();

    let sum: f32 = masked.iter().sum();
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(PolicyError::NoLegalMass {
            legal: legal_mask.iter().filter(|&&m| m > 0.0).count(),
        });
    }

    for p in &mut masked {
        *p /= sum;
    }
    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mix_noise() {
        let mut policy = vec![1.0, 0.0];
        mix_noise(&mut policy, &[0.0, 1.0], 0.25);
        assert_eq!(policy, vec![0.75, 0.25]);
    }

    #[test]
    fn test_mix_noise_zero_epsilon_is_identity() {
        let mut policy = vec![0.3, 0.7];
        mix_noise(&mut policy, &[0.9, 0.1], 0.0);
        assert_eq!(policy, vec![0.3, 0.7]);
    }

    #[test]
    fn test_mask_full_mask_is_noop() {
        let out = mask_and_normalize(&[0.3, 0.7], &[1.0, 1.0]).unwrap();
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_mask_renormalizes() {
        let out = mask_and_normalize(&[0.2, 0.3, 0.5], &[1.0, 0.0, 1.0]).unwrap();
        assert_eq!(out[1], 0.0);
        assert!((out[0] - 0.2 / 0.7).abs() < 1e-6);
        assert!((out[2] - 0.5 / 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_mask_no_legal_mass() {
        let err = mask_and_normalize(&[1.0, 0.0], &[0.0, 1.0]).unwrap_err();
        assert_eq!(err, PolicyError::NoLegalMass { legal: 1 });

        let err = mask_and_normalize(&[0.5, 0.5], &[0.0, 0.0]).unwrap_err();
        assert_eq!(err, PolicyError::NoLegalMass { legal: 0 });
    }

    #[test]
    fn test_mask_rejects_bad_input() {
        assert_eq!(
            mask_and_normalize(&[f32::NAN, 1.0], &[1.0, 1.0]),
            Err(PolicyError::NonFinite)
        );
        assert_eq!(
            mask_and_normalize(&[1.0], &[1.0, 1.0]),
            Err(PolicyError::LengthMismatch { policy: 1, mask: 2 })
        );
    }

    proptest! {
        #[test]
        fn prop_masked_policy_sums_to_one(
            entries in prop::collection::vec((0.001f32..1.0, any::<bool>()), 1..32)
        ) {
            let policy: Vec<f32> = entries.iter().map(|(p, _)| *p).collect();
            let mut mask: Vec<f32> = entries.iter().map(|(_, m)| if *m { 1.0 } else { 0.0 }).collect();
            mask[0] = 1.0;

            let out = mask_and_normalize(&policy, &mask).unwrap();
            let sum: f32 = out.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-4);
            for (p, m) in out.iter().zip(&mask) {
                if *m == 0.0 {
                    prop_assert_eq!(*p, 0.0);
                }
            }
        }
    }
}
