// ============================================================
// Layer 5 — ZINB Sampling
// ============================================================
// Draws values from the per-example predictive distribution:
//
//   z ~ Bernoulli(π)            structural zero?
//   λ ~ Gamma(θ, μ / θ)         NB as a Gamma–Poisson mixture
//   y ~ Poisson(λ)
//   sample = 0 if z else y
//
// Output is n_samples rows × N columns, matching how the
// evaluation driver averages over the sample axis.

use anyhow::{anyhow, Result};
use rand::{distributions::Bernoulli, Rng};
use rand_distr::{Distribution, Gamma, Poisson};

use crate::domain::traits::SampleMatrix;

pub fn sample_zinb<R: Rng + ?Sized>(
    mu: &[f32],
    theta: &[f32],
    pi: &[f32],
    n_samples: usize,
    rng: &mut R,
) -> Result<SampleMatrix> {
    if mu.len() != theta.len() || mu.len() != pi.len() {
        return Err(anyhow!(
            "ZINB parameter lengths differ: mu={}, theta={}, pi={}",
            mu.len(),
            theta.len(),
            pi.len()
        ));
    }

    let mut per_example = Vec::with_capacity(mu.len());
    for i in 0..mu.len() {
        let (m, t, p) = (mu[i] as f64, theta[i] as f64, pi[i] as f64);
        let zero = Bernoulli::new(p.clamp(0.0, 1.0))
            .map_err(|e| anyhow!("Invalid zero-inflation probability {p} for example {i}: {e}"))?;
        let rate = Gamma::new(t, m / t)
            .map_err(|e| anyhow!("Invalid NB parameters mu={m}, theta={t} for example {i}: {e}"))?;
        per_example.push((zero, rate));
    }

    let mut samples = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let mut row = Vec::with_capacity(per_example.len());
        for (zero, rate) in &per_example {
            if zero.sample(rng) {
                row.push(0.0);
                continue;
            }
            let lambda: f64 = rate.sample(rng);
            let count = if lambda > 0.0 {
                Poisson::new(lambda)
                    .map_err(|e| anyhow!("Invalid Poisson rate {lambda}: {e}"))?
                    .sample(rng)
            } else {
                0.0
            };
            row.push(count as f32);
        }
        samples.push(row);
    }
    Ok(samples)
}

/// Mean over the sample axis: one value per example.
pub fn column_means(samples: &SampleMatrix) -> Vec<f32> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    let mut sums = vec![0.0f64; first.len()];
    for row in samples {
        for (sum, v) in sums.iter_mut().zip(row) {
            *sum += *v as f64;
        }
    }
    let n = samples.len() as f64;
    sums.into_iter().map(|s| (s / n) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_full_inflation_gives_zeros() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = sample_zinb(&[5.0, 9.0], &[2.0, 2.0], &[1.0, 1.0], 50, &mut rng).unwrap();
        assert_eq!(samples.len(), 50);
        assert!(samples.iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sample_mean_tracks_expected_value() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = sample_zinb(&[8.0, 3.0], &[4.0, 10.0], &[0.0, 0.5], 20_000, &mut rng).unwrap();
        let means = column_means(&samples);
        assert!((means[0] - 8.0).abs() < 0.3, "mean {}", means[0]);
        assert!((means[1] - 1.5).abs() < 0.15, "mean {}", means[1]);
    }

    #[test]
    fn test_same_seed_same_samples() {
        let draw = || {
            let mut rng = StdRng::seed_from_u64(3);
            sample_zinb(&[2.0], &[1.0], &[0.2], 10, &mut rng).unwrap()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_zinb(&[1.0], &[1.0, 2.0], &[0.0], 1, &mut rng).is_err());
    }

    #[test]
    fn test_column_means() {
        let samples = vec![vec![1.0, 4.0], vec![3.0, 0.0]];
        assert_eq!(column_means(&samples), vec![2.0, 2.0]);
        assert!(column_means(&Vec::new()).is_empty());
    }
}
