// ============================================================
// Layer 5 — Training Criteria
// ============================================================
// Zero-inflated negative binomial (ZINB) negative log-likelihood,
// with MSE on the expected value as the alternative.
//
// With r = θ / (θ + μ):
//
//   y = 0 :  −log( π + (1 − π)·r^θ )
//   y > 0 :  −log(1 − π) − log NB(y; μ, θ)
//
//   log NB(y; μ, θ) = lnΓ(y + θ) − lnΓ(θ) − lnΓ(y + 1)
//                     + θ·log r + y·log(μ / (θ + μ))
//
// lnΓ uses Stirling's series after shifting the argument by 6:
//
//   lnΓ(z) = lnΓ(z + 6) − log(z (z+1) ... (z+5))
//   lnΓ(w) ≈ (w − ½)·ln w − w + ½·ln 2π + 1/12w − 1/360w³ + 1/1260w⁵

use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::*,
};

use crate::domain::options::LossDistribution;
use crate::ml::model::ZinbParams;

const EPS: f64 = 1e-8;
const SHIFT: usize = 6;
const HALF_LN_2PI: f64 = 0.918_938_533_204_672_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    ZeroInflatedNegativeBinomial,
    MeanSquaredError,
}

impl From<LossDistribution> for Criterion {
    fn from(distribution: LossDistribution) -> Self {
        match distribution {
            LossDistribution::NegativeBinomial => Criterion::ZeroInflatedNegativeBinomial,
            LossDistribution::Gaussian => Criterion::MeanSquaredError,
        }
    }
}

impl Criterion {
    /// Mean loss over the batch: shape [1].
    pub fn forward<B: Backend>(&self, params: &ZinbParams<B>, targets: Tensor<B, 1>) -> Tensor<B, 1> {
        match self {
            Criterion::ZeroInflatedNegativeBinomial => zinb_nll(params, targets).mean(),
            Criterion::MeanSquaredError => {
                MseLoss::new().forward(params.expected(), targets, Reduction::Mean)
            }
        }
    }
}

/// Per-example ZINB negative log-likelihood: shape [batch].
pub fn zinb_nll<B: Backend>(params: &ZinbParams<B>, targets: Tensor<B, 1>) -> Tensor<B, 1> {
    let ZinbParams { mu, theta, pi } = params.clone();

    let total = theta.clone() + mu.clone();
    let log_r = (theta.clone() + EPS).log() - (total.clone() + EPS).log();
    let log_mu_ratio = (mu + EPS).log() - (total + EPS).log();

    let log_nb = ln_gamma_tensor(targets.clone() + theta.clone())
        - ln_gamma_tensor(theta.clone())
        - ln_gamma_tensor(targets.clone().add_scalar(1.0))
        + theta.clone() * log_r.clone()
        + targets.clone() * log_mu_ratio;

    let one_minus_pi = pi.clone().neg().add_scalar(1.0);
    let positive_case = (one_minus_pi.clone() + EPS).log().neg() - log_nb;
    let zero_case = (pi + one_minus_pi * (theta * log_r).exp() + EPS).log().neg();

    let is_zero = targets.lower_equal_elem(0.0);
    positive_case.mask_where(is_zero, zero_case)
}

/// lnΓ(z) for z > 0, elementwise.
pub fn ln_gamma_tensor<B: Backend, const D: usize>(z: Tensor<B, D>) -> Tensor<B, D> {
    let mut product = z.clone();
    for k in 1..SHIFT {
        product = product * z.clone().add_scalar(k as f64);
    }
    let w = z.add_scalar(SHIFT as f64);

    let inv = w.clone().recip();
    let inv2 = inv.clone() * inv.clone();
    let series = inv.clone() * (inv2.clone() * (inv2.mul_scalar(1.0 / 1260.0).sub_scalar(1.0 / 360.0)).add_scalar(1.0 / 12.0));

    let stirling = w.clone().sub_scalar(0.5) * w.clone().log() - w + HALF_LN_2PI + series;
    stirling - product.log()
}

/// Scalar lnΓ with the same approximation.
pub fn ln_gamma(z: f64) -> f64 {
    let mut product = 1.0;
    for k in 0..SHIFT {
        product *= z + k as f64;
    }
    let w = z + SHIFT as f64;
    let series = 1.0 / (12.0 * w) - 1.0 / (360.0 * w.powi(3)) + 1.0 / (1260.0 * w.powi(5));
    (w - 0.5) * w.ln() - w + HALF_LN_2PI + series - product.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn tensor(values: &[f32]) -> Tensor<TestBackend, 1> {
        Tensor::from_data(TensorData::new(values.to_vec(), [values.len()]), &Default::default())
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-8);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-8);
        assert!((ln_gamma(0.5) - 0.572_364_942_924_700_1).abs() < 1e-8);
    }

    #[test]
    fn test_ln_gamma_tensor_matches_scalar() {
        let zs = [0.5f32, 1.0, 2.5, 10.0, 42.0];
        let out = ln_gamma_tensor(tensor(&zs)).into_data().to_vec::<f32>().unwrap();
        for (z, v) in zs.iter().zip(out) {
            assert!((ln_gamma(*z as f64) - v as f64).abs() < 1e-3, "lnΓ({z})");
        }
    }

    #[test]
    fn test_zinb_loss_is_finite_and_positive() {
        let params = ZinbParams {
            mu: tensor(&[2.0, 5.0, 0.5, 10.0]),
            theta: tensor(&[1.0, 3.0, 0.2, 8.0]),
            pi: tensor(&[0.1, 0.5, 0.9, 0.01]),
        };
        let targets = tensor(&[0.0, 4.0, 0.0, 12.0]);
        let nll = zinb_nll(&params, targets).into_data().to_vec::<f32>().unwrap();
        assert!(nll.iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn test_zero_inflation_lowers_zero_loss() {
        let base = |pi: f32| ZinbParams {
            mu: tensor(&[5.0]),
            theta: tensor(&[2.0]),
            pi: tensor(&[pi]),
        };
        let low = zinb_nll(&base(0.05), tensor(&[0.0])).into_scalar();
        let high = zinb_nll(&base(0.9), tensor(&[0.0])).into_scalar();
        assert!(high < low);
    }

    #[test]
    fn test_nb_term_matches_closed_form() {
        // θ = 1 makes NB geometric: P(y) = r·(1 − r)^y with r = 1/(1 + μ)
        let params = ZinbParams {
            mu: tensor(&[3.0]),
            theta: tensor(&[1.0]),
            pi: tensor(&[0.0]),
        };
        let nll = zinb_nll(&params, tensor(&[2.0])).into_scalar() as f64;
        let r: f64 = 0.25;
        let expected = -(r.ln() + 2.0 * (1.0 - r).ln());
        assert!((nll - expected).abs() < 1e-3);
    }

    #[test]
    fn test_mse_uses_expected_value() {
        let params = ZinbParams {
            mu: tensor(&[2.0, 4.0]),
            theta: tensor(&[1.0, 1.0]),
            pi: tensor(&[0.5, 0.0]),
        };
        // expected values 1.0 and 4.0
        let loss = Criterion::MeanSquaredError
            .forward(&params, tensor(&[2.0, 4.0]))
            .into_scalar();
        assert!((loss - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_criterion_from_distribution() {
        assert_eq!(
            Criterion::from(LossDistribution::NegativeBinomial),
            Criterion::ZeroInflatedNegativeBinomial
        );
        assert_eq!(Criterion::from(LossDistribution::Gaussian), Criterion::MeanSquaredError);
    }
}
