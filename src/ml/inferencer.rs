// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{anyhow, Result};
use burn::prelude::*;
use rand::Rng;

use crate::data::batcher::EfficiencyBatcher;
use crate::domain::example::FeatureBundle;
use crate::domain::traits::SampleMatrix;
use crate::ml::model::CrispAiModel;
use crate::ml::sampling::sample_zinb;

/// Host-side ZINB parameters, one entry per example.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZinbOutputs {
    pub mu:    Vec<f32>,
    pub theta: Vec<f32>,
    pub pi:    Vec<f32>,
}

pub struct Inferencer<'a, B: Backend> {
    model:      &'a CrispAiModel<B>,
    batcher:    EfficiencyBatcher<B>,
    batch_size: usize,
}

impl<'a, B: Backend> Inferencer<'a, B> {
    pub fn new(model: &'a CrispAiModel<B>, device: B::Device, seq_len: usize, batch_size: usize) -> Self {
        Self {
            model,
            batcher: EfficiencyBatcher::new(device, seq_len),
            batch_size: batch_size.max(1),
        }
    }

    /// Forward the bundle in chunks of `batch_size`.
    pub fn zinb_params(&self, bundle: &FeatureBundle) -> Result<ZinbOutputs> {
        let mut out = ZinbOutputs::default();
        let mut start = 0;
        while start < bundle.len() {
            let end = (start + self.batch_size).min(bundle.len());
            let (x_nucl, x_pi) = self.batcher.features(bundle, start, end);
            let params = self.model.forward(x_nucl, x_pi);

            out.mu.extend(to_host(params.mu)?);
            out.theta.extend(to_host(params.theta)?);
            out.pi.extend(to_host(params.pi)?);
            start = end;
        }
        Ok(out)
    }

    /// Point estimate (1 − π)·μ per example.
    pub fn predict(&self, bundle: &FeatureBundle) -> Result<Vec<f32>> {
        let params = self.zinb_params(bundle)?;
        Ok(params
            .mu
            .iter()
            .zip(&params.pi)
            .map(|(mu, pi)| (1.0 - pi) * mu)
            .collect())
    }

    pub fn draw_samples<R: Rng + ?Sized>(
        &self,
        bundle: &FeatureBundle,
        n_samples: usize,
        rng: &mut R,
    ) -> Result<SampleMatrix> {
        let params = self.zinb_params(bundle)?;
        tracing::debug!("Drawing {} samples for {} examples", n_samples, bundle.len());
        sample_zinb(&params.mu, &params.theta, &params.pi, n_samples, rng)
    }
}

fn to_host<B: Backend>(tensor: Tensor<B, 1>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read model output: {e:?}"))
}
