// ============================================================
// Layer 5 — Neural Regressor
// ============================================================
// Implements the Estimator contract on top of the Burn model:
//
//   fit           → trainer::train_fold, keeps the best weights
//   predict       → (1 − π)·μ from the inner-backend model
//   draw_samples  → ZINB draws, RNG seeded per fold
//   save / load   → CompactRecorder via CheckpointManager
//
// RegressorFactory hands out one fresh regressor per fold; all
// of them share the same immutable settings.

use std::path::{Path, PathBuf};

use anyhow::Result;
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use rand::{rngs::StdRng, SeedableRng};

use crate::application::train_use_case::TrainConfig;
use crate::domain::example::FeatureBundle;
use crate::domain::traits::{Estimator, EstimatorFactory, FitSummary, SampleMatrix};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;
use crate::ml::model::{CrispAiConfig, CrispAiModel};
use crate::ml::trainer::train_fold;

/// Batch size used for prediction and sampling unless overridden.
pub const DEFAULT_INFERENCE_BATCH: usize = 64;

pub struct NeuralRegressor<B: AutodiffBackend> {
    fold:            usize,
    settings:        TrainConfig,
    model_cfg:       CrispAiConfig,
    checkpoints:     CheckpointManager,
    inference_batch: usize,
    device:          B::Device,
    model:           CrispAiModel<B::InnerBackend>,
}

impl<B: AutodiffBackend> NeuralRegressor<B> {
    fn inferencer(&self) -> Inferencer<'_, B::InnerBackend> {
        Inferencer::new(&self.model, self.device.clone(), self.model_cfg.seq_len, self.inference_batch)
    }
}

impl<B: AutodiffBackend> Estimator for NeuralRegressor<B> {
    fn fit(&mut self, inputs: &FeatureBundle, labels: &[f32]) -> Result<FitSummary> {
        let outcome = train_fold::<B>(
            &self.settings,
            &self.model_cfg,
            self.fold,
            inputs,
            labels,
            &self.checkpoints,
            &self.device,
        )?;
        self.model = outcome.model;
        Ok(outcome.summary)
    }

    fn predict(&self, inputs: &FeatureBundle) -> Result<Vec<f32>> {
        self.inferencer().predict(inputs)
    }

    fn draw_samples(&self, inputs: &FeatureBundle, n_samples: usize) -> Result<SampleMatrix> {
        let mut rng = StdRng::seed_from_u64(self.settings.data.seed.wrapping_add(self.fold as u64));
        self.inferencer().draw_samples(inputs, n_samples, &mut rng)
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.checkpoints.save_model(&self.model, path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.model = self
            .checkpoints
            .load_model(self.model.clone(), path, self.fold, &self.device)?;
        Ok(())
    }
}

// ─── RegressorFactory ─────────────────────────────────────────────────────────
pub struct RegressorFactory<B: AutodiffBackend> {
    settings:        TrainConfig,
    model_cfg:       CrispAiConfig,
    checkpoints:     CheckpointManager,
    inference_batch: usize,
    device:          B::Device,
}

impl<B: AutodiffBackend> RegressorFactory<B> {
    pub fn new(settings: TrainConfig, model_cfg: CrispAiConfig, checkpoints: CheckpointManager, device: B::Device) -> Self {
        Self {
            settings,
            model_cfg,
            checkpoints,
            inference_batch: DEFAULT_INFERENCE_BATCH,
            device,
        }
    }

    pub fn with_inference_batch(mut self, batch_size: usize) -> Self {
        self.inference_batch = batch_size;
        self
    }
}

impl<B: AutodiffBackend> EstimatorFactory for RegressorFactory<B> {
    type Estimator = NeuralRegressor<B>;

    fn build(&self, fold: usize) -> Result<NeuralRegressor<B>> {
        B::seed(self.settings.data.seed.wrapping_add(fold as u64));
        Ok(NeuralRegressor {
            fold,
            settings:        self.settings.clone(),
            model_cfg:       self.model_cfg.clone(),
            checkpoints:     self.checkpoints.clone(),
            inference_batch: self.inference_batch,
            device:          self.device.clone(),
            model:           self.model_cfg.init(&self.device),
        })
    }

    fn artifact_path(&self, fold: usize) -> PathBuf {
        self.checkpoints.params_path(fold)
    }
}
