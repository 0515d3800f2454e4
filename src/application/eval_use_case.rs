// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Scores previously trained fold models:
//
//   Step 1: Load + encode test folds only   (Layer 4 - data)
//   Step 2: Rebuild the model config        (persisted JSON first)
//   Step 3: Per fold: load params, draw samples, average,
//           correlate                       (EvaluationDriver)
//   Step 4: Merge the scores into the Pearson and Spearman
//           comparison tables               (Layer 6 - infra)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::pipeline::{prepare_folds, resolve_model_config, DataConfig};
use crate::application::train_use_case::TrainConfig;
use crate::data::builder::{BuildMode, CrossValidationSet};
use crate::domain::correlation::FoldScore;
use crate::domain::traits::{Estimator, EstimatorFactory};
use crate::infra::comparison::ComparisonTable;
use crate::ml::{regressor::RegressorFactory, sampling::column_means, TrainBackend};

// ─── Evaluation Configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    pub data:           DataConfig,
    pub n_samples:      usize,
    /// Column written in both comparison tables
    pub column:         String,
    pub pearson_table:  PathBuf,
    pub spearman_table: PathBuf,
    pub batch_size:     usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            data:           DataConfig::default(),
            n_samples:      100,
            column:         "crispAI".to_string(),
            pearson_table:  PathBuf::from("data/pridict_90k_pearson.csv"),
            spearman_table: PathBuf::from("data/pridict_90k_spearman.csv"),
            batch_size:     64,
        }
    }
}

// ─── EvaluationDriver ─────────────────────────────────────────────────────────
pub struct EvaluationDriver<F: EstimatorFactory> {
    factory:   F,
    n_samples: usize,
}

impl<F: EstimatorFactory> EvaluationDriver<F> {
    pub fn new(factory: F, n_samples: usize) -> Self {
        Self { factory, n_samples }
    }

    pub fn run(&self, set: &CrossValidationSet) -> Result<Vec<FoldScore>> {
        let mut scores = Vec::with_capacity(set.folds.len());

        for fold in &set.folds {
            let mut estimator = self.factory.build(fold.fold)?;
            estimator.load(&self.factory.artifact_path(fold.fold))?;

            let samples = estimator.draw_samples(&fold.test.features, self.n_samples)?;
            let predictions = column_means(&samples);
            let score = FoldScore::compute(fold.fold, &predictions, &fold.test.labels);

            tracing::info!(
                "Fold {}: pearson={:.4} spearman={:.4} over {} samples",
                score.fold, score.pearson, score.spearman, self.n_samples
            );
            scores.push(score);
        }
        Ok(scores)
    }
}

/// Merge fold scores into both comparison tables under `column`.
pub fn merge_scores(cfg: &EvalConfig, scores: &[FoldScore]) -> Result<()> {
    let pearson: Vec<(usize, f64)> = scores.iter().map(|s| (s.fold, s.pearson)).collect();
    let spearman: Vec<(usize, f64)> = scores.iter().map(|s| (s.fold, s.spearman)).collect();
    ComparisonTable::merge_into_file(&cfg.pearson_table, &cfg.column, &pearson)?;
    ComparisonTable::merge_into_file(&cfg.spearman_table, &cfg.column, &spearman)?;
    Ok(())
}

// ─── EvalUseCase ──────────────────────────────────────────────────────────────
pub struct EvalUseCase {
    config: EvalConfig,
}

impl EvalUseCase {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<FoldScore>> {
        let cfg = &self.config;

        // ── Step 1: Test folds only ───────────────────────────────────────────
        let set = prepare_folds(&cfg.data, BuildMode::Eval)?;

        // ── Step 2: Same architecture as training ─────────────────────────────
        let ckpt = cfg.data.checkpoints();
        let model_cfg = resolve_model_config(&cfg.data, ckpt.load_config()?)?;

        // ── Step 3: Per-fold sampling and scores ──────────────────────────────
        let settings = TrainConfig { data: cfg.data.clone(), ..TrainConfig::default() };
        let factory = RegressorFactory::<TrainBackend>::new(settings, model_cfg, ckpt, Default::default())
            .with_inference_batch(cfg.batch_size);
        let scores = EvaluationDriver::new(factory, cfg.n_samples).run(&set)?;

        // ── Step 4: Comparison tables ─────────────────────────────────────────
        merge_scores(cfg, &scores)?;
        Ok(scores)
    }
}
