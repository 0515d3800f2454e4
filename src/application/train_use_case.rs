// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load + encode every fold        (Layer 4 - data)
//   Step 2: Resolve and save model config   (Layer 6 - infra)
//   Step 3: Build a regressor factory       (Layer 5 - ml)
//   Step 4: Fit and score each fold         (TrainingDriver)
//
// Folds run one after another. A failing fold aborts the run
// with its error unchanged; artifacts already written for
// earlier folds stay on disk.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::application::pipeline::{prepare_folds, resolve_model_config, DataConfig};
use crate::data::builder::{BuildMode, CrossValidationSet};
use crate::domain::correlation::FoldScore;
use crate::domain::options::LossDistribution;
use crate::domain::traits::{Estimator, EstimatorFactory};
use crate::ml::{regressor::RegressorFactory, TrainBackend};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data:                DataConfig,
    pub distribution:        LossDistribution,
    pub batch_size:          usize,
    pub lr:                  f64,
    pub epochs:              usize,
    pub patience:            usize,
    pub early_stopping:      bool,
    /// Internal validation split as a fold count (5 → first fifth)
    pub valid_folds:         usize,
    pub use_scheduler:       bool,
    pub scheduler_step_size: usize,
    pub scheduler_gamma:     f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data:                DataConfig::default(),
            distribution:        LossDistribution::NegativeBinomial,
            batch_size:          128,
            lr:                  0.01,
            epochs:              100,
            patience:            10,
            early_stopping:      true,
            valid_folds:         5,
            use_scheduler:       false,
            scheduler_step_size: 5,
            scheduler_gamma:     0.1,
        }
    }
}

// ─── TrainingDriver ───────────────────────────────────────────────────────────
/// Fits one fresh estimator per fold and scores it on the held-out fold.
pub struct TrainingDriver<F: EstimatorFactory> {
    factory: F,
}

impl<F: EstimatorFactory> TrainingDriver<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn run(&self, set: &CrossValidationSet) -> Result<Vec<FoldScore>> {
        let mut scores = Vec::with_capacity(set.folds.len());

        for fold in &set.folds {
            let train = fold.train.as_ref().ok_or_else(|| {
                anyhow!("Fold {} has no training partition; build the dataset in train mode", fold.fold)
            })?;

            tracing::info!("Fold {}: training on {} examples", fold.fold, train.len());
            let mut estimator = self.factory.build(fold.fold)?;
            let summary = estimator.fit(&train.features, &train.labels)?;

            let predictions = estimator.predict(&fold.test.features)?;
            let score = FoldScore::compute(fold.fold, &predictions, &fold.test.labels);
            tracing::info!(
                "Fold {}: pearson={:.4} spearman={:.4} (best epoch {}, {} epochs)",
                score.fold, score.pearson, score.spearman, summary.best_epoch, summary.epochs_run
            );
            scores.push(score);
        }
        Ok(scores)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<FoldScore>> {
        let cfg = &self.config;

        // ── Step 1: Load + encode ─────────────────────────────────────────────
        let set = prepare_folds(&cfg.data, BuildMode::Train)?;

        // ── Step 2: Model config, persisted for evaluation ────────────────────
        let ckpt = cfg.data.checkpoints();
        ckpt.ensure_dir()?;
        let model_cfg = resolve_model_config(&cfg.data, None)?;
        ckpt.save_config(&model_cfg)?;
        tracing::info!(
            "Training {} variant ({} loss) into '{}'",
            cfg.data.model,
            cfg.distribution,
            ckpt.dir().display()
        );

        // ── Step 3 + 4: Per-fold fit and score ────────────────────────────────
        let factory = RegressorFactory::<TrainBackend>::new(cfg.clone(), model_cfg, ckpt, Default::default());
        TrainingDriver::new(factory).run(&set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builder::DatasetBuilder;
    use crate::data::encoder::FeatureEncoder;
    use crate::data::fixtures::{synthetic_csv, synthetic_records};
    use crate::data::partitioner::FoldPartitioner;
    use crate::domain::error::PipelineError;
    use crate::domain::example::FeatureBundle;
    use crate::domain::traits::{FitSummary, SampleMatrix};
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    /// Predicts its training mean plus the first auxiliary value.
    struct FakeEstimator {
        fold: usize,
        offset: f32,
        fail_on: Option<usize>,
    }

    impl Estimator for FakeEstimator {
        fn fit(&mut self, _inputs: &FeatureBundle, labels: &[f32]) -> Result<FitSummary> {
            if self.fail_on == Some(self.fold) {
                return Err(PipelineError::TrainingDivergence { fold: self.fold, epoch: 1, loss: f64::NAN }.into());
            }
            self.offset = labels.iter().sum::<f32>() / labels.len() as f32;
            Ok(FitSummary { epochs_run: 1, best_epoch: 1, best_loss: 0.0, stopped_early: false })
        }

        fn predict(&self, inputs: &FeatureBundle) -> Result<Vec<f32>> {
            Ok((0..inputs.len()).map(|i| self.offset + inputs.example(i).1[0]).collect())
        }

        fn draw_samples(&self, inputs: &FeatureBundle, n: usize) -> Result<SampleMatrix> {
            Ok(vec![self.predict(inputs)?; n])
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFactory {
        fail_on: Option<usize>,
        built: RefCell<Vec<usize>>,
    }

    impl EstimatorFactory for FakeFactory {
        type Estimator = FakeEstimator;

        fn build(&self, fold: usize) -> Result<FakeEstimator> {
            self.built.borrow_mut().push(fold);
            Ok(FakeEstimator { fold, offset: 0.0, fail_on: self.fail_on })
        }

        fn artifact_path(&self, fold: usize) -> PathBuf {
            PathBuf::from(format!("fake_{fold}"))
        }
    }

    fn cv_set(mode: BuildMode) -> CrossValidationSet {
        DatasetBuilder::new(FeatureEncoder::new(23), FoldPartitioner::default(), mode)
            .build(&synthetic_records(20, 23))
            .unwrap()
    }

    #[test]
    fn test_every_fold_gets_a_fresh_estimator_and_score() {
        let driver = TrainingDriver::new(FakeFactory::default());
        let scores = driver.run(&cv_set(BuildMode::Train)).unwrap();

        assert_eq!(scores.iter().map(|s| s.fold).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*driver.factory.built.borrow(), vec![0, 1, 2, 3, 4]);
        assert!(scores.iter().all(|s| s.pearson.is_finite() && s.spearman.is_finite()));
    }

    #[test]
    fn test_fit_failure_stops_the_run_unchanged() {
        let driver = TrainingDriver::new(FakeFactory { fail_on: Some(2), ..FakeFactory::default() });
        let err = driver.run(&cv_set(BuildMode::Train)).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::TrainingDivergence { fold: 2, .. })
        ));
        // folds after the failing one are never started
        assert_eq!(*driver.factory.built.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_eval_only_set_is_rejected() {
        let driver = TrainingDriver::new(FakeFactory::default());
        assert!(driver.run(&cv_set(BuildMode::Eval)).is_err());
    }

    #[test]
    fn test_defaults_match_the_documented_settings() {
        let cfg = TrainConfig::default();
        assert_eq!((cfg.batch_size, cfg.epochs, cfg.patience, cfg.valid_folds), (128, 100, 10, 5));
        assert_eq!(cfg.lr, 0.01);
        assert!(!cfg.use_scheduler);
    }

    #[test]
    fn test_execute_end_to_end_on_a_small_table() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("table.csv");
        std::fs::write(&data_path, synthetic_csv(15, 23)).unwrap();
        let model_cfg = dir.path().join("model.json");
        std::fs::write(
            &model_cfg,
            serde_json::to_string(&crate::ml::model::CrispAiConfig::new().with_conv_filters(4).with_hidden(8)).unwrap(),
        )
        .unwrap();

        let cfg = TrainConfig {
            data: DataConfig {
                data_path,
                output_dir: dir.path().join("models"),
                model_config: Some(model_cfg),
                ..DataConfig::default()
            },
            epochs: 2,
            batch_size: 4,
            ..TrainConfig::default()
        };
        let scores = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(scores.len(), 5);
        for fold in 0..5 {
            let path = dir.path().join(format!("models/pridict_params_fold_{fold}.mpk.gz"));
            assert!(path.exists(), "{}", path.display());
        }
        assert!(dir.path().join("models/pridict_config.json").exists());
    }
}
