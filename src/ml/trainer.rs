// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop for one fold using Burn's DataLoader
// and Adam.
//
// Per epoch:
//   0. learning rate from the StepLR schedule (if enabled)
//   1. forward / criterion / backward / Adam step per batch
//   2. abort with TrainingDivergence on a non-finite loss
//   3. validation loss on model.valid() (inner backend, no dropout)
//   4. checkpoint to <prefix>params_fold_<k> on improvement
//   5. history row, early-stopping check
//
// The internal validation rows are the first 1/cv of the
// training partition (see data::splitter). With the split
// disabled, training loss drives checkpointing instead.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    lr_scheduler::{
        step::{StepLrScheduler, StepLrSchedulerConfig},
        LrScheduler,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::EfficiencyBatcher, dataset::EfficiencyDataset, splitter::holdout_split};
use crate::domain::error::PipelineError;
use crate::domain::example::FeatureBundle;
use crate::domain::traits::FitSummary;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::callbacks::EarlyStopping;
use crate::ml::loss::Criterion;
use crate::ml::model::{CrispAiConfig, CrispAiModel};

/// Best weights (inner backend) plus what happened during fit.
pub struct FitOutcome<B: Backend> {
    pub model:   CrispAiModel<B>,
    pub summary: FitSummary,
}

pub fn train_fold<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    model_cfg: &CrispAiConfig,
    fold:      usize,
    inputs:    &FeatureBundle,
    labels:    &[f32],
    ckpt:      &CheckpointManager,
    device:    &B::Device,
) -> Result<FitOutcome<B::InnerBackend>> {
    let (train_idx, valid_idx) = holdout_split(inputs.len(), cfg.valid_folds);
    if train_idx.is_empty() {
        return Err(anyhow!("Fold {fold}: no training rows left after the validation split"));
    }
    tracing::info!(
        "Fold {}: {} fitting rows, {} validation rows",
        fold,
        train_idx.len(),
        valid_idx.len()
    );

    B::seed(cfg.data.seed.wrapping_add(fold as u64));
    let mut model: CrispAiModel<B> = model_cfg.init(device);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
    let criterion = Criterion::from(cfg.distribution);
    let mut scheduler = step_scheduler(cfg)?;

    // ── Data loaders: autodiff for training, inner backend for validation ────
    let train_loader = DataLoaderBuilder::new(EfficiencyBatcher::<B>::new(device.clone(), model_cfg.seq_len))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.data.seed.wrapping_add(fold as u64))
        .num_workers(1)
        .build(EfficiencyDataset::from_bundle(inputs, labels, &train_idx));

    let valid_loader = DataLoaderBuilder::new(EfficiencyBatcher::<B::InnerBackend>::new(device.clone(), model_cfg.seq_len))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(EfficiencyDataset::from_bundle(inputs, labels, &valid_idx));

    let history = MetricsLogger::create(ckpt.history_path(fold))?;
    let mut stopper = EarlyStopping::new(cfg.patience);
    let mut best_model: Option<CrispAiModel<B::InnerBackend>> = None;
    let mut epochs_run = 0;
    let mut stopped_early = false;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        epochs_run = epoch;
        let lr = scheduler.as_mut().map_or(cfg.lr, |s| s.step());

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let params = model.forward(batch.x_nucl, batch.x_pi);
            let loss = criterion.forward(&params, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(PipelineError::TrainingDivergence { fold, epoch, loss: loss_val }.into());
            }
            train_loss_sum += loss_val;
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut valid_loss_sum = 0.0f64;
        let mut valid_batches  = 0usize;
        for batch in valid_loader.iter() {
            let params = model_valid.forward(batch.x_nucl, batch.x_pi);
            valid_loss_sum += criterion.forward(&params, batch.targets).into_scalar().elem::<f64>();
            valid_batches  += 1;
        }

        let avg_valid_loss = if valid_batches > 0 {
            valid_loss_sum / valid_batches as f64
        } else { f64::NAN };
        if valid_batches > 0 && !avg_valid_loss.is_finite() {
            return Err(PipelineError::TrainingDivergence { fold, epoch, loss: avg_valid_loss }.into());
        }

        let mut metrics = EpochMetrics {
            epoch,
            train_loss: avg_train_loss,
            valid_loss: avg_valid_loss,
            lr,
            improved: false,
        };
        metrics.improved = stopper.observe(epoch, metrics.monitored_loss());
        if metrics.improved {
            ckpt.save_model(&model_valid, &ckpt.params_path(fold))?;
            best_model = Some(model_valid);
        }
        history.log(&metrics)?;

        tracing::info!(
            "Fold {} epoch {:>3}/{} | train_loss={:.4} | valid_loss={:.4} | lr={:.2e}{}",
            fold, epoch, cfg.epochs, avg_train_loss, avg_valid_loss, lr,
            if metrics.improved { " | checkpoint" } else { "" },
        );

        if cfg.early_stopping && stopper.should_stop() {
            tracing::info!("Fold {}: early stopping after epoch {}", fold, epoch);
            stopped_early = true;
            break;
        }
    }

    let model = best_model.unwrap_or_else(|| model.valid());
    ckpt.save_model(&model, &ckpt.best_path(fold))?;

    let summary = FitSummary {
        epochs_run,
        best_epoch: stopper.best_epoch(),
        best_loss: stopper.best(),
        stopped_early,
    };
    tracing::info!(
        "Fold {}: best loss {:.4} at epoch {} ({} epochs run)",
        fold, summary.best_loss, summary.best_epoch, summary.epochs_run
    );
    Ok(FitOutcome { model, summary })
}

/// StepLR stepped once per epoch, or `None` for a constant rate.
fn step_scheduler(cfg: &TrainConfig) -> Result<Option<StepLrScheduler>> {
    if !cfg.use_scheduler {
        return Ok(None);
    }
    let scheduler = StepLrSchedulerConfig::new(cfg.lr, cfg.scheduler_step_size)
        .with_gamma(cfg.scheduler_gamma)
        .init()
        .map_err(|e| anyhow!("Invalid StepLR settings: {e}"))?;
    Ok(Some(scheduler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::DataConfig;
    use crate::data::encoder::FeatureEncoder;
    use crate::data::fixtures::synthetic_records;
    use burn::backend::{Autodiff, NdArray};
    use std::path::Path;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn encoded(n: usize) -> (FeatureBundle, Vec<f32>) {
        let encoder = FeatureEncoder::new(23);
        let mut bundle = FeatureBundle::new(23);
        let mut labels = Vec::new();
        for r in synthetic_records(n, 23) {
            let ex = encoder.encode(&r).unwrap();
            bundle.push(&ex.x_nucl, &ex.x_pi);
            labels.push(ex.label % 5.0);
        }
        (bundle, labels)
    }

    fn settings(dir: &Path, use_scheduler: bool) -> TrainConfig {
        TrainConfig {
            data: DataConfig { output_dir: dir.to_path_buf(), ..DataConfig::default() },
            epochs: 4,
            batch_size: 8,
            early_stopping: false,
            use_scheduler,
            scheduler_step_size: 2,
            scheduler_gamma: 0.5,
            ..TrainConfig::default()
        }
    }

    fn lr_column(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(3).unwrap().to_string())
            .collect()
    }

    fn fit(cfg: &TrainConfig, ckpt: &CheckpointManager) -> FitOutcome<NdArray<f32>> {
        let (bundle, labels) = encoded(12);
        let model_cfg = CrispAiConfig::new().with_conv_filters(4).with_hidden(8);
        train_fold::<TestBackend>(cfg, &model_cfg, 0, &bundle, &labels, ckpt, &Default::default()).unwrap()
    }

    #[test]
    fn test_step_schedule_decays_logged_lr() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "pridict_");
        let outcome = fit(&settings(dir.path(), true), &ckpt);

        assert_eq!(outcome.summary.epochs_run, 4);
        assert_eq!(
            lr_column(&ckpt.history_path(0)),
            vec!["0.010000", "0.010000", "0.005000", "0.005000"]
        );
    }

    #[test]
    fn test_constant_lr_without_scheduler() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "pridict_");
        fit(&settings(dir.path(), false), &ckpt);

        assert!(lr_column(&ckpt.history_path(0)).iter().all(|lr| lr == "0.010000"));
    }

    #[test]
    fn test_zero_step_size_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { scheduler_step_size: 0, ..settings(dir.path(), true) };
        assert!(step_scheduler(&cfg).is_err());
        let cfg = TrainConfig { use_scheduler: false, ..cfg };
        assert!(step_scheduler(&cfg).unwrap().is_none());
    }
}
