// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// File naming convention (prefix = "pridict_" or "pridict_long_"):
//   <output>/
//     <prefix>params_fold_0.mpk.gz    ← written on every validation improvement
//     <prefix>best_fold_0.mpk.gz      ← best weights, written when fit completes
//     <prefix>history_fold_0.csv      ← per-epoch metrics
//     ...
//     <prefix>config.json             ← model hyperparameters
//
// The recorder appends ".mpk.gz" itself, so the *_path helpers
// for weights return paths without an extension.
//
// CompactRecorder:
//   - Serialises parameters to MessagePack, gzip-compressed
//   - Type-safe: loading fails if the architecture doesn't match

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::error::PipelineError;
use crate::ml::model::{CrispAiConfig, CrispAiModel};

/// Extension CompactRecorder adds to every weights file.
pub const WEIGHTS_EXTENSION: &str = "mpk.gz";

#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
    prefix: String,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory, like `mkdir -p`.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create output directory '{}'", self.dir.display()))
    }

    pub fn params_path(&self, fold: usize) -> PathBuf {
        self.dir.join(format!("{}params_fold_{fold}", self.prefix))
    }

    pub fn best_path(&self, fold: usize) -> PathBuf {
        self.dir.join(format!("{}best_fold_{fold}", self.prefix))
    }

    pub fn history_path(&self, fold: usize) -> PathBuf {
        self.dir.join(format!("{}history_fold_{fold}.csv", self.prefix))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(format!("{}config.json", self.prefix))
    }

    /// Write model weights to `path` (extension added by the recorder).
    pub fn save_model<B: Backend>(&self, model: &CrispAiModel<B>, path: &Path) -> Result<()> {
        CompactRecorder::new()
            .record(model.clone().into_record(), path.to_path_buf())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(())
    }

    /// Restore weights from `path` into `model`.
    ///
    /// A missing file is reported as `PipelineError::ArtifactNotFound`
    /// so callers can tell "never trained" from "corrupt".
    pub fn load_model<B: Backend>(
        &self,
        model: CrispAiModel<B>,
        path: &Path,
        fold: usize,
        device: &B::Device,
    ) -> Result<CrispAiModel<B>> {
        let file = path.with_extension(WEIGHTS_EXTENSION);
        if !file.exists() {
            return Err(PipelineError::ArtifactNotFound { fold, path: file }.into());
        }

        let record = CompactRecorder::new()
            .load(path.to_path_buf(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", file.display()))?;

        tracing::info!("Loaded fold {} parameters from '{}'", fold, file.display());
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &CrispAiConfig) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// The persisted model configuration, if training has written one.
    pub fn load_config(&self) -> Result<Option<CrispAiConfig>> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        let cfg = serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))?;
        Ok(Some(cfg))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_artifact_names() {
        let ckpt = CheckpointManager::new("out", "pridict_long_");
        assert_eq!(ckpt.params_path(3), PathBuf::from("out/pridict_long_params_fold_3"));
        assert_eq!(ckpt.best_path(0), PathBuf::from("out/pridict_long_best_fold_0"));
        assert_eq!(ckpt.history_path(1), PathBuf::from("out/pridict_long_history_fold_1.csv"));
        assert_eq!(ckpt.config_path(), PathBuf::from("out/pridict_long_config.json"));
    }

    #[test]
    fn test_save_then_load_weights() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "pridict_");
        let device = Default::default();
        let cfg = CrispAiConfig::new().with_conv_filters(4).with_hidden(8);

        let model: CrispAiModel<TestBackend> = cfg.init(&device);
        ckpt.save_model(&model, &ckpt.params_path(0)).unwrap();
        assert!(dir.path().join("pridict_params_fold_0.mpk.gz").exists());

        let fresh: CrispAiModel<TestBackend> = cfg.init(&device);
        let loaded = ckpt.load_model(fresh, &ckpt.params_path(0), 0, &device).unwrap();
        let before = model.head.weight.val().into_data().to_vec::<f32>().unwrap();
        let after = loaded.head.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_weights_is_artifact_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "pridict_");
        let device = Default::default();
        let model: CrispAiModel<TestBackend> = CrispAiConfig::new().init(&device);

        let err = ckpt.load_model(model, &ckpt.params_path(2), 2, &device).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ArtifactNotFound { fold: 2, .. })
        ));
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "pridict_");
        assert!(ckpt.load_config().unwrap().is_none());

        ckpt.save_config(&CrispAiConfig::new().with_seq_len(60)).unwrap();
        let cfg = ckpt.load_config().unwrap().unwrap();
        assert_eq!(cfg.seq_len, 60);
    }
}
