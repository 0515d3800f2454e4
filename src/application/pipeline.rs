// ============================================================
// Layer 2 — Shared Pipeline Steps
// ============================================================
// Steps both use cases run before touching a model:
//
//   Step 1: Load the efficiency table     (Layer 4 - data)
//   Step 2: Partition + encode per fold   (Layer 4 - data)
//   Step 3: Resolve the model config      (Layer 5/6)
//
// The model configuration is built once per invocation and
// never mutated afterwards; the long variant is a new value
// produced by `with_seq_len`, not an edit of a shared one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::data::{
    builder::{BuildMode, CrossValidationSet, DatasetBuilder, NanPolicy},
    encoder::{FeatureEncoder, UnknownSymbolPolicy},
    loader::CsvLoader,
    partitioner::{FoldPartitioner, FOLD_COUNT},
};
use crate::domain::options::ModelVariant;
use crate::domain::traits::RecordSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::CrispAiConfig;

// ─── Data Configuration ──────────────────────────────────────────────────────
// Settings shared by `train` and `eval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_path:       PathBuf,
    pub output_dir:      PathBuf,
    pub model:           ModelVariant,
    pub model_config:    Option<PathBuf>,
    pub unknown_symbols: UnknownSymbolPolicy,
    pub strict_nan:      bool,
    pub folds:           usize,
    pub seed:            u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_path:       PathBuf::from("data/crispai-90k-filtered.csv"),
            output_dir:      PathBuf::from("crispAI/trained_models"),
            model:           ModelVariant::Base,
            model_config:    None,
            unknown_symbols: UnknownSymbolPolicy::Reject,
            strict_nan:      false,
            folds:           FOLD_COUNT,
            seed:            42,
        }
    }
}

impl DataConfig {
    pub fn seq_len(&self) -> usize {
        self.model.seq_len()
    }

    pub fn checkpoints(&self) -> CheckpointManager {
        CheckpointManager::new(&self.output_dir, self.model.artifact_prefix())
    }

    fn nan_policy(&self) -> NanPolicy {
        if self.strict_nan { NanPolicy::Strict } else { NanPolicy::Warn }
    }
}

/// Load the table and build every fold's tensors.
pub fn prepare_folds(data: &DataConfig, mode: BuildMode) -> Result<CrossValidationSet> {
    let partitioner = FoldPartitioner::new(data.folds)?;

    tracing::info!("Loading records from '{}'", data.data_path.display());
    let records = CsvLoader::new(&data.data_path, data.seq_len()).load_all()?;

    let encoder = FeatureEncoder::new(data.seq_len()).with_unknown_symbols(data.unknown_symbols);
    let builder = DatasetBuilder::new(encoder, partitioner, mode)
        .with_nan_policy(data.nan_policy());
    let set = builder.build(&records)?;

    if !set.nan_reports.is_empty() {
        tracing::warn!("{} fold tensors contain NaN values", set.nan_reports.len());
    }
    Ok(set)
}

/// Model configuration for this run.
///
/// Precedence: `persisted` (written next to the artifacts by a
/// previous training run), then `--model-config`, then defaults.
/// The variant's sequence length is always applied last.
pub fn resolve_model_config(
    data: &DataConfig,
    persisted: Option<CrispAiConfig>,
) -> Result<CrispAiConfig> {
    let base = match (persisted, &data.model_config) {
        (Some(cfg), _) => cfg,
        (None, Some(path)) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Cannot read model config '{}'", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Malformed model config '{}'", path.display()))?
        }
        (None, None) => CrispAiConfig::new(),
    };

    let cfg = base.with_seq_len(data.seq_len());
    anyhow::ensure!(
        cfg.matches_encoding(),
        "model config expects {} + {} input channels, the encoder produces 6 + 4",
        cfg.nucl_channels,
        cfg.pi_channels
    );
    Ok(cfg)
}
