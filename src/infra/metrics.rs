// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch training history to a CSV file, one file
// per fold.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean criterion value over training batches
//   - valid_loss: mean criterion value on the internal validation
//                 split (NaN when the split is disabled)
//   - lr:         learning rate used for this epoch
//   - improved:   whether this epoch produced a new checkpoint
//
// Example CSV output:
//   epoch,train_loss,valid_loss,lr,improved
//   1,3.124500,3.089200,0.010000,true
//   2,2.890100,2.954300,0.010000,false

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub valid_loss: f64,
    pub lr: f64,
    pub improved: bool,
}

impl EpochMetrics {
    /// The loss that drives checkpointing and early stopping:
    /// validation loss when available, training loss otherwise.
    pub fn monitored_loss(&self) -> f64 {
        if self.valid_loss.is_nan() {
            self.train_loss
        } else {
            self.valid_loss
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a fresh history file at `path`, replacing any earlier run.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = path.as_ref().to_path_buf();
        if let Some(parent) = csv_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create history file '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,valid_loss,lr,improved")?;
        tracing::debug!("Created history CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{}",
            m.epoch, m.train_loss, m.valid_loss, m.lr, m.improved,
        )?;
        Ok(())
    }
}
