// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The drivers in Layer 2 talk to data sources and models only
// through these traits:
//
//   RecordSource      → CsvLoader (Layer 4)
//   Estimator         → NeuralRegressor (Layer 5)
//   EstimatorFactory  → RegressorFactory (Layer 5)
//
// Test code implements them with in-memory fakes so the
// cross-validation control flow runs without a model.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::example::FeatureBundle;
use crate::domain::record::Record;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that yields parsed records.
pub trait RecordSource {
    fn load_all(&self) -> Result<Vec<Record>>;
}

// ─── Estimator ────────────────────────────────────────────────────────────────
/// Stochastic draws: `n_samples` rows, one column per example.
pub type SampleMatrix = Vec<Vec<f32>>;

/// What a completed `fit` reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub best_loss: f64,
    pub stopped_early: bool,
}

/// A regression model with a fit / predict / sample contract.
///
/// Failures inside `fit` (including a diverging loss) are returned
/// as-is; the caller decides whether the run survives.
pub trait Estimator {
    fn fit(&mut self, inputs: &FeatureBundle, labels: &[f32]) -> Result<FitSummary>;

    /// Point estimate per example.
    fn predict(&self, inputs: &FeatureBundle) -> Result<Vec<f32>>;

    /// Draw `n_samples` values per example from the predictive distribution.
    fn draw_samples(&self, inputs: &FeatureBundle, n_samples: usize) -> Result<SampleMatrix>;

    fn save(&self, path: &Path) -> Result<()>;

    /// Replace the current parameters with those stored at `path`.
    fn load(&mut self, path: &Path) -> Result<()>;
}

// ─── EstimatorFactory ─────────────────────────────────────────────────────────
/// Builds a fresh, independent estimator per fold.
pub trait EstimatorFactory {
    type Estimator: Estimator;

    fn build(&self, fold: usize) -> Result<Self::Estimator>;

    /// Where the fold's trained parameters live.
    fn artifact_path(&self, fold: usize) -> PathBuf;
}
