// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Typed failures raised by the pipeline. Low-level errors
// (ParseError, EncodingError) describe what went wrong with a
// single value; PipelineError adds where it happened.
//
// Policy:
//   - parse / encode problems fail fast with record context
//   - a missing fold artifact fails the evaluation run
//   - divergence is surfaced exactly as the trainer reports it
//   - nothing is retried

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::example::{Field, Split};

/// Malformed numeric-list literal such as `"[0.1, x, 0.3]"`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("token '{token}' at position {position} is not a number")]
    NonNumeric { position: usize, token: String },

    #[error("expected {expected} values, found {found}")]
    Length { expected: usize, found: usize },
}

/// A record that cannot be turned into model tensors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("symbol '{symbol}' at position {position} is not in the nucleotide vocabulary")]
    UnknownSymbol { symbol: char, position: usize },

    #[error("sequence has length {found}, expected {expected}")]
    SequenceLength { expected: usize, found: usize },

    #[error("feature channel '{channel}' has length {found}, expected {expected}")]
    ChannelLength {
        channel: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("one-hot row {position} is not a valid symbol encoding")]
    InvalidOneHot { position: usize },

    #[error("NaN values in fold {fold} {split} {field}")]
    NotFinite { fold: usize, split: Split, field: Field },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("record {row}, column '{column}': {source}")]
    Parse {
        row: usize,
        column: &'static str,
        #[source]
        source: ParseError,
    },

    #[error("{location}: {source}")]
    Encoding {
        location: String,
        #[source]
        source: EncodingError,
    },

    #[error("no trained parameters for fold {fold} at '{}'", path.display())]
    ArtifactNotFound { fold: usize, path: PathBuf },

    #[error("training diverged on fold {fold} at epoch {epoch} (loss = {loss})")]
    TrainingDivergence { fold: usize, epoch: usize, loss: f64 },
}
