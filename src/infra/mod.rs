// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the file formats the pipeline reads and writes:
//
//   checkpoint.rs : Saving and loading model weights
//                    Uses Burn's CompactRecorder for the
//                    fold parameter files and serde_json for
//                    the model configuration.
//
//   metrics.rs    : Per-fold training history CSV
//
//   comparison.rs : Fold-indexed Pearson / Spearman tables,
//                    merged under an exclusive file lock.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training history CSV logger
pub mod metrics;

/// Comparison table read / merge / write
pub mod comparison;
