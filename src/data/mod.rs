// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the raw efficiency table
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   efficiency table (.csv)
//       │
//       ▼
//   CsvLoader          → reads rows, parses list columns into Records
//       │
//       ▼
//   FoldPartitioner    → uniqueindex mod 5 → train / test per fold
//       │
//       ▼
//   FeatureEncoder     → one-hot sequence + auxiliary channels
//       │
//       ▼
//   DatasetBuilder     → per-fold feature bundles, labels, NaN scan
//       │
//       ▼
//   EfficiencyDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   EfficiencyBatcher  → stacks samples into tensor batches
//
// Each module is responsible for exactly one step.

/// Parses "[v1, v2, ...]" literals into float vectors
pub mod parser;

/// Reads the efficiency table using the csv crate
pub mod loader;

/// One-hot and auxiliary feature encoding
pub mod encoder;

/// Deterministic K-fold assignment by unique index
pub mod partitioner;

/// Builds per-fold tensors with NaN reporting
pub mod builder;

/// Implements Burn's Dataset trait for encoded examples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Carves an internal validation set out of a training partition
pub mod splitter;
