// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the problem:
// records, encoded examples, run options, errors, scores and
// the estimator contract.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain Rust structs, enums, traits and pure functions
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Pearson / Spearman scores
pub mod correlation;

// Parse, encoding and pipeline errors
pub mod error;

// Encoded examples and stacked feature bundles
pub mod example;

// Model variant and loss distribution choices
pub mod options;

// One parsed input row
pub mod record;

// Core abstractions (traits) that other layers implement
pub mod traits;
