// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or evaluating the fold models).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing or printing here (that's Layer 1)
//   - Only workflow coordination
//
// The two drivers (TrainingDriver, EvaluationDriver) only see
// the Estimator traits, so their control flow is tested with
// in-memory fakes.

// Steps shared by both workflows
pub mod pipeline;

// Cross-validated training
pub mod train_use_case;

// Sampling-based evaluation and table merge
pub mod eval_use_case;
