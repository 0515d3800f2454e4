// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// The data layer only touches Burn for its Dataset/Batcher
// impls; the drivers reach models through the Estimator trait.
//
// What's in this layer:
//
//   model.rs     : CrispAI network: conv over [X_nucl | X_pi],
//                   dense layer, ZINB parameter heads (μ, θ, π)
//
//   loss.rs      : ZINB negative log-likelihood and MSE
//
//   sampling.rs  : draws from the predicted ZINB distribution
//
//   callbacks.rs : early stopping and StepLR schedule
//
//   trainer.rs   : the epoch loop: forward, loss, backward,
//                   Adam step, validation, checkpoint on improvement
//
//   inferencer.rs: batched prediction and sampling on the
//                   inner (non-autodiff) backend
//
//   regressor.rs : NeuralRegressor: the Estimator implementation
//                   tying everything above together

use burn::backend::Autodiff;

/// CrispAI network and its configuration
pub mod model;

/// Training criteria
pub mod loss;

/// ZINB sampling for stochastic predictions
pub mod sampling;

/// Early stopping and learning-rate schedule
pub mod callbacks;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Prediction and sampling from a trained model
pub mod inferencer;

/// Estimator implementation over the Burn model
pub mod regressor;

#[cfg(not(feature = "backend-wgpu"))]
pub type InnerBackend = burn::backend::NdArray<f32>;

#[cfg(feature = "backend-wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

/// Backend used for training; `valid()` gives back InnerBackend.
pub type TrainBackend = Autodiff<InnerBackend>;
