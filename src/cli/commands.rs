// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `eval`, and their
// flags. Flags both commands share live in DataArgs and are
// flattened into each.
//
// --model and --distribution keep their loose matching: "base"
// selects the base variant and anything else the long one;
// "negative_binomial" selects the ZINB loss and anything else
// MSE.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::eval_use_case::EvalConfig;
use crate::application::pipeline::DataConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::encoder::UnknownSymbolPolicy;
use crate::domain::options::{LossDistribution, ModelVariant};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train one model per fold and report held-out correlations
    Train(TrainArgs),

    /// Score trained fold models and merge into the comparison tables
    Eval(EvalArgs),
}

/// Arguments shared by `train` and `eval`.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Efficiency table (CSV)
    #[arg(long, default_value = "data/crispai-90k-filtered.csv")]
    pub data: PathBuf,

    /// Directory holding fold parameters, histories and model config
    #[arg(long, default_value = "crispAI/trained_models")]
    pub output: PathBuf,

    /// Model variant: "base" (23 nt), anything else selects the 60 nt variant
    #[arg(long, default_value = "base")]
    pub model: ModelVariant,

    /// JSON model configuration to start from
    #[arg(long)]
    pub model_config: Option<PathBuf>,

    /// Handling of symbols outside A C G T N -: reject | zero-fill
    #[arg(long, default_value = "reject")]
    pub unknown_symbols: UnknownSymbolPolicy,

    /// Fail instead of warning when encoded tensors contain NaN
    #[arg(long)]
    pub strict_nan: bool,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Seed for shuffling, initialisation and sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<DataArgs> for DataConfig {
    fn from(a: DataArgs) -> Self {
        DataConfig {
            data_path:       a.data,
            output_dir:      a.output,
            model:           a.model,
            model_config:    a.model_config,
            unknown_symbols: a.unknown_symbols,
            strict_nan:      a.strict_nan,
            folds:           a.folds,
            seed:            a.seed,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Loss: "negative_binomial" (ZINB), anything else trains with MSE
    #[arg(long, default_value = "negative_binomial")]
    pub distribution: LossDistribution,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Maximum number of epochs per fold
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    /// Run every epoch regardless of validation loss
    #[arg(long)]
    pub no_early_stopping: bool,

    /// Internal validation split as a fold count (5 holds out the first fifth)
    #[arg(long, default_value_t = 5)]
    pub valid_folds: usize,

    /// Enable the StepLR learning-rate schedule
    #[arg(long)]
    pub use_scheduler: bool,

    #[arg(long, default_value_t = 5)]
    pub scheduler_step_size: usize,

    #[arg(long, default_value_t = 0.1)]
    pub scheduler_gamma: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data:                a.data.into(),
            distribution:        a.distribution,
            batch_size:          a.batch_size,
            lr:                  a.lr,
            epochs:              a.epochs,
            patience:            a.patience,
            early_stopping:      !a.no_early_stopping,
            valid_folds:         a.valid_folds,
            use_scheduler:       a.use_scheduler,
            scheduler_step_size: a.scheduler_step_size,
            scheduler_gamma:     a.scheduler_gamma,
        }
    }
}

/// All arguments for the `eval` command.
#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Stochastic samples drawn per test example
    #[arg(long, default_value_t = 100)]
    pub samples: usize,

    /// Column to write in the comparison tables
    #[arg(long, default_value = "crispAI")]
    pub column: String,

    #[arg(long, default_value = "data/pridict_90k_pearson.csv")]
    pub pearson_table: PathBuf,

    #[arg(long, default_value = "data/pridict_90k_spearman.csv")]
    pub spearman_table: PathBuf,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,
}

impl From<EvalArgs> for EvalConfig {
    fn from(a: EvalArgs) -> Self {
        EvalConfig {
            data:           a.data.into(),
            n_samples:      a.samples,
            column:         a.column,
            pearson_table:  a.pearson_table,
            spearman_table: a.spearman_table,
            batch_size:     a.batch_size,
        }
    }
}
