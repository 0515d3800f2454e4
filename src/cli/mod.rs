// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`: cross-validated training, one model per fold
//   2. `eval` : sampling-based scoring of the trained folds
//
// Any other run mode is rejected by clap with a usage message.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, TrainArgs};

use crate::domain::correlation::FoldScore;

#[derive(Parser, Debug)]
#[command(
    name = "crispai",
    version = "0.1.0",
    about = "Cross-validated training and evaluation of the CrispAI editing-efficiency model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Eval(args)  => run_eval(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.data.data.display());
    let scores = TrainUseCase::new(args.into()).execute()?;
    print_scores("Training", &scores);
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    tracing::info!("Evaluating models in '{}'", args.data.output.display());
    let scores = EvalUseCase::new(args.into()).execute()?;
    print_scores("Evaluation", &scores);
    Ok(())
}

fn print_scores(title: &str, scores: &[FoldScore]) {
    println!("\n{title} results");
    println!("{:>4}  {:>8}  {:>8}", "fold", "pearson", "spearman");
    for s in scores {
        println!("{:>4}  {:>8.4}  {:>8.4}", s.fold, s.pearson, s.spearman);
    }
}
