// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    - trains encoder + classifier on a JSONL file
//   2. `evaluate` - loss and accuracy of a checkpoint on a file
//   3. `predict`  - label of one premise/hypothesis pair
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

use crate::domain::traits::PairPredictor;

#[derive(Parser, Debug)]
#[command(
    name = "nli-trainer",
    version,
    about = "Train and evaluate a sentence-pair (NLI) classifier, then classify new pairs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.train_path);
    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.best {
        Some(best) => println!(
            "Training complete. Best epoch {} (val_loss={:.4}, val_acc={:.2}%).",
            best.epoch, best.val_loss, best.val_accuracy,
        ),
        None => println!("Training complete. Checkpoint saved."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.checkpoint_dir, args.batch_size)
        .execute(&args.data_path)?;

    println!(
        "Epoch {} on {} examples | loss={:.6} | accuracy={:.2}%",
        report.epoch, report.num_examples, report.loss, report.accuracy,
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case   = PredictUseCase::from_checkpoint(&args.checkpoint_dir)?;
    let prediction = use_case.predict(&args.premise, &args.hypothesis)?;

    println!("\nLabel: {} (confidence {:.2}%)", prediction.label, prediction.confidence * 100.0);
    Ok(())
}
