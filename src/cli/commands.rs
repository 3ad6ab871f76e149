// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `predict`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the encoder and classifier on an SNLI-style JSONL file
    Train(TrainArgs),

    /// Report loss and accuracy of a trained checkpoint on a labelled file
    Evaluate(EvaluateArgs),

    /// Classify one premise/hypothesis pair
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSONL file with sentence1 / sentence2 / gold_label records
    #[arg(long, default_value = "data/snli_1.0_train.jsonl")]
    pub train_path: String,

    /// Separate validation file. Without it, --val-fraction of the
    /// training examples is held out.
    #[arg(long)]
    pub valid_path: Option<String>,

    /// Directory to save checkpoints, tokenizer and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Tokens kept per sentence; longer sentences are truncated
    #[arg(long, default_value_t = 64)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Word embedding width
    #[arg(long, default_value_t = 128)]
    pub d_embed: usize,

    /// Sentence vector width
    #[arg(long, default_value_t = 256)]
    pub d_hidden: usize,

    /// Hidden layer width of the pair classifier
    #[arg(long, default_value_t = 256)]
    pub d_classifier: usize,

    /// Dropout probability in training mode
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Vocabulary size including [PAD] and [UNK]
    #[arg(long, default_value_t = 20000)]
    pub vocab_size: usize,

    /// Share of training examples held out when no --valid-path is given
    #[arg(long, default_value_t = 0.1)]
    pub val_fraction: f64,

    /// Seed for weight initialisation and the train/validation split
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_path:     a.train_path,
            valid_path:     a.valid_path,
            checkpoint_dir: a.checkpoint_dir,
            max_seq_len:    a.max_seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            d_embed:        a.d_embed,
            d_hidden:       a.d_hidden,
            d_classifier:   a.d_classifier,
            dropout:        a.dropout,
            vocab_size:     a.vocab_size,
            val_fraction:   a.val_fraction,
            seed:           a.seed,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled JSONL file to score
    #[arg(long)]
    pub data_path: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Override the batch size saved with the checkpoint
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long)]
    pub premise: String,

    #[arg(long)]
    pub hypothesis: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    #[test]
    fn test_train_args_convert_to_config() {
        let cli = Cli::try_parse_from([
            "nli-trainer", "train", "--train-path", "t.jsonl", "--epochs", "3", "--seed", "9",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.train_path, "t.jsonl");
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.seed, 9);
        assert!(cfg.valid_path.is_none());
        assert_eq!(cfg.batch_size, TrainConfig::default().batch_size);
    }

    #[test]
    fn test_predict_requires_both_sentences() {
        assert!(Cli::try_parse_from(["nli-trainer", "predict", "--premise", "A man."]).is_err());
    }

    #[test]
    fn test_evaluate_batch_size_override() {
        let cli = Cli::try_parse_from([
            "nli-trainer", "evaluate", "--data-path", "dev.jsonl", "--batch-size", "16",
        ])
        .unwrap();

        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(args.batch_size, Some(16));
        assert_eq!(args.checkpoint_dir, "checkpoints");
    }
}
