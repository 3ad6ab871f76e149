// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load SNLI examples         (Layer 4 - data)
//   Step 2: Clean the sentences        (Layer 4 - data)
//   Step 3: Build tokenizer            (Layer 6 - infra)
//   Step 4: Encode to token ids        (Layer 4 - data)
//   Step 5: Validation set             (file, or seeded split)
//   Step 6: Build datasets             (Layer 4 - data)
//   Step 7: Save config                (Layer 6 - infra)
//   Step 8: Run training loop          (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::{NliDataset, NliSample},
    loader::SnliLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::{example::NliExample, traits::ExampleSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::trainer::{run_training, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved to train_config.json so evaluation and inference can
// rebuild exactly the same encoder and classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_path:     String,
    /// Separate validation file; when absent `val_fraction` of the
    /// training examples is held out instead
    pub valid_path:     Option<String>,
    pub checkpoint_dir: String,
    pub max_seq_len:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub d_embed:        usize,
    pub d_hidden:       usize,
    pub d_classifier:   usize,
    pub dropout:        f64,
    pub vocab_size:     usize,
    pub val_fraction:   f64,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_path:     "data/snli_1.0_train.jsonl".to_string(),
            valid_path:     None,
            checkpoint_dir: "checkpoints".to_string(),
            max_seq_len:    64,
            batch_size:     64,
            epochs:         10,
            lr:             1e-3,
            d_embed:        128,
            d_hidden:       256,
            d_classifier:   256,
            dropout:        0.1,
            vocab_size:     20000,
            val_fraction:   0.1,
            seed:           1,
        }
    }
}

impl TrainConfig {
    /// Reject settings that would fail deep inside the run.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.max_seq_len > 0, "max_seq_len must be at least 1");
        ensure!(self.vocab_size > 2, "vocab_size must leave room for [PAD] and [UNK]");
        ensure!(
            (0.0..1.0).contains(&self.val_fraction),
            "val_fraction must be in [0, 1), got {}",
            self.val_fraction
        );
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must be in [0, 1), got {}",
            self.dropout
        );
        Ok(())
    }
}

/// Clean both sentences of every example.
pub(crate) fn clean_examples(examples: Vec<NliExample>, prep: &Preprocessor) -> Vec<NliExample> {
    examples
        .into_iter()
        .map(|e| NliExample::new(prep.clean(&e.premise), prep.clean(&e.hypothesis), e.label))
        .collect()
}

/// Tokenise every example into an unpadded sample.
pub(crate) fn encode_examples(
    examples:    &[NliExample],
    tokenizer:   &Tokenizer,
    max_seq_len: usize,
) -> Result<Vec<NliSample>> {
    examples
        .iter()
        .map(|e| NliSample::encode(e, tokenizer, max_seq_len))
        .collect()
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

/// Everything `run_training` needs, built from the config.
pub(crate) struct PreparedRun {
    pub train_dataset: NliDataset,
    pub val_dataset:   NliDataset,
    pub ckpt_manager:  CheckpointManager,
    pub metrics:       MetricsLogger,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let run = self.prepare()?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        run_training(
            &self.config,
            run.train_dataset,
            run.val_dataset,
            &run.ckpt_manager,
            &run.metrics,
        )
    }

    /// Steps 1-7: everything up to the first epoch.
    pub(crate) fn prepare(&self) -> Result<PreparedRun> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load examples ─────────────────────────────────────────────
        tracing::info!("Loading training examples from '{}'", cfg.train_path);
        let examples = SnliLoader::new(&cfg.train_path).load_all()?;
        ensure!(!examples.is_empty(), "No labelled examples in '{}'", cfg.train_path);
        tracing::info!("Loaded {} training examples", examples.len());

        // ── Step 2: Clean / normalise text ────────────────────────────────────
        let preprocessor = Preprocessor::new();
        let examples     = clean_examples(examples, &preprocessor);

        // ── Step 3: Build / load tokenizer ────────────────────────────────────
        // Vocabulary comes from the training sentences only
        let texts: Vec<String> = examples
            .iter()
            .flat_map(|e| [e.premise.clone(), e.hypothesis.clone()])
            .collect();
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir)
            .load_or_build(&texts, cfg.vocab_size)?;

        // ── Step 4 + 5: Encode, then pick the validation set ──────────────────
        let samples = encode_examples(&examples, &tokenizer, cfg.max_seq_len)?;
        let (train_samples, val_samples) = match &cfg.valid_path {
            Some(path) => {
                tracing::info!("Loading validation examples from '{}'", path);
                let val_examples = clean_examples(SnliLoader::new(path).load_all()?, &preprocessor);
                (samples, encode_examples(&val_examples, &tokenizer, cfg.max_seq_len)?)
            }
            None => split_train_val(samples, 1.0 - cfg.val_fraction, cfg.seed),
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 6: Build Burn datasets ───────────────────────────────────────
        let train_dataset = NliDataset::new(train_samples);
        let val_dataset   = NliDataset::new(val_samples);
        tracing::debug!("Training label counts: {:?}", train_dataset.label_counts());

        // ── Step 7: Save config for evaluation / inference ────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());

        Ok(PreparedRun { train_dataset, val_dataset, ckpt_manager, metrics })
    }
}
