// ============================================================
// Layer 2 - EvaluateUseCase
// ============================================================
// Scores a trained checkpoint on a labelled file:
//
//   Step 1: Load config + tokenizer    (Layer 6 - infra)
//   Step 2: Rebuild + load components  (Layer 5 - ml)
//   Step 3: Load, clean, encode file   (Layer 4 - data)
//   Step 4: Evaluation loop            (Layer 5 - ml)
//
// Evaluation runs on the plain (non-autodiff) backend, so no
// gradient graph is ever built.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::application::train_use_case::{clean_examples, encode_examples};
use crate::data::{
    batcher::{NliBatchLoader, NliBatcher},
    dataset::NliDataset,
    loader::SnliLoader,
    preprocessor::Preprocessor,
};
use crate::domain::traits::ExampleSource;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    component::Component,
    evaluator::run_evaluation,
    loss::CrossEntropyCriterion,
    trainer::init_components,
};

type EvalBackend = burn::backend::Wgpu;

/// Loss and accuracy of one checkpoint on one file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub epoch:        usize,
    pub num_examples: usize,
    pub loss:         f64,
    pub accuracy:     f64,
}

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    batch_size:     Option<usize>,
}

impl EvaluateUseCase {
    /// `batch_size` overrides the one saved with the checkpoint.
    pub fn new(checkpoint_dir: String, batch_size: Option<usize>) -> Self {
        Self { checkpoint_dir, batch_size }
    }

    pub fn execute(&self, data_path: &str) -> Result<EvaluationReport> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<EvalBackend>(data_path, device)
    }

    pub fn execute_on<B: Backend>(&self, data_path: &str, device: B::Device) -> Result<EvaluationReport> {
        // ── Step 1: Config + tokenizer ────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&self.checkpoint_dir);
        let cfg          = ckpt_manager.load_config()?;
        let tokenizer    = TokenizerStore::new(&self.checkpoint_dir).load()?;

        // ── Step 2: Components ────────────────────────────────────────────────
        let epoch = ckpt_manager.preferred_epoch()?;
        let (encoder, classifier) = init_components::<B>(&cfg, &device);
        let (encoder, classifier) =
            ckpt_manager.load_components::<B, _, _>(encoder, classifier, epoch, &device)?;
        let mut encoder    = Component::new(encoder);
        let mut classifier = Component::new(classifier);

        // ── Step 3: Data ──────────────────────────────────────────────────────
        tracing::info!("Evaluating epoch {} on '{}'", epoch, data_path);
        let examples = SnliLoader::new(data_path).load_all()?;
        ensure!(!examples.is_empty(), "No labelled examples in '{}'", data_path);
        let examples = clean_examples(examples, &Preprocessor::new());
        let samples  = encode_examples(&examples, &tokenizer, cfg.max_seq_len)?;

        let batches = NliBatchLoader::new(
            NliBatcher::<B>::new(device),
            NliDataset::new(samples),
            self.batch_size.unwrap_or(cfg.batch_size),
        )?;

        // ── Step 4: Evaluate ──────────────────────────────────────────────────
        let evaluation = run_evaluation(&mut encoder, &mut classifier, &batches, &CrossEntropyCriterion)?;

        Ok(EvaluationReport {
            epoch,
            num_examples: evaluation.num_rows(),
            loss:         evaluation.loss,
            accuracy:     evaluation.accuracy(),
        })
    }
}
