// ============================================================
// Layer 5 - Training Loop
// ============================================================
// One training epoch, per batch, in the order the batch source
// yields them:
//
//   zero_grad → move to device → encode premise, encode
//   hypothesis (same encoder, two calls) → classify → loss →
//   backward → step → accumulate → maybe print progress
//
// The epoch total is the dataset mean loss:
//
//   total += batch_loss * batch_size / num_items
//
// so a short final batch counts for exactly its share.
//
// `run_training` wraps the epoch in the full run: validation
// on inner-backend copies, metrics CSV, checkpoints and
// best-epoch tracking.
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - component.valid() gives a copy on the inner backend (Wgpu)
//   - Validation batcher must also use B::InnerBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{BatchSource, NliBatchLoader, NliBatcher},
    dataset::NliDataset,
};
use crate::domain::mode::Mode;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    progress::{is_report_due, BatchProgress, ProgressReporter},
};
use crate::ml::{
    classifier::{FeatureClassifier, FeatureClassifierConfig},
    component::{Component, PairClassifier, SentenceEncoder},
    encoder::{PooledEncoder, PooledEncoderConfig},
    evaluator::run_evaluation_no_grad,
    loss::{CrossEntropyCriterion, PairLoss},
    optimizer::{joint_adam, PairOptimizer},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Single Epoch ─────────────────────────────────────────────────────────────
/// Train for one pass over `batches`, printing progress lines to stdout.
///
/// Returns the dataset mean loss. An empty source returns 0.0 without
/// touching the components' parameters.
pub fn run_training_epoch<B, E, C, L, O, S>(
    encoder:    &mut Component<E>,
    classifier: &mut Component<C>,
    batches:    &S,
    loss_fn:    &L,
    optimizer:  &mut O,
    epoch:      usize,
) -> Result<f64>
where
    B: AutodiffBackend,
    E: SentenceEncoder<B> + AutodiffModule<B>,
    C: PairClassifier<B> + AutodiffModule<B>,
    L: PairLoss,
    O: PairOptimizer<B, E, C>,
    S: BatchSource<Backend = B> + ?Sized,
{
    let mut reporter = ProgressReporter::stdout();
    let total = run_training_epoch_with(
        encoder,
        classifier,
        batches,
        loss_fn,
        optimizer,
        epoch,
        |p| reporter.report(p),
    );
    reporter.finish();
    total
}

/// Same as [`run_training_epoch`], handing each due progress snapshot to
/// `on_progress` instead of printing it.
pub fn run_training_epoch_with<B, E, C, L, O, S, F>(
    encoder:     &mut Component<E>,
    classifier:  &mut Component<C>,
    batches:     &S,
    loss_fn:     &L,
    optimizer:   &mut O,
    epoch:       usize,
    mut on_progress: F,
) -> Result<f64>
where
    B: AutodiffBackend,
    E: SentenceEncoder<B> + AutodiffModule<B>,
    C: PairClassifier<B> + AutodiffModule<B>,
    L: PairLoss,
    O: PairOptimizer<B, E, C>,
    S: BatchSource<Backend = B> + ?Sized,
    F: FnMut(&BatchProgress),
{
    encoder.set_mode(Mode::Train);
    classifier.set_mode(Mode::Train);

    // Malformed batches fail here, before any parameter is touched
    batches.check()?;

    let num_items   = batches.num_items();
    let num_batches = batches.num_batches();
    if num_batches == 0 {
        tracing::warn!("Epoch {}: empty batch source, nothing to train on", epoch);
        optimizer.zero_grad();
        return Ok(0.0);
    }

    let device = encoder.module().devices().into_iter().next();
    let mut total_loss = 0.0f64;

    for (batch_idx, batch) in batches.batches().enumerate() {
        // ── Step 1: Clear gradients ───────────────────────────────────────────
        optimizer.zero_grad();

        // ── Step 2: Device residency + shape check ────────────────────────────
        let batch = match &device {
            Some(device) => batch.to_device(device),
            None         => batch,
        };
        let batch_size = batch.validate()?;

        // ── Step 3: Forward ───────────────────────────────────────────────────
        let u = encoder.encode(batch.premise_tokens, batch.premise_restore, batch.premise_lengths);
        let v = encoder.encode(
            batch.hypothesis_tokens,
            batch.hypothesis_restore,
            batch.hypothesis_lengths,
        );
        let scores = classifier.classify(u, v);
        let loss   = loss_fn.forward(scores, batch.labels);
        let batch_loss: f64 = loss.clone().into_scalar().elem::<f64>();

        // ── Step 4: Backward + update ─────────────────────────────────────────
        optimizer.backward(loss, encoder, classifier);
        optimizer.step(encoder, classifier);

        // ── Step 5: Accumulate + report ───────────────────────────────────────
        total_loss += batch_loss * batch_size as f64 / num_items as f64;

        if is_report_due(batch_idx, num_items, batch_size) {
            on_progress(&BatchProgress {
                epoch,
                batch_idx,
                batch_size,
                num_items,
                num_batches,
                loss: batch_loss,
            });
        }
    }

    optimizer.zero_grad();
    Ok(total_loss)
}

// ─── Full Run ─────────────────────────────────────────────────────────────────
/// Fresh encoder and classifier with the sizes in `cfg`.
///
/// Evaluation and inference call this with the saved config before
/// loading weights, so the architecture always matches the checkpoint.
pub fn init_components<B: Backend>(
    cfg:    &TrainConfig,
    device: &B::Device,
) -> (PooledEncoder<B>, FeatureClassifier<B>) {
    let encoder = PooledEncoderConfig::new(cfg.vocab_size, cfg.d_embed, cfg.d_hidden)
        .with_dropout(cfg.dropout)
        .init::<B>(device);
    let classifier = FeatureClassifierConfig::new(encoder.output_dim(), cfg.d_classifier)
        .with_dropout(cfg.dropout)
        .init::<B>(device);
    (encoder, classifier)
}

/// What a finished run reports back to the use case.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochMetrics>,
    /// Epoch with the lowest validation loss, if any validation ran
    pub best:   Option<EpochMetrics>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: NliDataset,
    val_dataset:   NliDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, train_dataset, val_dataset, ckpt_manager, metrics, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: NliDataset,
    val_dataset:   NliDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<TrainingSummary> {
    B::seed(cfg.seed);

    // ── Build components ──────────────────────────────────────────────────────
    let (encoder, classifier) = init_components::<B>(cfg, &device);
    let mut encoder    = Component::new(encoder);
    let mut classifier = Component::new(classifier);
    tracing::info!(
        "Components ready: d_embed={}, d_hidden={}, d_classifier={}",
        cfg.d_embed, cfg.d_hidden, cfg.d_classifier,
    );

    let mut optimizer = joint_adam::<B, PooledEncoder<B>, FeatureClassifier<B>>(cfg.lr);
    let loss_fn       = CrossEntropyCriterion;

    // ── Batch sources ─────────────────────────────────────────────────────────
    let train_batches = NliBatchLoader::new(
        NliBatcher::<B>::new(device.clone()),
        train_dataset,
        cfg.batch_size,
    )?;
    // Validation runs on the inner backend, no autodiff overhead
    let val_batches = NliBatchLoader::new(
        NliBatcher::<B::InnerBackend>::new(device.clone()),
        val_dataset,
        cfg.batch_size,
    )?;
    if val_batches.num_items() == 0 {
        tracing::warn!("No validation examples: val_loss and val_accuracy will be NaN");
    }

    // A best_epoch.json left by an earlier run would outrank this run's epochs
    ckpt_manager.clear_best_epoch()?;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history: Vec<EpochMetrics> = Vec::with_capacity(cfg.epochs);
    let mut best: Option<EpochMetrics> = None;

    for epoch in 1..=cfg.epochs {
        let train_loss = run_training_epoch(
            &mut encoder,
            &mut classifier,
            &train_batches,
            &loss_fn,
            &mut optimizer,
            epoch,
        )?;

        let (val_loss, val_accuracy) = if val_batches.num_items() > 0 {
            let eval = run_evaluation_no_grad::<B, _, _, _, _>(
                &mut encoder,
                &mut classifier,
                &val_batches,
                &loss_fn,
            )?;
            (eval.loss, eval.accuracy())
        } else {
            (f64::NAN, f64::NAN)
        };

        let row = EpochMetrics::new(epoch, train_loss, val_loss, val_accuracy);
        metrics.log(&row)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.2}%",
            epoch, cfg.epochs, train_loss, val_loss, val_accuracy,
        );

        ckpt_manager.save_components::<B, _, _>(encoder.module(), classifier.module(), epoch)?;

        let best_val_loss = best.as_ref().map_or(f64::INFINITY, |b| b.val_loss);
        if row.is_improvement(best_val_loss) {
            ckpt_manager.save_best_epoch(epoch)?;
            tracing::info!("New best epoch {} (val_loss={:.4})", epoch, val_loss);
            best = Some(row.clone());
        }
        history.push(row);
    }

    tracing::info!("Training complete!");
    Ok(TrainingSummary { epochs: history, best })
}
