// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Classifies a single premise/hypothesis pair with a trained
// checkpoint:
//
//   clean → tokenise → batch of one → encode both sides →
//   classify → softmax → argmax
//
// Both components stay in Eval mode for the lifetime of the
// inferencer, so a prediction is deterministic.
//
// Reference: Burn Book §6 (Inference)

use anyhow::{Context, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::activation::softmax};
use tokenizers::Tokenizer;

use crate::data::{
    batcher::NliBatcher,
    dataset::NliSample,
    preprocessor::Preprocessor,
};
use crate::domain::{
    example::{NliExample, NliLabel},
    traits::{PairPredictor, Prediction},
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    classifier::FeatureClassifier,
    component::Component,
    encoder::PooledEncoder,
    trainer::init_components,
};

type InferBackend = burn::backend::Wgpu;

pub struct Inferencer<B: Backend> {
    encoder:      Component<PooledEncoder<B>>,
    classifier:   Component<FeatureClassifier<B>>,
    tokenizer:    Tokenizer,
    batcher:      NliBatcher<B>,
    preprocessor: Preprocessor,
    max_seq_len:  usize,
}

impl Inferencer<InferBackend> {
    /// Load the preferred checkpoint (best epoch, else latest) onto the
    /// default WGPU device.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, tokenizer: Tokenizer) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        Self::load(ckpt_manager, tokenizer, device)
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn load(
        ckpt_manager: &CheckpointManager,
        tokenizer:    Tokenizer,
        device:       B::Device,
    ) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let epoch = ckpt_manager.preferred_epoch()?;

        let (encoder, classifier) = init_components::<B>(&cfg, &device);
        let (encoder, classifier) =
            ckpt_manager.load_components::<B, _, _>(encoder, classifier, epoch, &device)?;
        tracing::info!("Model loaded from checkpoint (epoch {})", epoch);

        Ok(Self::new(encoder, classifier, tokenizer, cfg.max_seq_len, device))
    }

    pub fn new(
        encoder:     PooledEncoder<B>,
        classifier:  FeatureClassifier<B>,
        tokenizer:   Tokenizer,
        max_seq_len: usize,
        device:      B::Device,
    ) -> Self {
        Self {
            encoder:      Component::new(encoder),
            classifier:   Component::new(classifier),
            tokenizer,
            batcher:      NliBatcher::new(device),
            preprocessor: Preprocessor::new(),
            max_seq_len,
        }
    }

    /// Softmax probability of every label, indexed like `NliLabel::index`.
    pub fn probabilities(&self, premise: &str, hypothesis: &str) -> Result<Vec<f32>> {
        // The label is a placeholder; only the token ids are used
        let example = NliExample::new(
            self.preprocessor.clean(premise),
            self.preprocessor.clean(hypothesis),
            NliLabel::Entailment,
        );
        let sample = NliSample::encode(&example, &self.tokenizer, self.max_seq_len)?;
        let batch  = self.batcher.batch(vec![sample]);

        let u = self.encoder.encode(batch.premise_tokens, batch.premise_restore, batch.premise_lengths);
        let v = self.encoder.encode(
            batch.hypothesis_tokens,
            batch.hypothesis_restore,
            batch.hypothesis_lengths,
        );
        let scores = self.classifier.classify(u, v); // [1, num_classes]

        Ok(softmax(scores, 1).into_data().iter::<f32>().collect())
    }
}

impl<B: Backend> PairPredictor for Inferencer<B> {
    fn predict(&self, premise: &str, hypothesis: &str) -> Result<Prediction> {
        let probs = self.probabilities(premise, hypothesis)?;

        // Strict '>' keeps the lowest index on ties
        let (index, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _                        => Some((i, p)),
            })
            .context("Classifier returned no scores")?;

        let label = NliLabel::from_index(index)
            .with_context(|| format!("Classifier produced unknown class index {index}"))?;

        tracing::debug!("Predicted {} (confidence {:.4})", label, confidence);
        Ok(Prediction { label, confidence })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    use crate::application::train_use_case::TrainConfig;
    use crate::infra::tokenizer_store::TokenizerStore;

    type TestBackend = NdArray<f32>;

    fn small_config(dir: &str) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.to_string(),
            d_embed:        4,
            d_hidden:       4,
            d_classifier:   8,
            vocab_size:     32,
            ..TrainConfig::default()
        }
    }

    fn tokenizer(dir: &str) -> Tokenizer {
        TokenizerStore::new(dir)
            .load_or_build(&["a man is sleeping".to_string(), "a woman runs".to_string()], 32)
            .unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().to_string_lossy().to_string();
        let cfg    = small_config(&path);
        let device = Default::default();

        let (encoder, classifier) = init_components::<TestBackend>(&cfg, &device);
        let inferencer = Inferencer::new(encoder, classifier, tokenizer(&path), cfg.max_seq_len, device);

        let probs = inferencer.probabilities("A man is sleeping.", "A woman runs.").unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        let prediction = inferencer.predict("A man is sleeping.", "A woman runs.").unwrap();
        assert!((0.0..=1.0).contains(&prediction.confidence));
        assert_eq!(prediction.confidence, probs[prediction.label.index()]);
    }

    #[test]
    fn test_loaded_inferencer_matches_saved_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().to_string_lossy().to_string();
        let cfg    = small_config(&path);
        let device = Default::default();
        let ckpt   = CheckpointManager::new(&path);

        let (encoder, classifier) = init_components::<TestBackend>(&cfg, &device);
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_components::<TestBackend, _, _>(&encoder, &classifier, 1).unwrap();

        let original = Inferencer::new(encoder, classifier, tokenizer(&path), cfg.max_seq_len, device);
        let loaded   = Inferencer::<TestBackend>::load(&ckpt, tokenizer(&path), Default::default()).unwrap();

        assert_eq!(
            original.probabilities("a man", "a woman").unwrap(),
            loaded.probabilities("a man", "a woman").unwrap(),
        );
    }

    #[test]
    fn test_empty_sentences_still_predict() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().to_string_lossy().to_string();
        let cfg    = small_config(&path);
        let device = Default::default();

        let (encoder, classifier) = init_components::<TestBackend>(&cfg, &device);
        let inferencer = Inferencer::new(encoder, classifier, tokenizer(&path), cfg.max_seq_len, device);

        assert!(inferencer.predict("", "   ").is_ok());
    }
}
