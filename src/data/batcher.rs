// ============================================================
// Layer 4 - NLI Batcher and Batch Source
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<NliSample>
// into device tensors, and the ordered Batch Source the
// training and evaluation loops iterate over.
//
// One NliBatch holds seven tensors, all with batch_size rows:
//
//   premise_tokens      [batch, max_premise_len]     padded ids
//   premise_restore     [batch]                      original-order indices
//   premise_lengths     [batch]                      true lengths
//   hypothesis_tokens   [batch, max_hypothesis_len]
//   hypothesis_restore  [batch]
//   hypothesis_lengths  [batch]
//   labels              [batch]                      class indices
//
// Padding is dynamic: each side is padded to the longest
// sequence of that side in the batch, not to a global maximum.
//
// Each side's rows are stored longest-first (the layout packed
// recurrent encoders expect). The restore indices undo that:
// for an encoder output `out` in row order,
//
//   out.select(0, restore)  →  row i belongs to example i
//
// so premise and hypothesis encodings line up with the labels
// again even though the two sides are sorted independently.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{ensure, Context, Result};
use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::{NliDataset, NliSample, PAD_ID};

// ─── NliBatch ─────────────────────────────────────────────────────────────────
/// A batch of NLI pairs ready for the encoder/classifier forward pass.
#[derive(Debug, Clone)]
pub struct NliBatch<B: Backend> {
    pub premise_tokens:     Tensor<B, 2, Int>,
    pub premise_restore:    Tensor<B, 1, Int>,
    pub premise_lengths:    Tensor<B, 1, Int>,
    pub hypothesis_tokens:  Tensor<B, 2, Int>,
    pub hypothesis_restore: Tensor<B, 1, Int>,
    pub hypothesis_lengths: Tensor<B, 1, Int>,
    pub labels:             Tensor<B, 1, Int>,
}

impl<B: Backend> NliBatch<B> {
    /// Number of examples, read from the label vector
    pub fn batch_size(&self) -> usize {
        self.labels.dims()[0]
    }

    /// Check the batch invariants and return the batch size.
    ///
    /// Fails if the batch is empty, if any of the seven fields disagrees
    /// on the batch dimension, or if a token tensor has zero width.
    pub fn validate(&self) -> Result<usize> {
        let batch_size = self.batch_size();
        ensure!(batch_size > 0, "Invalid batch: zero examples");

        let rows = [
            ("premise_tokens",     self.premise_tokens.dims()[0]),
            ("premise_restore",    self.premise_restore.dims()[0]),
            ("premise_lengths",    self.premise_lengths.dims()[0]),
            ("hypothesis_tokens",  self.hypothesis_tokens.dims()[0]),
            ("hypothesis_restore", self.hypothesis_restore.dims()[0]),
            ("hypothesis_lengths", self.hypothesis_lengths.dims()[0]),
        ];
        for (field, n) in rows {
            ensure!(
                n == batch_size,
                "Invalid batch: {field} has {n} rows but labels has {batch_size}"
            );
        }

        ensure!(
            self.premise_tokens.dims()[1] > 0 && self.hypothesis_tokens.dims()[1] > 0,
            "Invalid batch: token tensors must have at least one column"
        );
        Ok(batch_size)
    }

    /// Move every tensor to `device`. No-op for tensors already there.
    pub fn to_device(self, device: &B::Device) -> Self {
        Self {
            premise_tokens:     self.premise_tokens.to_device(device),
            premise_restore:    self.premise_restore.to_device(device),
            premise_lengths:    self.premise_lengths.to_device(device),
            hypothesis_tokens:  self.hypothesis_tokens.to_device(device),
            hypothesis_restore: self.hypothesis_restore.to_device(device),
            hypothesis_lengths: self.hypothesis_lengths.to_device(device),
            labels:             self.labels.to_device(device),
        }
    }
}

// ─── NliBatcher ───────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct NliBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> NliBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Padded, length-sorted tensors for one side (premise or hypothesis).
struct PaddedSide<B: Backend> {
    tokens:  Tensor<B, 2, Int>,
    restore: Tensor<B, 1, Int>,
    lengths: Tensor<B, 1, Int>,
}

fn pad_side<B: Backend>(sequences: &[&[u32]], device: &B::Device) -> PaddedSide<B> {
    let batch_size = sequences.len();
    let max_len    = sequences.iter().map(|s| s.len()).max().unwrap_or(0).max(1);

    // Longest first; sort_by is stable so equal lengths keep example order
    let mut order: Vec<usize> = (0..batch_size).collect();
    order.sort_by(|&a, &b| sequences[b].len().cmp(&sequences[a].len()));

    let mut flat    = Vec::with_capacity(batch_size * max_len);
    let mut lengths = Vec::with_capacity(batch_size);
    let mut restore = vec![0i64; batch_size];

    for (row, &example) in order.iter().enumerate() {
        let seq = sequences[example];
        restore[example] = row as i64;
        lengths.push(seq.len() as i64);
        flat.extend(seq.iter().map(|&id| id as i64));
        flat.extend(std::iter::repeat(PAD_ID as i64).take(max_len - seq.len()));
    }

    PaddedSide {
        tokens:  Tensor::from_data(TensorData::new(flat, [batch_size, max_len]), device),
        restore: Tensor::from_data(TensorData::new(restore, [batch_size]), device),
        lengths: Tensor::from_data(TensorData::new(lengths, [batch_size]), device),
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<NliSample, NliBatch<B>> for NliBatcher<B> {
    fn batch(&self, items: Vec<NliSample>) -> NliBatch<B> {
        let premises: Vec<&[u32]>   = items.iter().map(|s| s.premise_ids.as_slice()).collect();
        let hypotheses: Vec<&[u32]> = items.iter().map(|s| s.hypothesis_ids.as_slice()).collect();
        let labels: Vec<i64>        = items.iter().map(|s| s.label as i64).collect();

        let premise    = pad_side::<B>(&premises, &self.device);
        let hypothesis = pad_side::<B>(&hypotheses, &self.device);
        let labels     = Tensor::from_data(TensorData::new(labels, [items.len()]), &self.device);

        NliBatch {
            premise_tokens:     premise.tokens,
            premise_restore:    premise.restore,
            premise_lengths:    premise.lengths,
            hypothesis_tokens:  hypothesis.tokens,
            hypothesis_restore: hypothesis.restore,
            hypothesis_lengths: hypothesis.lengths,
            labels,
        }
    }
}

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// An ordered, finite, restartable sequence of batches.
///
/// Every call to `batches()` starts a fresh pass in the same order.
/// `num_items` and `num_batches` are used for loss weighting and
/// progress arithmetic only.
///
/// The loops call `check()` once before touching any parameter, so a
/// malformed batch anywhere in the pass is reported up front.
pub trait BatchSource {
    type Backend: Backend;

    /// Fail if any batch of a pass would be malformed
    fn check(&self) -> Result<()>;

    /// Total number of examples across all batches
    fn num_items(&self) -> usize;

    /// Number of batches one pass yields
    fn num_batches(&self) -> usize;

    /// Start a new pass over the batches, in order
    fn batches(&self) -> Box<dyn Iterator<Item = NliBatch<Self::Backend>> + '_>;
}

/// Sequential batch source over an NliDataset.
///
/// Burn's multi-worker DataLoader may hand batches back out of order;
/// evaluation pairs scores with labels by position, so this loader
/// always batches indices [0, bs), [bs, 2bs), ... in turn.
pub struct NliBatchLoader<B: Backend> {
    batcher:    NliBatcher<B>,
    dataset:    NliDataset,
    batch_size: usize,
}

impl<B: Backend> NliBatchLoader<B> {
    pub fn new(batcher: NliBatcher<B>, dataset: NliDataset, batch_size: usize) -> Result<Self> {
        ensure!(batch_size > 0, "batch_size must be at least 1");
        Ok(Self { batcher, dataset, batch_size })
    }
}

impl<B: Backend> BatchSource for NliBatchLoader<B> {
    type Backend = B;

    /// The batcher builds all seven fields from the same samples, so the
    /// only thing left to check is that no sentence is empty.
    fn check(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        if let Some(index) = self
            .dataset
            .iter()
            .position(|s| s.premise_ids.is_empty() || s.hypothesis_ids.is_empty())
        {
            anyhow::bail!("Invalid sample {index}: a sentence has no tokens");
        }
        Ok(())
    }

    fn num_items(&self) -> usize {
        self.dataset.len()
    }

    fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    fn batches(&self) -> Box<dyn Iterator<Item = NliBatch<B>> + '_> {
        let len = self.dataset.len();
        Box::new((0..len).step_by(self.batch_size).map(move |start| {
            let end   = (start + self.batch_size).min(len);
            let items = (start..end).filter_map(|i| self.dataset.get(i)).collect();
            self.batcher.batch(items)
        }))
    }
}

/// Pre-built batches are a batch source too (handy for fixtures).
impl<B: Backend> BatchSource for Vec<NliBatch<B>> {
    type Backend = B;

    fn check(&self) -> Result<()> {
        for (idx, batch) in self.as_slice().iter().enumerate() {
            batch.validate().with_context(|| format!("Batch {idx} is malformed"))?;
        }
        Ok(())
    }

    fn num_items(&self) -> usize {
        self.as_slice().iter().map(NliBatch::batch_size).sum()
    }

    fn num_batches(&self) -> usize {
        self.len()
    }

    fn batches(&self) -> Box<dyn Iterator<Item = NliBatch<B>> + '_> {
        Box::new(self.as_slice().iter().cloned())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn ints(t: Tensor<TestBackend, 1, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    fn sample(premise_len: usize, hypothesis_len: usize, label: usize) -> NliSample {
        NliSample {
            premise_ids:    (0..premise_len as u32).map(|i| i + 2).collect(),
            hypothesis_ids: (0..hypothesis_len as u32).map(|i| i + 10).collect(),
            label,
        }
    }

    #[test]
    fn test_batch_shapes_and_padding() {
        let batcher = NliBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(1, 2, 0), sample(3, 1, 1), sample(2, 2, 2)]);

        assert_eq!(batch.premise_tokens.dims(), [3, 3]);
        assert_eq!(batch.hypothesis_tokens.dims(), [3, 2]);
        assert_eq!(batch.validate().unwrap(), 3);

        // Rows are longest first: example 1 (len 3), example 2 (len 2), example 0 (len 1)
        assert_eq!(ints(batch.premise_lengths), vec![3, 2, 1]);
        let tokens: Vec<i64> = batch.premise_tokens.into_data().iter::<i64>().collect();
        assert_eq!(tokens, vec![2, 3, 4, 2, 3, 0, 2, 0, 0]);

        // Labels stay in example order
        assert_eq!(ints(batch.labels), vec![0, 1, 2]);
    }

    #[test]
    fn test_restore_indices_undo_length_sort() {
        let batcher = NliBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(1, 2, 0), sample(3, 1, 1), sample(2, 2, 2)]);

        // example 0 sits in row 2, example 1 in row 0, example 2 in row 1
        assert_eq!(ints(batch.premise_restore.clone()), vec![2, 0, 1]);

        // Selecting the lengths with the restore indices gives example order
        let lengths = batch.premise_lengths.select(0, batch.premise_restore);
        assert_eq!(ints(lengths), vec![1, 3, 2]);

        // Ties keep example order: hypothesis lengths are 2, 1, 2
        assert_eq!(ints(batch.hypothesis_restore), vec![0, 2, 1]);
    }

    #[test]
    fn test_validate_rejects_mismatched_batch_dimension() {
        let batcher   = NliBatcher::<TestBackend>::new(Default::default());
        let mut batch = batcher.batch(vec![sample(2, 2, 0), sample(2, 2, 1)]);
        batch.labels  = batch.labels.slice([0..1]);

        let err = batch.validate().unwrap_err().to_string();
        assert!(err.contains("premise_tokens"), "unexpected error: {err}");
    }

    #[test]
    fn test_loader_batches_in_order_with_remainder() {
        let samples: Vec<NliSample> = (0..7).map(|i| sample(2, 2, i % 3)).collect();
        let loader = NliBatchLoader::new(
            NliBatcher::<TestBackend>::new(Default::default()),
            NliDataset::new(samples),
            3,
        )
        .unwrap();

        assert_eq!(loader.num_items(), 7);
        assert_eq!(loader.num_batches(), 3);

        let sizes: Vec<usize> = loader.batches().map(|b| b.batch_size()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);

        let labels: Vec<i64> = loader.batches().flat_map(|b| ints(b.labels)).collect();
        assert_eq!(labels, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_loader_rejects_zero_batch_size() {
        let result = NliBatchLoader::new(
            NliBatcher::<TestBackend>::new(Default::default()),
            NliDataset::new(vec![sample(1, 1, 0)]),
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_vec_is_a_batch_source() {
        let batcher = NliBatcher::<TestBackend>::new(Default::default());
        let batches = vec![
            batcher.batch(vec![sample(1, 1, 0), sample(1, 1, 1)]),
            batcher.batch(vec![sample(1, 1, 2)]),
        ];
        assert_eq!(batches.num_items(), 3);
        assert_eq!(batches.num_batches(), 2);
        assert_eq!(batches.batches().count(), 2);
        assert!(batches.check().is_ok());
    }

    #[test]
    fn test_vec_check_names_the_malformed_batch() {
        let batcher = NliBatcher::<TestBackend>::new(Default::default());
        let good    = batcher.batch(vec![sample(1, 1, 0), sample(1, 1, 1)]);
        let mut bad = batcher.batch(vec![sample(2, 2, 0), sample(2, 2, 1), sample(2, 2, 2)]);
        bad.labels  = bad.labels.slice([0..2]);

        let err = vec![good, bad].check().unwrap_err();
        assert!(format!("{err:#}").contains("Batch 1"), "unexpected error: {err:#}");
    }

    #[test]
    fn test_vec_check_rejects_zero_row_batch() {
        let device = Default::default();
        let empty_1d = || {
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(Vec::<i64>::new(), [0]), &device)
        };
        let empty_2d = || {
            Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(Vec::<i64>::new(), [0, 1]), &device)
        };
        let batch = NliBatch {
            premise_tokens:     empty_2d(),
            premise_restore:    empty_1d(),
            premise_lengths:    empty_1d(),
            hypothesis_tokens:  empty_2d(),
            hypothesis_restore: empty_1d(),
            hypothesis_lengths: empty_1d(),
            labels:             empty_1d(),
        };

        assert_eq!(vec![batch.clone()].num_items(), 0);
        assert!(vec![batch].check().is_err());
    }

    #[test]
    fn test_loader_check_rejects_empty_sentence() {
        let mut empty = sample(1, 1, 0);
        empty.hypothesis_ids.clear();
        let loader = NliBatchLoader::new(
            NliBatcher::<TestBackend>::new(Default::default()),
            NliDataset::new(vec![sample(1, 1, 0), empty]),
            2,
        )
        .unwrap();

        let err = loader.check().unwrap_err().to_string();
        assert!(err.contains("sample 1"), "unexpected error: {err}");
    }
}
