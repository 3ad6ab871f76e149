use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::example::{NliExample, NUM_CLASSES};

/// Padding token id. Must stay 0: the batcher pads with it and the
/// tokenizer store reserves it.
pub const PAD_ID: u32 = 0;

/// Out-of-vocabulary token id.
pub const UNK_ID: u32 = 1;

/// One tokenised premise/hypothesis pair, not yet padded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NliSample {
    pub premise_ids:    Vec<u32>,
    pub hypothesis_ids: Vec<u32>,
    pub label:          usize,
}

impl NliSample {
    /// Tokenise both sentences of `example`, truncating each side to
    /// `max_seq_len` tokens. A side that tokenises to nothing becomes a
    /// single [UNK] so every sequence has a true length of at least 1.
    pub fn encode(example: &NliExample, tokenizer: &Tokenizer, max_seq_len: usize) -> Result<Self> {
        Ok(Self {
            premise_ids:    encode_sentence(tokenizer, &example.premise, max_seq_len)?,
            hypothesis_ids: encode_sentence(tokenizer, &example.hypothesis, max_seq_len)?,
            label:          example.label.index(),
        })
    }
}

fn encode_sentence(tokenizer: &Tokenizer, text: &str, max_seq_len: usize) -> Result<Vec<u32>> {
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    let mut ids = enc.get_ids().to_vec();
    ids.truncate(max_seq_len.max(1));
    if ids.is_empty() {
        ids.push(UNK_ID);
    }
    Ok(ids)
}

pub struct NliDataset {
    samples: Vec<NliSample>,
}

impl NliDataset {
    pub fn new(samples: Vec<NliSample>) -> Self { Self { samples } }

    /// Number of samples per class index
    pub fn label_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0usize; NUM_CLASSES];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<NliSample> for NliDataset {
    fn get(&self, index: usize) -> Option<NliSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
