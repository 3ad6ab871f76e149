// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level tokenizer shared by
// training, evaluation and inference.
//
// Vocabulary layout:
//   0         [PAD]   (the batcher pads with id 0)
//   1         [UNK]
//   2..       corpus words, most frequent first
//
// The tokenizer JSON is written by hand and loaded back with
// Tokenizer::from_file: in tokenizers 0.15, train_from_files
// requires Trainer::Model to equal ModelWrapper, and building
// the JSON sidesteps that type mismatch entirely.
//
// Vocabulary words are counted by running the same BertNormalizer
// and Whitespace pre-tokenizer the saved tokenizer applies, so
// every counted word is reachable at encode time.

use anyhow::{bail, Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::{
    normalizers::bert::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer, Tokenizer,
};

use crate::data::dataset::{PAD_ID, UNK_ID};

const TOKENIZER_FILE: &str = "tokenizer.json";
const SPECIAL_TOKENS: usize = 2;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load existing tokenizer or build a new one from texts.
    ///
    /// A saved tokenizer whose vocabulary is larger than `vocab_size`
    /// is rejected: its ids would overflow the embedding table.
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        let tok_path = self.dir.join(TOKENIZER_FILE);
        if !tok_path.exists() {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            return self.build_and_save(texts, vocab_size);
        }

        tracing::info!("Loading existing tokenizer from disk");
        let tokenizer = self.load()?;
        let size      = tokenizer.get_vocab_size(true);
        if size > vocab_size {
            bail!(
                "Saved tokenizer at '{}' has {} tokens but vocab_size is {}",
                tok_path.display(), size, vocab_size,
            );
        }
        Ok(tokenizer)
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if vocab_size <= SPECIAL_TOKENS {
            bail!("vocab_size must be larger than {SPECIAL_TOKENS}, got {vocab_size}");
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count words ───────────────────────────────────────────────
        let words = most_frequent_words(texts, vocab_size - SPECIAL_TOKENS)?;

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]": PAD_ID,
            "[UNK]": UNK_ID,
        });
        for (offset, word) in words.iter().enumerate() {
            vocab[word.as_str()] = serde_json::json!(SPECIAL_TOKENS + offset);
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} tokens, saved to '{}'",
            words.len() + SPECIAL_TOKENS,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Matches the "normalizer" entry of the saved tokenizer JSON.
fn bert_normalizer() -> BertNormalizer {
    BertNormalizer::new(true, true, None, true)
}

/// Up to `limit` normalised words by descending frequency, ties broken
/// alphabetically so the same corpus always gives the same ids.
fn most_frequent_words(texts: &[String], limit: usize) -> Result<Vec<String>> {
    let normalizer    = bert_normalizer();
    let pre_tokenizer = Whitespace::default();

    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in split_words(text, &normalizer, &pre_tokenizer)? {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(limit);
    Ok(words.into_iter().map(|(w, _)| w).collect())
}

/// Normalise `text` and split it into the pieces the WordLevel model sees.
fn split_words(
    text:          &str,
    normalizer:    &BertNormalizer,
    pre_tokenizer: &Whitespace,
) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    normalizer
        .normalize(&mut normalized)
        .map_err(|e| anyhow::anyhow!("Cannot normalise text: {e}"))?;

    let mut pretokenized = PreTokenizedString::from(normalized);
    pre_tokenizer
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| anyhow::anyhow!("Cannot pre-tokenise text: {e}"))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}
