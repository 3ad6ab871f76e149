// ============================================================
// Layer 4 - SNLI Loader
// ============================================================
// Loads labelled sentence pairs from a JSON Lines file in the
// SNLI / MultiNLI release format. Only three fields are read:
//
//   {"gold_label": "neutral",
//    "sentence1":  "A person on a horse jumps over a broken down airplane.",
//    "sentence2":  "A person is training his horse for a competition.", ...}
//
// Rows whose gold label is "-" (no annotator consensus) or any
// other unknown string are skipped and counted. A line that is
// not valid JSON is an error that names the line number.
//
// Reference: Bowman et al. (2015) SNLI corpus
//            serde_json crate documentation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::example::{NliExample, NliLabel};
use crate::domain::traits::ExampleSource;

/// The subset of an SNLI record this crate needs.
/// Unknown fields (parses, pairID, annotator_labels) are ignored.
#[derive(Debug, Deserialize)]
struct SnliRecord {
    sentence1:  String,
    sentence2:  String,
    gold_label: String,
}

/// Loads NLI examples from one JSON Lines file.
pub struct SnliLoader {
    path: PathBuf,
}

impl SnliLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExampleSource for SnliLoader {
    fn load_all(&self) -> Result<Vec<NliExample>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open NLI data file '{}'", self.path.display()))?;

        let mut examples = Vec::new();
        let mut skipped  = 0usize;

        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| {
                format!("Cannot read line {} of '{}'", line_no + 1, self.path.display())
            })?;

            // Blank lines (e.g. a trailing newline) carry no record
            if line.trim().is_empty() {
                continue;
            }

            let record: SnliRecord = serde_json::from_str(&line).with_context(|| {
                format!("Malformed record on line {} of '{}'", line_no + 1, self.path.display())
            })?;

            match NliLabel::parse(&record.gold_label) {
                Some(label) => examples.push(NliExample::new(
                    record.sentence1,
                    record.sentence2,
                    label,
                )),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(
                "Skipped {} rows without a usable gold label in '{}'",
                skipped,
                self.path.display()
            );
        }
        tracing::info!("Loaded {} examples from '{}'", examples.len(), self.path.display());
        Ok(examples)
    }
}
