// ============================================================
// Layer 3 - NliExample Domain Type
// ============================================================
// Represents a single natural language inference example:
//   - a premise sentence
//   - a hypothesis sentence
//   - the relationship between them
//
// Example:
//   Premise:    "A man is playing a guitar on stage."
//   Hypothesis: "A person is performing music."
//   Label:      Entailment
//
// Labels map to fixed class indices so that the classifier's
// score columns always mean the same thing:
//   0 = entailment, 1 = neutral, 2 = contradiction
//
// Reference: Bowman et al. (2015) SNLI corpus
//            Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of relationship classes the classifier scores.
pub const NUM_CLASSES: usize = 3;

/// The relationship between a premise and a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NliLabel {
    Entailment,
    Neutral,
    Contradiction,
}

impl NliLabel {
    /// All labels in class-index order
    pub const ALL: [NliLabel; NUM_CLASSES] = [
        NliLabel::Entailment,
        NliLabel::Neutral,
        NliLabel::Contradiction,
    ];

    /// Class index used for the label tensor and the score columns
    pub fn index(self) -> usize {
        match self {
            NliLabel::Entailment    => 0,
            NliLabel::Neutral       => 1,
            NliLabel::Contradiction => 2,
        }
    }

    /// Inverse of `index()`. Returns None for out-of-range indices.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parse an SNLI gold label string.
    /// The "no consensus" marker "-" and anything unknown give None.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "entailment"    => Some(NliLabel::Entailment),
            "neutral"       => Some(NliLabel::Neutral),
            "contradiction" => Some(NliLabel::Contradiction),
            _               => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NliLabel::Entailment    => "entailment",
            NliLabel::Neutral       => "neutral",
            NliLabel::Contradiction => "contradiction",
        }
    }
}

impl fmt::Display for NliLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled premise/hypothesis pair, before tokenisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NliExample {
    /// The sentence that is taken as given
    pub premise: String,

    /// The sentence whose truth is judged against the premise
    pub hypothesis: String,

    /// Gold relationship label
    pub label: NliLabel,
}

impl NliExample {
    /// Create a new NliExample.
    /// Accepts &str or String for both sentences.
    pub fn new(
        premise:    impl Into<String>,
        hypothesis: impl Into<String>,
        label:      NliLabel,
    ) -> Self {
        Self {
            premise:    premise.into(),
            hypothesis: hypothesis.into(),
            label,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for label in NliLabel::ALL {
            assert_eq!(NliLabel::from_index(label.index()), Some(label));
        }
        assert_eq!(NliLabel::from_index(NUM_CLASSES), None);
    }

    #[test]
    fn test_parse_snli_labels() {
        assert_eq!(NliLabel::parse("entailment"), Some(NliLabel::Entailment));
        assert_eq!(NliLabel::parse(" Neutral "), Some(NliLabel::Neutral));
        assert_eq!(NliLabel::parse("contradiction"), Some(NliLabel::Contradiction));
        // SNLI marks examples without annotator consensus with "-"
        assert_eq!(NliLabel::parse("-"), None);
        assert_eq!(NliLabel::parse(""), None);
    }

    #[test]
    fn test_display_matches_snli_spelling() {
        assert_eq!(NliLabel::Contradiction.to_string(), "contradiction");
    }
}
