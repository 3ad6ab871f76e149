// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so any
// example source (SNLI JSONL, MultiNLI, an in-memory fixture)
// or predictor can be swapped in without touching the
// workflow code.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::example::{NliExample, NliLabel};

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can load labelled sentence pairs.
///
/// Implementations:
///   - SnliLoader → reads SNLI-style JSON Lines files
pub trait ExampleSource {
    /// Load every usable example from this source, in file order.
    fn load_all(&self) -> Result<Vec<NliExample>>;
}

// ─── PairPredictor ────────────────────────────────────────────────────────────
/// The predicted relationship for one premise/hypothesis pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Highest scoring label
    pub label: NliLabel,

    /// Softmax probability of `label`, in [0, 1]
    pub confidence: f32,
}

/// Any component that can classify a premise/hypothesis pair.
///
/// Implementations:
///   - Inferencer → uses a trained encoder + classifier checkpoint
pub trait PairPredictor {
    fn predict(&self, premise: &str, hypothesis: &str) -> Result<Prediction>;
}
