// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Loads the tokenizer and the preferred checkpoint once, then
// classifies premise/hypothesis pairs on demand.

use anyhow::Result;

use crate::domain::traits::{PairPredictor, Prediction};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase<P: PairPredictor> {
    predictor: P,
}

impl PredictUseCase<Inferencer<burn::backend::Wgpu>> {
    pub fn from_checkpoint(checkpoint_dir: &str) -> Result<Self> {
        let tokenizer  = TokenizerStore::new(checkpoint_dir).load()?;
        let ckpt       = CheckpointManager::new(checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, tokenizer)?;
        Ok(Self::new(inferencer))
    }
}

impl<P: PairPredictor> PredictUseCase<P> {
    pub fn new(predictor: P) -> Self {
        Self { predictor }
    }
}

impl<P: PairPredictor> PairPredictor for PredictUseCase<P> {
    fn predict(&self, premise: &str, hypothesis: &str) -> Result<Prediction> {
        anyhow::ensure!(
            !premise.trim().is_empty() && !hypothesis.trim().is_empty(),
            "Both a premise and a hypothesis are required"
        );
        self.predictor.predict(premise, hypothesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::NliLabel;

    struct AlwaysNeutral;

    impl PairPredictor for AlwaysNeutral {
        fn predict(&self, _premise: &str, _hypothesis: &str) -> Result<Prediction> {
            Ok(Prediction { label: NliLabel::Neutral, confidence: 0.9 })
        }
    }

    #[test]
    fn test_delegates_to_predictor() {
        let use_case   = PredictUseCase::new(AlwaysNeutral);
        let prediction = use_case.predict("A man sleeps.", "A man dreams.").unwrap();
        assert_eq!(prediction.label, NliLabel::Neutral);
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let use_case = PredictUseCase::new(AlwaysNeutral);
        assert!(use_case.predict("  ", "A man dreams.").is_err());
    }
}
