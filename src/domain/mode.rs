// ============================================================
// Layer 3 - Component Mode
// ============================================================
// Every trainable component (encoder, classifier) carries its
// own mode flag. The flag is only ever changed through an
// explicit `set_mode` call; the training and evaluation loops
// set it at the start of every pass.
//
// In Train mode stochastic regularisation (dropout) is active.
// In Eval mode the forward pass is deterministic.

use serde::{Deserialize, Serialize};

/// Train/eval switch for a trainable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Dropout active, gradients expected
    Train,
    /// Deterministic forward pass
    #[default]
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}
