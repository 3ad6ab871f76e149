// ============================================================
// Layer 5 - Trainable Components
// ============================================================
// The loops only see two capability traits:
//
//   SentenceEncoder  (tokens, restore, lengths) → [batch, d]
//   PairClassifier   (u, v)                     → [batch, classes]
//
// Both are Burn Modules, so their parameters can be walked by
// the optimizer, saved by the recorder and cloned onto the
// inner backend with `.valid()`.
//
// Component<M> pairs a module with its Mode flag. The flag is
// plain state on the wrapper: it changes only through
// `set_mode`, and every forward call passes it down so the
// module decides whether dropout fires.
//
// Reference: Burn Book §3 (Modules)
//            Rust Book §10 (Traits)

use burn::{module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};

use crate::domain::mode::Mode;

// ─── SentenceEncoder ──────────────────────────────────────────────────────────
/// Encodes a padded, length-sorted batch of token sequences into one
/// fixed-size vector per example.
pub trait SentenceEncoder<B: Backend>: Module<B> {
    /// Width of the vectors `forward` returns
    fn output_dim(&self) -> usize;

    /// * `tokens`  - [batch, max_len] padded ids, rows longest first
    /// * `restore` - [batch] row index of each example
    /// * `lengths` - [batch] true length of each row
    ///
    /// Returns [batch, output_dim] with row `i` belonging to example `i`.
    fn forward(
        &self,
        tokens:  Tensor<B, 2, Int>,
        restore: Tensor<B, 1, Int>,
        lengths: Tensor<B, 1, Int>,
        mode:    Mode,
    ) -> Tensor<B, 2>;
}

// ─── PairClassifier ───────────────────────────────────────────────────────────
/// Maps two sentence vectors to unnormalised class scores.
pub trait PairClassifier<B: Backend>: Module<B> {
    /// `a`, `b`: [batch, d] → [batch, num_classes]
    fn forward(&self, a: Tensor<B, 2>, b: Tensor<B, 2>, mode: Mode) -> Tensor<B, 2>;
}

// ─── Component ────────────────────────────────────────────────────────────────
/// A trainable module together with its train/eval mode flag.
#[derive(Debug, Clone)]
pub struct Component<M> {
    module: M,
    mode:   Mode,
}

impl<M> Component<M> {
    /// Wrap `module`. New components start in Eval mode.
    pub fn new(module: M) -> Self {
        Self { module, mode: Mode::Eval }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    /// Replace the module with `f(module)`, keeping the mode.
    ///
    /// Burn optimizers consume the module and hand back the updated one,
    /// so this is how a step is applied through a `&mut Component`.
    pub fn update(&mut self, f: impl FnOnce(M) -> M)
    where
        M: Clone,
    {
        self.module = f(self.module.clone());
    }

    /// Copy of this component on the inner (non-autodiff) backend.
    /// The copy keeps the current mode flag.
    pub fn valid<B>(&self) -> Component<<M as AutodiffModule<B>>::InnerModule>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
    {
        Component {
            module: <M as AutodiffModule<B>>::valid(&self.module),
            mode:   self.mode,
        }
    }

    pub fn encode<B: Backend>(
        &self,
        tokens:  Tensor<B, 2, Int>,
        restore: Tensor<B, 1, Int>,
        lengths: Tensor<B, 1, Int>,
    ) -> Tensor<B, 2>
    where
        M: SentenceEncoder<B>,
    {
        self.module.forward(tokens, restore, lengths, self.mode)
    }

    pub fn classify<B: Backend>(&self, a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 2>
    where
        M: PairClassifier<B>,
    {
        self.module.forward(a, b, self.mode)
    }
}
