// ============================================================
// Layer 5 - Pair Optimizer
// ============================================================
// One optimizer covering every trainable parameter of both the
// encoder and the classifier.
//
// Gradient handling is a two-phase contract driven by the loop:
//
//   zero_grad()            drop any gradients not yet applied
//   backward(loss, ..)     run autodiff, split the gradients into
//                          the encoder's and the classifier's share
//   step(..)               apply the pending gradients, one Burn
//                          optimizer per component
//
// The optimizer owns the update rule and the pending gradients;
// the parameters stay in the components.
//
// Reference: Burn Book §5 (Optimizers)
//            Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    LearningRate,
    optim::{AdamConfig, GradientsAccumulator, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::ml::component::Component;

// ─── PairOptimizer ────────────────────────────────────────────────────────────
pub trait PairOptimizer<B: AutodiffBackend, E, C> {
    /// Discard gradients that have not been applied yet.
    fn zero_grad(&mut self);

    /// Back-propagate `loss` and keep the gradients of both components.
    fn backward(&mut self, loss: Tensor<B, 1>, encoder: &Component<E>, classifier: &Component<C>);

    /// Apply the pending gradients to both components.
    fn step(&mut self, encoder: &mut Component<E>, classifier: &mut Component<C>);

    /// Backward passes whose gradients are still waiting for a step.
    fn pending_steps(&self) -> usize;
}

// ─── JointOptimizer ───────────────────────────────────────────────────────────
pub struct JointOptimizer<E, C, OE, OC> {
    lr:               LearningRate,
    encoder_optim:    OE,
    classifier_optim: OC,
    encoder_grads:    GradientsAccumulator<E>,
    classifier_grads: GradientsAccumulator<C>,
    pending:          usize,
}

impl<E, C, OE, OC> JointOptimizer<E, C, OE, OC> {
    pub fn new(lr: LearningRate, encoder_optim: OE, classifier_optim: OC) -> Self {
        Self {
            lr,
            encoder_optim,
            classifier_optim,
            encoder_grads:    GradientsAccumulator::new(),
            classifier_grads: GradientsAccumulator::new(),
            pending:          0,
        }
    }
}

/// Adam on both components.
///
/// m = β1*m + (1-β1)*g        (mean)
/// v = β2*v + (1-β2)*g²       (variance)
/// θ = θ - lr * m / (√v + ε)  (update)
pub fn joint_adam<B, E, C>(lr: LearningRate) -> impl PairOptimizer<B, E, C>
where
    B: AutodiffBackend,
    E: AutodiffModule<B>,
    C: AutodiffModule<B>,
{
    let config = AdamConfig::new().with_epsilon(1e-8);
    JointOptimizer::<E, C, _, _>::new(lr, config.init::<B, E>(), config.init::<B, C>())
}

impl<B, E, C, OE, OC> PairOptimizer<B, E, C> for JointOptimizer<E, C, OE, OC>
where
    B:  AutodiffBackend,
    E:  AutodiffModule<B>,
    C:  AutodiffModule<B>,
    OE: Optimizer<E, B>,
    OC: Optimizer<C, B>,
{
    fn zero_grad(&mut self) {
        // grads() hands back the accumulated gradients and resets the accumulator
        let _ = self.encoder_grads.grads();
        let _ = self.classifier_grads.grads();
        self.pending = 0;
    }

    fn backward(&mut self, loss: Tensor<B, 1>, encoder: &Component<E>, classifier: &Component<C>) {
        let mut grads = loss.backward();

        let encoder_grads    = GradientsParams::from_module::<B, E>(&mut grads, encoder.module());
        let classifier_grads = GradientsParams::from_module::<B, C>(&mut grads, classifier.module());

        self.encoder_grads.accumulate::<B>(encoder.module(), encoder_grads);
        self.classifier_grads.accumulate::<B>(classifier.module(), classifier_grads);
        self.pending += 1;
    }

    fn step(&mut self, encoder: &mut Component<E>, classifier: &mut Component<C>) {
        let lr               = self.lr;
        let encoder_grads    = self.encoder_grads.grads();
        let classifier_grads = self.classifier_grads.grads();

        let encoder_optim = &mut self.encoder_optim;
        encoder.update(|module| encoder_optim.step(lr, module, encoder_grads));

        let classifier_optim = &mut self.classifier_optim;
        classifier.update(|module| classifier_optim.step(lr, module, classifier_grads));

        self.pending = 0;
    }

    fn pending_steps(&self) -> usize {
        self.pending
    }
}
