use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::{example::NUM_CLASSES, mode::Mode};
use crate::ml::component::PairClassifier;

#[derive(Config, Debug)]
pub struct FeatureClassifierConfig {
    /// Width of each sentence vector
    pub d_input:     usize,
    pub d_hidden:    usize,
    #[config(default = "NUM_CLASSES")]
    pub num_classes: usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl FeatureClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeatureClassifier<B> {
        FeatureClassifier {
            hidden:  LinearConfig::new(4 * self.d_input, self.d_hidden).init(device),
            output:  LinearConfig::new(self.d_hidden, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// MLP over the matching features [u, v, |u - v|, u * v].
#[derive(Module, Debug)]
pub struct FeatureClassifier<B: Backend> {
    pub hidden:  Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> PairClassifier<B> for FeatureClassifier<B> {
    fn forward(&self, a: Tensor<B, 2>, b: Tensor<B, 2>, mode: Mode) -> Tensor<B, 2> {
        let diff     = (a.clone() - b.clone()).abs();
        let product  = a.clone() * b.clone();
        let features = Tensor::cat(vec![a, b, diff, product], 1); // [batch, 4 * d_input]

        let x = relu(self.hidden.forward(features));
        let x = if mode.is_train() { self.dropout.forward(x) } else { x };
        self.output.forward(x)
    }
}
