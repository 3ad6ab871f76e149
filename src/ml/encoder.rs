use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::mode::Mode;
use crate::ml::component::SentenceEncoder;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct PooledEncoderConfig {
    pub vocab_size: usize,
    pub d_embed:    usize,
    pub d_hidden:   usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

impl PooledEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PooledEncoder<B> {
        PooledEncoder {
            embedding:  EmbeddingConfig::new(self.vocab_size, self.d_embed).init(device),
            projection: LinearConfig::new(self.d_embed, self.d_hidden).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            d_hidden:   self.d_hidden,
        }
    }
}

/// Bag-of-embeddings sentence encoder.
///
/// embedding → linear + tanh → dropout (train only) → mean over the
/// first `length` positions of each row. Padding never contributes,
/// so an example encodes to the same vector whatever batch it is in.
#[derive(Module, Debug)]
pub struct PooledEncoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub projection: Linear<B>,
    pub dropout:    Dropout,
    pub d_hidden:   usize,
}

impl<B: Backend> SentenceEncoder<B> for PooledEncoder<B> {
    fn output_dim(&self) -> usize {
        self.d_hidden
    }

    fn forward(
        &self,
        tokens:  Tensor<B, 2, Int>,
        restore: Tensor<B, 1, Int>,
        lengths: Tensor<B, 1, Int>,
        mode:    Mode,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = tokens.dims();
        let device = tokens.device();

        let x = self.embedding.forward(tokens);        // [batch, seq_len, d_embed]
        let x = self.projection.forward(x).tanh();     // [batch, seq_len, d_hidden]
        let x = if mode.is_train() { self.dropout.forward(x) } else { x };

        // mask[b, t] = 1.0 where t < lengths[b]
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let limits = lengths.unsqueeze_dim::<2>(1).expand([batch_size, seq_len]);
        let mask   = positions.lower(limits).float();  // [batch, seq_len]

        let summed = (x * mask.clone().unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .squeeze::<2>(1);                          // [batch, d_hidden]
        let counts = mask.sum_dim(1).clamp_min(1.0);   // [batch, 1]

        // rows are length-sorted; put them back in example order
        (summed / counts).select(0, restore)
    }
}
