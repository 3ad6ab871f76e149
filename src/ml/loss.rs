use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

/// (scores [batch, classes], labels [batch]) → mean loss, shape [1].
///
/// Generic over the backend so one loss value serves both the autodiff
/// training loop and the inner-backend evaluation loop.
pub trait PairLoss {
    fn forward<B: Backend>(&self, scores: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1>;
}

/// Softmax cross-entropy, mean over the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyCriterion;

impl PairLoss for CrossEntropyCriterion {
    fn forward<B: Backend>(&self, scores: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        CrossEntropyLossConfig::new()
            .init(&scores.device())
            .forward(scores, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_uniform_scores_give_ln_classes() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::zeros([4, 3], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1, 2, 0], [4]), &device);

        let loss: f64 = CrossEntropyCriterion.forward(scores, labels).into_scalar().elem();
        assert!((loss - 3f64.ln()).abs() < 1e-5, "loss = {loss}");
    }

    #[test]
    fn test_confident_correct_scores_give_small_loss() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![10.0f32, 0.0, 0.0, 0.0, 10.0, 0.0], [2, 3]),
            &device,
        );
        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 1], [2]), &device);

        let loss: f64 = CrossEntropyCriterion.forward(scores, labels).into_scalar().elem();
        assert!(loss < 1e-3, "loss = {loss}");
    }
}
