// ============================================================
// Layer 5 - Evaluation Loop and Accuracy
// ============================================================
// Runs the encoder and classifier over every batch in order,
// with both components in Eval mode, and collects:
//
//   loss    Σ batch_loss / num_items
//   scores  [num_items, num_classes]   concatenated in batch order
//   labels  [num_items]                concatenated in batch order
//
// The loss weighting differs from the training loop on purpose:
// each batch mean is divided by the dataset size, without the
// batch-size factor. Keep the two formulas separate.
//
// Nothing here calls backward or touches an optimizer. Callers
// holding autodiff components go through
// `run_evaluation_no_grad`, which evaluates inner-backend copies
// so no autodiff graph is recorded at all.
//
// Reference: Burn Book §5 (Validation with model.valid())

use anyhow::{ensure, Result};
use burn::{module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};

use crate::data::batcher::BatchSource;
use crate::domain::mode::Mode;
use crate::ml::{
    component::{Component, PairClassifier, SentenceEncoder},
    loss::PairLoss,
};

/// Output of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation<B: Backend> {
    pub loss:   f64,
    pub scores: Tensor<B, 2>,
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> Evaluation<B> {
    pub fn num_rows(&self) -> usize {
        self.labels.dims()[0]
    }

    pub fn accuracy(&self) -> f64 {
        accuracy_percent(self.scores.clone(), self.labels.clone())
    }
}

/// Evaluate `encoder` + `classifier` over every batch of `batches`.
///
/// Fails on an empty source (there is nothing to concatenate) and on
/// any batch whose seven fields disagree on the batch dimension.
pub fn run_evaluation<B, E, C, L, S>(
    encoder:    &mut Component<E>,
    classifier: &mut Component<C>,
    batches:    &S,
    loss_fn:    &L,
) -> Result<Evaluation<B>>
where
    B: Backend,
    E: SentenceEncoder<B>,
    C: PairClassifier<B>,
    L: PairLoss,
    S: BatchSource<Backend = B> + ?Sized,
{
    encoder.set_mode(Mode::Eval);
    classifier.set_mode(Mode::Eval);

    batches.check()?;

    let num_items = batches.num_items();
    ensure!(
        num_items > 0 && batches.num_batches() > 0,
        "Cannot evaluate an empty batch source"
    );
    let device = encoder.module().devices().into_iter().next();

    let mut total_loss = 0.0f64;
    let mut all_scores = Vec::with_capacity(batches.num_batches());
    let mut all_labels = Vec::with_capacity(batches.num_batches());

    for batch in batches.batches() {
        let batch = match &device {
            Some(device) => batch.to_device(device),
            None         => batch,
        };
        batch.validate()?;

        let u = encoder.encode(batch.premise_tokens, batch.premise_restore, batch.premise_lengths);
        let v = encoder.encode(
            batch.hypothesis_tokens,
            batch.hypothesis_restore,
            batch.hypothesis_lengths,
        );
        let scores = classifier.classify(u, v);

        let batch_loss: f64 = loss_fn
            .forward(scores.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        total_loss += batch_loss / num_items as f64;

        all_scores.push(scores);
        all_labels.push(batch.labels);
    }

    ensure!(!all_scores.is_empty(), "Batch source yielded no batches");

    Ok(Evaluation {
        loss:   total_loss,
        scores: Tensor::cat(all_scores, 0),
        labels: Tensor::cat(all_labels, 0),
    })
}

/// Evaluate autodiff components without recording gradients.
///
/// Both components are switched to Eval mode, then their `.valid()`
/// copies on the inner backend run the evaluation loop.
pub fn run_evaluation_no_grad<B, E, C, L, S>(
    encoder:    &mut Component<E>,
    classifier: &mut Component<C>,
    batches:    &S,
    loss_fn:    &L,
) -> Result<Evaluation<B::InnerBackend>>
where
    B: AutodiffBackend,
    E: AutodiffModule<B>,
    C: AutodiffModule<B>,
    <E as AutodiffModule<B>>::InnerModule: SentenceEncoder<B::InnerBackend>,
    <C as AutodiffModule<B>>::InnerModule: PairClassifier<B::InnerBackend>,
    L: PairLoss,
    S: BatchSource<Backend = B::InnerBackend> + ?Sized,
{
    encoder.set_mode(Mode::Eval);
    classifier.set_mode(Mode::Eval);

    let mut encoder_valid    = encoder.valid::<B>();
    let mut classifier_valid = classifier.valid::<B>();
    run_evaluation(&mut encoder_valid, &mut classifier_valid, batches, loss_fn)
}

/// Percentage of batches' examples whose argmax score matches the label.
pub fn compute_accuracy<B, E, C, L, S>(
    encoder:    &mut Component<E>,
    classifier: &mut Component<C>,
    batches:    &S,
    loss_fn:    &L,
) -> Result<f64>
where
    B: Backend,
    E: SentenceEncoder<B>,
    C: PairClassifier<B>,
    L: PairLoss,
    S: BatchSource<Backend = B> + ?Sized,
{
    let evaluation = run_evaluation(encoder, classifier, batches, loss_fn)?;
    Ok(evaluation.accuracy())
}

/// 100 * correct / total, where a row is correct when its argmax
/// equals its label.
pub fn accuracy_percent<B: Backend>(scores: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64 {
    let total   = labels.dims()[0];
    let correct: i64 = predicted_classes(scores)
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    100.0 * correct as f64 / total as f64
}

/// Row-wise argmax with ties going to the lowest class index.
///
/// Every column holding the row maximum is a candidate; the others are
/// pushed past the last class, so the smallest remaining index wins on
/// any backend.
pub fn predicted_classes<B: Backend>(scores: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    let [rows, classes] = scores.dims();
    let device = scores.device();

    let row_max = scores.clone().max_dim(1).expand([rows, classes]);
    let is_max  = scores.greater_equal(row_max);

    Tensor::<B, 1, Int>::arange(0..classes as i64, &device)
        .unsqueeze::<2>()
        .expand([rows, classes])
        .mask_fill(is_max.bool_not(), classes as i64)
        .min_dim(1)
        .squeeze::<1>(1)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArray, Autodiff};
    use burn::data::dataloader::batcher::Batcher;
    use burn::module::Param;
    use burn::tensor::TensorData;

    use crate::data::batcher::{NliBatch, NliBatcher};
    use crate::data::dataset::NliSample;
    use crate::ml::classifier::FeatureClassifierConfig;
    use crate::ml::encoder::{PooledEncoder, PooledEncoderConfig};
    use crate::ml::loss::CrossEntropyCriterion;

    type TestBackend    = NdArray<f32>;
    type TestAdBackend  = Autodiff<NdArray<f32>>;

    /// Ignores its inputs and returns the same scores for every row.
    #[derive(Module, Debug)]
    struct ConstantClassifier<B: Backend> {
        bias: Param<Tensor<B, 1>>,
    }

    impl<B: Backend> ConstantClassifier<B> {
        fn new(scores: Vec<f32>, device: &B::Device) -> Self {
            let n = scores.len();
            let bias = Tensor::from_data(TensorData::new(scores, [n]), device);
            Self { bias: Param::from_tensor(bias) }
        }
    }

    impl<B: Backend> PairClassifier<B> for ConstantClassifier<B> {
        fn forward(&self, a: Tensor<B, 2>, _b: Tensor<B, 2>, _mode: Mode) -> Tensor<B, 2> {
            let [batch_size, _] = a.dims();
            let n = self.bias.val().dims()[0];
            self.bias.val().unsqueeze::<2>().expand([batch_size, n])
        }
    }

    fn encoder() -> Component<PooledEncoder<TestBackend>> {
        Component::new(PooledEncoderConfig::new(32, 4, 4).init(&Default::default()))
    }

    fn batches(labels: &[&[usize]]) -> Vec<NliBatch<TestBackend>> {
        let batcher = NliBatcher::<TestBackend>::new(Default::default());
        let mut next = 2u32;
        labels
            .iter()
            .map(|chunk| {
                let samples = chunk
                    .iter()
                    .map(|&label| {
                        next += 1;
                        NliSample {
                            premise_ids:    (2..next % 7 + 3).collect(),
                            hypothesis_ids: vec![next % 30 + 2],
                            label,
                        }
                    })
                    .collect();
                batcher.batch(samples)
            })
            .collect()
    }

    fn labels(t: Tensor<TestBackend, 1, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    fn floats(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_rows_and_labels_follow_batch_order() {
        let mut enc = encoder();
        let mut cls = Component::new(FeatureClassifierConfig::new(4, 8).init(&Default::default()));
        let source  = batches(&[&[0, 1, 2], &[2, 1]]);

        let eval = run_evaluation(&mut enc, &mut cls, &source, &CrossEntropyCriterion).unwrap();
        assert_eq!(eval.scores.dims(), [5, 3]);
        assert_eq!(eval.num_rows(), source.num_items());
        assert_eq!(labels(eval.labels.clone()), vec![0, 1, 2, 2, 1]);

        // Row i of the concatenation is row i of its own batch
        let first  = run_evaluation(&mut enc, &mut cls, &vec![source[0].clone()], &CrossEntropyCriterion).unwrap();
        let second = run_evaluation(&mut enc, &mut cls, &vec![source[1].clone()], &CrossEntropyCriterion).unwrap();
        let mut expected = floats(first.scores);
        expected.extend(floats(second.scores));
        assert_eq!(floats(eval.scores), expected);
    }

    #[test]
    fn test_loss_is_sum_of_batch_losses_over_dataset_size() {
        let mut enc = encoder();
        let mut cls = Component::new(ConstantClassifier::new(vec![1.0, 0.0, -1.0], &Default::default()));
        let source  = batches(&[&[0, 1], &[2]]);

        let eval = run_evaluation(&mut enc, &mut cls, &source, &CrossEntropyCriterion).unwrap();

        let mut expected = 0.0f64;
        for batch in source.batches() {
            let scores = cls.module().forward(
                Tensor::zeros([batch.batch_size(), 4], &Default::default()),
                Tensor::zeros([batch.batch_size(), 4], &Default::default()),
                Mode::Eval,
            );
            let batch_loss: f64 = CrossEntropyCriterion.forward(scores, batch.labels).into_scalar().elem();
            expected += batch_loss / 3.0;
        }
        assert!((eval.loss - expected).abs() < 1e-9, "{} vs {}", eval.loss, expected);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let mut enc = encoder();
        let mut cls = Component::new(FeatureClassifierConfig::new(4, 8).init(&Default::default()));
        let source  = batches(&[&[0, 1, 2, 0], &[1, 2]]);

        let a = run_evaluation(&mut enc, &mut cls, &source, &CrossEntropyCriterion).unwrap();
        let b = run_evaluation(&mut enc, &mut cls, &source, &CrossEntropyCriterion).unwrap();
        assert_eq!(a.loss.to_bits(), b.loss.to_bits());
        assert_eq!(floats(a.scores), floats(b.scores));
        assert_eq!(labels(a.labels), labels(b.labels));
    }

    #[test]
    fn test_evaluation_sets_eval_mode() {
        let mut enc = encoder();
        let mut cls = Component::new(FeatureClassifierConfig::new(4, 8).init(&Default::default()));
        enc.set_mode(Mode::Train);
        cls.set_mode(Mode::Train);

        run_evaluation(&mut enc, &mut cls, &batches(&[&[0]]), &CrossEntropyCriterion).unwrap();
        assert_eq!(enc.mode(), Mode::Eval);
        assert_eq!(cls.mode(), Mode::Eval);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let mut enc = encoder();
        let mut cls = Component::new(FeatureClassifierConfig::new(4, 8).init(&Default::default()));
        let empty: Vec<NliBatch<TestBackend>> = Vec::new();

        assert!(run_evaluation(&mut enc, &mut cls, &empty, &CrossEntropyCriterion).is_err());
        assert!(compute_accuracy(&mut enc, &mut cls, &empty, &CrossEntropyCriterion).is_err());
    }

    #[test]
    fn test_mismatched_batch_is_an_error() {
        let mut enc   = encoder();
        let mut cls   = Component::new(FeatureClassifierConfig::new(4, 8).init(&Default::default()));
        let mut bad   = batches(&[&[0, 1, 2]]);
        bad[0].labels = bad[0].labels.clone().slice([0..2]);

        assert!(run_evaluation(&mut enc, &mut cls, &bad, &CrossEntropyCriterion).is_err());
    }

    #[test]
    fn test_accuracy_half_when_always_predicting_class_zero() {
        let mut enc = encoder();
        let mut cls = Component::new(ConstantClassifier::new(vec![5.0, 0.0], &Default::default()));
        let source  = batches(&[&[0, 1, 0, 1]]);

        let acc = compute_accuracy(&mut enc, &mut cls, &source, &CrossEntropyCriterion).unwrap();
        assert_eq!(acc, 50.0);
    }

    #[test]
    fn test_accuracy_extremes() {
        let mut enc = encoder();
        let mut cls = Component::new(ConstantClassifier::new(vec![5.0, 0.0], &Default::default()));

        let all_right = batches(&[&[0, 0], &[0]]);
        let all_wrong = batches(&[&[1, 1], &[1]]);
        assert_eq!(compute_accuracy(&mut enc, &mut cls, &all_right, &CrossEntropyCriterion).unwrap(), 100.0);
        assert_eq!(compute_accuracy(&mut enc, &mut cls, &all_wrong, &CrossEntropyCriterion).unwrap(), 0.0);
    }

    #[test]
    fn test_accuracy_percent_counts_argmax_matches() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.1f32, 0.7, 0.2, 0.9, 0.05, 0.05, 0.2, 0.3, 0.5], [3, 3]),
            &device,
        );
        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![1i64, 0, 0], [3]), &device);

        let acc = accuracy_percent(scores, labels);
        assert!((acc - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_go_to_the_lowest_class_index() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 1.0, 0.0, 2.0, 2.0, 3.0, 0.0, 3.0], [3, 3]),
            &device,
        );
        assert_eq!(labels(predicted_classes(scores.clone())), vec![0, 1, 0]);

        let gold = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0i64, 2, 2], [3]), &device);
        let acc  = accuracy_percent(scores, gold);
        assert!((acc - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_accuracy_with_tied_constant_scores() {
        let device  = Default::default();
        let mut enc = encoder();
        // Classes 0 and 1 tie for the top score on every row
        let mut cls = Component::new(ConstantClassifier::<TestBackend>::new(vec![0.5, 0.5, 0.1], &device));
        let source  = batches(&[&[0, 1], &[0, 1]]);

        let acc = compute_accuracy(&mut enc, &mut cls, &source, &CrossEntropyCriterion).unwrap();
        assert_eq!(acc, 50.0);
    }

    #[test]
    fn test_no_grad_evaluation_matches_inner_backend_copies() {
        let device  = Default::default();
        let mut enc = Component::new(PooledEncoderConfig::new(32, 4, 4).init::<TestAdBackend>(&device));
        let mut cls = Component::new(FeatureClassifierConfig::new(4, 8).init::<TestAdBackend>(&device));
        enc.set_mode(Mode::Train);
        let source  = batches(&[&[0, 1], &[2]]);

        let eval = run_evaluation_no_grad::<TestAdBackend, _, _, _, _>(
            &mut enc, &mut cls, &source, &CrossEntropyCriterion,
        )
        .unwrap();
        assert_eq!(enc.mode(), Mode::Eval);

        let mut enc_inner = enc.valid::<TestAdBackend>();
        let mut cls_inner = cls.valid::<TestAdBackend>();
        let direct = run_evaluation(&mut enc_inner, &mut cls_inner, &source, &CrossEntropyCriterion).unwrap();
        assert_eq!(floats(eval.scores), floats(direct.scores));
    }
}
