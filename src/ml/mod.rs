// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// The trainable components and the loops that drive them.
//
// What's in this layer:
//
//   component.rs  - SentenceEncoder / PairClassifier traits and
//                   the Component wrapper carrying the
//                   explicit train/eval mode flag
//
//   encoder.rs    - Reference sentence encoder: embeddings,
//                   tanh projection, length-masked mean pooling
//
//   classifier.rs - Reference pair classifier over
//                   [u, v, |u - v|, u * v]
//
//   loss.rs       - PairLoss trait, cross-entropy criterion
//
//   optimizer.rs  - PairOptimizer: zero_grad / backward / step
//                   over encoder + classifier parameters
//
//   trainer.rs    - Training epoch and the full epoch loop
//                   (validation, metrics, checkpoints)
//
//   evaluator.rs  - Evaluation loop and accuracy
//
//   inferencer.rs - Loads a checkpoint, classifies one pair
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Conneau et al. (2017) InferSent

/// Encoder / classifier traits and the mode-carrying wrapper
pub mod component;

/// Mean-pooling sentence encoder
pub mod encoder;

/// Feature-matching pair classifier
pub mod classifier;

/// Loss functions over class scores
pub mod loss;

/// Joint optimizer for encoder + classifier
pub mod optimizer;

/// Training epoch and full training run
pub mod trainer;

/// Evaluation loop and accuracy reporter
pub mod evaluator;

/// Inference engine - loads checkpoint and predicts labels
pub mod inferencer;
