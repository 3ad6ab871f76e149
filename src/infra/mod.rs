// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   checkpoint.rs      - Saving and loading encoder and
//                        classifier weights with Burn's
//                        full-precision MessagePack
//                        recorder, plus the JSON
//                        pointers (latest / best epoch) and
//                        the TrainConfig used to rebuild the
//                        architecture.
//
//   tokenizer_store.rs - Builds the word-level vocabulary from
//                        the training sentences, or loads the
//                        saved one, so training and inference
//                        share the same ids.
//
//   metrics.rs         - Appends per-epoch loss and accuracy
//                        to a CSV file.
//
//   progress.rs        - The in-place "Train Epoch: ..." line
//                        printed during each training epoch.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Encoder/classifier checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Training progress line
pub mod progress;
