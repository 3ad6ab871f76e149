// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: training, evaluating a checkpoint, or predicting
// the label of a single sentence pair.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Loss and accuracy of a checkpoint on a labelled file
pub mod evaluate_use_case;

// Single-pair inference
pub mod predict_use_case;
