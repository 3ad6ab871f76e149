// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from an SNLI-style file on disk to device-ready
// tensor batches.
//
// The pipeline flows in this order:
//
//   .jsonl file
//       │
//       ▼
//   SnliLoader        → parses records, drops unlabelled rows
//       │
//       ▼
//   Preprocessor      → normalises whitespace / control chars
//       │
//       ▼
//   Tokenizer         → word ids (see infra::tokenizer_store)
//       │
//       ▼
//   NliDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   NliBatcher        → pads, length-sorts, builds tensors
//       │
//       ▼
//   NliBatchLoader    → ordered batch source for the loops
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads SNLI-style JSON Lines files
pub mod loader;

/// Cleans and normalises raw sentences
pub mod preprocessor;

/// Tokenised samples and Burn's Dataset trait
pub mod dataset;

/// Padding, batching, and the ordered batch source
pub mod batcher;

/// Seeded shuffle and train/validation split
pub mod splitter;
