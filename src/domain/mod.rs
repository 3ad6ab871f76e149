// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits that name the core concepts of
// natural language inference: a premise, a hypothesis, and the
// relationship label between them.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)
//            Bowman et al. (2015) SNLI corpus

// A labelled premise/hypothesis pair and its label set
pub mod example;

// The train/eval switch carried by every trainable component
pub mod mode;

// Core abstractions (traits) that other layers implement
pub mod traits;
