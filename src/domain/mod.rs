// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe the two
// artifacts this tool produces:
//
//   attention.rs   — head selectors, captured subword attention,
//                    word alignments and the JSON records written
//                    for the attention widgets
//
//   model_spec.rs  — the next-word model's configuration, its five
//                    parameter tensors and the vocabulary that is
//                    shipped next to every exported model
//
//   traits.rs      — the seams to external collaborators
//                    (transformer capture, corpus, tokenizer)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Keeping burn out of here means the codec and the attention
// merge can be tested without any tensor backend.

/// Attention capture and word-level attention records
pub mod attention;

/// Next-word model configuration, parameters and vocabulary
pub mod model_spec;

/// Core abstractions implemented by the data and infra layers
pub mod traits;
