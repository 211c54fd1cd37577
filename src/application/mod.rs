// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to produce one
// artifact set per command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No direct file formats here (that's Layer 6)
//   - Only workflow coordination and operator-facing output
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Sentence sets, head selectors, training grid, probe phrases
pub mod presets;

// The attention extraction workflow
pub mod attention_use_case;

// The next-word training workflow
pub mod train_use_case;

// The exported-model probing workflow
pub mod probe_use_case;
