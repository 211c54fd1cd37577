// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or an external
// artifact format:
//
//   attention_capture.rs — Captured transformer attention
//                          JSON dump, served per sentence
//                          through AttentionSource.
//
//   attention_store.rs   — Writes the word-level attention
//                          artifact for the browser widget.
//
//   tokenizer_store.rs   — Loads the pretrained WordPiece
//                          tokenizer and adapts it to the
//                          TokenEncoder trait.
//
//   model_codec.rs       — Exports trained models as JSON
//                          metadata + little-endian weight
//                          blob, and reads them back.
//
//   metrics.rs           — Per-epoch training metrics CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Captured attention input file
pub mod attention_capture;

/// Attention JSON artifact writer
pub mod attention_store;

/// Pretrained tokenizer loading
pub mod tokenizer_store;

/// Model export format (write + read)
pub mod model_codec;

/// Training metrics CSV logger
pub mod metrics;
