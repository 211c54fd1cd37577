// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Two independent flows live here.
//
// Attention (no tensors involved):
//
//   captured subword attention
//       │
//       ▼
//   alignment         → groups subword tokens into words
//       │
//       ▼
//   attention_merge   → block-averages + renormalises rows
//
// Next-word training:
//
//   corpus file
//       │
//       ▼
//   TextCorpus        → streams raw story records
//       │
//       ▼
//   Tokenizer         → story → token ids (infra layer)
//       │
//       ▼
//   windows           → (context, target) pairs per story
//       │
//       ▼
//   splitter          → one shuffle, 95/5 train/validation
//       │
//       ▼
//   NextWordDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   NextWordBatcher   → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Word ↔ subword alignment for WordPiece tokens
pub mod alignment;

/// Subword → word attention merge and renormalisation
pub mod attention_merge;

/// Streaming corpus reader (JSON Lines or separator-delimited text)
pub mod corpus;

/// Sliding context windows over tokenized records
pub mod windows;

/// Implements Burn's Dataset trait for next-word samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles once and splits into train/validation sets
pub mod splitter;
