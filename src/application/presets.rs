// ============================================================
// Layer 2 — Built-in Presets
// ============================================================
// The hand-curated tables the pipelines run over. Heads were
// picked by inspecting bert-base-uncased (12 layers × 12 heads)
// for recognisable patterns; indices are 0-based.

use crate::domain::attention::HeadSelector;

// ─── Attention extraction ─────────────────────────────────────────────────────

pub const FULL_SENTENCES: &[&str] = &[
    "The dog chased the cat because it was angry",
    "The bank by the river was steep and muddy",
    "The chef who won the competition opened a restaurant",
    "The movie was not great but I loved it anyway",
    "She picked up the guitar and played a song",
    "The students who studied hard passed the exam easily",
    "After the storm the sky turned a brilliant orange",
    "The old cat sat on the warm mat and slept",
];

pub const FULL_HEADS: &[HeadSelector] = &[
    HeadSelector::new(2, 0,  "Next word"),
    HeadSelector::new(2, 9,  "Next word (2)"),
    HeadSelector::new(3, 5,  "Previous word"),
    HeadSelector::new(4, 3,  "Self / pronoun"),
    HeadSelector::new(3, 0,  "Identity"),
    HeadSelector::new(5, 9,  "Local context"),
    HeadSelector::new(1, 4,  "Previous word (early)"),
    HeadSelector::new(6, 11, "Broad context"),
    HeadSelector::new(7, 4,  "Syntactic"),
    HeadSelector::new(3, 9,  "Forward skip"),
];

pub const COMPACT_SENTENCES: &[&str] = &[
    "The dog chased the cat because it was angry",
    "The chef who won the competition opened a restaurant",
    "She picked up the guitar and played a song",
    "The old cat sat on the warm mat and slept",
];

pub const COMPACT_HEADS: &[HeadSelector] = &[
    HeadSelector::new(2, 0, "Next word"),
    HeadSelector::new(3, 5, "Previous word"),
    HeadSelector::new(4, 3, "Self / pronoun"),
    HeadSelector::new(7, 4, "Syntactic"),
];

/// A sentence set, the heads to pull for each sentence and the
/// rounding applied to the written matrices.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionPreset {
    pub name:      &'static str,
    pub sentences: &'static [&'static str],
    pub heads:     &'static [HeadSelector],
    pub precision: u32,
}

pub const FULL_PRESET: ExtractionPreset = ExtractionPreset {
    name:      "full",
    sentences: FULL_SENTENCES,
    heads:     FULL_HEADS,
    precision: 4,
};

pub const COMPACT_PRESET: ExtractionPreset = ExtractionPreset {
    name:      "compact",
    sentences: COMPACT_SENTENCES,
    heads:     COMPACT_HEADS,
    precision: 3,
};

// ─── Next-word training grid ──────────────────────────────────────────────────

/// One hyperparameter configuration; vocab_size comes from the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridEntry {
    pub name:        &'static str,
    pub context_len: usize,
    pub embed_dim:   usize,
    pub hidden_dim:  usize,
}

impl GridEntry {
    pub const fn new(name: &'static str, context_len: usize, embed_dim: usize, hidden_dim: usize) -> Self {
        Self { name, context_len, embed_dim, hidden_dim }
    }
}

pub const FULL_GRID: &[GridEntry] = &[
    GridEntry::new("ctx2_e32_h128",  2, 32,  128),
    GridEntry::new("ctx2_e64_h128",  2, 64,  128),
    GridEntry::new("ctx2_e64_h256",  2, 64,  256),
    GridEntry::new("ctx3_e32_h128",  3, 32,  128),
    GridEntry::new("ctx3_e64_h128",  3, 64,  128),
    GridEntry::new("ctx3_e64_h256",  3, 64,  256),
    GridEntry::new("ctx3_e128_h256", 3, 128, 256),
];

pub const SMOKE_GRID: &[GridEntry] = &[
    GridEntry::new("ctx2_e16_h32", 2, 16, 32),
    GridEntry::new("ctx3_e16_h32", 3, 16, 32),
];

// ─── Probes ───────────────────────────────────────────────────────────────────

/// Printed after training with the overall best model
pub const DEMO_PHRASES: &[&str] = &["once upon", "the little", "she was", "he said", "they went"];

/// Printed by the probe command for every loaded model
pub const PROBE_PHRASES: &[&str] = &[
    "once upon",
    "once upon a",
    "the little",
    "the little girl",
    "she was",
    "she was very",
    "he said",
    "they went to",
    "the cat sat",
    "it was a",
];

/// Words that should get similar continuations after "the"
pub const WORD_GROUPS: &[&[&str]] = &[
    &["cat", "dog", "bird"],
    &["boy", "girl", "child"],
    &["happy", "sad", "angry"],
];

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_preset_fits_bert_base() {
        for h in FULL_PRESET.heads.iter().chain(COMPACT_PRESET.heads) {
            assert!(h.layer < 12 && h.head < 12, "{h:?}");
        }
        assert_eq!(FULL_PRESET.sentences.len(), 8);
        assert_eq!(FULL_PRESET.heads.len(), 10);
    }

    #[test]
    fn test_grid_names_match_dimensions() {
        for g in FULL_GRID.iter().chain(SMOKE_GRID) {
            let expected = format!("ctx{}_e{}_h{}", g.context_len, g.embed_dim, g.hidden_dim);
            assert_eq!(g.name, expected);
        }
    }
}
