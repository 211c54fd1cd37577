// ============================================================
// Layer 3 — Attention Domain Types
// ============================================================
// A transformer produces, for every (layer, head), a square
// matrix of subword-to-subword attention. The widgets want the
// same thing at WORD granularity, so we carry three shapes of
// data through the pipeline:
//
//   CapturedAttention  — raw subword tokens + layers[l][h][q][k]
//   WordAlignment      — word index → contiguous subword indices
//   SentenceAttention  — the JSON record written per sentence
//
// Example alignment for "The dog chased the cat":
//   tokens:  [CLS] the dog chase ##d the cat [SEP]
//   groups:  [[1], [2], [3, 4], [5], [6]]
//
// Reference: Clark et al. (2019) "What Does BERT Look At?"

use serde::{Deserialize, Serialize};

/// A (layer, head) coordinate inside the transformer plus the
/// human label shown in the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadSelector {
    /// 0-based transformer layer
    pub layer: usize,
    /// 0-based head within the layer
    pub head: usize,
    /// What this head appears to do, e.g. "Previous word"
    pub label: &'static str,
}

impl HeadSelector {
    pub const fn new(layer: usize, head: usize, label: &'static str) -> Self {
        Self { layer, head, label }
    }
}

/// Raw attention captured from one forward pass over a sentence.
///
/// `layers[layer][head]` is a `tokens.len() × tokens.len()` matrix;
/// row `q` is the softmax distribution of query token `q` over keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedAttention {
    /// Subword tokens including the leading and trailing sentinels
    pub tokens: Vec<String>,

    /// Indexed as [layer][head][query][key]
    #[serde(rename = "attentions")]
    pub layers: Vec<Vec<Vec<Vec<f32>>>>,
}

impl CapturedAttention {
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Heads per layer, taken from the first layer (0 when empty)
    pub fn num_heads(&self) -> usize {
        self.layers.first().map_or(0, |l| l.len())
    }

    /// The raw subword matrix for one head, if it exists
    pub fn head(&self, layer: usize, head: usize) -> Option<&[Vec<f32>]> {
        self.layers
            .get(layer)
            .and_then(|heads| heads.get(head))
            .map(|m| m.as_slice())
    }
}

/// Mapping from word index to the ordered subword-token indices
/// that make up that word.
///
/// Invariant: groups are non-empty, contiguous, in order, and
/// together cover every non-sentinel token exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAlignment {
    groups: Vec<Vec<usize>>,
}

impl WordAlignment {
    pub fn new(groups: Vec<Vec<usize>>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn word_count(&self) -> usize {
        self.groups.len()
    }
}

/// One head's word-level attention, ready for the JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadAttention {
    pub layer: usize,
    pub head:  usize,
    pub label: String,
    /// N×N row-major, N = word count, each row sums to 1
    pub attention: Vec<Vec<f64>>,
}

/// Everything the attention widget needs for a single sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceAttention {
    pub sentence: String,
    pub words:    Vec<String>,
    pub heads:    Vec<HeadAttention>,
}
