// ============================================================
// Layer 3 — Next-Word Model Specification
// ============================================================
// Describes the next-word model in framework-free terms so the
// export codec can read and write it without touching Burn.
//
// Parameter tensors, always handled in this fixed order:
//
//   slot          shape
//   ──────────    ─────────────────────────────────
//   embedding     [vocab_size, embed_dim]
//   fc1_weight    [hidden_dim, context_len * embed_dim]
//   fc1_bias      [hidden_dim]
//   fc2_weight    [vocab_size, hidden_dim]
//   fc2_bias      [vocab_size]
//
// Linear weights are stored output-major ([d_output, d_input]),
// the layout the browser predictor indexes as W[out * d_input + in].
// Burn keeps `Linear::weight` input-major, so the model transposes
// on the way out and back in.

use serde::{Deserialize, Serialize};

/// Placeholder written into the vocabulary for ids the tokenizer
/// has no string for.
pub const UNKNOWN_TOKEN: &str = "[UNK]";

/// The four integers that fully determine every parameter shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vocab_size:  usize,
    pub embed_dim:   usize,
    pub context_len: usize,
    pub hidden_dim:  usize,
}

impl ModelConfig {
    /// Expected shape for one parameter slot
    pub fn shape_of(&self, slot: ParamSlot) -> Vec<usize> {
        match slot {
            ParamSlot::Embedding => vec![self.vocab_size, self.embed_dim],
            ParamSlot::Fc1Weight => vec![self.hidden_dim, self.context_len * self.embed_dim],
            ParamSlot::Fc1Bias   => vec![self.hidden_dim],
            ParamSlot::Fc2Weight => vec![self.vocab_size, self.hidden_dim],
            ParamSlot::Fc2Bias   => vec![self.vocab_size],
        }
    }

    /// Total number of trainable scalars
    pub fn param_count(&self) -> usize {
        ParamSlot::ORDER
            .iter()
            .map(|&slot| self.shape_of(slot).iter().product::<usize>())
            .sum()
    }
}

/// Names the five parameter tensors in their serialisation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSlot {
    Embedding,
    Fc1Weight,
    Fc1Bias,
    Fc2Weight,
    Fc2Bias,
}

impl ParamSlot {
    /// The order tensors appear in the weight blob
    pub const ORDER: [ParamSlot; 5] = [
        ParamSlot::Embedding,
        ParamSlot::Fc1Weight,
        ParamSlot::Fc1Bias,
        ParamSlot::Fc2Weight,
        ParamSlot::Fc2Bias,
    ];

    /// Key used in the JSON weight document
    pub fn name(self) -> &'static str {
        match self {
            ParamSlot::Embedding => "embedding",
            ParamSlot::Fc1Weight => "fc1_weight",
            ParamSlot::Fc1Bias   => "fc1_bias",
            ParamSlot::Fc2Weight => "fc2_weight",
            ParamSlot::Fc2Bias   => "fc2_bias",
        }
    }
}

/// A dense row-major f32 tensor detached from any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamTensor {
    pub shape: Vec<usize>,
    pub data:  Vec<f32>,
}

impl ParamTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Product of the extents (1 for a rank-0 tensor)
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// The five trained tensors of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParameters {
    pub embedding:  ParamTensor,
    pub fc1_weight: ParamTensor,
    pub fc1_bias:   ParamTensor,
    pub fc2_weight: ParamTensor,
    pub fc2_bias:   ParamTensor,
}

impl ModelParameters {
    pub fn get(&self, slot: ParamSlot) -> &ParamTensor {
        match slot {
            ParamSlot::Embedding => &self.embedding,
            ParamSlot::Fc1Weight => &self.fc1_weight,
            ParamSlot::Fc1Bias   => &self.fc1_bias,
            ParamSlot::Fc2Weight => &self.fc2_weight,
            ParamSlot::Fc2Bias   => &self.fc2_bias,
        }
    }

    /// Assemble from tensors given in `ParamSlot::ORDER`
    pub fn from_ordered(tensors: [ParamTensor; 5]) -> Self {
        let [embedding, fc1_weight, fc1_bias, fc2_weight, fc2_bias] = tensors;
        Self { embedding, fc1_weight, fc1_bias, fc2_weight, fc2_bias }
    }

    /// Iterate (slot, tensor) pairs in serialisation order
    pub fn iter(&self) -> impl Iterator<Item = (ParamSlot, &ParamTensor)> + '_ {
        ParamSlot::ORDER.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    /// First slot whose shape disagrees with `config`, if any
    pub fn first_mismatch(&self, config: &ModelConfig) -> Option<(ParamSlot, Vec<usize>, Vec<usize>)> {
        self.iter().find_map(|(slot, t)| {
            let expected = config.shape_of(slot);
            (t.shape != expected).then(|| (slot, expected, t.shape.clone()))
        })
    }
}

/// id → token string, dense over [0, vocab_size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    tokens: Vec<String>,
}

impl Vocabulary {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Build a dense vocabulary of `size` entries, filling ids the
    /// lookup cannot resolve with `UNKNOWN_TOKEN`.
    pub fn from_lookup(size: usize, lookup: impl Fn(u32) -> Option<String>) -> Self {
        let tokens = (0..size)
            .map(|id| lookup(id as u32).unwrap_or_else(|| UNKNOWN_TOKEN.to_string()))
            .collect();
        Self::new(tokens)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token string for an id, `UNKNOWN_TOKEN` when out of range
    pub fn token(&self, id: u32) -> &str {
        self.tokens
            .get(id as usize)
            .map_or(UNKNOWN_TOKEN, String::as_str)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ModelConfig {
        ModelConfig { vocab_size: 10, embed_dim: 4, context_len: 3, hidden_dim: 6 }
    }

    #[test]
    fn test_shapes_follow_config() {
        let c = cfg();
        assert_eq!(c.shape_of(ParamSlot::Embedding), vec![10, 4]);
        assert_eq!(c.shape_of(ParamSlot::Fc1Weight), vec![6, 12]);
        assert_eq!(c.shape_of(ParamSlot::Fc1Bias),   vec![6]);
        assert_eq!(c.shape_of(ParamSlot::Fc2Weight), vec![10, 6]);
        assert_eq!(c.shape_of(ParamSlot::Fc2Bias),   vec![10]);
    }

    #[test]
    fn test_param_count() {
        // 40 + 72 + 6 + 60 + 10
        assert_eq!(cfg().param_count(), 188);
    }

    #[test]
    fn test_vocab_fills_unknown_ids() {
        let v = Vocabulary::from_lookup(4, |id| (id != 2).then(|| format!("t{id}")));
        let tokens: Vec<&str> = (0..4).map(|id| v.token(id)).collect();
        assert_eq!(tokens, ["t0", "t1", UNKNOWN_TOKEN, "t3"]);
        assert_eq!(v.len(), 4);
        assert_eq!(v.token(99), UNKNOWN_TOKEN);
    }

    #[test]
    fn test_first_mismatch_reports_slot() {
        let c = cfg();
        let mk = |slot: ParamSlot| {
            let shape = c.shape_of(slot);
            let n = shape.iter().product();
            ParamTensor::new(shape, vec![0.0; n])
        };
        let mut params = ModelParameters::from_ordered(ParamSlot::ORDER.map(mk));
        assert!(params.first_mismatch(&c).is_none());

        params.fc1_bias = ParamTensor::new(vec![7], vec![0.0; 7]);
        let (slot, expected, got) = params.first_mismatch(&c).unwrap();
        assert_eq!(slot, ParamSlot::Fc1Bias);
        assert_eq!(expected, vec![6]);
        assert_eq!(got, vec![7]);
    }
}
