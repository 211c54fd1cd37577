// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{anyhow, bail, Result};
use burn::prelude::*;

use crate::domain::model_spec::Vocabulary;
use crate::domain::traits::TokenEncoder;
use crate::ml::evaluation::top_k;
use crate::ml::model::NextWordModel;

/// How many candidates a probe reports
pub const TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub token:       String,
    pub probability: f32,
}

/// The context actually fed to the model and what came out.
#[derive(Debug, Clone)]
pub struct PhrasePrediction {
    pub context_tokens: Vec<String>,
    pub predictions:    Vec<Prediction>,
}

pub struct Inferencer<B: Backend> {
    model:  NextWordModel<B>,
    vocab:  Vocabulary,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: NextWordModel<B>, vocab: Vocabulary, device: B::Device) -> Self {
        Self { model, vocab, device }
    }

    pub fn context_len(&self) -> usize {
        self.model.context_len
    }

    /// Softmax over the vocabulary for exactly `context_len` ids.
    pub fn probabilities(&self, ids: &[u32]) -> Result<Vec<f32>> {
        if ids.len() != self.context_len() {
            bail!("expected {} context ids, got {}", self.context_len(), ids.len());
        }
        if let Some(&id) = ids.iter().find(|&&id| id as usize >= self.model.vocab_size) {
            bail!(
                "token id {} is outside the model's {}-entry vocabulary; \
                 was the model trained with this tokenizer?",
                id, self.model.vocab_size
            );
        }

        let flat: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
        let input = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, ids.len()]);

        let logits = self.model.forward(input);
        burn::tensor::activation::softmax(logits, 1)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("cannot read probabilities: {e:?}"))
    }

    /// The `k` most likely next tokens for `ids`.
    pub fn predict_ids(&self, ids: &[u32], k: usize) -> Result<Vec<Prediction>> {
        let probs = self.probabilities(ids)?;
        Ok(top_k(&probs, k)
            .into_iter()
            .map(|idx| Prediction {
                token:       self.vocab.token(idx as u32).to_string(),
                probability: probs[idx],
            })
            .collect())
    }

    /// Tokenize `phrase`, keep its last `context_len` ids and predict.
    /// Returns None when the phrase has fewer tokens than the context.
    pub fn predict_phrase(
        &self,
        encoder: &dyn TokenEncoder,
        phrase:  &str,
    ) -> Result<Option<PhrasePrediction>> {
        let ids = encoder.encode(phrase)?;
        let ctx = self.context_len();
        if ids.len() < ctx {
            tracing::debug!("'{}' has {} tokens, need {}; skipped", phrase, ids.len(), ctx);
            return Ok(None);
        }

        let context = &ids[ids.len() - ctx..];
        Ok(Some(PhrasePrediction {
            context_tokens: context.iter().map(|&id| self.vocab.token(id).to_string()).collect(),
            predictions:    self.predict_ids(context, TOP_K)?,
        }))
    }
}

/// "tok(12.3%), tok(4.0%)" as printed by the probes
pub fn format_predictions(preds: &[Prediction]) -> String {
    preds
        .iter()
        .map(|p| format!("{}({:.1}%)", p.token, p.probability * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}
