// ============================================================
// Layer 2 — ProbeUseCase
// ============================================================
// Reference decoder for exported models. For every model name:
//
//   1. Read <name>.json (+ weights)      (Layer 6 - infra)
//   2. Rebuild the Burn model from the
//      framework-free parameters         (Layer 5 - ml)
//   3. Print top-5 predictions for the
//      probe phrases and the "the {word}"
//      generalization groups             (Layer 5 - ml)
//
// Inference runs on the CPU backend; the models are small.

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::{Path, PathBuf};

use crate::application::presets::{PROBE_PHRASES, WORD_GROUPS};
use crate::domain::traits::TokenEncoder;
use crate::infra::{model_codec::load_model, tokenizer_store::TokenizerStore};
use crate::ml::{
    cpu_device,
    inferencer::{format_predictions, Inferencer, PhrasePrediction},
    model::NextWordModelConfig,
};

type ProbeBackend = burn::backend::NdArray;

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub tokenizer_path: PathBuf,
    pub model_dir:      PathBuf,
    pub names:          Vec<String>,
}

pub struct ProbeUseCase {
    config: ProbeConfig,
}

impl ProbeUseCase {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg       = &self.config;
        let tokenizer = TokenizerStore::load(&cfg.tokenizer_path)?;
        let device    = cpu_device();

        for name in &cfg.names {
            println!("\n{}", "=".repeat(60));
            println!("Model: {name}");
            println!("{}", "=".repeat(60));

            let inferencer = load_inferencer::<ProbeBackend>(&cfg.model_dir, name, &device)?;
            probe_model(&inferencer, &tokenizer)?;
        }
        Ok(())
    }
}

/// Rebuild an exported model on backend `B`.
pub fn load_inferencer<B: Backend>(dir: &Path, name: &str, device: &B::Device) -> Result<Inferencer<B>> {
    let artifact = load_model(dir, name)?;
    let model = NextWordModelConfig::from(&artifact.config)
        .init::<B>(device)
        .load_parameters(&artifact.params, device)
        .with_context(|| format!("Cannot rebuild model '{name}'"))?;

    tracing::info!(
        "Loaded '{}': context={}, embed={}, hidden={}, vocab={}",
        name,
        artifact.config.context_len,
        artifact.config.embed_dim,
        artifact.config.hidden_dim,
        artifact.config.vocab_size
    );
    Ok(Inferencer::new(model, artifact.vocab, device.clone()))
}

/// Print the probe phrases and generalization groups. Returns how
/// many phrases were long enough to predict from.
pub fn probe_model<B: Backend>(inferencer: &Inferencer<B>, encoder: &dyn TokenEncoder) -> Result<usize> {
    let mut probed = 0;

    for phrase in PROBE_PHRASES {
        if let Some(PhrasePrediction { context_tokens, predictions }) =
            inferencer.predict_phrase(encoder, phrase)?
        {
            println!("  [{}] → {}", context_tokens.join(", "), format_predictions(&predictions));
            probed += 1;
        }
    }

    println!("\n  Generalization test (similar words → similar predictions):");
    for group in WORD_GROUPS {
        println!("  Group: {group:?}");
        for word in group.iter() {
            let phrase = format!("the {word}");
            if let Some(p) = inferencer.predict_phrase(encoder, &phrase)? {
                println!("    {phrase} → {}", format_predictions(&p.predictions));
                probed += 1;
            }
        }
    }

    Ok(probed)
}
