// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the pretrained WordPiece tokenizer artifact
// (a HuggingFace `tokenizer.json`) and exposes it through the
// TokenEncoder trait.
//
// The same file must be used for training and for probing:
// token ids are only meaningful relative to its vocabulary,
// and the exported vocab table is read back from it.
//
// Reference: Wu et al. (2016) Google's NMT System (WordPiece)

use anyhow::{anyhow, Result};
use std::path::Path;
use tokenizers::Tokenizer;

use crate::domain::traits::TokenEncoder;

pub struct TokenizerStore;

impl TokenizerStore {
    /// Load a previously saved tokenizer from its JSON file
    pub fn load(path: &Path) -> Result<WordPieceTokenizer> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?;

        tracing::info!(
            "Loaded tokenizer '{}' ({} tokens)",
            path.display(),
            inner.get_vocab_size(true)
        );
        Ok(WordPieceTokenizer { inner })
    }
}

pub struct WordPieceTokenizer {
    inner: Tokenizer,
}

impl TokenEncoder for WordPieceTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        // Special tokens follow the tokenizer's own post-processor,
        // matching how the corpus was tokenized for training.
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }
}
