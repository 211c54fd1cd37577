// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pretrained transformer, the tokenizer artifact and the
// text corpus are all produced elsewhere. We only depend on
// what they can DO, expressed as traits:
//
//   AttentionSource → CaptureFile (infra)      + test fakes
//   CorpusSource    → TextCorpus (data)        + test fakes
//   TokenEncoder    → WordPieceTokenizer (infra) + test fakes
//
// Programming against these traits keeps the extraction and
// training pipelines testable without a 400MB model on disk.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::attention::CapturedAttention;
use crate::domain::model_spec::Vocabulary;

// ─── AttentionSource ──────────────────────────────────────────────────────────
/// Anything that can run a sentence through a transformer with
/// attention capture enabled.
pub trait AttentionSource {
    /// Tokenize `sentence` and return its subword tokens plus the
    /// attention weights of every layer and head.
    fn capture(&self, sentence: &str) -> Result<CapturedAttention>;
}

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// A streaming source of raw text records (one story per record).
///
/// Records are yielded lazily so callers can stop after a fixed
/// count without reading the rest of the corpus.
pub trait CorpusSource {
    fn records(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>>;
}

// ─── TokenEncoder ─────────────────────────────────────────────────────────────
/// The tokenizer artifact: text → ordered token ids, plus the
/// inverse id → token lookup.
pub trait TokenEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    fn vocab_size(&self) -> usize;

    fn id_to_token(&self, id: u32) -> Option<String>;

    /// Dense id → string table shipped next to every exported model
    fn vocabulary(&self) -> Vocabulary {
        Vocabulary::from_lookup(self.vocab_size(), |id| self.id_to_token(id))
    }
}
