// ============================================================
// Layer 6 — Attention Capture File
// ============================================================
// The pretrained transformer runs outside this binary. Whatever
// runtime hosts it dumps one record per sentence:
//
//   [
//     { "sentence":   "The dog chased the cat ...",
//       "tokens":     ["[CLS]", "the", "dog", ..., "[SEP]"],
//       "attentions": [ layer ][ head ][ query ][ key ] },
//     ...
//   ]
//
// CaptureFile indexes those records by sentence text and serves
// them through the AttentionSource trait.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use crate::domain::attention::CapturedAttention;
use crate::domain::traits::AttentionSource;

#[derive(Deserialize)]
struct CaptureRecord {
    sentence: String,
    #[serde(flatten)]
    capture: CapturedAttention,
}

pub struct CaptureFile {
    by_sentence: HashMap<String, CapturedAttention>,
}

impl CaptureFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open attention capture '{}'", path.display()))?;
        let records: Vec<CaptureRecord> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Malformed attention capture '{}'", path.display()))?;

        let capture = Self::from_records(records);
        if capture.is_empty() {
            bail!("attention capture '{}' holds no sentences", path.display());
        }
        tracing::info!("Loaded {} captured sentences from '{}'", capture.len(), path.display());
        Ok(capture)
    }

    fn from_records(records: Vec<CaptureRecord>) -> Self {
        let by_sentence = records
            .into_iter()
            .map(|r| (r.sentence, r.capture))
            .collect();
        Self { by_sentence }
    }

    pub fn len(&self) -> usize {
        self.by_sentence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sentence.is_empty()
    }
}

impl AttentionSource for CaptureFile {
    fn capture(&self, sentence: &str) -> Result<CapturedAttention> {
        self.by_sentence
            .get(sentence)
            .cloned()
            .ok_or_else(|| anyhow!("no captured attention for sentence \"{sentence}\""))
    }
}
