// ============================================================
// Layer 6 — Attention Artifact Writer
// ============================================================
// Writes the word-level attention for every sentence as one
// pretty-printed JSON array. Each run overwrites the file.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use crate::domain::attention::SentenceAttention;

pub fn write_attention_artifact(path: &Path, sentences: &[SentenceAttention]) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, sentences)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    w.flush()?;

    let size = fs::metadata(path)?.len();
    tracing::info!("Saved {} sentences to '{}' ({} KB)", sentences.len(), path.display(), size / 1024);
    Ok(size)
}
