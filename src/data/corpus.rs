// ============================================================
// Layer 4 — Text Corpus
// ============================================================
// Streams raw story records from a local corpus dump. Two
// on-disk layouts are understood, chosen by file extension:
//
//   *.jsonl / *.json  — JSON Lines, one {"text": "..."} per line
//                       (the shape of a HuggingFace dataset export)
//   anything else     — plain text, records separated by a line
//                       that is exactly "<|endoftext|>"
//
// Records are produced lazily from a BufReader, so a run that
// only wants the first 50k stories never reads the rest of a
// multi-gigabyte file. The file handle is owned by the iterator
// and closed when the iterator is dropped.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

use crate::domain::traits::CorpusSource;

/// Separator line between stories in plain-text dumps
pub const RECORD_SEPARATOR: &str = "<|endoftext|>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    JsonLines,
    PlainText,
}

impl CorpusFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("json") => CorpusFormat::JsonLines,
            _ => CorpusFormat::PlainText,
        }
    }
}

/// A corpus file on disk.
pub struct TextCorpus {
    path:   PathBuf,
    format: CorpusFormat,
}

impl TextCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path   = path.into();
        let format = CorpusFormat::from_path(&path);
        Self { path, format }
    }

    pub fn format(&self) -> CorpusFormat {
        self.format
    }
}

impl CorpusSource for TextCorpus {
    fn records(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open corpus '{}'", self.path.display()))?;
        let lines = BufReader::new(file).lines();

        tracing::debug!("Streaming {:?} corpus from '{}'", self.format, self.path.display());

        let records: Box<dyn Iterator<Item = Result<String>>> = match self.format {
            CorpusFormat::JsonLines => Box::new(JsonLineRecords { lines, line_no: 0 }),
            CorpusFormat::PlainText => Box::new(PlainRecords { lines, done: false }),
        };
        Ok(records)
    }
}

#[derive(Deserialize)]
struct JsonRecord {
    text: String,
}

struct JsonLineRecords {
    lines:   Lines<BufReader<File>>,
    line_no: usize,
}

impl Iterator for JsonLineRecords {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(l) => l,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            let line_no = self.line_no;
            return Some(
                serde_json::from_str::<JsonRecord>(&line)
                    .map(|r| r.text)
                    .with_context(|| format!("Malformed corpus record on line {line_no}")),
            );
        }
    }
}

struct PlainRecords {
    lines: Lines<BufReader<File>>,
    done:  bool,
}

impl Iterator for PlainRecords {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let mut buf: Vec<String> = Vec::new();

            loop {
                match self.lines.next() {
                    None => {
                        self.done = true;
                        break;
                    }
                    Some(Err(e)) => return Some(Err(e.into())),
                    Some(Ok(line)) if line.trim() == RECORD_SEPARATOR => break,
                    Some(Ok(line)) => buf.push(line),
                }
            }

            let record = buf.join("\n").trim().to_string();
            // Consecutive separators produce empty records; skip them
            if !record.is_empty() {
                return Some(Ok(record));
            }
        }
        None
    }
}
