// ============================================================
// Layer 4 — Word ↔ Subword Alignment
// ============================================================
// A WordPiece tokenizer splits rare words into pieces and marks
// every piece after the first with "##":
//
//   sentence: "The chef opened a restaurant"
//   tokens:   [CLS] the chef opened a restaurant [SEP]
//   sentence: "She strummed"
//   tokens:   [CLS] she st ##rum ##med [SEP]
//
// To draw word-level attention we need to know which tokens
// belong to which whitespace-separated word. We walk the tokens
// left to right:
//
//   1. Skip the leading sentinel ([CLS]) at index 0
//   2. For each word, take the next token as its first piece
//   3. Keep absorbing tokens that start with "##"
//   4. Never look at the trailing sentinel ([SEP])
//
// The sentence must be short enough to tokenize without
// truncation; running out of tokens is reported as an error.

use anyhow::{bail, Result};

use crate::domain::attention::WordAlignment;

/// Prefix WordPiece puts on continuation pieces
pub const CONTINUATION_MARKER: &str = "##";

/// Group subword token indices by whitespace word.
///
/// `tokens` must include one leading and one trailing sentinel.
pub fn align_words(tokens: &[String], sentence: &str) -> Result<WordAlignment> {
    let words: Vec<&str> = sentence.split_whitespace().collect();

    // Index of the trailing sentinel; content tokens live in 1..end
    let end = tokens.len().saturating_sub(1);

    let mut groups  = Vec::with_capacity(words.len());
    let mut tok_idx = 1usize;

    for (word_idx, word) in words.iter().enumerate() {
        if tok_idx >= end {
            bail!(
                "ran out of subword tokens at word {} ('{}') of \"{}\": \
                 {} tokens for {} words",
                word_idx,
                word,
                sentence,
                tokens.len(),
                words.len()
            );
        }

        let mut indices = vec![tok_idx];
        tok_idx += 1;

        while tok_idx < end && tokens[tok_idx].starts_with(CONTINUATION_MARKER) {
            indices.push(tok_idx);
            tok_idx += 1;
        }

        groups.push(indices);
    }

    if tok_idx < end {
        tracing::warn!(
            "{} subword tokens left unaligned in \"{}\"",
            end - tok_idx,
            sentence
        );
    }

    Ok(WordAlignment::new(groups))
}
