// ============================================================
// Layer 2 — AttentionUseCase
// ============================================================
// Builds the word-level attention artifact:
//
//   Step 1: Load the captured attention      (Layer 6 - infra)
//   Step 2: Check the preset's heads exist   (this file)
//   Step 3: Per sentence: align words        (Layer 4 - data)
//   Step 4: Per head: merge + renormalise    (Layer 4 - data)
//   Step 5: Round and write the JSON         (Layer 6 - infra)
//
// A short text summary (top-3 targets per word) is printed for
// every sentence/head so the chosen heads can be eyeballed.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::application::presets::ExtractionPreset;
use crate::data::{
    alignment::align_words,
    attention_merge::{merge_subword_attention, round_matrix, top_targets},
};
use crate::domain::attention::{CapturedAttention, HeadAttention, HeadSelector, SentenceAttention};
use crate::domain::traits::AttentionSource;
use crate::infra::{attention_capture::CaptureFile, attention_store::write_attention_artifact};

/// How many targets the per-word summary lists
const SUMMARY_TOP: usize = 3;

#[derive(Debug, Clone)]
pub struct AttentionConfig {
    pub capture_path: PathBuf,
    pub output_path:  PathBuf,
    pub preset:       ExtractionPreset,
    /// Overrides the preset's rounding when set
    pub precision:    Option<u32>,
}

// ─── AttentionExtractor ───────────────────────────────────────────────────────
pub struct AttentionExtractor<'a> {
    source:    &'a dyn AttentionSource,
    heads:     &'a [HeadSelector],
    precision: u32,
}

impl<'a> AttentionExtractor<'a> {
    pub fn new(source: &'a dyn AttentionSource, heads: &'a [HeadSelector], precision: u32) -> Self {
        Self { source, heads, precision }
    }

    pub fn extract_all(&self, sentences: &[&str]) -> Result<Vec<SentenceAttention>> {
        sentences.iter().map(|s| self.extract(s)).collect()
    }

    /// Word-level attention of every configured head for one sentence.
    pub fn extract(&self, sentence: &str) -> Result<SentenceAttention> {
        let captured = self.source.capture(sentence)?;
        check_capture(&captured, self.heads, sentence)?;

        let alignment = align_words(&captured.tokens, sentence)?;
        let words: Vec<String> = sentence.split_whitespace().map(String::from).collect();
        tracing::debug!(
            "'{}': {} words over {} subword tokens",
            sentence, alignment.word_count(), captured.tokens.len()
        );

        println!("\n--- {sentence} ---");

        let mut heads = Vec::with_capacity(self.heads.len());
        for sel in self.heads {
            // presence checked above
            let Some(raw) = captured.head(sel.layer, sel.head) else {
                bail!("layer {} head {} missing from capture", sel.layer, sel.head);
            };
            let merged = merge_subword_attention(raw, &alignment);

            print_summary(sel, &words, &merged);

            heads.push(HeadAttention {
                layer:     sel.layer,
                head:      sel.head,
                label:     sel.label.to_string(),
                attention: round_matrix(&merged, self.precision),
            });
        }

        Ok(SentenceAttention { sentence: sentence.to_string(), words, heads })
    }
}

/// Every selector must address an existing head, and each of those
/// matrices must be square over the captured tokens.
fn check_capture(captured: &CapturedAttention, heads: &[HeadSelector], sentence: &str) -> Result<()> {
    let n = captured.tokens.len();
    for sel in heads {
        let Some(m) = captured.head(sel.layer, sel.head) else {
            bail!(
                "head selector L{}H{} ('{}') is outside the captured model \
                 ({} layers × {} heads)",
                sel.layer, sel.head, sel.label, captured.num_layers(), captured.num_heads()
            );
        };
        if m.len() != n || m.iter().any(|row| row.len() != n) {
            bail!(
                "L{}H{} attention for \"{}\" is not {}×{} (one row/column per token)",
                sel.layer, sel.head, sentence, n, n
            );
        }
    }
    Ok(())
}

fn print_summary(sel: &HeadSelector, words: &[String], merged: &[Vec<f64>]) {
    println!("  {} (L{}H{}):", sel.label, sel.layer, sel.head);
    for (word, row) in words.iter().zip(merged) {
        let targets = top_targets(row, SUMMARY_TOP)
            .into_iter()
            .map(|j| format!("{}({:.0}%)", words[j], row[j] * 100.0))
            .collect::<Vec<_>>()
            .join(", ");
        println!("    {word:>15} → {targets}");
    }
}

// ─── AttentionUseCase ─────────────────────────────────────────────────────────
pub struct AttentionUseCase {
    config: AttentionConfig,
}

impl AttentionUseCase {
    pub fn new(config: AttentionConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg       = &self.config;
        let precision = cfg.precision.unwrap_or(cfg.preset.precision);

        tracing::info!(
            "Extracting attention: preset '{}' ({} sentences, {} heads, {} decimals)",
            cfg.preset.name, cfg.preset.sentences.len(), cfg.preset.heads.len(), precision
        );

        let source    = CaptureFile::load(&cfg.capture_path)?;
        let extractor = AttentionExtractor::new(&source, cfg.preset.heads, precision);
        let results   = extractor.extract_all(cfg.preset.sentences)?;

        write_attention_artifact(&cfg.output_path, &results)?;
        println!("\nWrote {}", cfg.output_path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// One token per word plus sentinels, every head a fixed
    /// "attend to the next token" pattern.
    struct NextTokenSource {
        layers: usize,
        heads:  usize,
    }

    impl AttentionSource for NextTokenSource {
        fn capture(&self, sentence: &str) -> Result<CapturedAttention> {
            let mut tokens = vec!["[CLS]".to_string()];
            for w in sentence.split_whitespace() {
                let w = w.to_lowercase();
                // split long words to exercise the merge
                if w.len() > 6 {
                    tokens.push(w[..3].to_string());
                    tokens.push(format!("##{}", &w[3..]));
                } else {
                    tokens.push(w);
                }
            }
            tokens.push("[SEP]".to_string());

            let n = tokens.len();
            let matrix: Vec<Vec<f32>> = (0..n)
                .map(|q| {
                    let mut row = vec![0.02f32; n];
                    row[(q + 1) % n] += 1.0 - 0.02 * n as f32;
                    row
                })
                .collect();
            Ok(CapturedAttention {
                tokens,
                layers: vec![vec![matrix; self.heads]; self.layers],
            })
        }
    }

    const HEADS: &[HeadSelector] = &[
        HeadSelector::new(2, 0, "Next word"),
        HeadSelector::new(3, 5, "Previous word"),
    ];

    #[test]
    fn test_rows_are_distributions_and_word_count_matches() {
        let source    = NextTokenSource { layers: 12, heads: 12 };
        let extractor = AttentionExtractor::new(&source, HEADS, 4);
        let sentence  = "The chef who won the competition opened a restaurant";
        let out       = extractor.extract(sentence).unwrap();

        assert_eq!(out.words.len(), 9);
        assert_eq!(out.words[0], "The");
        assert_eq!(out.heads.len(), 2);
        for h in &out.heads {
            assert_eq!(h.attention.len(), 9);
            for row in &h.attention {
                assert_eq!(row.len(), 9);
                let sum: f64 = row.iter().sum();
                // 4-decimal rounding can move the sum by a few 1e-4
                assert!((sum - 1.0).abs() < 1e-3, "row sums to {sum}");
            }
        }
        assert_eq!(out.heads[0].label, "Next word");
    }

    #[test]
    fn test_next_token_head_points_at_next_word() {
        let source    = NextTokenSource { layers: 4, heads: 6 };
        let extractor = AttentionExtractor::new(&source, &HEADS[..1], 4);
        let out       = extractor.extract("a b c d").unwrap();
        let m         = &out.heads[0].attention;
        for i in 0..3 {
            assert_eq!(top_targets(&m[i], 1), vec![i + 1]);
        }
    }

    #[test]
    fn test_out_of_range_head_is_error() {
        let source    = NextTokenSource { layers: 3, heads: 4 };
        let extractor = AttentionExtractor::new(&source, HEADS, 4);
        assert!(extractor.extract("a b c").is_err());
    }

    #[test]
    fn test_precision_is_applied() {
        let source    = NextTokenSource { layers: 4, heads: 6 };
        let extractor = AttentionExtractor::new(&source, &HEADS[..1], 2);
        let out       = extractor.extract("one two three").unwrap();
        for v in out.heads[0].attention.iter().flatten() {
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-9);
        }
    }
}
