// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full next-word training pipeline in order:
//
//   Step 1: Load the WordPiece tokenizer  (Layer 6 - infra)
//   Step 2: Tokenize corpus records       (Layer 4 - data)
//   Step 3: For each grid configuration:
//             build context windows       (Layer 4 - data)
//             train + validate            (Layer 5 - ml)
//   Step 4: Print the results summary
//   Step 5: Pick best per context length
//           and overall                   (Layer 5 - ml)
//   Step 6: Export selected models        (Layer 6 - infra)
//   Step 7: Demo top-5 predictions        (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::{prelude::*, tensor::backend::AutodiffBackend};
use std::{path::PathBuf, time::Instant};

use crate::application::presets::{GridEntry, DEMO_PHRASES};
use crate::data::{corpus::TextCorpus, windows::build_samples};
use crate::domain::{
    model_spec::Vocabulary,
    traits::{CorpusSource, TokenEncoder},
};
use crate::infra::{
    metrics::MetricsLogger,
    model_codec::{export_model, ExportFormat, ModelArtifact},
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    cpu_device,
    inferencer::{format_predictions, Inferencer},
    model::{NextWordModel, NextWordModelConfig},
    selection::{select_best, ConfigResult, Selection},
    trainer::{train_model, TrainSettings},
    wgpu_device, CpuTrainBackend, DeviceKind, GpuTrainBackend,
};

/// Progress is logged every this many corpus records
const PROGRESS_EVERY: usize = 10_000;

/// Name of the export that holds the overall best model
pub const BEST_MODEL_NAME: &str = "next-word-best";

pub fn context_model_name(context_len: usize) -> String {
    format!("next-word-ctx{context_len}")
}

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub tokenizer_path: PathBuf,
    pub corpus_path:    PathBuf,
    pub output_dir:     PathBuf,
    pub max_records:    usize,
    pub settings:       TrainSettings,
    pub grid:           &'static [GridEntry],
    pub format:         ExportFormat,
    pub device:         DeviceKind,
}

/// What a pipeline run produced, for callers and tests.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// (configuration name, parameter count, best validation loss), grid order
    pub summary:  Vec<(String, usize, f64)>,
    /// Names of the exported artifacts
    pub exported: Vec<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        let tokenizer = TokenizerStore::load(&cfg.tokenizer_path)?;
        let corpus    = TextCorpus::new(&cfg.corpus_path);
        tracing::info!("Corpus '{}' ({:?})", cfg.corpus_path.display(), corpus.format());

        match cfg.device {
            DeviceKind::Wgpu => {
                tracing::info!("Using device: wgpu");
                run_pipeline::<GpuTrainBackend>(cfg, &corpus, &tokenizer, &wgpu_device())
            }
            DeviceKind::Cpu => {
                tracing::info!("Using device: cpu (ndarray)");
                run_pipeline::<CpuTrainBackend>(cfg, &corpus, &tokenizer, &cpu_device())
            }
        }
    }
}

/// Steps 2–7 on an arbitrary autodiff backend.
pub fn run_pipeline<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    corpus:  &dyn CorpusSource,
    encoder: &dyn TokenEncoder,
    device:  &B::Device,
) -> Result<TrainReport> {
    let vocab = encoder.vocabulary();
    if vocab.is_empty() {
        bail!("tokenizer '{}' has an empty vocabulary", cfg.tokenizer_path.display());
    }
    tracing::info!("Vocab size: {}", vocab.len());

    // ── Step 2: Tokenize ──────────────────────────────────────────────────────
    let records = tokenize_corpus(corpus, encoder, cfg.max_records)?;

    // ── Step 3: Train the grid ────────────────────────────────────────────────
    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("Cannot create '{}'", cfg.output_dir.display()))?;
    let metrics = MetricsLogger::create(&cfg.output_dir)?;
    tracing::info!("Per-epoch metrics: '{}'", metrics.csv_path().display());

    let results = train_grid::<B>(cfg.grid, vocab.len(), &records, &cfg.settings, device, &metrics)?;

    // ── Step 4: Summary ───────────────────────────────────────────────────────
    print_summary(&results);

    // ── Steps 5–6: Select and export ──────────────────────────────────────────
    let selection = select_best(&results);
    let exported  = export_selection(&results, &selection, &vocab, cfg)?;

    // ── Step 7: Demo ──────────────────────────────────────────────────────────
    if let Some(best) = selection.overall.map(|i| &results[i]) {
        println!("\n{}", "=".repeat(60));
        println!("DEMO: Top-5 predictions");
        println!("{}", "=".repeat(60));

        let inferencer = Inferencer::new(best.model.clone(), vocab.clone(), device.clone());
        for phrase in DEMO_PHRASES {
            if let Some(p) = inferencer.predict_phrase(encoder, phrase)? {
                println!("  '{}' → {}", phrase, format_predictions(&p.predictions));
            }
        }
    }

    Ok(TrainReport {
        summary: results.iter().map(|r| (r.name.clone(), r.params, r.val_loss)).collect(),
        exported,
    })
}

/// Encode up to `max_records` records independently. Empty encodings
/// are dropped; windows never cross a record boundary.
pub fn tokenize_corpus(
    corpus:      &dyn CorpusSource,
    encoder:     &dyn TokenEncoder,
    max_records: usize,
) -> Result<Vec<Vec<u32>>> {
    tracing::info!("Tokenizing up to {} records", max_records);

    let mut out = Vec::new();
    for (i, record) in corpus.records()?.take(max_records).enumerate() {
        let ids = encoder.encode(&record?)?;
        if !ids.is_empty() {
            out.push(ids);
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!("  Tokenized {} records...", i + 1);
        }
    }

    let total: usize = out.iter().map(Vec::len).sum();
    tracing::info!("  Done: {} records, {} total tokens", out.len(), total);
    Ok(out)
}

/// Train every grid entry in order.
pub fn train_grid<B: AutodiffBackend>(
    grid:       &[GridEntry],
    vocab_size: usize,
    records:    &[Vec<u32>],
    settings:   &TrainSettings,
    device:     &B::Device,
    metrics:    &MetricsLogger,
) -> Result<Vec<ConfigResult<NextWordModel<B::InnerBackend>>>> {
    let mut results = Vec::with_capacity(grid.len());

    for entry in grid {
        println!("\n{}", "=".repeat(60));
        println!(
            "Config: {} (context={}, embed={}, hidden={})",
            entry.name, entry.context_len, entry.embed_dim, entry.hidden_dim
        );
        println!("{}", "=".repeat(60));

        let model_cfg = NextWordModelConfig::new(vocab_size, entry.embed_dim, entry.context_len, entry.hidden_dim);
        let spec      = model_cfg.spec();
        let samples   = build_samples(records, entry.context_len);
        tracing::info!("Training samples: {}", samples.len());
        tracing::info!("Parameters: {}", spec.param_count());

        let started = Instant::now();
        let outcome = train_model::<B>(entry.name, &model_cfg, samples, settings, device, Some(metrics))?;
        tracing::info!("Training time: {:.1}s", started.elapsed().as_secs_f64());
        if let Some(last) = outcome.history.last() {
            tracing::info!(
                "Final epoch: top-1 {:.2}%, top-5 {:.2}%",
                last.top1_acc * 100.0, last.top5_acc * 100.0
            );
        }

        results.push(ConfigResult {
            name:     entry.name.to_string(),
            config:   spec,
            params:   spec.param_count(),
            val_loss: outcome.best_val_loss,
            model:    outcome.model,
        });
    }

    Ok(results)
}

fn print_summary<M>(results: &[ConfigResult<M>]) {
    println!("\n{}", "=".repeat(60));
    println!("RESULTS SUMMARY");
    println!("{}", "=".repeat(60));
    println!("{:<20} {:>10} {:>10}", "Name", "Params", "Val Loss");
    println!("{}", "-".repeat(42));
    for r in results {
        println!("{:<20} {:>10} {:>10.4}", r.name, r.params, r.val_loss);
    }
}

/// Export the per-context winners and the overall winner.
pub fn export_selection<B: Backend>(
    results:   &[ConfigResult<NextWordModel<B>>],
    selection: &Selection,
    vocab:     &Vocabulary,
    cfg:       &TrainConfig,
) -> Result<Vec<String>> {
    let mut targets: Vec<(String, usize)> = selection
        .per_context
        .iter()
        .map(|&(ctx, idx)| (context_model_name(ctx), idx))
        .collect();

    if let Some(idx) = selection.overall {
        targets.push((BEST_MODEL_NAME.to_string(), idx));
    }

    let mut exported = Vec::with_capacity(targets.len());
    for (name, idx) in targets {
        let r = &results[idx];
        let label = if name == BEST_MODEL_NAME { "Overall best".to_string() } else {
            format!("Best context-{} model", r.config.context_len)
        };
        println!("\n{}: {} (loss={:.4}, params={})", label, r.name, r.val_loss, r.params);

        let artifact = ModelArtifact {
            config: r.config,
            vocab:  vocab.clone(),
            params: r.model.to_parameters()?,
        };
        tracing::info!("Exporting '{}' to '{}'", name, cfg.output_dir.display());
        export_model(&cfg.output_dir, &name, &artifact, cfg.format)?;
        exported.push(name);
    }

    Ok(exported)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::model_codec::load_model;
    use burn::backend::{Autodiff, NdArray};
    use std::collections::HashMap;

    type TestBackend = Autodiff<NdArray>;

    struct VecCorpus(Vec<String>);

    impl CorpusSource for VecCorpus {
        fn records(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>> {
            Ok(Box::new(self.0.iter().cloned().map(Ok)))
        }
    }

    /// Whitespace tokenizer; unknown words map to 0
    struct WordEncoder {
        words: Vec<String>,
        ids:   HashMap<String, u32>,
    }

    impl WordEncoder {
        fn new(words: &[&str]) -> Self {
            let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
            let ids = words.iter().enumerate().map(|(i, w)| (w.clone(), i as u32)).collect();
            Self { words, ids }
        }
    }

    impl TokenEncoder for WordEncoder {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text
                .split_whitespace()
                .map(|w| self.ids.get(&w.to_lowercase()).copied().unwrap_or(0))
                .collect())
        }
        fn vocab_size(&self) -> usize { self.words.len() }
        fn id_to_token(&self, id: u32) -> Option<String> { self.words.get(id as usize).cloned() }
    }

    const WORDS: &[&str] = &[
        "[UNK]", "once", "upon", "a", "time", "the", "little", "she", "was", "happy",
        "he", "said", "they", "went", "home",
    ];

    fn stories() -> Vec<String> {
        let lines = [
            "once upon a time the little girl was happy",
            "she was happy he said they went home",
            "the little a time once upon she was happy",
            "they went home he said once upon a time",
        ];
        (0..40).map(|i| lines[i % lines.len()].to_string()).collect()
    }

    const TINY_GRID: &[GridEntry] = &[
        GridEntry::new("ctx2_e4_h8",  2, 4, 8),
        GridEntry::new("ctx2_e8_h8",  2, 8, 8),
        GridEntry::new("ctx3_e4_h8",  3, 4, 8),
    ];

    const LONG_CONTEXT_GRID: &[GridEntry] = &[GridEntry::new("ctx20_e4_h8", 20, 4, 8)];

    fn config(dir: &std::path::Path, format: ExportFormat) -> TrainConfig {
        TrainConfig {
            tokenizer_path: dir.join("unused-tokenizer.json"),
            corpus_path:    dir.join("unused-corpus.txt"),
            output_dir:     dir.join("out"),
            max_records:    30,
            settings:       TrainSettings { epochs: 2, batch_size: 16, lr: 1e-2, seed: 7 },
            grid:           TINY_GRID,
            format,
            device:         DeviceKind::Cpu,
        }
    }

    #[test]
    fn test_tokenize_respects_max_records() {
        let corpus  = VecCorpus(stories());
        let encoder = WordEncoder::new(WORDS);
        let records = tokenize_corpus(&corpus, &encoder, 5).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0][..4], [1, 2, 3, 4]);
    }

    #[test]
    fn test_pipeline_exports_per_context_and_best() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path(), ExportFormat::Binary);
        let corpus  = VecCorpus(stories());
        let encoder = WordEncoder::new(WORDS);
        let device  = Default::default();

        let report = run_pipeline::<TestBackend>(&cfg, &corpus, &encoder, &device).unwrap();

        assert_eq!(report.summary.len(), 3);
        assert_eq!(report.exported, vec!["next-word-ctx2", "next-word-ctx3", "next-word-best"]);

        let out = &cfg.output_dir;
        for name in &report.exported {
            assert!(out.join(format!("{name}.json")).exists());
            assert!(out.join(format!("{name}.weights.bin")).exists());
        }

        let csv = std::fs::read_to_string(out.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1 + 3 * 2);

        let ctx3 = load_model(out, "next-word-ctx3").unwrap();
        assert_eq!(ctx3.config.context_len, 3);
        assert_eq!(ctx3.vocab.len(), WORDS.len());

        // overall best is the lowest loss in the summary
        let best = load_model(out, "next-word-best").unwrap();
        let (_, _, best_loss) = report
            .summary
            .iter()
            .cloned()
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .unwrap();
        let winner = report.summary.iter().find(|s| s.2 == best_loss).unwrap();
        let entry  = TINY_GRID.iter().find(|g| g.name == winner.0).unwrap();
        assert_eq!(best.config.context_len, entry.context_len);
        assert_eq!(best.config.embed_dim, entry.embed_dim);
    }

    #[test]
    fn test_json_format_writes_single_file() {
        let dir     = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), ExportFormat::Json);
        cfg.grid    = &TINY_GRID[..1];
        let corpus  = VecCorpus(stories());
        let encoder = WordEncoder::new(WORDS);

        let report = run_pipeline::<TestBackend>(&cfg, &corpus, &encoder, &Default::default()).unwrap();
        assert_eq!(report.exported, vec!["next-word-ctx2", "next-word-best"]);
        assert!(!cfg.output_dir.join("next-word-best.weights.bin").exists());
        assert!(load_model(&cfg.output_dir, "next-word-best").is_ok());
    }

    #[test]
    fn test_context_longer_than_every_record_is_error() {
        let dir     = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), ExportFormat::Binary);
        cfg.grid    = LONG_CONTEXT_GRID;
        let corpus  = VecCorpus(stories());
        let encoder = WordEncoder::new(WORDS);

        assert!(run_pipeline::<TestBackend>(&cfg, &corpus, &encoder, &Default::default()).is_err());
    }

    #[test]
    fn test_empty_vocabulary_is_error() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path(), ExportFormat::Binary);
        let corpus  = VecCorpus(stories());
        let encoder = WordEncoder::new(&[]);

        let err = run_pipeline::<TestBackend>(&cfg, &corpus, &encoder, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("empty vocabulary"), "{err}");
        assert!(!cfg.output_dir.exists());
    }
}
