// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `attention`, `train` and
// `probe`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, enums, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    attention_use_case::AttentionConfig,
    presets::{ExtractionPreset, GridEntry, COMPACT_PRESET, FULL_GRID, FULL_PRESET, SMOKE_GRID},
    probe_use_case::ProbeConfig,
    train_use_case::TrainConfig,
};
use crate::infra::model_codec::ExportFormat;
use crate::ml::{trainer::TrainSettings, DeviceKind};

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn captured transformer attention into word-level JSON
    Attention(AttentionArgs),

    /// Train the next-word model grid and export the best models
    Train(TrainArgs),

    /// Load exported models and print top-5 predictions
    Probe(ProbeArgs),
}

// ─── Value enums ──────────────────────────────────────────────────────────────

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PresetArg {
    /// 8 sentences, 10 heads, 4 decimals
    Full,
    /// 4 sentences, 4 heads, 3 decimals
    Compact,
}

impl From<PresetArg> for ExtractionPreset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Full    => FULL_PRESET,
            PresetArg::Compact => COMPACT_PRESET,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum GridArg {
    /// The seven production configurations
    Full,
    /// Two tiny configurations for a quick end-to-end run
    Smoke,
}

impl GridArg {
    fn entries(self) -> &'static [GridEntry] {
        match self {
            GridArg::Full  => FULL_GRID,
            GridArg::Smoke => SMOKE_GRID,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    /// JSON metadata + little-endian .weights.bin
    Binary,
    /// Single JSON file with nested weight arrays
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Binary => ExportFormat::Binary,
            FormatArg::Json   => ExportFormat::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DeviceArg {
    Wgpu,
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

// ─── attention ────────────────────────────────────────────────────────────────

/// All arguments for the `attention` command.
#[derive(Args, Debug)]
pub struct AttentionArgs {
    /// JSON dump of [{sentence, tokens, attentions}] from the transformer
    #[arg(long)]
    pub capture: PathBuf,

    /// Which sentence/head set to extract
    #[arg(long, value_enum, default_value_t = PresetArg::Full)]
    pub preset: PresetArg,

    /// Decimal places kept in the matrices (defaults to the preset's)
    #[arg(long)]
    pub precision: Option<u32>,

    /// Where to write the attention JSON
    #[arg(long, default_value = "public/data/bert-attention-data.json")]
    pub output: PathBuf,
}

impl From<AttentionArgs> for AttentionConfig {
    fn from(a: AttentionArgs) -> Self {
        AttentionConfig {
            capture_path: a.capture,
            output_path:  a.output,
            preset:       a.preset.into(),
            precision:    a.precision,
        }
    }
}

// ─── train ────────────────────────────────────────────────────────────────────

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Pretrained WordPiece tokenizer (HuggingFace tokenizer.json)
    #[arg(long, default_value = "public/data/tokenizer/ts-tokenizer-4096.json")]
    pub tokenizer: PathBuf,

    /// Corpus: .jsonl with {"text": ...} per line, or plain text
    /// with records separated by <|endoftext|> lines
    #[arg(long)]
    pub corpus: PathBuf,

    /// Stop reading the corpus after this many records
    #[arg(long, default_value_t = 50_000)]
    pub max_records: usize,

    /// Where exported models and metrics.csv are written
    #[arg(long, default_value = "public/data/next-word-model")]
    pub output_dir: PathBuf,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Examples per optimiser step
    #[arg(long, default_value_t = 1024)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for the train/validation split and per-epoch shuffles
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = FormatArg::Binary)]
    pub format: FormatArg,

    #[arg(long, value_enum, default_value_t = GridArg::Full)]
    pub grid: GridArg,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            tokenizer_path: a.tokenizer,
            corpus_path:    a.corpus,
            output_dir:     a.output_dir,
            max_records:    a.max_records,
            settings: TrainSettings {
                epochs:     a.epochs,
                batch_size: a.batch_size,
                lr:         a.lr,
                seed:       a.seed,
            },
            grid:   a.grid.entries(),
            format: a.format.into(),
            device: a.device.into(),
        }
    }
}

// ─── probe ────────────────────────────────────────────────────────────────────

/// All arguments for the `probe` command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// The tokenizer the models were trained with
    #[arg(long, default_value = "public/data/tokenizer/ts-tokenizer-4096.json")]
    pub tokenizer: PathBuf,

    /// Directory holding <name>.json and <name>.weights.bin
    #[arg(long, default_value = "public/data/next-word-model")]
    pub model_dir: PathBuf,

    /// Comma-separated model names to probe
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "next-word-ctx2,next-word-ctx3,next-word-best"
    )]
    pub names: Vec<String>,
}

impl From<ProbeArgs> for ProbeConfig {
    fn from(a: ProbeArgs) -> Self {
        ProbeConfig {
            tokenizer_path: a.tokenizer,
            model_dir:      a.model_dir,
            names:          a.names,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::super::Cli;
    use super::*;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["widget-artifacts", "train", "--corpus", "stories.jsonl"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.max_records, 50_000);
        assert_eq!(cfg.settings.epochs, 5);
        assert_eq!(cfg.settings.batch_size, 1024);
        assert_eq!(cfg.grid.len(), 7);
        assert_eq!(cfg.format, ExportFormat::Binary);
        assert_eq!(cfg.device, DeviceKind::Wgpu);
    }

    #[test]
    fn test_probe_names_split_on_commas() {
        let cli = Cli::try_parse_from(["widget-artifacts", "probe", "--names", "a,b"]).unwrap();
        let Commands::Probe(args) = cli.command else { panic!("expected probe") };
        assert_eq!(args.names, vec!["a", "b"]);

        let cli = Cli::try_parse_from(["widget-artifacts", "probe"]).unwrap();
        let Commands::Probe(args) = cli.command else { panic!("expected probe") };
        assert_eq!(args.names.len(), 3);
    }

    #[test]
    fn test_attention_preset_and_precision() {
        let cli = Cli::try_parse_from([
            "widget-artifacts", "attention", "--capture", "cap.json",
            "--preset", "compact", "--precision", "2",
        ])
        .unwrap();
        let Commands::Attention(args) = cli.command else { panic!("expected attention") };
        let cfg: AttentionConfig = args.into();
        assert_eq!(cfg.preset.name, "compact");
        assert_eq!(cfg.precision, Some(2));
    }
}
