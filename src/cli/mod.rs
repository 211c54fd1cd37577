// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `attention` — word-level attention JSON for the widget
//   2. `train`     — trains the next-word grid, exports models
//   3. `probe`     — loads exported models, prints predictions
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AttentionArgs, Commands, ProbeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "widget-artifacts",
    version,
    about = "Build the attention maps and next-word models used by the browser widgets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Attention(args) => run_attention(args),
            Commands::Train(args)     => run_train(args),
            Commands::Probe(args)     => run_probe(args),
        }
    }
}

fn run_attention(args: AttentionArgs) -> Result<()> {
    use crate::application::attention_use_case::AttentionUseCase;

    tracing::info!("Reading captured attention from: {}", args.capture.display());
    AttentionUseCase::new(args.into()).execute()
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on corpus: {}", args.corpus.display());
    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "\nTraining complete: {} configurations. Exported: {}",
        report.summary.len(),
        report.exported.join(", ")
    );
    Ok(())
}

fn run_probe(args: ProbeArgs) -> Result<()> {
    use crate::application::probe_use_case::ProbeUseCase;

    ProbeUseCase::new(args.into()).execute()
}
