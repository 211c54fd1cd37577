// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch validation metrics for every configuration
// in the grid to one CSV file.
//
// Metrics recorded per epoch:
//   - run:        configuration name, e.g. ctx3_e64_h256
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean cross-entropy over training batches
//   - val_loss:   mean cross-entropy over validation batches
//   - top1_acc:   fraction of val targets ranked first
//   - top5_acc:   fraction of val targets in the 5 best scores
//
// Output file: <output_dir>/metrics.csv, rewritten every run.
//
// Example CSV output:
//   run,epoch,train_loss,val_loss,top1_acc,top5_acc
//   ctx2_e32_h128,1,4.812300,4.401200,0.188000,0.402000
//   ctx2_e32_h128,2,4.233100,4.190400,0.203000,0.431000
//
// How to read the metrics:
//   - A vocabulary of 4096 starts near ln(4096) ≈ 8.3 loss
//   - If val_loss rises while train_loss falls → overfitting

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Name of the configuration being trained
    pub run: String,

    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation split
    pub val_loss: f64,

    /// Fraction of validation targets that were the arg-max
    pub top1_acc: f64,

    /// Fraction of validation targets among the 5 best scores
    pub top5_acc: f64,
}

impl EpochMetrics {
    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Writes epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the CSV (truncating any previous run) and write the header.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "run,epoch,train_loss,val_loss,top1_acc,top5_acc")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            m.run,
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.top1_acc,
            m.top5_acc,
        )?;

        tracing::debug!(
            "Logged {} epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.run,
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn row(epoch: usize, val_loss: f64) -> EpochMetrics {
        EpochMetrics {
            run: "ctx2_e32_h128".into(),
            epoch,
            train_loss: 2.5,
            val_loss,
            top1_acc: 0.2,
            top5_acc: 0.45,
        }
    }

    #[test]
    fn test_is_improvement() {
        let m = row(2, 2.3);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_csv_rows_and_rerun_truncates() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::create(dir.path()).unwrap();
        logger.log(&row(1, 3.0)).unwrap();
        logger.log(&row(2, 2.9)).unwrap();
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(
            text.lines().nth(1).unwrap(),
            "ctx2_e32_h128,1,2.500000,3.000000,0.200000,0.450000"
        );

        // A second run starts from a fresh file
        let logger = MetricsLogger::create(dir.path()).unwrap();
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
