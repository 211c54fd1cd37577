// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Trains one NextWordModel configuration:
//
//   1. Shuffle all examples once, hold out the last 5%
//   2. Each epoch: reshuffle the training split, run
//      mini-batches of cross-entropy + Adam
//   3. After each epoch: score the held-out split for
//      average loss, top-1 and top-5 accuracy
//
// Burn notes:
//   - Training runs on B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend, so the
//     validation batcher is built for the inner backend too
//   - DataLoaderBuilder::shuffle(seed) draws a fresh permutation
//     every time the loader is iterated, i.e. once per epoch
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::NextWordBatcher,
    dataset::{NextWordDataset, NextWordSample},
    splitter::split_train_val,
};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluation::{count_hits, TopKHits};
use crate::ml::model::{NextWordModel, NextWordModelConfig};

/// Fraction of examples used for training; the rest is validation
pub const TRAIN_FRACTION: f64 = 0.95;

/// Optimisation settings shared by every configuration in a grid.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub epochs:     usize,
    pub batch_size: usize,
    pub lr:         f64,
    pub seed:       u64,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            epochs:     5,
            batch_size: 1024,
            lr:         1e-3,
            seed:       42,
        }
    }
}

/// A trained model (on the inner, non-autodiff backend) and its history.
pub struct TrainOutcome<B: Backend> {
    pub model:         NextWordModel<B>,
    pub best_val_loss: f64,
    pub history:       Vec<EpochMetrics>,
}

pub fn train_model<B: AutodiffBackend>(
    run_name:  &str,
    model_cfg: &NextWordModelConfig,
    samples:   Vec<NextWordSample>,
    settings:  &TrainSettings,
    device:    &B::Device,
    metrics:   Option<&MetricsLogger>,
) -> Result<TrainOutcome<B::InnerBackend>> {
    if samples.is_empty() {
        bail!(
            "configuration '{}' produced no training examples: context_len {} \
             exceeds every tokenized record",
            run_name, model_cfg.context_len
        );
    }

    // ── Split once ────────────────────────────────────────────────────────────
    let (train_samples, val_samples) = split_train_val(samples, TRAIN_FRACTION, settings.seed);
    if train_samples.is_empty() || val_samples.is_empty() {
        bail!(
            "configuration '{}' has too few examples for a train/validation split \
             ({} train, {} validation)",
            run_name, train_samples.len(), val_samples.len()
        );
    }
    tracing::info!(
        "{}: {} train / {} validation examples",
        run_name, train_samples.len(), val_samples.len()
    );

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: NextWordModel<B> = model_cfg.init(device);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend, reshuffled per epoch) ──────────
    let train_loader = DataLoaderBuilder::new(NextWordBatcher::<B>::new(device.clone()))
        .batch_size(settings.batch_size)
        .shuffle(settings.seed)
        .build(NextWordDataset::new(train_samples));

    // ── Validation data loader (InnerBackend, no autodiff) ────────────────────
    let val_loader = DataLoaderBuilder::new(NextWordBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(settings.batch_size)
        .build(NextWordDataset::new(val_samples));

    let mut best_val_loss = f64::INFINITY;
    let mut history       = Vec::with_capacity(settings.epochs);

    for epoch in 1..=settings.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.contexts, batch.targets);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.lr, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(device);

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut hits         = TopKHits::default();

        for batch in val_loader.iter() {
            let logits = model_valid.forward(batch.contexts);

            val_loss_sum += ce
                .forward(logits.clone(), batch.targets)
                .into_scalar()
                .elem::<f64>();
            val_batches += 1;

            let scores = logits
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("cannot read logits: {e:?}"))?;
            hits.add(count_hits(&scores, model_cfg.vocab_size, &batch.target_ids));
        }

        let row = EpochMetrics {
            run:        run_name.to_string(),
            epoch,
            train_loss: train_loss_sum / train_batches.max(1) as f64,
            val_loss:   val_loss_sum / val_batches.max(1) as f64,
            top1_acc:   hits.top1_acc(),
            top5_acc:   hits.top5_acc(),
        };

        if row.is_improvement(best_val_loss) {
            best_val_loss = row.val_loss;
        }

        println!(
            "  Epoch {}/{}: train_loss={:.4}  val_loss={:.4}  top1_acc={:.1}%  top5_acc={:.1}%",
            epoch, settings.epochs, row.train_loss, row.val_loss,
            row.top1_acc * 100.0, row.top5_acc * 100.0,
        );

        if let Some(logger) = metrics {
            logger.log(&row)?;
        }
        history.push(row);
    }

    Ok(TrainOutcome {
        model: model.valid(),
        best_val_loss,
        history,
    })
}
