// ============================================================
// Layer 4 — Next-Word Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<NextWordSample>
// into tensors:
//
//   Input:  N samples, each with `context_len` ids
//   Output: contexts [N, context_len] (Int), targets [N] (Int)
//
// Every context in a run has the same length, so there is no
// padding: we flatten row by row and reshape.
//
// The targets are also kept as plain u32 so evaluation can score
// top-k hits on the CPU without reading an Int tensor back.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::NextWordSample;

/// A mini-batch ready for `NextWordModel::forward`.
#[derive(Debug, Clone)]
pub struct NextWordBatch<B: Backend> {
    /// Context token ids — shape: [batch_size, context_len]
    pub contexts: Tensor<B, 2, Int>,

    /// True next token per row — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,

    /// Same values as `targets`, host side
    pub target_ids: Vec<u32>,
}

/// Holds the device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct NextWordBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> NextWordBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<NextWordSample, NextWordBatch<B>> for NextWordBatcher<B> {
    fn batch(&self, items: Vec<NextWordSample>) -> NextWordBatch<B> {
        let batch_size  = items.len();
        let context_len = items.first().map_or(0, |s| s.context.len());

        // Vec<Vec<u32>> → flat Vec<i32> (Burn's Int tensors take i32)
        let context_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.context.iter().map(|&id| id as i32))
            .collect();

        let target_ids: Vec<u32> = items.iter().map(|s| s.target).collect();
        let target_flat: Vec<i32> = target_ids.iter().map(|&id| id as i32).collect();

        let contexts = Tensor::<B, 1, Int>::from_ints(
            context_flat.as_slice(), &self.device
        ).reshape([batch_size, context_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(
            target_flat.as_slice(), &self.device
        );

        NextWordBatch { contexts, targets, target_ids }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let batcher = NextWordBatcher::<NdArray>::new(Default::default());
        let items = vec![
            NextWordSample { context: vec![1, 2, 3], target: 4 },
            NextWordSample { context: vec![5, 6, 7], target: 8 },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.contexts.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);
        assert_eq!(batch.target_ids, vec![4, 8]);
    }
}
