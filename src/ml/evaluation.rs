// ============================================================
// Layer 5 — Evaluation Helpers
// ============================================================
// Host-side scoring of a batch of logits. Top-k needs a sort
// per row, which is done on the CPU once the logits are read
// back:
//
//   logits  [batch × vocab] (row-major f32)
//   targets [batch]
//
//   top-1 hit  ⇔  target is the arg-max of its row
//   top-5 hit  ⇔  target is among the 5 highest scores

/// Indices of the `k` highest scores, highest first.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(k);
    order
}

/// Correct-prediction counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopKHits {
    pub top1:  usize,
    pub top5:  usize,
    pub total: usize,
}

impl TopKHits {
    pub fn add(&mut self, other: TopKHits) {
        self.top1  += other.top1;
        self.top5  += other.top5;
        self.total += other.total;
    }

    pub fn top1_acc(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.top1 as f64 / self.total as f64 }
    }

    pub fn top5_acc(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.top5 as f64 / self.total as f64 }
    }
}

/// Count top-1 / top-5 hits for a flattened `[targets.len(), vocab_size]` logit block.
pub fn count_hits(logits: &[f32], vocab_size: usize, targets: &[u32]) -> TopKHits {
    let mut hits = TopKHits { total: targets.len(), ..Default::default() };

    for (row, &target) in logits.chunks_exact(vocab_size).zip(targets) {
        let best = top_k(row, 5);
        if best.first() == Some(&(target as usize)) {
            hits.top1 += 1;
        }
        if best.contains(&(target as usize)) {
            hits.top5 += 1;
        }
    }
    hits
}
