// ============================================================
// Layer 5 — Model Selection
// ============================================================
// After the whole grid has trained we keep:
//   - the lowest-val-loss configuration for each distinct
//     context length (exported as next-word-ctx{C})
//   - the single lowest-val-loss configuration overall
//     (exported as next-word-best)
//
// Ties keep the configuration that appears first in the grid.
// A diverged run (NaN loss) ranks below every finite loss.

use std::collections::BTreeMap;

use crate::domain::model_spec::ModelConfig;

/// The outcome of training one grid entry.
pub struct ConfigResult<M> {
    pub name:     String,
    pub config:   ModelConfig,
    pub params:   usize,
    pub val_loss: f64,
    pub model:    M,
}

/// Indices into the results slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// (context_len, index of its best result), ascending context_len
    pub per_context: Vec<(usize, usize)>,
    pub overall:     Option<usize>,
}

fn rank_loss(val_loss: f64) -> f64 {
    if val_loss.is_nan() { f64::INFINITY } else { val_loss }
}

pub fn select_best<M>(results: &[ConfigResult<M>]) -> Selection {
    let mut per_context: BTreeMap<usize, usize> = BTreeMap::new();

    for (idx, r) in results.iter().enumerate() {
        per_context
            .entry(r.config.context_len)
            .and_modify(|best| {
                if rank_loss(r.val_loss) < rank_loss(results[*best].val_loss) {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    let overall = per_context
        .values()
        .copied()
        .reduce(|a, b| {
            let (la, lb) = (rank_loss(results[a].val_loss), rank_loss(results[b].val_loss));
            if lb < la || (lb == la && b < a) { b } else { a }
        });

    Selection {
        per_context: per_context.into_iter().collect(),
        overall,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, ctx: usize, val_loss: f64) -> ConfigResult<()> {
        ConfigResult {
            name: name.into(),
            config: ModelConfig { vocab_size: 10, embed_dim: 4, context_len: ctx, hidden_dim: 8 },
            params: 0,
            val_loss,
            model: (),
        }
    }

    #[test]
    fn test_best_per_context_and_overall() {
        let results = vec![
            result("ctx2_a", 2, 4.1),
            result("ctx2_b", 2, 3.9),
            result("ctx3_a", 3, 3.7),
            result("ctx3_b", 3, 3.8),
        ];
        let s = select_best(&results);
        assert_eq!(s.per_context, vec![(2, 1), (3, 2)]);
        assert_eq!(s.overall, Some(2));
    }

    #[test]
    fn test_tie_keeps_first_in_grid() {
        let results = vec![result("a", 2, 3.0), result("b", 2, 3.0), result("c", 3, 3.0)];
        let s = select_best(&results);
        assert_eq!(s.per_context, vec![(2, 0), (3, 2)]);
        assert_eq!(s.overall, Some(0));
    }

    #[test]
    fn test_nan_loss_never_wins() {
        let results = vec![result("nan", 2, f64::NAN), result("ok", 2, 5.0)];
        let s = select_best(&results);
        assert_eq!(s.per_context, vec![(2, 1)]);
        assert_eq!(s.overall, Some(1));
    }

    #[test]
    fn test_empty_results() {
        let s = select_best::<()>(&[]);
        assert!(s.per_context.is_empty());
        assert_eq!(s.overall, None);
    }
}
