// ============================================================
// Layer 4 — Context Windows
// ============================================================
// Slides a window of `context_len + 1` tokens over each
// tokenized story. The first `context_len` ids are the input,
// the last one is the token to predict:
//
//   story:  [12, 7, 99, 3, 41]     context_len = 2
//   pairs:  [12, 7]  → 99
//           [7, 99]  → 3
//           [99, 3]  → 41
//
// A story of length L yields max(0, L - C) examples. Stories
// are windowed independently so no example ever spans two
// documents.

use crate::data::dataset::NextWordSample;

/// Every (context, target) pair inside one tokenized record.
pub fn context_windows(
    ids:         &[u32],
    context_len: usize,
) -> impl Iterator<Item = NextWordSample> + '_ {
    ids.windows(context_len + 1).map(move |w| NextWordSample {
        context: w[..context_len].to_vec(),
        target:  w[context_len],
    })
}

/// Training examples for all records; records shorter than
/// `context_len + 1` contribute nothing.
pub fn build_samples(records: &[Vec<u32>], context_len: usize) -> Vec<NextWordSample> {
    records
        .iter()
        .filter(|r| r.len() > context_len)
        .flat_map(|r| context_windows(r, context_len))
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_count_is_len_minus_context() {
        let ids: Vec<u32> = (0..10).collect();
        for c in 1..=12 {
            let n = context_windows(&ids, c).count();
            assert_eq!(n, ids.len().saturating_sub(c), "context_len={c}");
        }
    }

    #[test]
    fn test_target_is_one_past_context() {
        let ids = vec![12, 7, 99, 3, 41];
        let samples: Vec<_> = context_windows(&ids, 2).collect();
        assert_eq!(samples[0], NextWordSample { context: vec![12, 7], target: 99 });
        assert_eq!(samples[2], NextWordSample { context: vec![99, 3], target: 41 });
        assert!(samples.iter().all(|s| s.context.len() == 2));
    }

    #[test]
    fn test_windows_never_cross_records() {
        let records = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let samples = build_samples(&records, 2);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].target, 3);
        // [2, 3] → 4 would cross the boundary
        assert_eq!(samples[1], NextWordSample { context: vec![4, 5], target: 6 });
    }

    #[test]
    fn test_short_records_are_skipped() {
        let records = vec![vec![1, 2], vec![3], vec![4, 5, 6, 7]];
        let samples = build_samples(&records, 3);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].target, 7);
    }

    #[test]
    fn test_context_longer_than_every_record_yields_nothing() {
        let records = vec![vec![1, 2, 3]];
        assert!(build_samples(&records, 5).is_empty());
    }
}
