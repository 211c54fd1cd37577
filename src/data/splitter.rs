// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles all examples ONCE and holds out the tail as the
// validation split:
//
//   [ ............ shuffled examples ............ ]
//   [ ─────── train (95%) ─────── | ─ val (5%) ─ ]
//
// The validation split is only ever used to measure loss and
// accuracy; it never updates parameters.
//
// The shuffle is seeded so two runs over the same corpus see
// the same split, which keeps validation losses comparable
// across the configuration grid.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// The boundary is `floor(len * train_fraction)`.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).floor() as usize;
    let split_at = split_at.min(total);

    // split_off(n) leaves [0..n) in `samples` and returns [n..)
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.95, 7);
        assert_eq!(train.len(), 95);
        assert_eq!(val.len(),   5);
    }

    #[test]
    fn test_split_truncates_like_integer_cast() {
        // 0.95 * 39 = 37.05 → 37 train, 2 val
        let items: Vec<usize> = (0..39).collect();
        let (train, val)      = split_train_val(items, 0.95, 7);
        assert_eq!(train.len(), 37);
        assert_eq!(val.len(),   2);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.7, 1);
        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val((0..200).collect::<Vec<u32>>(), 0.95, 42);
        let b = split_train_val((0..200).collect::<Vec<u32>>(), 0.95, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.95, 0);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
