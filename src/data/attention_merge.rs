// ============================================================
// Layer 4 — Subword → Word Attention Merge
// ============================================================
// Turns a raw subword attention matrix into a word attention
// matrix using a WordAlignment.
//
// Merge rule (block AVERAGE, not block sum):
//
//   merged[i][j] = Σ raw[s][t] / (|group_i| · |group_j|)
//                  s ∈ group_i
//                  t ∈ group_j
//
// Then every row is rescaled to sum to 1. The divisor is
// clamped to ROW_SUM_EPSILON so a numerically empty row stays
// finite instead of turning into NaN.
//
// Sums accumulate in f64; the captured weights are f32.

use crate::domain::attention::WordAlignment;

/// Smallest row sum we are willing to divide by
pub const ROW_SUM_EPSILON: f64 = 1e-9;

/// Block-average `raw` over the alignment groups and renormalise
/// each row. `raw` must be square and cover every index the
/// alignment mentions.
pub fn merge_subword_attention(raw: &[Vec<f32>], alignment: &WordAlignment) -> Vec<Vec<f64>> {
    let groups = alignment.groups();

    let mut merged: Vec<Vec<f64>> = groups
        .iter()
        .map(|src| {
            groups
                .iter()
                .map(|tgt| {
                    let total: f64 = src
                        .iter()
                        .flat_map(|&s| tgt.iter().map(move |&t| raw[s][t] as f64))
                        .sum();
                    total / (src.len() * tgt.len()) as f64
                })
                .collect()
        })
        .collect();

    renormalize_rows(&mut merged);
    merged
}

/// Scale each row to sum to 1, with the divisor clamped from below.
pub fn renormalize_rows(matrix: &mut [Vec<f64>]) {
    for row in matrix.iter_mut() {
        let sum: f64 = row.iter().sum();
        let divisor  = sum.max(ROW_SUM_EPSILON);
        for v in row.iter_mut() {
            *v /= divisor;
        }
    }
}

/// Round every entry to `precision` decimal places for the JSON artifact.
pub fn round_matrix(matrix: &[Vec<f64>], precision: u32) -> Vec<Vec<f64>> {
    let scale = 10f64.powi(precision as i32);
    matrix
        .iter()
        .map(|row| row.iter().map(|v| (v * scale).round() / scale).collect())
        .collect()
}

/// Indices of the `k` largest entries of `row`, largest first.
pub fn top_targets(row: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
    order.truncate(k);
    order
}
