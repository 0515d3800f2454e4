// ============================================================
// Layer 3 — Correlation Scores
// ============================================================
// Pearson (linear) and Spearman (rank) agreement between
// predicted and measured efficiencies.
//
// Both return NaN when the score is undefined: fewer than two
// points, mismatched lengths, or a constant input.

use serde::{Deserialize, Serialize};

/// Held-out agreement for one fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldScore {
    pub fold: usize,
    pub pearson: f64,
    pub spearman: f64,
}

impl FoldScore {
    pub fn compute(fold: usize, predictions: &[f32], labels: &[f32]) -> Self {
        Self {
            fold,
            pearson: pearson(predictions, labels),
            spearman: spearman(predictions, labels),
        }
    }
}

/// Pearson product-moment correlation.
pub fn pearson(x: &[f32], y: &[f32]) -> f64 {
    let xs: Vec<f64> = x.iter().map(|&v| v as f64).collect();
    let ys: Vec<f64> = y.iter().map(|&v| v as f64).collect();
    pearson_f64(&xs, &ys)
}

/// Spearman rank correlation; tied values share their average rank.
pub fn spearman(x: &[f32], y: &[f32]) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    pearson_f64(&average_ranks(x), &average_ranks(y))
}

fn pearson_f64(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator > 0.0 {
        (cov / denominator).clamp(-1.0, 1.0)
    } else {
        f64::NAN
    }
}

/// 1-based ranks, ties averaged.
fn average_ranks(values: &[f32]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j are tied
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}
