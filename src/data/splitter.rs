// ============================================================
// Layer 4 — Internal Validation Splitter
// ============================================================
// Carves a validation set out of a fold's training partition
// for early stopping and checkpointing.
//
// `cv` is the split ratio expressed as a fold count: cv = 5
// holds out the first fifth of the rows, the same rows a
// non-shuffled 5-way K-fold puts in its first test fold:
//
//   n = 12, cv = 5 → fold sizes 3 3 2 2 2 → valid = rows 0..3
//
// cv < 2 disables the split; the trainer then monitors the
// training loss instead.

/// Split `0..n` into (train indices, validation indices).
pub fn holdout_split(n: usize, cv: usize) -> (Vec<usize>, Vec<usize>) {
    if cv < 2 || n < cv {
        return ((0..n).collect(), Vec::new());
    }

    let valid_len = n / cv + usize::from(n % cv > 0);
    let valid: Vec<usize> = (0..valid_len).collect();
    let train: Vec<usize> = (valid_len..n).collect();

    tracing::debug!(
        "Internal split: {} training, {} validation (cv = {})",
        train.len(),
        valid.len(),
        cv
    );
    (train, valid)
}
