// ============================================================
// Layer 4 — Fold Partitioner
// ============================================================
// Assigns every record to one of K cross-validation folds:
//
//   fold = uniqueindex mod K
//
// For fold f:
//   test  = records with fold == f
//   train = records with fold != f
//
// Assignment depends on `uniqueindex` alone, so re-running on
// the same rows yields identical folds. Records keep their
// source order inside each partition, and every partition holds
// its own copies.

use anyhow::{ensure, Result};

use crate::domain::record::Record;

/// Number of cross-validation folds.
pub const FOLD_COUNT: usize = 5;

/// Euclidean remainder keeps negative indices inside 0..folds.
pub fn assign_fold(unique_index: i64, folds: usize) -> usize {
    unique_index.rem_euclid(folds as i64) as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldSplit {
    pub fold: usize,
    pub train: Vec<Record>,
    pub test: Vec<Record>,
}

#[derive(Debug, Clone, Copy)]
pub struct FoldPartitioner {
    folds: usize,
}

impl FoldPartitioner {
    /// Fails for fewer than 2 folds: a single fold leaves nothing to train on.
    pub fn new(folds: usize) -> Result<Self> {
        ensure!(folds >= 2, "Cross-validation needs at least 2 folds, got {folds}");
        Ok(Self { folds })
    }

    pub fn split(&self, records: &[Record], fold: usize) -> FoldSplit {
        let (test, train): (Vec<Record>, Vec<Record>) = records
            .iter()
            .cloned()
            .partition(|r| assign_fold(r.unique_index, self.folds) == fold);
        FoldSplit { fold, train, test }
    }

    /// One split per fold that has at least one test record, in fold order.
    pub fn splits(&self, records: &[Record]) -> Vec<FoldSplit> {
        (0..self.folds)
            .map(|fold| self.split(records, fold))
            .filter(|split| {
                if split.test.is_empty() {
                    tracing::warn!("Fold {} has no records; skipping it", split.fold);
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

impl Default for FoldPartitioner {
    fn default() -> Self {
        Self { folds: FOLD_COUNT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::synthetic_records;
    use std::collections::HashSet;

    #[test]
    fn test_fold_is_index_mod_five() {
        for idx in -12i64..40 {
            assert_eq!(assign_fold(idx, 5) as i64, idx.rem_euclid(5));
        }
        assert_eq!(assign_fold(-1, 5), 4);
    }

    #[test]
    fn test_folds_partition_all_records() {
        let records = synthetic_records(37, 23);
        let splits = FoldPartitioner::default().splits(&records);

        let mut seen = HashSet::new();
        for split in &splits {
            assert_eq!(split.train.len() + split.test.len(), records.len());
            for r in &split.test {
                assert_eq!(assign_fold(r.unique_index, 5), split.fold);
                // each record is a test record in exactly one fold
                assert!(seen.insert(r.unique_index));
            }
            assert!(split.train.iter().all(|r| assign_fold(r.unique_index, 5) != split.fold));
        }
        assert_eq!(seen.len(), records.len());
    }

    #[test]
    fn test_ten_rows_give_five_folds_of_two() {
        let records = synthetic_records(10, 23);
        let splits = FoldPartitioner::default().splits(&records);
        assert_eq!(splits.len(), 5);
        for split in &splits {
            assert_eq!(split.test.len(), 2);
            let ids: Vec<i64> = split.test.iter().map(|r| r.unique_index).collect();
            assert_eq!(ids, vec![split.fold as i64, split.fold as i64 + 5]);
        }
    }

    #[test]
    fn test_partitions_are_deterministic() {
        let records = synthetic_records(23, 23);
        let p = FoldPartitioner::default();
        assert_eq!(p.splits(&records), p.splits(&records));
    }

    #[test]
    fn test_empty_folds_are_skipped() {
        let records = synthetic_records(3, 23);
        let splits = FoldPartitioner::default().splits(&records);
        let folds: Vec<usize> = splits.iter().map(|s| s.fold).collect();
        assert_eq!(folds, vec![0, 1, 2]);
    }

    #[test]
    fn test_fewer_than_two_folds_is_an_error() {
        for folds in [0, 1] {
            let err = FoldPartitioner::new(folds).unwrap_err();
            assert!(err.to_string().contains("at least 2 folds"));
        }
        let splits = FoldPartitioner::new(2).unwrap().splits(&synthetic_records(4, 23));
        assert_eq!(splits.len(), 2);
    }
}
