// ============================================================
// Layer 4 — Dataset Builder
// ============================================================
// Combines the partitioner and the encoder into per-fold tensor
// bundles:
//
//   records ──► FoldPartitioner ──► FoldSplit { train, test }
//                                        │
//                                        ▼  FeatureEncoder per record
//                                   FoldData { train?, test }
//
// In Eval mode training rows are never encoded. After encoding
// every tensor is scanned for NaN; each hit is reported as a
// (fold, split, field) triple and either logged or turned into
// an error depending on NanPolicy.

use anyhow::Result;

use crate::data::encoder::FeatureEncoder;
use crate::data::partitioner::FoldPartitioner;
use crate::domain::error::{EncodingError, PipelineError};
use crate::domain::example::{FeatureBundle, Field, Split};
use crate::domain::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Encode both sides of every fold
    Train,
    /// Encode only the test side
    Eval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    #[default]
    Warn,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NanReport {
    pub fold: usize,
    pub split: Split,
    pub field: Field,
}

/// Encoded examples of one side of a fold.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: FeatureBundle,
    pub labels: Vec<f32>,
    pub unique_indices: Vec<i64>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn fields_with_nan(&self) -> Vec<Field> {
        let mut fields = self.features.fields_with_nan();
        if self.labels.iter().any(|v| v.is_nan()) {
            fields.push(Field::Labels);
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldData {
    pub fold: usize,
    /// None in Eval mode
    pub train: Option<Partition>,
    pub test: Partition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationSet {
    pub folds: Vec<FoldData>,
    pub nan_reports: Vec<NanReport>,
}

pub struct DatasetBuilder {
    encoder: FeatureEncoder,
    partitioner: FoldPartitioner,
    mode: BuildMode,
    nan_policy: NanPolicy,
}

impl DatasetBuilder {
    pub fn new(encoder: FeatureEncoder, partitioner: FoldPartitioner, mode: BuildMode) -> Self {
        Self {
            encoder,
            partitioner,
            mode,
            nan_policy: NanPolicy::default(),
        }
    }

    pub fn with_nan_policy(mut self, policy: NanPolicy) -> Self {
        self.nan_policy = policy;
        self
    }

    pub fn build(&self, records: &[Record]) -> Result<CrossValidationSet> {
        let mut folds = Vec::new();
        let mut nan_reports = Vec::new();

        for split in self.partitioner.splits(records) {
            let fold = split.fold;

            let train = match self.mode {
                BuildMode::Train => Some(self.encode_partition(fold, Split::Train, &split.train)?),
                BuildMode::Eval => None,
            };
            let test = self.encode_partition(fold, Split::Test, &split.test)?;

            tracing::info!(
                "Fold {}: {} training / {} test examples",
                fold,
                train.as_ref().map_or(0, Partition::len),
                test.len()
            );

            let sides = train
                .iter()
                .map(|p| (Split::Train, p))
                .chain(std::iter::once((Split::Test, &test)));
            for (side, partition) in sides {
                for field in partition.fields_with_nan() {
                    self.report_nan(NanReport { fold, split: side, field }, &mut nan_reports)?;
                }
            }

            folds.push(FoldData { fold, train, test });
        }

        Ok(CrossValidationSet { folds, nan_reports })
    }

    fn encode_partition(
        &self,
        fold: usize,
        side: Split,
        records: &[Record],
    ) -> Result<Partition, PipelineError> {
        let mut features = FeatureBundle::with_capacity(self.encoder.seq_len(), records.len());
        let mut labels = Vec::with_capacity(records.len());
        let mut unique_indices = Vec::with_capacity(records.len());

        for record in records {
            let example = self
                .encoder
                .encode(record)
                .map_err(|source| PipelineError::Encoding {
                    location: format!(
                        "fold {fold} {side} record uniqueindex={}",
                        record.unique_index
                    ),
                    source,
                })?;
            features.push(&example.x_nucl, &example.x_pi);
            labels.push(example.label);
            unique_indices.push(record.unique_index);
        }

        Ok(Partition { features, labels, unique_indices })
    }

    fn report_nan(&self, report: NanReport, reports: &mut Vec<NanReport>) -> Result<()> {
        match self.nan_policy {
            NanPolicy::Warn => {
                tracing::warn!(
                    "NaN values in fold {} {} {}",
                    report.fold,
                    report.split,
                    report.field
                );
                reports.push(report);
                Ok(())
            }
            NanPolicy::Strict => Err(EncodingError::NotFinite {
                fold: report.fold,
                split: report.split,
                field: report.field,
            }
            .into()),
        }
    }
}
