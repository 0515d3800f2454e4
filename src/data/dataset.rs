use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::example::FeatureBundle;

/// One encoded example with its label, as the DataLoader sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencySample {
    pub x_nucl: Vec<f32>,
    pub x_pi:   Vec<f32>,
    pub label:  f32,
}

pub struct EfficiencyDataset {
    samples: Vec<EfficiencySample>,
}

impl EfficiencyDataset {
    /// Samples for the bundle rows listed in `indices`, in that order.
    pub fn from_bundle(bundle: &FeatureBundle, labels: &[f32], indices: &[usize]) -> Self {
        let samples = indices
            .iter()
            .map(|&i| {
                let (x_nucl, x_pi) = bundle.example(i);
                EfficiencySample {
                    x_nucl: x_nucl.to_vec(),
                    x_pi:   x_pi.to_vec(),
                    label:  labels[i],
                }
            })
            .collect();
        Self { samples }
    }
}

impl Dataset<EfficiencySample> for EfficiencyDataset {
    fn get(&self, index: usize) -> Option<EfficiencySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
