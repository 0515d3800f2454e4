// ============================================================
// Layer 4 — Efficiency Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of
// EfficiencySamples into tensors.
//
// How batching works here:
//   Input:  N samples, each with flat [L, 6] and [L, 4] blocks
//   Output: EfficiencyBatch with
//             x_nucl  [N, L, 6]
//             x_pi    [N, L, 4]
//             targets [N]
//
//   Every block is already row-major, so concatenating the
//   samples and wrapping the Vec in TensorData with the right
//   shape is all that is needed.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::EfficiencySample;
use crate::domain::example::{FeatureBundle, AUX_CHANNELS, NUCLEOTIDE_CHANNELS};

// ─── EfficiencyBatch ──────────────────────────────────────────────────────────
/// A batch of encoded examples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct EfficiencyBatch<B: Backend> {
    /// One-hot sequence channels, shape [batch_size, seq_len, 6]
    pub x_nucl: Tensor<B, 3>,

    /// Auxiliary channels, shape [batch_size, seq_len, 4]
    pub x_pi: Tensor<B, 3>,

    /// Measured efficiency, shape [batch_size]
    pub targets: Tensor<B, 1>,
}

// ─── EfficiencyBatcher ────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct EfficiencyBatcher<B: Backend> {
    pub device:  B::Device,
    pub seq_len: usize,
}

impl<B: Backend> EfficiencyBatcher<B> {
    pub fn new(device: B::Device, seq_len: usize) -> Self {
        Self { device, seq_len }
    }

    /// Feature tensors for bundle rows `start..end`, without labels.
    pub fn features(&self, bundle: &FeatureBundle, start: usize, end: usize) -> (Tensor<B, 3>, Tensor<B, 3>) {
        let n = end - start;
        let nucl_stride = self.seq_len * NUCLEOTIDE_CHANNELS;
        let pi_stride = self.seq_len * AUX_CHANNELS;

        let x_nucl = bundle.x_nucl()[start * nucl_stride..end * nucl_stride].to_vec();
        let x_pi = bundle.x_pi()[start * pi_stride..end * pi_stride].to_vec();
        (self.tensor3(x_nucl, n, NUCLEOTIDE_CHANNELS), self.tensor3(x_pi, n, AUX_CHANNELS))
    }

    fn tensor3(&self, values: Vec<f32>, n: usize, channels: usize) -> Tensor<B, 3> {
        Tensor::from_data(TensorData::new(values, [n, self.seq_len, channels]), &self.device)
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<EfficiencySample, EfficiencyBatch<B>> for EfficiencyBatcher<B> {
    fn batch(&self, items: Vec<EfficiencySample>) -> EfficiencyBatch<B> {
        let batch_size = items.len();

        let nucl_flat: Vec<f32> = items.iter().flat_map(|s| s.x_nucl.iter().copied()).collect();
        let pi_flat: Vec<f32> = items.iter().flat_map(|s| s.x_pi.iter().copied()).collect();
        let labels: Vec<f32> = items.iter().map(|s| s.label).collect();

        EfficiencyBatch {
            x_nucl: self.tensor3(nucl_flat, batch_size, NUCLEOTIDE_CHANNELS),
            x_pi: self.tensor3(pi_flat, batch_size, AUX_CHANNELS),
            targets: Tensor::from_data(TensorData::new(labels, [batch_size]), &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn sample(value: f32, seq_len: usize) -> EfficiencySample {
        EfficiencySample {
            x_nucl: vec![value; seq_len * NUCLEOTIDE_CHANNELS],
            x_pi: vec![value + 0.5; seq_len * AUX_CHANNELS],
            label: value,
        }
    }

    #[test]
    fn test_batch_shapes_and_order() {
        let batcher = EfficiencyBatcher::<TestBackend>::new(Default::default(), 3);
        let batch = batcher.batch(vec![sample(1.0, 3), sample(2.0, 3)]);

        assert_eq!(batch.x_nucl.dims(), [2, 3, NUCLEOTIDE_CHANNELS]);
        assert_eq!(batch.x_pi.dims(), [2, 3, AUX_CHANNELS]);
        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![1.0, 2.0]);
    }

    #[test]
    fn test_features_slice_rows() {
        let mut bundle = FeatureBundle::new(2);
        for i in 0..4 {
            let s = sample(i as f32, 2);
            bundle.push(&s.x_nucl, &s.x_pi);
        }
        let batcher = EfficiencyBatcher::<TestBackend>::new(Default::default(), 2);
        let (x_nucl, x_pi) = batcher.features(&bundle, 1, 3);
        assert_eq!(x_nucl.dims(), [2, 2, NUCLEOTIDE_CHANNELS]);
        let pi = x_pi.into_data().to_vec::<f32>().unwrap();
        assert_eq!(pi[0], 1.5);
        assert_eq!(pi[pi.len() - 1], 2.5);
    }
}
