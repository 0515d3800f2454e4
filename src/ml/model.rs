use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid, softplus},
};

use crate::domain::example::{AUX_CHANNELS, NUCLEOTIDE_CHANNELS};

/// Lower bound added to μ and θ so the likelihood stays defined.
const PARAM_FLOOR: f64 = 1e-4;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CrispAiConfig {
    #[config(default = 23)]
    pub seq_len:      usize,
    #[config(default = 6)]
    pub nucl_channels: usize,
    #[config(default = 4)]
    pub pi_channels:  usize,
    #[config(default = 32)]
    pub conv_filters: usize,
    #[config(default = 5)]
    pub kernel_size:  usize,
    #[config(default = 64)]
    pub hidden:       usize,
    #[config(default = 0.1)]
    pub dropout:      f64,
}

impl CrispAiConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CrispAiModel<B> {
        let conv = Conv1dConfig::new(self.nucl_channels + self.pi_channels, self.conv_filters, self.kernel_size)
            .with_padding(PaddingConfig1d::Same)
            .init(device);
        let dense   = LinearConfig::new(self.conv_filters * self.seq_len, self.hidden).init(device);
        let head    = LinearConfig::new(self.hidden, 3).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        CrispAiModel { conv, dense, head, dropout }
    }

    /// Shape check against the encoder's fixed channel widths.
    pub fn matches_encoding(&self) -> bool {
        self.nucl_channels == NUCLEOTIDE_CHANNELS && self.pi_channels == AUX_CHANNELS
    }
}

impl Default for CrispAiConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Module, Debug)]
pub struct CrispAiModel<B: Backend> {
    pub conv:    Conv1d<B>,
    pub dense:   Linear<B>,
    pub head:    Linear<B>,
    pub dropout: Dropout,
}

/// Per-example parameters of the zero-inflated negative binomial.
#[derive(Debug, Clone)]
pub struct ZinbParams<B: Backend> {
    /// mean of the NB component: [batch]
    pub mu:    Tensor<B, 1>,
    /// dispersion: [batch]
    pub theta: Tensor<B, 1>,
    /// probability of a structural zero: [batch]
    pub pi:    Tensor<B, 1>,
}

impl<B: Backend> ZinbParams<B> {
    /// E[y] = (1 − π)·μ
    pub fn expected(&self) -> Tensor<B, 1> {
        self.pi.clone().neg().add_scalar(1.0) * self.mu.clone()
    }
}

impl<B: Backend> CrispAiModel<B> {
    /// x_nucl: [batch, L, 6], x_pi: [batch, L, 4] → ZINB parameters per example
    pub fn forward(&self, x_nucl: Tensor<B, 3>, x_pi: Tensor<B, 3>) -> ZinbParams<B> {
        let [batch_size, _, _] = x_nucl.dims();

        // [batch, L, 10] → [batch, 10, L] for the channels-first conv
        let x = Tensor::cat(vec![x_nucl, x_pi], 2).swap_dims(1, 2);
        let x = self.dropout.forward(relu(self.conv.forward(x)));
        let x = x.flatten::<2>(1, 2);
        let x = self.dropout.forward(relu(self.dense.forward(x)));

        let out = self.head.forward(x); // [batch, 3]
        let column = |i: usize| out.clone().slice([0..batch_size, i..i + 1]).reshape([batch_size]);

        ZinbParams {
            mu:    softplus(column(0), 1.0).add_scalar(PARAM_FLOOR),
            theta: softplus(column(1), 1.0).add_scalar(PARAM_FLOOR),
            pi:    sigmoid(column(2)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shapes_and_ranges() {
        let device = Default::default();
        let model: CrispAiModel<TestBackend> = CrispAiConfig::new().init(&device);
        let x_nucl = Tensor::<TestBackend, 3>::zeros([4, 23, 6], &device);
        let x_pi = Tensor::<TestBackend, 3>::ones([4, 23, 4], &device);

        let params = model.forward(x_nucl, x_pi);
        assert_eq!(params.mu.dims(), [4]);

        let mu = params.mu.into_data().to_vec::<f32>().unwrap();
        let pi = params.pi.into_data().to_vec::<f32>().unwrap();
        assert!(mu.iter().all(|&m| m > 0.0));
        assert!(pi.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_long_variant_builds() {
        let device = Default::default();
        let model: CrispAiModel<TestBackend> = CrispAiConfig::new().with_seq_len(60).init(&device);
        let params = model.forward(
            Tensor::zeros([2, 60, 6], &device),
            Tensor::zeros([2, 60, 4], &device),
        );
        assert_eq!(params.expected().dims(), [2]);
    }

    #[test]
    fn test_default_matches_encoding() {
        assert!(CrispAiConfig::default().matches_encoding());
    }
}
