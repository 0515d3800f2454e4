// ============================================================
// Layer 3 — Encoded Examples and Feature Bundles
// ============================================================
// An encoded example is the tensor form of one Record:
//
//   X_nucl : [seq_len, 6]  one-hot nucleotide channels
//   X_pi   : [seq_len, 4]  auxiliary per-position features
//
// Both are stored row-major in flat Vec<f32>s so this layer
// stays free of any tensor framework. A FeatureBundle stacks
// N examples into [N, seq_len, C] blocks, the unit that
// estimators consume.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of the one-hot block: A, C, G, T, N, gap.
pub const NUCLEOTIDE_CHANNELS: usize = 6;

/// Width of the auxiliary block: GC flank, BDM, occupancy, affinity.
pub const AUX_CHANNELS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedExample {
    pub x_nucl: Vec<f32>,
    pub x_pi: Vec<f32>,
    pub label: f32,
}

/// Which side of a fold split a tensor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Named tensor inside a fold partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    XNucl,
    XPi,
    Labels,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::XNucl => write!(f, "X_nucl"),
            Field::XPi => write!(f, "X_pi"),
            Field::Labels => write!(f, "labels"),
        }
    }
}

/// A stack of encoded examples, owned and contiguous.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureBundle {
    seq_len: usize,
    len: usize,
    x_nucl: Vec<f32>,
    x_pi: Vec<f32>,
}

impl FeatureBundle {
    pub fn new(seq_len: usize) -> Self {
        Self::with_capacity(seq_len, 0)
    }

    pub fn with_capacity(seq_len: usize, examples: usize) -> Self {
        Self {
            seq_len,
            len: 0,
            x_nucl: Vec::with_capacity(examples * seq_len * NUCLEOTIDE_CHANNELS),
            x_pi: Vec::with_capacity(examples * seq_len * AUX_CHANNELS),
        }
    }

    /// Append one example. Both blocks must already have the bundle's shape.
    pub fn push(&mut self, x_nucl: &[f32], x_pi: &[f32]) {
        assert_eq!(x_nucl.len(), self.nucl_stride(), "X_nucl block has the wrong size");
        assert_eq!(x_pi.len(), self.pi_stride(), "X_pi block has the wrong size");
        self.x_nucl.extend_from_slice(x_nucl);
        self.x_pi.extend_from_slice(x_pi);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Flat [len, seq_len, 6] block.
    pub fn x_nucl(&self) -> &[f32] {
        &self.x_nucl
    }

    /// Flat [len, seq_len, 4] block.
    pub fn x_pi(&self) -> &[f32] {
        &self.x_pi
    }

    /// Borrow the blocks of example `index`.
    pub fn example(&self, index: usize) -> (&[f32], &[f32]) {
        let n = self.nucl_stride();
        let p = self.pi_stride();
        (
            &self.x_nucl[index * n..(index + 1) * n],
            &self.x_pi[index * p..(index + 1) * p],
        )
    }

    /// Tensor fields of this bundle that contain at least one NaN.
    pub fn fields_with_nan(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.x_nucl.iter().any(|v| v.is_nan()) {
            fields.push(Field::XNucl);
        }
        if self.x_pi.iter().any(|v| v.is_nan()) {
            fields.push(Field::XPi);
        }
        fields
    }

    fn nucl_stride(&self) -> usize {
        self.seq_len * NUCLEOTIDE_CHANNELS
    }

    fn pi_stride(&self) -> usize {
        self.seq_len * AUX_CHANNELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(seq_len: usize, channels: usize, value: f32) -> Vec<f32> {
        vec![value; seq_len * channels]
    }

    #[test]
    fn test_push_and_example() {
        let mut bundle = FeatureBundle::new(2);
        bundle.push(&block(2, 6, 0.0), &block(2, 4, 1.0));
        bundle.push(&block(2, 6, 1.0), &block(2, 4, 2.0));

        assert_eq!(bundle.len(), 2);
        let (nucl, pi) = bundle.example(1);
        assert!(nucl.iter().all(|&v| v == 1.0));
        assert!(pi.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_fields_with_nan() {
        let mut bundle = FeatureBundle::new(1);
        let mut pi = block(1, 4, 0.5);
        pi[2] = f32::NAN;
        bundle.push(&block(1, 6, 0.0), &pi);
        assert_eq!(bundle.fields_with_nan(), vec![Field::XPi]);
    }

    #[test]
    #[should_panic]
    fn test_push_rejects_wrong_shape() {
        let mut bundle = FeatureBundle::new(3);
        bundle.push(&block(2, 6, 0.0), &block(3, 4, 0.0));
    }
}
