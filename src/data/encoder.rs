// ============================================================
// Layer 4 — Feature Encoder
// ============================================================
// Converts one Record into the two tensors the model reads:
//
//   X_nucl [seq_len, 6]  one-hot over A C G T N -
//   X_pi   [seq_len, 4]  GC flank, BDM, occupancy, affinity
//
// Example (seq_len = 3, "AG-"):
//   pos 0  A → [1 0 0 0 0 0]
//   pos 1  G → [0 0 1 0 0 0]
//   pos 2  - → [0 0 0 0 0 1]
//
// The last two channels are also the mismatch-direction slots
// used when a guide and a target are encoded together. With a
// single target they stay zero for every A/C/G/T position, but
// the block is always six channels wide because the model's
// input layer is.

use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::domain::error::EncodingError;
use crate::domain::example::{EncodedExample, AUX_CHANNELS, NUCLEOTIDE_CHANNELS};
use crate::domain::record::Record;

/// Symbol ↔ channel mapping, in channel order.
pub const VOCABULARY: [char; NUCLEOTIDE_CHANNELS] = ['A', 'C', 'G', 'T', 'N', '-'];

pub fn symbol_channel(symbol: char) -> Option<usize> {
    VOCABULARY.iter().position(|&s| s == symbol)
}

/// What to do with a symbol outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnknownSymbolPolicy {
    /// Fail the record with EncodingError::UnknownSymbol
    #[default]
    Reject,
    /// Leave the row all-zero and log a warning
    ZeroFill,
}

impl FromStr for UnknownSymbolPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(UnknownSymbolPolicy::Reject),
            "zero-fill" | "zero_fill" => Ok(UnknownSymbolPolicy::ZeroFill),
            other => Err(anyhow!(
                "unknown symbol policy '{other}' (expected 'reject' or 'zero-fill')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    seq_len: usize,
    unknown_symbols: UnknownSymbolPolicy,
}

impl FeatureEncoder {
    pub fn new(seq_len: usize) -> Self {
        Self {
            seq_len,
            unknown_symbols: UnknownSymbolPolicy::default(),
        }
    }

    pub fn with_unknown_symbols(mut self, policy: UnknownSymbolPolicy) -> Self {
        self.unknown_symbols = policy;
        self
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn encode(&self, record: &Record) -> Result<EncodedExample, EncodingError> {
        Ok(EncodedExample {
            x_nucl: self.one_hot(&record.sequence)?,
            x_pi: self.aux_features(record)?,
            label: record.efficiency,
        })
    }

    /// Flat [seq_len, 6] one-hot block for `sequence`.
    pub fn one_hot(&self, sequence: &str) -> Result<Vec<f32>, EncodingError> {
        let found = sequence.chars().count();
        if found != self.seq_len {
            return Err(EncodingError::SequenceLength {
                expected: self.seq_len,
                found,
            });
        }

        let mut x_nucl = vec![0.0f32; self.seq_len * NUCLEOTIDE_CHANNELS];
        for (position, symbol) in sequence.chars().enumerate() {
            match symbol_channel(symbol) {
                Some(channel) => x_nucl[position * NUCLEOTIDE_CHANNELS + channel] = 1.0,
                None => match self.unknown_symbols {
                    UnknownSymbolPolicy::Reject => {
                        return Err(EncodingError::UnknownSymbol { symbol, position });
                    }
                    UnknownSymbolPolicy::ZeroFill => {
                        tracing::warn!(
                            "Unknown symbol '{}' at position {} left as an all-zero row",
                            symbol,
                            position
                        );
                    }
                },
            }
        }
        Ok(x_nucl)
    }

    /// Flat [seq_len, 4] block, channels interleaved per position.
    fn aux_features(&self, record: &Record) -> Result<Vec<f32>, EncodingError> {
        let channels = record.aux_channels();
        for (name, values) in &channels {
            if values.len() != self.seq_len {
                return Err(EncodingError::ChannelLength {
                    channel: *name,
                    expected: self.seq_len,
                    found: values.len(),
                });
            }
        }

        let mut x_pi = Vec::with_capacity(self.seq_len * AUX_CHANNELS);
        for position in 0..self.seq_len {
            for (_, values) in &channels {
                x_pi.push(values[position]);
            }
        }
        Ok(x_pi)
    }
}

/// Map a one-hot block back to its sequence.
/// Every row must contain exactly one 1 and zeros elsewhere.
pub fn decode_one_hot(x_nucl: &[f32]) -> Result<String, EncodingError> {
    x_nucl
        .chunks(NUCLEOTIDE_CHANNELS)
        .enumerate()
        .map(|(position, row)| {
            let hot: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, &v)| v != 0.0)
                .map(|(i, _)| i)
                .collect();
            match hot.as_slice() {
                [channel] if row[*channel] == 1.0 && row.len() == NUCLEOTIDE_CHANNELS => {
                    Ok(VOCABULARY[*channel])
                }
                _ => Err(EncodingError::InvalidOneHot { position }),
            }
        })
        .collect()
}
