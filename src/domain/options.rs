// ============================================================
// Layer 3 — Run Options
// ============================================================
// Plain enums describing which model variant and which loss
// distribution a run uses. Parsing follows the command-line
// contract: "base" selects the base variant and every other
// name selects the long one; "negative_binomial" selects the
// zero-inflated loss and every other name falls back to MSE.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelVariant {
    /// 23-nt target window
    #[default]
    Base,
    /// 60-nt target window
    Long,
}

impl ModelVariant {
    pub fn seq_len(self) -> usize {
        match self {
            ModelVariant::Base => 23,
            ModelVariant::Long => 60,
        }
    }

    /// Filename prefix shared by every artifact of this variant.
    pub fn artifact_prefix(self) -> &'static str {
        match self {
            ModelVariant::Base => "pridict_",
            ModelVariant::Long => "pridict_long_",
        }
    }
}

impl FromStr for ModelVariant {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "base" { ModelVariant::Base } else { ModelVariant::Long })
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Base => write!(f, "base"),
            ModelVariant::Long => write!(f, "long"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LossDistribution {
    #[default]
    NegativeBinomial,
    /// Anything that is not negative binomial trains with squared error
    Gaussian,
}

impl FromStr for LossDistribution {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "negative_binomial" {
            LossDistribution::NegativeBinomial
        } else {
            LossDistribution::Gaussian
        })
    }
}

impl fmt::Display for LossDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossDistribution::NegativeBinomial => write!(f, "negative_binomial"),
            LossDistribution::Gaussian => write!(f, "gaussian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognised_variant_falls_through_to_long() {
        assert_eq!("base".parse::<ModelVariant>().unwrap(), ModelVariant::Base);
        assert_eq!("long".parse::<ModelVariant>().unwrap(), ModelVariant::Long);
        assert_eq!("xl".parse::<ModelVariant>().unwrap(), ModelVariant::Long);
    }

    #[test]
    fn test_distribution_falls_back_to_gaussian() {
        assert_eq!(
            "negative_binomial".parse::<LossDistribution>().unwrap(),
            LossDistribution::NegativeBinomial
        );
        assert_eq!("poisson".parse::<LossDistribution>().unwrap(), LossDistribution::Gaussian);
    }

    #[test]
    fn test_variant_geometry() {
        assert_eq!(ModelVariant::Base.seq_len(), 23);
        assert_eq!(ModelVariant::Long.seq_len(), 60);
        assert_ne!(ModelVariant::Base.artifact_prefix(), ModelVariant::Long.artifact_prefix());
    }
}
