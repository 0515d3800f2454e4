// ============================================================
// Layer 3 — Record Domain Type
// ============================================================
// One parsed row of the efficiency table. By the time a Record
// exists, the bracketed list columns have already been turned
// into floats of the configured sequence length.

use serde::{Deserialize, Serialize};

/// Column names as they appear in the input table.
pub const COL_UNIQUE_INDEX: &str = "uniqueindex";
pub const COL_SEQUENCE: &str = "target_sequence";
pub const COL_EFFICIENCY: &str = "efficiency";
pub const COL_GC_FLANK: &str = "GC flank73";
pub const COL_BDM: &str = "nucleotide BDM";
pub const COL_OCCUPANCY: &str = "NuPoP occupancy";
pub const COL_AFFINITY: &str = "NuPoP affinity";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier; fold membership is derived from it alone
    pub unique_index: i64,

    /// Target sequence over {A, C, G, T, N, -}
    pub sequence: String,

    /// Measured editing efficiency (the regression label)
    pub efficiency: f32,

    pub gc_flank: Vec<f32>,
    pub bdm: Vec<f32>,
    pub occupancy: Vec<f32>,
    pub affinity: Vec<f32>,
}

impl Record {
    /// Auxiliary channels in the fixed order the model was trained with:
    /// [GC flank, BDM, occupancy, affinity].
    pub fn aux_channels(&self) -> [(&'static str, &[f32]); 4] {
        [
            (COL_GC_FLANK, &self.gc_flank),
            (COL_BDM, &self.bdm),
            (COL_OCCUPANCY, &self.occupancy),
            (COL_AFFINITY, &self.affinity),
        ]
    }
}
