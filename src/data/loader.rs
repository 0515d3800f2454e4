// ============================================================
// Layer 4 — Record Loader
// ============================================================
// Reads the efficiency table with the `csv` crate and turns
// each row into a domain Record.
//
// Required columns:
//   uniqueindex, target_sequence, efficiency,
//   GC flank73, nucleotide BDM, NuPoP occupancy, NuPoP affinity
//
// Extra columns are ignored. The four list columns are parsed
// with parse_numeric_list and must have exactly `seq_len`
// values; the first bad row stops the load. An empty efficiency
// cell is read as NaN and left to the builder's NaN scan.

use std::{fs::File, io::Read, path::PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;

use crate::data::parser::parse_numeric_list;
use crate::domain::error::PipelineError;
use crate::domain::record::{
    Record, COL_AFFINITY, COL_BDM, COL_GC_FLANK, COL_OCCUPANCY,
};
use crate::domain::traits::RecordSource;

/// One row exactly as it appears on disk.
#[derive(Debug, Deserialize)]
struct RawRow {
    uniqueindex: i64,
    target_sequence: String,
    efficiency: Option<f32>,
    #[serde(rename = "GC flank73")]
    gc_flank: String,
    #[serde(rename = "nucleotide BDM")]
    bdm: String,
    #[serde(rename = "NuPoP occupancy")]
    occupancy: String,
    #[serde(rename = "NuPoP affinity")]
    affinity: String,
}

/// Loads records from a delimited file on disk.
pub struct CsvLoader {
    path: PathBuf,
    seq_len: usize,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>, seq_len: usize) -> Self {
        Self { path: path.into(), seq_len }
    }

    /// Parse records from any reader; used for files and for in-memory tables.
    pub fn from_reader<R: Read>(reader: R, seq_len: usize) -> Result<Vec<Record>> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<RawRow>().enumerate() {
            let raw = result.with_context(|| format!("Malformed table row {row}"))?;
            records.push(parse_row(row, raw, seq_len)?);
        }
        Ok(records)
    }
}

impl RecordSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open data table '{}'", self.path.display()))?;
        let records = Self::from_reader(file, self.seq_len)
            .with_context(|| format!("Cannot load '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} records from '{}'",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}

fn parse_row(row: usize, raw: RawRow, seq_len: usize) -> Result<Record, PipelineError> {
    let list = |column: &'static str, literal: &str| {
        parse_numeric_list(literal, seq_len)
            .map_err(|source| PipelineError::Parse { row, column, source })
    };

    Ok(Record {
        unique_index: raw.uniqueindex,
        gc_flank: list(COL_GC_FLANK, &raw.gc_flank)?,
        bdm: list(COL_BDM, &raw.bdm)?,
        occupancy: list(COL_OCCUPANCY, &raw.occupancy)?,
        affinity: list(COL_AFFINITY, &raw.affinity)?,
        sequence: raw.target_sequence,
        efficiency: raw.efficiency.unwrap_or(f32::NAN),
    })
}
