// ============================================================
// Layer 6 — Comparison Tables
// ============================================================
// Fold-indexed score tables shared across evaluation runs, one
// column per model:
//
//   fold,baseline,crispAI
//   0,0.512,0.634
//   1,0.498,0.611
//   ...
//
// Merging only ever touches the cells being written; other
// columns and folds are kept, and columns keep their order.
//
// Tables written without an index column (plain positional
// rows) are still readable: row i is fold i.
//
// merge_into_file holds an exclusive fs2 lock for the whole
// read-modify-write, so concurrent evaluations serialise
// instead of losing each other's cells.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use fs2::FileExt;
use std::{
    collections::BTreeMap,
    fs::OpenOptions,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

/// Name of the index column.
pub const FOLD_COLUMN: &str = "fold";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    columns: Vec<String>,
    rows: BTreeMap<usize, Vec<Option<f64>>>,
}

impl ComparisonTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        // an explicit index column is "fold", or the blank header pandas writes
        let indexed = matches!(headers.first().map(String::as_str), Some(FOLD_COLUMN) | Some(""));
        let skip = usize::from(indexed);

        let mut table = Self {
            columns: headers.into_iter().skip(skip).collect(),
            rows: BTreeMap::new(),
        };

        for (position, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Malformed table row {position}"))?;
            let fold = if indexed {
                let cell = record.get(0).unwrap_or_default().trim();
                cell.parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && *v >= 0.0)
                    .map(|v| v as usize)
                    .with_context(|| format!("Row {position}: '{cell}' is not a fold index"))?
            } else {
                position
            };

            let mut cells = Vec::with_capacity(table.columns.len());
            for (column, name) in table.columns.iter().enumerate() {
                let raw = record.get(column + skip).unwrap_or_default().trim();
                let value = if raw.is_empty() {
                    None
                } else {
                    Some(raw.parse::<f64>().with_context(|| {
                        format!("Row {position}, column '{name}': '{raw}' is not a number")
                    })?)
                };
                cells.push(value);
            }
            table.rows.insert(fold, cells);
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get(&self, fold: usize, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.rows.get(&fold)?.get(index).copied().flatten()
    }

    /// Insert or overwrite one cell, adding the column or row if needed.
    pub fn set(&mut self, fold: usize, column: &str, value: f64) {
        let index = match self.column_index(column) {
            Some(i) => i,
            None => {
                self.columns.push(column.to_string());
                for cells in self.rows.values_mut() {
                    cells.push(None);
                }
                self.columns.len() - 1
            }
        };
        let width = self.columns.len();
        let cells = self.rows.entry(fold).or_insert_with(|| vec![None; width]);
        cells[index] = Some(value);
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(writer);

        let mut header = vec![FOLD_COLUMN.to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (fold, cells) in &self.rows {
            let mut row = vec![fold.to_string()];
            row.extend(cells.iter().map(|c| c.map(|v| v.to_string()).unwrap_or_default()));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Merge `scores` into `column` of the table at `path`, creating it if absent.
    pub fn merge_into_file(path: &Path, column: &str, scores: &[(usize, f64)]) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Cannot open table '{}'", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Cannot lock table '{}'", path.display()))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let mut table = if contents.trim().is_empty() {
            Self::new()
        } else {
            Self::from_reader(contents.as_bytes())
                .with_context(|| format!("Cannot parse table '{}'", path.display()))?
        };

        for &(fold, value) in scores {
            table.set(fold, column, value);
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        table.write(&mut file)?;
        file.unlock()?;

        tracing::info!(
            "Merged {} fold scores into column '{}' of '{}'",
            scores.len(),
            column,
            path.display()
        );
        Ok(table)
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn baseline_table() -> String {
        let mut out = String::from("fold,baseline\n");
        for fold in 0..5 {
            out.push_str(&format!("{fold},0.{fold}\n"));
        }
        out
    }

    #[test]
    fn test_merge_touches_only_the_new_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pearson.csv");
        fs::write(&path, baseline_table()).unwrap();

        ComparisonTable::merge_into_file(&path, "crispAI", &[(0, 0.75)]).unwrap();

        let table = ComparisonTable::from_reader(fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(table.columns(), &["baseline".to_string(), "crispAI".to_string()]);
        assert_eq!(table.get(0, "crispAI"), Some(0.75));
        for fold in 1..5 {
            assert_eq!(table.get(fold, "crispAI"), None);
        }
        for fold in 0..5 {
            assert_eq!(table.get(fold, "baseline"), Some(fold as f64 / 10.0));
        }
    }

    #[test]
    fn test_merge_overwrites_existing_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spearman.csv");
        ComparisonTable::merge_into_file(&path, "crispAI", &[(0, 0.1), (1, 0.2)]).unwrap();
        let table = ComparisonTable::merge_into_file(&path, "crispAI", &[(1, 0.9)]).unwrap();
        assert_eq!(table.get(0, "crispAI"), Some(0.1));
        assert_eq!(table.get(1, "crispAI"), Some(0.9));
    }

    #[test]
    fn test_positional_tables_are_read_by_row() {
        let legacy = "baseline,other\n0.5,0.6\n0.4,0.3\n";
        let table = ComparisonTable::from_reader(legacy.as_bytes()).unwrap();
        assert_eq!(table.get(1, "other"), Some(0.3));
        assert_eq!(table.get(0, "baseline"), Some(0.5));
        assert_eq!(table.get(2, "baseline"), None);
    }

    #[test]
    fn test_blank_index_header_is_an_index() {
        let pandas = ",baseline\n0,0.5\n3,0.7\n";
        let table = ComparisonTable::from_reader(pandas.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["baseline".to_string()]);
        assert_eq!(table.get(3, "baseline"), Some(0.7));
    }

    #[test]
    fn test_column_order_is_preserved() {
        let mut table = ComparisonTable::from_reader("fold,z,a\n0,1,2\n".as_bytes()).unwrap();
        table.set(0, "m", 3.0);
        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "fold,z,a,m\n0,1,2,3\n");
    }

    #[test]
    fn test_nan_scores_survive_a_rewrite() {
        let mut table = ComparisonTable::new();
        table.set(2, "crispAI", f64::NAN);
        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        let back = ComparisonTable::from_reader(out.as_slice()).unwrap();
        assert!(back.get(2, "crispAI").unwrap().is_nan());
    }
}
