// ============================================================
// Layer 4 — Numeric Table
// ============================================================
// A small named-column table of optional f64 cells. Every
// column of the heart-disease data is numeric; a cell is None
// when the source marked it missing (the UCI file uses "?").
//
// CSV reading and writing goes through the `csv` crate.

use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows:    Vec<Vec<Option<f64>>>,
}

impl Table {
    /// Build a table, checking every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(PipelineError::ShapeMismatch {
                expected: columns.len(),
                got:      bad.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// A single fully-populated row, e.g. one API request.
    pub fn single_row(cells: &[(&str, f64)]) -> Self {
        Self {
            columns: cells.iter().map(|(n, _)| n.to_string()).collect(),
            rows:    vec![cells.iter().map(|(_, v)| Some(*v)).collect()],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Like `column`, but every cell must be present.
    pub fn dense_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| PipelineError::MissingValue { column: name.to_string(), row })
            })
            .collect()
    }

    /// Apply `f` to every present cell of one column.
    pub fn map_column(&mut self, name: &str, f: impl Fn(f64) -> f64) -> Result<()> {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            row[idx] = row[idx].map(&f);
        }
        Ok(())
    }

    /// Replace missing cells of one column with `value`.
    pub fn fill_missing(&mut self, name: &str, value: f64) -> Result<usize> {
        let idx = self.column_index(name)?;
        let mut filled = 0;
        for row in &mut self.rows {
            if row[idx].is_none() {
                row[idx] = Some(value);
                filled += 1;
            }
        }
        Ok(filled)
    }

    /// Number of missing cells per column, in column order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), self.rows.iter().filter(|r| r[i].is_none()).count()))
            .collect()
    }

    // ─── CSV I/O ──────────────────────────────────────────────────────────────

    /// Parse CSV text. With `names`, the input has no header row and
    /// takes these column names; otherwise the first row is the header.
    /// Cells equal to one of `na_values` (or empty) become None.
    pub fn from_csv_reader<R: Read>(
        reader:    R,
        names:     Option<&[&str]>,
        na_values: &[&str],
    ) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(names.is_none())
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = match names {
            Some(n) => n.iter().map(|s| s.to_string()).collect(),
            None    => rdr.headers()?.iter().map(str::to_string).collect(),
        };

        let mut rows = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            // Trailing blank lines in the UCI file parse as one empty field.
            if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
                continue;
            }
            if record.len() != columns.len() {
                return Err(PipelineError::ShapeMismatch {
                    expected: columns.len(),
                    got:      record.len(),
                });
            }

            let mut row = Vec::with_capacity(columns.len());
            for (col_idx, cell) in record.iter().enumerate() {
                if cell.is_empty() || na_values.contains(&cell) {
                    row.push(None);
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| PipelineError::InvalidValue {
                    column: columns[col_idx].clone(),
                    row:    row_idx,
                    value:  cell.to_string(),
                })?;
                row.push(Some(value));
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Read a headed CSV file written by `write_csv`.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_csv_reader(file, None, &[])
    }

    /// Write the table with a header row; missing cells are left empty.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = WriterBuilder::new().from_path(path)?;
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.map(format_cell).unwrap_or_default()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Whole numbers keep a trailing ".0" so written files read like the source.
fn format_cell(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "63.0,1.0,?\n67.0,?,3.0\n";

    #[test]
    fn test_headerless_parse_with_na_marker() {
        let t = Table::from_csv_reader(RAW.as_bytes(), Some(&["age", "sex", "thal"][..]), &["?"]).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("thal").unwrap(), vec![None, Some(3.0)]);
        assert_eq!(t.column("sex").unwrap(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_invalid_cell_is_reported() {
        let err = Table::from_csv_reader("1.0,abc\n".as_bytes(), Some(&["a", "b"][..]), &["?"]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { ref column, row: 0, .. } if column == "b"));
    }

    #[test]
    fn test_fill_missing_counts_cells() {
        let mut t = Table::from_csv_reader(RAW.as_bytes(), Some(&["age", "sex", "thal"][..]), &["?"]).unwrap();
        assert_eq!(t.fill_missing("thal", 3.0).unwrap(), 1);
        assert_eq!(t.column("thal").unwrap(), vec![Some(3.0), Some(3.0)]);
    }

    #[test]
    fn test_csv_file_round_trip_keeps_missing_cells() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("t.csv");
        let t = Table::from_csv_reader(RAW.as_bytes(), Some(&["age", "sex", "thal"][..]), &["?"]).unwrap();
        t.write_csv(&path).unwrap();

        let back = Table::read_csv(&path).unwrap();
        assert_eq!(back, t);
        assert!(fs::read_to_string(&path).unwrap().starts_with("age,sex,thal\n63.0,1.0,\n"));
    }

    #[test]
    fn test_dense_column_rejects_missing() {
        let t = Table::from_csv_reader(RAW.as_bytes(), Some(&["age", "sex", "thal"][..]), &["?"]).unwrap();
        assert!(t.dense_column("age").is_ok());
        assert!(matches!(
            t.dense_column("sex"),
            Err(PipelineError::MissingValue { row: 1, .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let t = Table::single_row(&[("age", 50.0)]);
        assert!(matches!(t.column("chol"), Err(PipelineError::MissingColumn(_))));
    }
}
