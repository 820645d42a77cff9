// ============================================================
// Layer 4 — Table Cleaner
// ============================================================
// Turns the raw UCI table into a training-ready table.
//
// Cleaning steps (applied in order):
//   1. Collapse the 0..=4 diagnosis into a binary target
//   2. Fill every missing cell with its column's median
//
// Only `ca` and `thal` have gaps in the Cleveland file, but
// imputation runs over every column so other sources work too.

use crate::error::{PipelineError, Result};
use crate::data::table::Table;

/// What the cleaner changed, for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    /// (column, median used, cells filled)
    pub imputed: Vec<(String, f64, usize)>,
}

pub struct Cleaner {
    target_column: String,
}

impl Cleaner {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self { target_column: target_column.into() }
    }

    /// Clean `table` in place.
    pub fn clean(&self, table: &mut Table) -> Result<CleaningReport> {
        // ── Step 1: Binary target ─────────────────────────────────────────────
        table.map_column(&self.target_column, |v| if v > 0.0 { 1.0 } else { 0.0 })?;

        // ── Step 2: Median imputation ─────────────────────────────────────────
        let mut report = CleaningReport::default();
        for (column, missing) in table.missing_counts() {
            if missing == 0 {
                continue;
            }
            let observed: Vec<f64> = table.column(&column)?.into_iter().flatten().collect();
            let fill = median(&observed).ok_or_else(|| PipelineError::EmptyColumn(column.clone()))?;
            let filled = table.fill_missing(&column, fill)?;
            tracing::debug!("Imputed {} cells of '{}' with median {}", filled, column, fill);
            report.imputed.push((column, fill, filled));
        }

        Ok(report)
    }
}

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
