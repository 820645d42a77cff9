// ============================================================
// Layer 5 — Feature Transformer
// ============================================================
// Maps a patient table to the model's input space:
//
//   numerical columns   → (x - mean) / std
//   categorical columns → one indicator per category seen at fit
//
// Output layout: all scaled numerical columns first, then one
// one-hot block per categorical column, in declaration order.
// Columns not named in either list (e.g. `target`) are dropped.
//
// The fitted transformer is serialised to JSON and shipped with
// the model so the server applies exactly the training-time
// transform.

use serde::{Deserialize, Serialize};

use crate::data::table::Table;
use crate::domain::patient::{CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS};
use crate::error::{PipelineError, Result};

// ─── StandardScaler ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean:  f64,
    /// Population standard deviation, or 1.0 for a constant column.
    pub scale: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let n    = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var  = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std  = var.sqrt();
        Ok(Self { mean, scale: if std > 0.0 { std } else { 1.0 } })
    }

    pub fn transform(&self, v: f64) -> f64 {
        (v - self.mean) / self.scale
    }
}

// ─── OneHotEncoder ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted distinct values observed at fit time.
    pub categories: Vec<f64>,
}

impl OneHotEncoder {
    pub fn fit(values: &[f64]) -> Self {
        let mut categories = values.to_vec();
        categories.sort_by(f64::total_cmp);
        categories.dedup();
        Self { categories }
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Append the indicator block for `v`. Unknown values encode as all zeros.
    pub fn encode_into(&self, v: f64, out: &mut Vec<f32>) {
        out.extend(self.categories.iter().map(|&c| if c == v { 1.0 } else { 0.0 }));
    }
}

// ─── ColumnTransformer ────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    pub numerical:   Vec<(String, StandardScaler)>,
    pub categorical: Vec<(String, OneHotEncoder)>,
}

impl ColumnTransformer {
    /// Fit on `table` using the given column lists.
    pub fn fit(table: &Table, numerical: &[&str], categorical: &[&str]) -> Result<Self> {
        if table.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        tracing::info!("Numerical columns: {:?}", numerical);
        tracing::info!("Categorical columns: {:?}", categorical);

        let numerical = numerical
            .iter()
            .map(|&c| Ok((c.to_string(), StandardScaler::fit(&table.dense_column(c)?)?)))
            .collect::<Result<Vec<_>>>()?;
        let categorical = categorical
            .iter()
            .map(|&c| Ok((c.to_string(), OneHotEncoder::fit(&table.dense_column(c)?))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { numerical, categorical })
    }

    /// Fit with the heart-disease column lists.
    pub fn fit_default(table: &Table) -> Result<Self> {
        Self::fit(table, &NUMERICAL_COLUMNS, &CATEGORICAL_COLUMNS)
    }

    /// Width of every transformed row.
    pub fn output_width(&self) -> usize {
        self.numerical.len() + self.categorical.iter().map(|(_, e)| e.width()).sum::<usize>()
    }

    /// Transform every row of `table`. Every listed column must be present
    /// and fully populated.
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f32>>> {
        let num_cols = self
            .numerical
            .iter()
            .map(|(c, _)| table.dense_column(c))
            .collect::<Result<Vec<_>>>()?;
        let cat_cols = self
            .categorical
            .iter()
            .map(|(c, _)| table.dense_column(c))
            .collect::<Result<Vec<_>>>()?;

        let width = self.output_width();
        let rows = (0..table.n_rows())
            .map(|r| {
                let mut out = Vec::with_capacity(width);
                for ((_, scaler), col) in self.numerical.iter().zip(&num_cols) {
                    out.push(scaler.transform(col[r]) as f32);
                }
                for ((_, encoder), col) in self.categorical.iter().zip(&cat_cols) {
                    encoder.encode_into(col[r], &mut out);
                }
                out
            })
            .collect();
        Ok(rows)
    }

    pub fn fit_transform(table: &Table) -> Result<(Self, Vec<Vec<f32>>)> {
        let transformer = Self::fit_default(table)?;
        let rows = transformer.transform(table)?;
        Ok((transformer, rows))
    }
}
