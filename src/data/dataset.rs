use serde::{Deserialize, Serialize};

use crate::data::table::Table;
use crate::error::{PipelineError, Result};

/// Dense feature matrix plus binary labels, ready for fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Vec<Vec<f32>>,
    pub labels:   Vec<u8>,
}

impl Dataset {
    pub fn new(features: Vec<Vec<f32>>, labels: Vec<u8>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(PipelineError::ShapeMismatch { expected: features.len(), got: labels.len() });
        }
        if let Some(first) = features.first() {
            let width = first.len();
            if let Some(bad) = features.iter().find(|r| r.len() != width) {
                return Err(PipelineError::ShapeMismatch { expected: width, got: bad.len() });
            }
        }
        Ok(Self { features, labels })
    }

    /// Split a transformed table into features (every other column) and labels.
    pub fn from_table(table: &Table, target: &str) -> Result<Self> {
        let target_idx = table.column_index(target)?;
        let labels: Vec<u8> = table
            .dense_column(target)?
            .into_iter()
            .map(|v| if v > 0.0 { 1 } else { 0 })
            .collect();

        let mut features = Vec::with_capacity(table.n_rows());
        for (row_idx, row) in table.rows().iter().enumerate() {
            let mut out = Vec::with_capacity(row.len() - 1);
            for (col_idx, cell) in row.iter().enumerate() {
                if col_idx == target_idx {
                    continue;
                }
                let v = cell.ok_or_else(|| PipelineError::MissingValue {
                    column: table.columns()[col_idx].clone(),
                    row:    row_idx,
                })?;
                out.push(v as f32);
            }
            features.push(out);
        }

        Self::new(features, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map(Vec::len).unwrap_or(0)
    }

    /// Rows at `indices`, in that order (duplicates allowed).
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels:   indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&y| y == 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_table_drops_target_column() {
        let table = Table::new(
            vec!["0".into(), "target".into(), "1".into()],
            vec![
                vec![Some(0.5), Some(1.0), Some(-1.0)],
                vec![Some(1.5), Some(0.0), Some(2.0)],
            ],
        )
        .unwrap();
        let ds = Dataset::from_table(&table, "target").unwrap();
        assert_eq!(ds.features, vec![vec![0.5, -1.0], vec![1.5, 2.0]]);
        assert_eq!(ds.labels, vec![1, 0]);
        assert_eq!(ds.n_features(), 2);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Dataset::new(vec![vec![1.0, 2.0], vec![1.0]], vec![0, 1]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_subset_keeps_order_and_duplicates() {
        let ds = Dataset::new(vec![vec![0.0], vec![1.0], vec![2.0]], vec![0, 1, 0]).unwrap();
        let sub = ds.subset(&[2, 2, 1]);
        assert_eq!(sub.features, vec![vec![2.0], vec![2.0], vec![1.0]]);
        assert_eq!(sub.labels, vec![0, 0, 1]);
    }
}
