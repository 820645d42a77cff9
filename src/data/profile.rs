// ============================================================
// Layer 4 — Dataset Profile
// ============================================================
// Summary statistics for exploratory analysis of the cleaned
// table: how balanced the target is, and how strongly every
// pair of columns is (linearly) correlated.

use crate::data::table::Table;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassCount {
    pub value:    f64,
    pub count:    usize,
    pub fraction: f64,
}

/// Pearson correlation of every column pair, in table column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values:  Vec<Vec<f64>>,
}

/// Count of every distinct value of `column`, ascending by value.
pub fn class_distribution(table: &Table, column: &str) -> Result<Vec<ClassCount>> {
    let values = table.dense_column(column)?;
    if values.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);

    let mut out: Vec<ClassCount> = Vec::new();
    for v in sorted {
        match out.last_mut() {
            Some(last) if last.value == v => last.count += 1,
            _ => out.push(ClassCount { value: v, count: 1, fraction: 0.0 }),
        }
    }
    let n = values.len() as f64;
    for c in &mut out {
        c.fraction = c.count as f64 / n;
    }
    Ok(out)
}

/// Pearson correlation; 0 when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let mx = x[..n].iter().sum::<f64>() / n as f64;
    let my = y[..n].iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        0.0
    } else {
        sxy / (sxx.sqrt() * syy.sqrt())
    }
}

pub fn correlation_matrix(table: &Table) -> Result<CorrelationMatrix> {
    let columns: Vec<String> = table.columns().to_vec();
    let data = columns
        .iter()
        .map(|c| table.dense_column(c))
        .collect::<Result<Vec<_>>>()?;

    let values = data
        .iter()
        .map(|x| data.iter().map(|y| pearson(x, y)).collect())
        .collect();
    Ok(CorrelationMatrix { columns, values })
}
