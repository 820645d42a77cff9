// ============================================================
// Layer 6 — CSV Reports
// ============================================================
// Writes the tabular reports produced during a pipeline run.
// They are small enough to open in a spreadsheet and are also
// logged as run artifacts.
//
//   cv_results.csv        ← one row per grid candidate
//     params,mean_test_score,std_test_score,rank_test_score,split0_test_score,...
//
//   confusion_matrix.csv  ← hold-out confusion matrix
//     actual,predicted_0,predicted_1
//     0,<tn>,<fp>
//     1,<fn>,<tp>
//
//   class_distribution.csv, correlation_matrix.csv  ← EDA (profile step)

use std::fs;
use std::path::Path;

use csv::Writer;

use crate::data::profile::{ClassCount, CorrelationMatrix};
use crate::error::Result;
use crate::ml::grid_search::CvResult;
use crate::ml::scoring::ConfusionMatrix;

fn writer(path: &Path) -> Result<Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(Writer::from_path(path)?)
}

pub fn write_cv_results(path: &Path, results: &[CvResult]) -> Result<()> {
    let n_splits = results.iter().map(|r| r.fold_scores.len()).max().unwrap_or(0);
    let mut wtr = writer(path)?;

    let mut header = vec![
        "params".to_string(),
        "mean_test_score".to_string(),
        "std_test_score".to_string(),
        "rank_test_score".to_string(),
    ];
    header.extend((0..n_splits).map(|i| format!("split{i}_test_score")));
    wtr.write_record(&header)?;

    for r in results {
        let mut record = vec![
            r.params.to_string(),
            format!("{:.6}", r.mean_score),
            format!("{:.6}", r.std_score),
            r.rank.to_string(),
        ];
        record.extend(r.fold_scores.iter().map(|s| format!("{s:.6}")));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    tracing::debug!("Wrote {} CV results to '{}'", results.len(), path.display());
    Ok(())
}

pub fn write_confusion_matrix(path: &Path, cm: &ConfusionMatrix) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["actual", "predicted_0", "predicted_1"])?;
    for (class, row) in cm.as_rows().iter().enumerate() {
        wtr.write_record([class.to_string(), row[0].to_string(), row[1].to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_class_distribution(path: &Path, counts: &[ClassCount]) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["target", "count", "fraction"])?;
    for c in counts {
        wtr.write_record([c.value.to_string(), c.count.to_string(), format!("{:.6}", c.fraction)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Square matrix with the column names as both header row and first column.
pub fn write_correlation_matrix(path: &Path, matrix: &CorrelationMatrix) -> Result<()> {
    let mut wtr = writer(path)?;
    let mut header = vec![String::new()];
    header.extend(matrix.columns.iter().cloned());
    wtr.write_record(&header)?;
    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        let mut record = vec![name.clone()];
        record.extend(row.iter().map(|v| format!("{v:.6}")));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
