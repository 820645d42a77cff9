// ============================================================
// Pipeline Errors
// ============================================================
// Typed errors for the data, ml, infra and serve layers.
// The application and CLI layers wrap these in anyhow with
// context describing which pipeline step failed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced below the application layer.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required column is absent from a table.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// A cell that must hold a value is empty.
    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    /// A cell could not be parsed as a number.
    #[error("invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row:    usize,
        value:  String,
    },

    /// A column has no observed values, so no median exists.
    #[error("cannot impute column '{0}': every value is missing")]
    EmptyColumn(String),

    /// Row width does not match what a fitted component expects.
    #[error("feature width mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// An operation needs at least one sample.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A metric is not defined for the given labels.
    #[error("metric '{metric}' is undefined: {reason}")]
    UndefinedMetric { metric: &'static str, reason: String },

    /// A hyperparameter is missing or has the wrong type.
    #[error("invalid hyperparameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    /// Failure inside the tensor backend.
    #[error("model backend error: {0}")]
    Backend(String),

    /// A model or preprocessing artifact is not on disk.
    #[error("artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// An artifact exists but has no content.
    #[error("artifact is empty: {}", .0.display())]
    EmptyArtifact(PathBuf),

    #[error("experiment not found: {0}")]
    ExperimentNotFound(String),

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("registered model not found: {0}")]
    ModelNotFound(String),

    #[error("version {version} of model '{name}' not found")]
    VersionNotFound { name: String, version: u32 },

    /// Unparseable stage, metric or ordering expression.
    #[error("cannot parse {kind}: '{value}'")]
    Parse { kind: &'static str, value: String },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Convenience alias for results below the application layer.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::MissingColumn("thal".into());
        assert_eq!(err.to_string(), "missing column: thal");

        let err = PipelineError::ShapeMismatch { expected: 28, got: 13 };
        assert_eq!(err.to_string(), "feature width mismatch: expected 28, got 13");

        let err = PipelineError::MissingArtifact(PathBuf::from("models/best_model.json"));
        assert_eq!(err.to_string(), "artifact not found: models/best_model.json");

        let err = PipelineError::VersionNotFound { name: "HeartDiseaseClassifier".into(), version: 3 };
        assert_eq!(err.to_string(), "version 3 of model 'HeartDiseaseClassifier' not found");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad}}").unwrap_err();
        let err: PipelineError = json_err.into();
        assert!(matches!(err, PipelineError::Json(_)));
    }
}
