// ============================================================
// Layer 3 — Patient Schema
// ============================================================
// The Cleveland heart-disease dataset has 13 clinical features
// and one diagnosis column. Raw diagnoses range 0..=4; the
// pipeline collapses them to "disease present" (1) or not (0).

use serde::{Deserialize, Serialize};

/// Column names of the raw UCI file, in file order.
pub const COLUMN_NAMES: [&str; 14] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg",
    "thalach", "exang", "oldpeak", "slope", "ca", "thal", "target",
];

/// Name of the label column.
pub const TARGET_COLUMN: &str = "target";

/// Continuous features, standard-scaled.
pub const NUMERICAL_COLUMNS: [&str; 5] = ["age", "trestbps", "chol", "thalach", "oldpeak"];

/// Discrete features, one-hot encoded.
pub const CATEGORICAL_COLUMNS: [&str; 8] = [
    "sex", "cp", "fbs", "restecg", "exang", "slope", "ca", "thal",
];

/// One patient as submitted to the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientData {
    pub age:      i64,
    pub sex:      i64,
    pub cp:       i64,
    pub trestbps: i64,
    pub chol:     i64,
    pub fbs:      i64,
    pub restecg:  i64,
    pub thalach:  i64,
    pub exang:    i64,
    pub oldpeak:  f64,
    pub slope:    i64,
    pub ca:       i64,
    pub thal:     i64,
}

impl PatientData {
    /// Feature values keyed by column name, in raw-file order.
    pub fn features(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("age",      self.age as f64),
            ("sex",      self.sex as f64),
            ("cp",       self.cp as f64),
            ("trestbps", self.trestbps as f64),
            ("chol",     self.chol as f64),
            ("fbs",      self.fbs as f64),
            ("restecg",  self.restecg as f64),
            ("thalach",  self.thalach as f64),
            ("exang",    self.exang as f64),
            ("oldpeak",  self.oldpeak),
            ("slope",    self.slope as f64),
            ("ca",       self.ca as f64),
            ("thal",     self.thal as f64),
        ]
    }
}

/// Diagnosis label shown to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnosis {
    Positive,
    Negative,
}

impl Diagnosis {
    pub fn from_class(class: u8) -> Self {
        if class == 1 { Diagnosis::Positive } else { Diagnosis::Negative }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Positive => "Positive",
            Diagnosis::Negative => "Negative",
        }
    }
}

/// Response body of the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: u8,
    pub status:     Diagnosis,
    /// Probability of the predicted class, rounded to 4 decimals.
    pub confidence: f64,
}

impl Prediction {
    /// Build a prediction from the two class probabilities.
    pub fn from_proba(class: u8, proba: [f64; 2]) -> Self {
        let confidence = proba[0].max(proba[1]);
        Self {
            prediction: class,
            status:     Diagnosis::from_class(class),
            confidence: (confidence * 10_000.0).round() / 10_000.0,
        }
    }
}
