// ============================================================
// Layer 5 — Estimators and the Model Artifact
// ============================================================
// EstimatorKind names the two candidate model families and
// knows how to fit one from a grid point. TrainedModel is the
// fitted result of either family and is what gets written as
// `model.json`:
//
//   { "kind": "logistic_regression", "coefficients": [...], "intercept": ... }
//   { "kind": "random_forest", "n_features": 30, "trees": [...] }

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::dataset::Dataset;
use crate::domain::traits::Classifier;
use crate::error::{PipelineError, Result};
use crate::ml::forest::{ForestParams, RandomForest};
use crate::ml::logistic::{LogisticParams, LogisticRegression};
use crate::ml::params::{ParamGrid, ParamSet, ParamValue};

/// File name of the serialised model inside its artifact directory.
pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    LogisticRegression,
    RandomForest,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 2] = [EstimatorKind::LogisticRegression, EstimatorKind::RandomForest];

    /// Run name used when tracking this candidate.
    pub fn run_name(&self) -> &'static str {
        match self {
            EstimatorKind::LogisticRegression => "Logistic_Regression",
            EstimatorKind::RandomForest       => "Random_Forest",
        }
    }

    /// Hyperparameter grid searched for this family.
    pub fn default_grid(&self) -> ParamGrid {
        match self {
            EstimatorKind::LogisticRegression => ParamGrid::new()
                .with("C", vec![ParamValue::Float(0.1), ParamValue::Float(1.0), ParamValue::Float(10.0)])
                .with("solver", vec![ParamValue::Text("adam".into()), ParamValue::Text("sgd".into())]),
            EstimatorKind::RandomForest => ParamGrid::new()
                .with("n_estimators", vec![ParamValue::Int(50), ParamValue::Int(100), ParamValue::Int(200)])
                .with("max_depth", vec![ParamValue::None, ParamValue::Int(10), ParamValue::Int(20)])
                .with("min_samples_split", vec![ParamValue::Int(2), ParamValue::Int(5)]),
        }
    }

    /// Fit one candidate. `seed` only affects the forest.
    pub fn fit(&self, params: &ParamSet, data: &Dataset, seed: u64) -> Result<TrainedModel> {
        match self {
            EstimatorKind::LogisticRegression => {
                Ok(TrainedModel::LogisticRegression(LogisticParams::from_params(params)?.fit(data)?))
            }
            EstimatorKind::RandomForest => {
                Ok(TrainedModel::RandomForest(ForestParams::from_params(params, seed)?.fit(data)?))
            }
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.run_name())
    }
}

impl FromStr for EstimatorKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        EstimatorKind::ALL
            .into_iter()
            .find(|k| k.run_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| PipelineError::Parse { kind: "estimator", value: s.to_string() })
    }
}

// ─── TrainedModel ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl TrainedModel {
    pub fn kind(&self) -> EstimatorKind {
        match self {
            TrainedModel::LogisticRegression(_) => EstimatorKind::LogisticRegression,
            TrainedModel::RandomForest(_)       => EstimatorKind::RandomForest,
        }
    }
}

impl Classifier for TrainedModel {
    fn n_features(&self) -> usize {
        match self {
            TrainedModel::LogisticRegression(m) => m.n_features(),
            TrainedModel::RandomForest(m)       => m.n_features(),
        }
    }

    fn predict_proba(&self, rows: &[Vec<f32>]) -> Result<Vec<[f64; 2]>> {
        match self {
            TrainedModel::LogisticRegression(m) => m.predict_proba(rows),
            TrainedModel::RandomForest(m)       => m.predict_proba(rows),
        }
    }
}
