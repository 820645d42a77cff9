// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Every path, name and knob the use cases share. Defaults
// reproduce the standard layout:
//
//   data/raw/heart_raw.csv
//   data/processed/heart_cleaned.csv
//   data/processed/heart_transformed.csv
//   models/preprocessor.json, models/best_model.json
//   reports/*.csv
//   mlruns/          ← experiment tracking store
//   logs/            ← daily JSON log files
//
// A TOML file passed with `--config` may override any subset of
// fields; missing fields keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::loader::UCI_CLEVELAND_URL;
use crate::domain::experiment::Stage;
use crate::ml::scoring::Metric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub raw_data_path:         PathBuf,
    pub cleaned_data_path:     PathBuf,
    pub transformed_data_path: PathBuf,
    pub models_dir:            PathBuf,
    pub reports_dir:           PathBuf,
    pub tracking_dir:          PathBuf,
    pub logs_dir:              PathBuf,

    pub dataset_url:           String,
    pub experiment_name:       String,
    pub registered_model_name: String,
    /// Metric the best run is chosen by (highest wins).
    pub selection_metric:      Metric,
    /// Registry stage the promoted version moves to.
    pub promotion_stage:       Stage,

    pub seed:                  u64,
    pub test_fraction:         f64,
    pub cv_folds:              usize,
    pub cv_scoring:            Metric,

    pub host:                  String,
    pub port:                  u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_path:         PathBuf::from("data/raw/heart_raw.csv"),
            cleaned_data_path:     PathBuf::from("data/processed/heart_cleaned.csv"),
            transformed_data_path: PathBuf::from("data/processed/heart_transformed.csv"),
            models_dir:            PathBuf::from("models"),
            reports_dir:           PathBuf::from("reports"),
            tracking_dir:          PathBuf::from("mlruns"),
            logs_dir:              PathBuf::from("logs"),

            dataset_url:           UCI_CLEVELAND_URL.to_string(),
            experiment_name:       "Heart_Disease_Classification".to_string(),
            registered_model_name: "HeartDiseaseClassifier".to_string(),
            selection_metric:      Metric::Recall,
            promotion_stage:       Stage::Staging,

            seed:                  42,
            test_fraction:         0.2,
            cv_folds:              5,
            cv_scoring:            Metric::Accuracy,

            host:                  "0.0.0.0".to_string(),
            port:                  8000,
        }
    }
}

impl PipelineConfig {
    /// Read a TOML file; absent fields take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Resolve every relative path against `root`.
    pub fn relative_to(mut self, root: &Path) -> Self {
        for path in [
            &mut self.raw_data_path,
            &mut self.cleaned_data_path,
            &mut self.transformed_data_path,
            &mut self.models_dir,
            &mut self.reports_dir,
            &mut self.tracking_dir,
            &mut self.logs_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }
}
