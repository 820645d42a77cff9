// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per pipeline stage, plus `pipeline` (ingest
// through evaluate) and `serve` (the prediction API).
//
// Flags here only override PipelineConfig; the application
// layer never sees clap types.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::loader::{CsvFileSource, DatasetSource, UciDownloader};
use crate::domain::experiment::Stage;
use crate::ml::model::EstimatorKind;
use crate::ml::params::ParamGrid;
use crate::ml::scoring::Metric;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download (or read) the raw dataset, clean it and impute missing values
    Ingest(SourceArgs),

    /// Write class-balance and correlation reports for the cleaned data
    Profile,

    /// Fit the preprocessor and write the transformed dataset
    Transform,

    /// Grid-search every candidate model and track each as a run
    Train(TrainArgs),

    /// Export, register and promote the best tracked run
    Evaluate(EvaluateArgs),

    /// Run ingest, transform, train and evaluate in order
    Pipeline(PipelineArgs),

    /// Serve predictions over HTTP
    Serve(ServeArgs),
}

/// Where the raw dataset comes from.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Download from this URL instead of the configured one
    #[arg(long, conflicts_with = "input")]
    pub url: Option<String>,

    /// Read a local file in UCI format instead of downloading
    #[arg(long)]
    pub input: Option<PathBuf>,
}

impl SourceArgs {
    pub fn into_source(self, config: &PipelineConfig) -> Box<dyn DatasetSource> {
        match (self.input, self.url) {
            (Some(path), _) => Box::new(CsvFileSource::new(path)),
            (None, Some(url)) => Box::new(UciDownloader::new(url)),
            (None, None) => Box::new(UciDownloader::new(config.dataset_url.clone())),
        }
    }
}

/// Which candidate families to train.
#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// Train only this family (Logistic_Regression, Random_Forest); repeatable
    #[arg(long = "model", value_name = "NAME")]
    pub models: Vec<String>,
}

impl TrainArgs {
    /// The chosen families with their default grids, or `None` for all.
    pub fn candidates(&self) -> Result<Option<Vec<(EstimatorKind, ParamGrid)>>> {
        if self.models.is_empty() {
            return Ok(None);
        }
        let mut out: Vec<(EstimatorKind, ParamGrid)> = Vec::with_capacity(self.models.len());
        for name in &self.models {
            let kind: EstimatorKind = name.parse()?;
            if !out.iter().any(|(k, _)| *k == kind) {
                out.push((kind, kind.default_grid()));
            }
        }
        Ok(Some(out))
    }
}

/// Overrides for run selection and promotion.
#[derive(Args, Debug, Default)]
pub struct EvaluateArgs {
    /// Metric the best run is chosen by (default from config: recall)
    #[arg(long)]
    pub metric: Option<String>,

    /// Stage the winning version moves to (default from config: Staging)
    #[arg(long)]
    pub stage: Option<String>,
}

impl EvaluateArgs {
    pub fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(metric) = &self.metric {
            config.selection_metric = metric.parse::<Metric>()?;
        }
        if let Some(stage) = &self.stage {
            config.promotion_stage = stage.parse::<Stage>()?;
        }
        Ok(())
    }
}

#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub train: TrainArgs,

    #[command(flatten)]
    pub evaluate: EvaluateArgs,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Interface to bind (default from config: 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default from config: 8000)
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Apply the flags on top of `config`.
    pub fn apply(self, config: &mut PipelineConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags_override_config() {
        let mut config = PipelineConfig::default();
        ServeArgs { host: None, port: Some(9100) }.apply(&mut config);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
    }

    #[test]
    fn test_model_flags_pick_families_once() {
        let args = TrainArgs {
            models: vec!["random_forest".into(), "Random_Forest".into()],
        };
        let picked = args.candidates().unwrap().unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, EstimatorKind::RandomForest);
        assert_eq!(picked[0].1, EstimatorKind::RandomForest.default_grid());

        assert!(TrainArgs::default().candidates().unwrap().is_none());
        assert!(TrainArgs { models: vec!["svm".into()] }.candidates().is_err());
    }

    #[test]
    fn test_evaluate_flags_override_selection() {
        let mut config = PipelineConfig::default();
        let args = EvaluateArgs { metric: Some("roc_auc".into()), stage: Some("production".into()) };
        args.apply(&mut config).unwrap();
        assert_eq!(config.selection_metric, Metric::RocAuc);
        assert_eq!(config.promotion_stage, Stage::Production);

        let bad = EvaluateArgs { metric: Some("f1".into()), stage: None };
        assert!(bad.apply(&mut config).is_err());
    }

    #[test]
    fn test_source_defaults_to_configured_url() {
        let config = PipelineConfig::default();
        let source = SourceArgs::default().into_source(&config);
        assert_eq!(source.describe(), config.dataset_url);

        let source = SourceArgs { url: None, input: Some(PathBuf::from("local.data")) }.into_source(&config);
        assert_eq!(source.describe(), "local.data");
    }
}
