// ============================================================
// Layer 2 — PipelineUseCase
// ============================================================
// The whole offline pipeline in one call:
//
//   ingest → transform → train → evaluate
//
// Each stage reads what the previous one wrote, exactly as when
// the stages are run one by one from the CLI. `profile` only
// writes reports nothing downstream reads, so it stays a
// separate command.

use anyhow::{Context, Result};

use crate::application::{
    config::PipelineConfig,
    evaluate_use_case::{EvaluateUseCase, Promotion},
    ingest_use_case::IngestUseCase,
    train_use_case::TrainUseCase,
    transform_use_case::TransformUseCase,
};
use crate::data::loader::DatasetSource;
use crate::domain::traits::{ExperimentTracker, ModelRegistry};
use crate::ml::model::EstimatorKind;
use crate::ml::params::ParamGrid;

pub struct PipelineUseCase<'a, T: ExperimentTracker + ModelRegistry> {
    config:     &'a PipelineConfig,
    tracker:    &'a T,
    candidates: Option<Vec<(EstimatorKind, ParamGrid)>>,
}

impl<'a, T: ExperimentTracker + ModelRegistry> PipelineUseCase<'a, T> {
    pub fn new(config: &'a PipelineConfig, tracker: &'a T) -> Self {
        Self { config, tracker, candidates: None }
    }

    /// Train only these families, with these grids.
    pub fn with_candidates(mut self, candidates: Vec<(EstimatorKind, ParamGrid)>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn execute(&self, source: Box<dyn DatasetSource>) -> Result<Promotion> {
        tracing::info!("Stage 1/4: ingest");
        IngestUseCase::new(self.config, source).execute().context("Ingest stage failed")?;

        tracing::info!("Stage 2/4: transform");
        TransformUseCase::new(self.config).execute().context("Transform stage failed")?;

        tracing::info!("Stage 3/4: train");
        let mut train = TrainUseCase::new(self.config, self.tracker);
        if let Some(candidates) = &self.candidates {
            train = train.with_candidates(candidates.clone());
        }
        train.execute().context("Train stage failed")?;

        tracing::info!("Stage 4/4: evaluate");
        EvaluateUseCase::new(self.config, self.tracker).execute().context("Evaluate stage failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures;
    use crate::application::train_use_case::tests::small_candidates;
    use crate::data::loader::CsvFileSource;
    use crate::infra::tracking::FileTracker;
    use tempfile::tempdir;

    #[test]
    fn test_full_pipeline_leaves_servable_artifacts() {
        let dir        = tempdir().unwrap();
        let mut config = fixtures::config_in(dir.path());
        config.cv_folds = 3;
        let tracker = FileTracker::new(&config.tracking_dir).unwrap();
        let source  = CsvFileSource::new(fixtures::write_uci_file(dir.path()));

        let promotion = PipelineUseCase::new(&config, &tracker)
            .with_candidates(small_candidates())
            .execute(Box::new(source))
            .unwrap();

        assert!(promotion.exported_to.exists());
        assert!(config.models_dir.join("preprocessor.json").exists());
        assert!(!config.reports_dir.join("class_distribution.csv").exists());
        assert!(["Logistic_Regression", "Random_Forest"].contains(&promotion.run_name.as_str()));
    }
}
