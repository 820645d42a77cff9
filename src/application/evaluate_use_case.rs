// ============================================================
// Layer 2 — EvaluateUseCase (select, export, register, promote)
// ============================================================
// Picks the winning run of the experiment and hands it to the
// serving side:
//
//   Step 1: Find the experiment by name         (missing → error)
//   Step 2: Best finished run by `metrics.recall DESC`, max 1
//           (ties go to the newest run)
//   Step 3: Export its model/model.json → models/best_model.json
//           and check it loads as a TrainedModel
//   Step 4: Register runs:/<run_id>/model as a new version
//   Step 5: Move that version to Staging
//
// Why select by recall?
//   A missed diagnosis costs more than a false alarm, so the
//   default winner is the run that catches the most positive
//   patients. `evaluate --metric` picks another metric.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::application::train_use_case::MODEL_ARTIFACT_PATH;
use crate::domain::experiment::{ModelVersion, OrderBy, RunQuery, RunStatus};
use crate::domain::traits::{ExperimentTracker, ModelRegistry};
use crate::error::PipelineError;
use crate::infra::artifact_store::{read_json, ArtifactStore};
use crate::ml::model::{TrainedModel, MODEL_FILE};

/// Result of a promotion.
#[derive(Debug, Clone)]
pub struct Promotion {
    pub run_id:       String,
    pub run_name:     String,
    pub metric_value: f64,
    pub exported_to:  PathBuf,
    pub version:      ModelVersion,
}

pub struct EvaluateUseCase<'a, T: ExperimentTracker + ModelRegistry> {
    config:  &'a PipelineConfig,
    tracker: &'a T,
}

impl<'a, T: ExperimentTracker + ModelRegistry> EvaluateUseCase<'a, T> {
    pub fn new(config: &'a PipelineConfig, tracker: &'a T) -> Self {
        Self { config, tracker }
    }

    pub fn execute(&self) -> Result<Promotion> {
        let cfg    = self.config;
        let metric = cfg.selection_metric.key();
        tracing::info!("Selecting best run of '{}' by {}", cfg.experiment_name, metric);

        // ── Step 1: Experiment ────────────────────────────────────────────────
        let experiment = self
            .tracker
            .get_experiment_by_name(&cfg.experiment_name)?
            .ok_or_else(|| PipelineError::ExperimentNotFound(cfg.experiment_name.clone()))?;

        // ── Step 2: Best run ──────────────────────────────────────────────────
        let order_by: OrderBy = format!("metrics.{metric} DESC").parse()?;
        let query = RunQuery {
            experiment_ids: vec![experiment.experiment_id.clone()],
            order_by:       vec![order_by],
            max_results:    Some(1),
            status:         Some(RunStatus::Finished),
        };
        let best = self
            .tracker
            .search_runs(&query)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No finished runs found in experiment '{}'", cfg.experiment_name))?;
        let metric_value = best
            .metric(metric)
            .ok_or_else(|| anyhow!("Run {} has no '{}' metric", best.info.run_id, metric))?;
        tracing::info!("Winner model: {} with {}: {:.4}", best.name(), metric, metric_value);

        // ── Step 3: Export ────────────────────────────────────────────────────
        let artifact_dir = self
            .tracker
            .download_artifacts(&best.info.run_id, MODEL_ARTIFACT_PATH)
            .with_context(|| format!("Run {} has no model artifact", best.info.run_id))?;
        let model: TrainedModel = read_json(&artifact_dir.join(MODEL_FILE))
            .with_context(|| format!("Cannot load {} of run {}", MODEL_FILE, best.info.run_id))?;
        let store    = ArtifactStore::new(&cfg.models_dir);
        let exported = store.save_best_model(&model)?;

        // Read back what the server will read.
        let model = store
            .load_best_model()
            .with_context(|| format!("Exported model '{}' does not load", exported.display()))?;
        tracing::info!("Exported {} model to '{}'", model.kind(), exported.display());

        // ── Step 4: Register ──────────────────────────────────────────────────
        let uri     = format!("runs:/{}/{}", best.info.run_id, MODEL_ARTIFACT_PATH);
        let version = self
            .tracker
            .register_model(&uri, &cfg.registered_model_name)
            .with_context(|| format!("Cannot register '{uri}'"))?;

        // ── Step 5: Promote ───────────────────────────────────────────────────
        let previous = self
            .tracker
            .get_latest_versions(&cfg.registered_model_name, &[cfg.promotion_stage])?;
        for old in &previous {
            tracing::info!("Version {} stays in '{}' alongside the new one", old.version, old.current_stage);
        }
        let version = self.tracker.transition_model_version_stage(
            &cfg.registered_model_name,
            version.version,
            cfg.promotion_stage,
            false,
        )?;
        tracing::info!("Model version {} promoted to '{}'", version.version, version.current_stage);

        Ok(Promotion {
            run_id:       best.info.run_id.clone(),
            run_name:     best.name().to_string(),
            metric_value,
            exported_to:  exported,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures;
    use crate::application::train_use_case::tests::{prepared_config, small_candidates};
    use crate::application::train_use_case::TrainUseCase;
    use crate::domain::experiment::{Run, Stage};
    use crate::infra::artifact_store::write_json;
    use crate::infra::tracking::FileTracker;
    use crate::ml::inferencer::Inferencer;
    use tempfile::tempdir;

    #[test]
    fn test_promotes_highest_recall_run() {
        let dir     = tempdir().unwrap();
        let config  = prepared_config(dir.path());
        let tracker = FileTracker::new(&config.tracking_dir).unwrap();
        let summaries = TrainUseCase::new(&config, &tracker)
            .with_candidates(small_candidates())
            .execute()
            .unwrap();

        let promotion = EvaluateUseCase::new(&config, &tracker).execute().unwrap();

        let best_recall = summaries.iter().map(|s| s.report.recall).fold(f64::MIN, f64::max);
        assert_eq!(promotion.metric_value, best_recall);
        assert_eq!(promotion.version.version, 1);
        assert_eq!(promotion.version.current_stage, Stage::Staging);
        assert_eq!(promotion.version.run_id.as_deref(), Some(promotion.run_id.as_str()));

        // The exported model serves together with the frozen preprocessor.
        let store = ArtifactStore::new(&config.models_dir);
        let inf   = Inferencer::from_artifacts(&store.best_model_path(), &store.preprocessor_path());
        assert!(inf.is_ok());
    }

    #[test]
    fn test_second_promotion_adds_a_version() {
        let dir     = tempdir().unwrap();
        let config  = prepared_config(dir.path());
        let tracker = FileTracker::new(&config.tracking_dir).unwrap();
        TrainUseCase::new(&config, &tracker).with_candidates(small_candidates()).execute().unwrap();

        EvaluateUseCase::new(&config, &tracker).execute().unwrap();
        let second = EvaluateUseCase::new(&config, &tracker).execute().unwrap();
        assert_eq!(second.version.version, 2);

        let latest = tracker.get_latest_versions(&config.registered_model_name, &[Stage::Staging]).unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].version, 2);
    }

    #[test]
    fn test_missing_experiment_is_an_error() {
        let dir     = tempdir().unwrap();
        let config  = fixtures::config_in(dir.path());
        let tracker = FileTracker::new(&config.tracking_dir).unwrap();
        let err = EvaluateUseCase::new(&config, &tracker).execute().unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ExperimentNotFound(name)) if *name == config.experiment_name
        ));
    }

    /// Give both runs the same recall and `newest` the later start time.
    fn tie(config: &PipelineConfig, tracker: &FileTracker, newest: &str, other: &str) {
        for (run_id, start) in [(newest, 2_000), (other, 1_000)] {
            tracker.log_metric(run_id, "recall", 0.75).unwrap();
            let path = config.tracking_dir.join("runs").join(run_id).join("run.json");
            let mut run: Run = read_json(&path).unwrap();
            run.info.start_time = start;
            write_json(&path, &run).unwrap();
        }
    }

    #[test]
    fn test_recall_tie_promotes_newest_run() {
        let dir     = tempdir().unwrap();
        let config  = prepared_config(dir.path());
        let tracker = FileTracker::new(&config.tracking_dir).unwrap();
        let summaries = TrainUseCase::new(&config, &tracker)
            .with_candidates(small_candidates())
            .execute()
            .unwrap();
        let (a, b) = (&summaries[0].run_id, &summaries[1].run_id);

        tie(&config, &tracker, a, b);
        let first = EvaluateUseCase::new(&config, &tracker).execute().unwrap();
        assert_eq!(&first.run_id, a);
        assert_eq!(first.metric_value, 0.75);

        tie(&config, &tracker, b, a);
        let second = EvaluateUseCase::new(&config, &tracker).execute().unwrap();
        assert_eq!(&second.run_id, b);
    }

    #[test]
    fn test_experiment_without_finished_runs_is_an_error() {
        let dir     = tempdir().unwrap();
        let config  = fixtures::config_in(dir.path());
        let tracker = FileTracker::new(&config.tracking_dir).unwrap();
        let exp = tracker.get_or_create_experiment(&config.experiment_name).unwrap();
        tracker.start_run(&exp.experiment_id, "Logistic_Regression").unwrap();

        let err = EvaluateUseCase::new(&config, &tracker).execute().unwrap_err();
        assert!(err.to_string().contains("No finished runs"));
    }
}
