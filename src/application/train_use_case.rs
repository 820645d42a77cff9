// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Trains every candidate model family and tracks each as a run:
//
//   Step 1: Load the transformed table      (Layer 4 - data)
//   Step 2: Split train/test (80/20)        (Layer 4 - data)
//   Step 3: Get or create the experiment    (Layer 6 - infra)
//   Step 4: For each candidate family:
//     4a. start a run named after the family
//     4b. grid-search with stratified CV    (Layer 5 - ml)
//     4c. score the refit model on the test split
//     4d. log params, metrics, confusion matrix, CV results
//         and the model itself under artifact path "model"
//     4e. end the run FINISHED (FAILED if any step erred)
//
// The tracker is any ExperimentTracker, so tests and
// alternative stores plug in without touching this workflow.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::{dataset::Dataset, splitter::split_train_test, table::Table};
use crate::domain::experiment::RunStatus;
use crate::domain::patient::TARGET_COLUMN;
use crate::domain::traits::{Classifier, ExperimentTracker};
use crate::infra::{artifact_store::write_json, reports};
use crate::ml::grid_search::GridSearch;
use crate::ml::model::{EstimatorKind, MODEL_FILE};
use crate::ml::params::ParamGrid;
use crate::ml::scoring::EvaluationReport;

/// Artifact path the fitted model is logged under.
pub const MODEL_ARTIFACT_PATH: &str = "model";

/// Scratch directory under `models/` for models not yet logged.
const STAGING_DIR: &str = ".staging";

/// Outcome of one tracked candidate.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub run_id: String,
    pub kind:   EstimatorKind,
    pub report: EvaluationReport,
}

pub struct TrainUseCase<'a, T: ExperimentTracker> {
    config:     &'a PipelineConfig,
    tracker:    &'a T,
    candidates: Vec<(EstimatorKind, ParamGrid)>,
}

impl<'a, T: ExperimentTracker> TrainUseCase<'a, T> {
    pub fn new(config: &'a PipelineConfig, tracker: &'a T) -> Self {
        let candidates = EstimatorKind::ALL.iter().map(|k| (*k, k.default_grid())).collect();
        Self { config, tracker, candidates }
    }

    /// Replace the candidate families and their grids.
    pub fn with_candidates(mut self, candidates: Vec<(EstimatorKind, ParamGrid)>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn execute(&self) -> Result<Vec<TrainingSummary>> {
        let cfg = self.config;

        // ── Step 1: Load transformed data ─────────────────────────────────────
        let table = Table::read_csv(&cfg.transformed_data_path).with_context(|| {
            format!(
                "Cannot read transformed data '{}'; run `transform` first",
                cfg.transformed_data_path.display()
            )
        })?;
        let data = Dataset::from_table(&table, TARGET_COLUMN)?;

        // ── Step 2: Train / test split ────────────────────────────────────────
        let indices: Vec<usize> = (0..data.len()).collect();
        let (train_idx, test_idx) = split_train_test(indices, cfg.test_fraction, cfg.seed);
        let train = data.subset(&train_idx);
        let test  = data.subset(&test_idx);
        tracing::info!(
            "Split: {} train ({} positive), {} test ({} positive)",
            train.len(), train.positives(), test.len(), test.positives(),
        );

        // ── Step 3: Experiment ────────────────────────────────────────────────
        let experiment = self
            .tracker
            .get_or_create_experiment(&cfg.experiment_name)
            .with_context(|| format!("Cannot open experiment '{}'", cfg.experiment_name))?;

        // ── Step 4: One tracked run per candidate family ──────────────────────
        let mut summaries = Vec::with_capacity(self.candidates.len());
        for (kind, grid) in &self.candidates {
            let run = self
                .tracker
                .start_run(&experiment.experiment_id, kind.run_name())
                .with_context(|| format!("Cannot start run for {kind}"))?;
            tracing::info!(run_id = %run.run_id, "Training {}", kind);

            match self.train_candidate(*kind, grid, &run.run_id, &train, &test) {
                Ok(report) => {
                    self.tracker.end_run(&run.run_id, RunStatus::Finished)?;
                    tracing::info!(
                        run_id = %run.run_id,
                        accuracy = report.accuracy,
                        recall = report.recall,
                        "{} finished",
                        kind
                    );
                    summaries.push(TrainingSummary { run_id: run.run_id, kind: *kind, report });
                }
                Err(e) => {
                    if let Err(end_err) = self.tracker.end_run(&run.run_id, RunStatus::Failed) {
                        tracing::warn!("Could not mark run {} failed: {}", run.run_id, end_err);
                    }
                    tracing::error!(run_id = %run.run_id, "{} failed: {:#}", kind, e);
                    return Err(e.context(format!("Training {kind} failed")));
                }
            }
        }

        Ok(summaries)
    }

    fn train_candidate(
        &self,
        kind:   EstimatorKind,
        grid:   &ParamGrid,
        run_id: &str,
        train:  &Dataset,
        test:   &Dataset,
    ) -> Result<EvaluationReport> {
        let cfg = self.config;

        // ── 4b: Grid search ───────────────────────────────────────────────────
        let search = GridSearch::new(kind, grid.clone())
            .with_folds(cfg.cv_folds)
            .with_scoring(cfg.cv_scoring)
            .with_seed(cfg.seed)
            .fit(train)?;
        tracing::info!("Best params for {}: {} (cv {} = {:.4})", kind, search.best_params, cfg.cv_scoring, search.best_score);

        // ── 4c: Hold-out evaluation ───────────────────────────────────────────
        let proba = search.best_model.predict_proba(&test.features)?;
        let p1: Vec<f64> = proba.iter().map(|p| p[1]).collect();
        let predicted    = search.best_model.predict(&test.features)?;
        let report = EvaluationReport::compute(&test.labels, &predicted, &p1)?;

        // ── 4d: Log everything ────────────────────────────────────────────────
        self.tracker.log_params(run_id, &search.best_params.to_strings())?;
        for (key, value) in report.metrics() {
            self.tracker.log_metric(run_id, key, value)?;
        }

        let prefix = kind.run_name();
        let cm_path = self.report_path(&format!("{prefix}_confusion_matrix.csv"));
        reports::write_confusion_matrix(&cm_path, &report.confusion)?;
        self.tracker.log_artifact(run_id, &cm_path, None)?;

        let cv_path = self.report_path(&format!("{prefix}_cv_results.csv"));
        reports::write_cv_results(&cv_path, &search.cv_results)?;
        self.tracker.log_artifact(run_id, &cv_path, None)?;

        // Staged only until the tracker has its own copy.
        let staging   = cfg.models_dir.join(STAGING_DIR);
        let model_dir = staging.join(run_id);
        write_json(&model_dir.join(MODEL_FILE), &search.best_model)?;
        let logged = self.tracker.log_artifact_dir(run_id, &model_dir, MODEL_ARTIFACT_PATH);
        fs::remove_dir_all(&model_dir)
            .with_context(|| format!("Cannot remove staged model '{}'", model_dir.display()))?;
        // Left in place while not empty.
        let _ = fs::remove_dir(&staging);
        logged?;

        Ok(report)
    }

    fn report_path(&self, file_name: &str) -> PathBuf {
        self.config.reports_dir.join(file_name)
    }
}
