// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits:
//   - Classifier         → any fitted model that scores rows
//   - ExperimentTracker  → records runs, params, metrics, artifacts
//   - ModelRegistry      → versions models and moves them between stages
//
// infra::tracking::FileTracker implements both tracking traits
// on the local filesystem. A remote tracking server would only
// need another implementation of the same traits.
//
// Why two traits for one store?
//   Training only records runs; it takes `T: ExperimentTracker`
//   and cannot touch the registry. Evaluation needs both and
//   asks for `ExperimentTracker + ModelRegistry`.
//
// Reference: Rust Book §10 (Traits)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::experiment::{
    Experiment, ModelVersion, Run, RunInfo, RunQuery, RunStatus, Stage,
};
use crate::error::Result;

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A fitted binary classifier.
pub trait Classifier {
    /// Number of input features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Class probabilities `[p(0), p(1)]` for every row.
    fn predict_proba(&self, rows: &[Vec<f32>]) -> Result<Vec<[f64; 2]>>;

    /// Most probable class for every row. Ties resolve to class 0.
    fn predict(&self, rows: &[Vec<f32>]) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(|p| if p[1] > p[0] { 1 } else { 0 })
            .collect())
    }
}

// ─── ExperimentTracker ────────────────────────────────────────────────────────
/// Records training runs grouped into named experiments.
pub trait ExperimentTracker {
    /// Return the experiment with this name, creating it if needed.
    fn get_or_create_experiment(&self, name: &str) -> Result<Experiment>;

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<Experiment>>;

    /// Open a new run in `RUNNING` status.
    fn start_run(&self, experiment_id: &str, run_name: &str) -> Result<RunInfo>;

    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()>;

    fn log_metric(&self, run_id: &str, key: &str, value: f64) -> Result<()>;

    /// Copy a local file into the run's artifacts, optionally under a sub-path.
    fn log_artifact(&self, run_id: &str, local_path: &Path, artifact_path: Option<&str>) -> Result<()>;

    /// Copy every file of a local directory into `artifact_path`.
    fn log_artifact_dir(&self, run_id: &str, local_dir: &Path, artifact_path: &str) -> Result<()>;

    fn end_run(&self, run_id: &str, status: RunStatus) -> Result<()>;

    fn get_run(&self, run_id: &str) -> Result<Run>;

    fn search_runs(&self, query: &RunQuery) -> Result<Vec<Run>>;

    /// Local path of a run's artifact (file or directory).
    fn download_artifacts(&self, run_id: &str, artifact_path: &str) -> Result<PathBuf>;
}

// ─── ModelRegistry ────────────────────────────────────────────────────────────
/// Versioned store of promoted models.
pub trait ModelRegistry {
    /// Register `source` (a `runs:/<id>/<path>` URI) as the next version of `name`.
    fn register_model(&self, source: &str, name: &str) -> Result<ModelVersion>;

    /// Move a version to `stage`. With `archive_existing`, other versions
    /// currently in `stage` are moved to `Archived`.
    fn transition_model_version_stage(
        &self,
        name:             &str,
        version:          u32,
        stage:            Stage,
        archive_existing: bool,
    ) -> Result<ModelVersion>;

    /// Newest version in each requested stage (all stages when empty).
    fn get_latest_versions(&self, name: &str, stages: &[Stage]) -> Result<Vec<ModelVersion>>;
}
