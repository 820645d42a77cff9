// ============================================================
// Layer 6 — File-backed Experiment Tracker and Model Registry
// ============================================================
// Implements ExperimentTracker and ModelRegistry on a plain
// directory tree (by default `mlruns/`):
//
//   mlruns/
//     experiments/<experiment_id>.json   ← Experiment
//     runs/<run_id>/run.json             ← Run (info + params/metrics/tags)
//     runs/<run_id>/artifacts/...        ← logged files
//     models/<name>.json                 ← RegisteredModel with its versions
//
// Run ids are random UUIDs (simple form). Experiment ids are
// "1", "2", ... in creation order. Timestamps are milliseconds
// since the Unix epoch.
//
// Every JSON document is rewritten whole through
// artifact_store::write_json (temp file + rename).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::experiment::{
    parse_runs_uri, Experiment, ModelVersion, RegisteredModel, Run, RunData, RunInfo, RunQuery,
    RunStatus, Stage, RUN_NAME_TAG,
};
use crate::domain::traits::{ExperimentTracker, ModelRegistry};
use crate::error::{PipelineError, Result};
use crate::infra::artifact_store::{read_json, write_json};

const RUN_FILE: &str = "run.json";
const ARTIFACTS_DIR: &str = "artifacts";

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct FileTracker {
    root: PathBuf,
}

impl FileTracker {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for sub in ["experiments", "runs", "models"] {
            fs::create_dir_all(root.join(sub))?;
        }
        Ok(Self { root })
    }

    fn experiments_dir(&self) -> PathBuf {
        self.root.join("experiments")
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("runs").join(run_id)
    }

    fn artifacts_dir(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join(ARTIFACTS_DIR)
    }

    fn model_file(&self, name: &str) -> PathBuf {
        self.root.join("models").join(format!("{name}.json"))
    }

    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(self.experiments_dir())? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                out.push(read_json(&path)?);
            }
        }
        Ok(out)
    }

    fn save_run(&self, run: &Run) -> Result<()> {
        write_json(&self.run_dir(&run.info.run_id).join(RUN_FILE), run)
    }

    /// Load, modify and rewrite one run.
    fn update_run(&self, run_id: &str, f: impl FnOnce(&mut Run)) -> Result<()> {
        let mut run = self.get_run(run_id)?;
        f(&mut run);
        self.save_run(&run)
    }

    fn load_model(&self, name: &str) -> Result<RegisteredModel> {
        let path = self.model_file(name);
        if !path.exists() {
            return Err(PipelineError::ModelNotFound(name.to_string()));
        }
        read_json(&path)
    }

    fn save_model(&self, model: &RegisteredModel) -> Result<()> {
        write_json(&self.model_file(&model.name), model)
    }
}

/// Copy every file under `src` into `dst`, keeping relative paths.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ─── ExperimentTracker ────────────────────────────────────────────────────────
impl ExperimentTracker for FileTracker {
    fn get_or_create_experiment(&self, name: &str) -> Result<Experiment> {
        if let Some(existing) = self.get_experiment_by_name(name)? {
            return Ok(existing);
        }
        let next_id = self
            .list_experiments()?
            .iter()
            .filter_map(|e| e.experiment_id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let experiment = Experiment {
            experiment_id:   next_id.to_string(),
            name:            name.to_string(),
            lifecycle_stage: "active".to_string(),
            creation_time:   now_millis(),
        };
        write_json(&self.experiments_dir().join(format!("{next_id}.json")), &experiment)?;
        tracing::info!("Created experiment '{}' (id {})", name, next_id);
        Ok(experiment)
    }

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<Experiment>> {
        Ok(self.list_experiments()?.into_iter().find(|e| e.name == name))
    }

    fn start_run(&self, experiment_id: &str, run_name: &str) -> Result<RunInfo> {
        let info = RunInfo {
            run_id:        Uuid::new_v4().simple().to_string(),
            experiment_id: experiment_id.to_string(),
            run_name:      run_name.to_string(),
            status:        RunStatus::Running,
            start_time:    now_millis(),
            end_time:      None,
        };
        let mut data = RunData::default();
        data.tags.insert(RUN_NAME_TAG.to_string(), run_name.to_string());

        fs::create_dir_all(self.artifacts_dir(&info.run_id))?;
        self.save_run(&Run { info: info.clone(), data })?;
        tracing::info!("Started run {} ('{}')", info.run_id, run_name);
        Ok(info)
    }

    fn log_params(&self, run_id: &str, params: &BTreeMap<String, String>) -> Result<()> {
        self.update_run(run_id, |run| {
            run.data.params.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        })
    }

    fn log_metric(&self, run_id: &str, key: &str, value: f64) -> Result<()> {
        self.update_run(run_id, |run| {
            run.data.metrics.insert(key.to_string(), value);
        })
    }

    fn log_artifact(&self, run_id: &str, local_path: &Path, artifact_path: Option<&str>) -> Result<()> {
        self.get_run(run_id)?;
        let file_name = local_path
            .file_name()
            .ok_or_else(|| PipelineError::MissingArtifact(local_path.to_path_buf()))?;
        let mut dest = self.artifacts_dir(run_id);
        if let Some(sub) = artifact_path {
            dest = dest.join(sub);
        }
        fs::create_dir_all(&dest)?;
        fs::copy(local_path, dest.join(file_name))?;
        Ok(())
    }

    fn log_artifact_dir(&self, run_id: &str, local_dir: &Path, artifact_path: &str) -> Result<()> {
        self.get_run(run_id)?;
        let copied = copy_dir(local_dir, &self.artifacts_dir(run_id).join(artifact_path))?;
        tracing::debug!("Logged {} files to {}/{}", copied, run_id, artifact_path);
        Ok(())
    }

    fn end_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        self.update_run(run_id, |run| {
            run.info.status   = status;
            run.info.end_time = Some(now_millis());
        })?;
        tracing::info!("Run {} ended with status {:?}", run_id, status);
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> Result<Run> {
        let path = self.run_dir(run_id).join(RUN_FILE);
        if !path.exists() {
            return Err(PipelineError::RunNotFound(run_id.to_string()));
        }
        read_json(&path)
    }

    fn search_runs(&self, query: &RunQuery) -> Result<Vec<Run>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(self.root.join("runs"))? {
            let path = entry?.path().join(RUN_FILE);
            if !path.exists() {
                continue;
            }
            let run: Run = read_json(&path)?;
            let in_experiment = query.experiment_ids.is_empty()
                || query.experiment_ids.contains(&run.info.experiment_id);
            let status_ok = query.status.map_or(true, |s| run.info.status == s);
            if in_experiment && status_ok {
                runs.push(run);
            }
        }

        // Base order: newest first, run id breaks ties.
        runs.sort_by(|a, b| {
            b.info.start_time
                .cmp(&a.info.start_time)
                .then_with(|| a.info.run_id.cmp(&b.info.run_id))
        });
        // Stable sort: runs equal under every clause keep the base order.
        runs.sort_by(|a, b| {
            query
                .order_by
                .iter()
                .map(|o| o.compare(a, b))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(max) = query.max_results {
            runs.truncate(max);
        }
        Ok(runs)
    }

    fn download_artifacts(&self, run_id: &str, artifact_path: &str) -> Result<PathBuf> {
        self.get_run(run_id)?;
        let path = self.artifacts_dir(run_id).join(artifact_path);
        if !path.exists() {
            return Err(PipelineError::MissingArtifact(path));
        }
        Ok(path)
    }
}

// ─── ModelRegistry ────────────────────────────────────────────────────────────
impl ModelRegistry for FileTracker {
    fn register_model(&self, source: &str, name: &str) -> Result<ModelVersion> {
        let now = now_millis();
        let mut model = match self.load_model(name) {
            Ok(m) => m,
            Err(PipelineError::ModelNotFound(_)) => {
                tracing::info!("Registering new model '{}'", name);
                RegisteredModel { name: name.to_string(), creation_timestamp: now, versions: Vec::new() }
            }
            Err(e) => return Err(e),
        };

        let version = ModelVersion {
            name:                   name.to_string(),
            version:                model.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1,
            source:                 source.to_string(),
            run_id:                 parse_runs_uri(source).map(|(id, _)| id.to_string()),
            current_stage:          Stage::None,
            creation_timestamp:     now,
            last_updated_timestamp: now,
        };
        model.versions.push(version.clone());
        self.save_model(&model)?;
        tracing::info!("Created version {} of model '{}'", version.version, name);
        Ok(version)
    }

    fn transition_model_version_stage(
        &self,
        name:             &str,
        version:          u32,
        stage:            Stage,
        archive_existing: bool,
    ) -> Result<ModelVersion> {
        let mut model = self.load_model(name)?;
        if !model.versions.iter().any(|v| v.version == version) {
            return Err(PipelineError::VersionNotFound { name: name.to_string(), version });
        }

        let now = now_millis();
        let mut updated = None;
        for v in &mut model.versions {
            if v.version == version {
                v.current_stage          = stage;
                v.last_updated_timestamp = now;
                updated = Some(v.clone());
            } else if archive_existing && v.current_stage == stage && stage != Stage::None {
                v.current_stage          = Stage::Archived;
                v.last_updated_timestamp = now;
            }
        }
        self.save_model(&model)?;

        let updated = updated.ok_or_else(|| PipelineError::VersionNotFound { name: name.to_string(), version })?;
        tracing::info!("Model '{}' version {} moved to {}", name, version, stage);
        Ok(updated)
    }

    fn get_latest_versions(&self, name: &str, stages: &[Stage]) -> Result<Vec<ModelVersion>> {
        let model = self.load_model(name)?;
        let mut wanted: Vec<Stage> = stages.to_vec();
        if wanted.is_empty() {
            for v in &model.versions {
                if !wanted.contains(&v.current_stage) {
                    wanted.push(v.current_stage);
                }
            }
        }
        Ok(wanted
            .into_iter()
            .filter_map(|stage| {
                model
                    .versions
                    .iter()
                    .filter(|v| v.current_stage == stage)
                    .max_by_key(|v| v.version)
                    .cloned()
            })
            .collect())
    }
}
