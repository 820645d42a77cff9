// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// JSON persistence for everything the pipeline hands from one
// step to the next:
//
//   models/
//     preprocessor.json   ← fitted ColumnTransformer (transform step)
//     best_model.json     ← promoted TrainedModel   (evaluate step)
//
// Every write goes to a sibling temp file first and is then
// renamed over the target, so a reader never sees a partially
// written file.
//
// Why write the temp file next to the target?
//   rename() is only atomic within one filesystem. A temp file
//   in /tmp could sit on another mount, and the "rename" would
//   become a copy that a server can observe half done.
//
// Reference: Rust Book §9 (Error Handling)
//            std::fs::rename documentation

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::ml::features::ColumnTransformer;
use crate::ml::model::TrainedModel;

pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const BEST_MODEL_FILE: &str = "best_model.json";

/// Write `bytes` to `path` via temp file + rename, creating parent directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let tmp = parent.join(format!(".{name}.tmp"));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Serialise `value` as pretty JSON and write it atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, &serde_json::to_vec_pretty(value)?)
}

/// Read a JSON file; absent and empty files get their own errors.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PipelineError::MissingArtifact(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(PipelineError::EmptyArtifact(path.to_path_buf()));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// The directory holding the artifacts the server loads.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.dir.join(PREPROCESSOR_FILE)
    }

    pub fn best_model_path(&self) -> PathBuf {
        self.dir.join(BEST_MODEL_FILE)
    }

    pub fn save_preprocessor(&self, preprocessor: &ColumnTransformer) -> Result<PathBuf> {
        let path = self.preprocessor_path();
        write_json(&path, preprocessor)?;
        tracing::info!("Preprocessor saved to '{}'", path.display());
        Ok(path)
    }

    pub fn load_preprocessor(&self) -> Result<ColumnTransformer> {
        read_json(&self.preprocessor_path())
    }

    pub fn save_best_model(&self, model: &TrainedModel) -> Result<PathBuf> {
        let path = self.best_model_path();
        write_json(&path, model)?;
        Ok(path)
    }

    pub fn load_best_model(&self) -> Result<TrainedModel> {
        read_json(&self.best_model_path())
    }
}
