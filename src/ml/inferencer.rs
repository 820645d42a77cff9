// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads the two frozen artifacts produced by the pipeline and
// turns one patient record into a prediction:
//
//   PatientData → single-row Table → ColumnTransformer
//               → TrainedModel::predict_proba → Prediction
//
// Both artifacts must exist before the server starts; a missing
// one is reported as MissingArtifact with its path.

use std::path::Path;

use crate::data::table::Table;
use crate::domain::patient::{PatientData, Prediction};
use crate::domain::traits::Classifier;
use crate::error::{PipelineError, Result};
use crate::infra::artifact_store::read_json;
use crate::ml::features::ColumnTransformer;
use crate::ml::model::{EstimatorKind, TrainedModel};

pub struct Inferencer {
    model:        TrainedModel,
    preprocessor: ColumnTransformer,
}

impl Inferencer {
    pub fn new(model: TrainedModel, preprocessor: ColumnTransformer) -> Result<Self> {
        let width = preprocessor.output_width();
        if width != model.n_features() {
            return Err(PipelineError::ShapeMismatch { expected: model.n_features(), got: width });
        }
        Ok(Self { model, preprocessor })
    }

    pub fn from_artifacts(model_path: &Path, preprocessor_path: &Path) -> Result<Self> {
        // Neither is read until both are known to exist.
        for path in [model_path, preprocessor_path] {
            if !path.exists() {
                return Err(PipelineError::MissingArtifact(path.to_path_buf()));
            }
        }
        let model: TrainedModel = read_json(model_path)?;
        let preprocessor: ColumnTransformer = read_json(preprocessor_path)?;
        tracing::info!(
            "Loaded {} model from '{}' and preprocessor from '{}'",
            model.kind(), model_path.display(), preprocessor_path.display(),
        );
        Self::new(model, preprocessor)
    }

    pub fn model_kind(&self) -> EstimatorKind {
        self.model.kind()
    }

    pub fn predict(&self, patient: &PatientData) -> Result<Prediction> {
        let table = Table::single_row(&patient.features());
        let rows  = self.preprocessor.transform(&table)?;
        let proba = self
            .model
            .predict_proba(&rows)?
            .into_iter()
            .next()
            .ok_or(PipelineError::EmptyDataset)?;
        let class = if proba[1] > proba[0] { 1 } else { 0 };
        Ok(Prediction::from_proba(class, proba))
    }
}
