// ============================================================
// Layer 2 — TransformUseCase
// ============================================================
// Fits the preprocessor on the cleaned table and freezes it:
//
//   Step 1: Read data/processed/heart_cleaned.csv
//   Step 2: Fit scaler + one-hot encoders, transform all rows
//   Step 3: Write data/processed/heart_transformed.csv
//           columns "0".."n-1" then "target"
//   Step 4: Save models/preprocessor.json for the server and
//           return it as loaded back from disk

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::table::Table;
use crate::domain::patient::TARGET_COLUMN;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::features::ColumnTransformer;

pub struct TransformUseCase<'a> {
    config: &'a PipelineConfig,
}

impl<'a> TransformUseCase<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Returns the fitted preprocessor.
    pub fn execute(&self) -> Result<ColumnTransformer> {
        let cfg = self.config;

        // ── Step 1: Load cleaned data ─────────────────────────────────────────
        let table = Table::read_csv(&cfg.cleaned_data_path).with_context(|| {
            format!("Cannot read cleaned data '{}'; run `ingest` first", cfg.cleaned_data_path.display())
        })?;

        // ── Step 2: Fit + transform ───────────────────────────────────────────
        let (preprocessor, features) =
            ColumnTransformer::fit_transform(&table).context("Failed to fit preprocessor")?;
        let width = preprocessor.output_width();
        tracing::info!(rows = features.len(), width, "Features transformed");

        // ── Step 3: Transformed CSV ───────────────────────────────────────────
        let targets = table.dense_column(TARGET_COLUMN)?;
        let mut columns: Vec<String> = (0..width).map(|i| i.to_string()).collect();
        columns.push(TARGET_COLUMN.to_string());

        let rows = features
            .into_iter()
            .zip(targets)
            .map(|(row, target)| {
                row.into_iter()
                    .map(|v| Some(v as f64))
                    .chain(std::iter::once(Some(target)))
                    .collect()
            })
            .collect();
        Table::new(columns, rows)?
            .write_csv(&cfg.transformed_data_path)
            .with_context(|| {
                format!("Cannot write transformed data to '{}'", cfg.transformed_data_path.display())
            })?;
        tracing::info!("Transformed data saved to '{}'", cfg.transformed_data_path.display());

        // ── Step 4: Freeze the preprocessor ───────────────────────────────────
        let store = ArtifactStore::new(&cfg.models_dir);
        let saved = store.save_preprocessor(&preprocessor).context("Cannot save preprocessor")?;

        // Read back what the server will read.
        store
            .load_preprocessor()
            .with_context(|| format!("Saved preprocessor '{}' does not load", saved.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures;
    use crate::application::ingest_use_case::IngestUseCase;
    use crate::data::loader::CsvFileSource;
    use tempfile::tempdir;

    #[test]
    fn test_transform_writes_table_and_preprocessor() {
        let dir    = tempdir().unwrap();
        let config = fixtures::config_in(dir.path());
        let source = CsvFileSource::new(fixtures::write_uci_file(dir.path()));
        IngestUseCase::new(&config, Box::new(source)).execute().unwrap();

        let preprocessor = TransformUseCase::new(&config).execute().unwrap();

        let table = Table::read_csv(&config.transformed_data_path).unwrap();
        assert_eq!(table.columns().len(), preprocessor.output_width() + 1);
        assert_eq!(table.columns()[0], "0");
        assert_eq!(table.columns().last().unwrap(), TARGET_COLUMN);
        assert_eq!(table.n_rows(), 60);

        let saved = ArtifactStore::new(&config.models_dir).load_preprocessor().unwrap();
        assert_eq!(saved, preprocessor);
    }
}
