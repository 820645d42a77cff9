// ============================================================
// Layer 2 — IngestUseCase
// ============================================================
// Produces the cleaned dataset every later step reads:
//
//   Step 1: Load the raw table        (Layer 4 - data, any DatasetSource)
//   Step 2: Save it with a header     → data/raw/heart_raw.csv
//   Step 3: Binarise target, impute   (Layer 4 - data)
//   Step 4: Save the cleaned table    → data/processed/heart_cleaned.csv

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::{cleaner::Cleaner, loader::DatasetSource};
use crate::domain::patient::TARGET_COLUMN;

pub struct IngestUseCase<'a> {
    config: &'a PipelineConfig,
    source: Box<dyn DatasetSource>,
}

impl<'a> IngestUseCase<'a> {
    pub fn new(config: &'a PipelineConfig, source: Box<dyn DatasetSource>) -> Self {
        Self { config, source }
    }

    /// Run the ingest steps and return the cleaned CSV path.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg = self.config;

        // ── Step 1: Load ──────────────────────────────────────────────────────
        tracing::info!("Loading dataset from {}", self.source.describe());
        let mut table = self
            .source
            .load()
            .with_context(|| format!("Failed to load dataset from {}", self.source.describe()))?;
        tracing::info!(rows = table.n_rows(), columns = table.columns().len(), "Dataset loaded");

        // ── Step 2: Raw copy ──────────────────────────────────────────────────
        table
            .write_csv(&cfg.raw_data_path)
            .with_context(|| format!("Cannot write raw data to '{}'", cfg.raw_data_path.display()))?;
        tracing::info!("Raw data saved to '{}'", cfg.raw_data_path.display());

        // ── Step 3: Clean ─────────────────────────────────────────────────────
        let report = Cleaner::new(TARGET_COLUMN)
            .clean(&mut table)
            .context("Data cleaning failed")?;
        for (column, median, filled) in &report.imputed {
            tracing::info!("Imputed {} missing '{}' values with median {}", filled, column, median);
        }

        // ── Step 4: Cleaned copy ──────────────────────────────────────────────
        table.write_csv(&cfg.cleaned_data_path).with_context(|| {
            format!("Cannot write cleaned data to '{}'", cfg.cleaned_data_path.display())
        })?;
        tracing::info!("Cleaned data saved to '{}'", cfg.cleaned_data_path.display());

        Ok(cfg.cleaned_data_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures;
    use crate::data::loader::CsvFileSource;
    use crate::data::table::Table;
    use tempfile::tempdir;

    #[test]
    fn test_ingest_writes_raw_and_cleaned() {
        let dir    = tempdir().unwrap();
        let config = fixtures::config_in(dir.path());
        let source = CsvFileSource::new(fixtures::write_uci_file(dir.path()));

        let cleaned_path = IngestUseCase::new(&config, Box::new(source)).execute().unwrap();
        assert_eq!(cleaned_path, config.cleaned_data_path);

        let raw = Table::read_csv(&config.raw_data_path).unwrap();
        assert_eq!(raw.n_rows(), 60);
        assert!(raw.missing_counts().iter().any(|(_, n)| *n > 0));

        let cleaned = Table::read_csv(&cleaned_path).unwrap();
        assert_eq!(cleaned.n_rows(), 60);
        assert!(cleaned.missing_counts().iter().all(|(_, n)| *n == 0));
        let targets = cleaned.dense_column(TARGET_COLUMN).unwrap();
        assert!(targets.iter().all(|&t| t == 0.0 || t == 1.0));
        assert!(targets.contains(&0.0) && targets.contains(&1.0));
    }

    #[test]
    fn test_missing_source_file_is_an_error() {
        let dir    = tempdir().unwrap();
        let config = fixtures::config_in(dir.path());
        let source = CsvFileSource::new(dir.path().join("absent.data"));

        let err = IngestUseCase::new(&config, Box::new(source)).execute().unwrap_err();
        assert!(err.to_string().contains("Failed to load dataset"));
        assert!(!config.raw_data_path.exists());
    }
}
