// ============================================================
// Layer 2 — ProfileUseCase
// ============================================================
// Exploratory summaries of the cleaned dataset, written as CSV:
//
//   reports/class_distribution.csv  — target, count, fraction
//   reports/correlation_matrix.csv  — Pearson r for every column pair

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::config::PipelineConfig;
use crate::data::{profile, table::Table};
use crate::domain::patient::TARGET_COLUMN;
use crate::infra::reports;

pub const CLASS_DISTRIBUTION_FILE: &str = "class_distribution.csv";
pub const CORRELATION_MATRIX_FILE: &str = "correlation_matrix.csv";

pub struct ProfileUseCase<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ProfileUseCase<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Write both reports and return their paths.
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let cfg   = self.config;
        let table = Table::read_csv(&cfg.cleaned_data_path).with_context(|| {
            format!("Cannot read cleaned data '{}'; run `ingest` first", cfg.cleaned_data_path.display())
        })?;

        let classes = profile::class_distribution(&table, TARGET_COLUMN)?;
        for c in &classes {
            tracing::info!("Class {}: {} samples ({:.1}%)", c.value, c.count, c.fraction * 100.0);
        }
        let classes_path = cfg.reports_dir.join(CLASS_DISTRIBUTION_FILE);
        reports::write_class_distribution(&classes_path, &classes)?;

        let matrix      = profile::correlation_matrix(&table)?;
        let matrix_path = cfg.reports_dir.join(CORRELATION_MATRIX_FILE);
        reports::write_correlation_matrix(&matrix_path, &matrix)?;

        tracing::info!("EDA reports written to '{}'", cfg.reports_dir.display());
        Ok(vec![classes_path, matrix_path])
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
    fn test_profile_writes_both_reports() {
        let dir    = tempdir().unwrap();
        let config = fixtures::config_in(dir.path());
        let source = CsvFileSource::new(fixtures::write_uci_file(dir.path()));
        IngestUseCase::new(&config, Box::new(source)).execute().unwrap();

        let paths = ProfileUseCase::new(&config).execute().unwrap();
        assert_eq!(paths.len(), 2);

        let mut rdr  = csv::Reader::from_path(&paths[0]).unwrap();
        let counts: usize = rdr
            .records()
            .map(|r| r.unwrap()[1].parse::<usize>().unwrap())
            .sum();
        assert_eq!(counts, 60);

        let mut rdr = csv::Reader::from_path(&paths[1]).unwrap();
        assert_eq!(rdr.records().count(), 14);
    }

    #[test]
    fn test_profile_without_ingest_fails() {
        let dir    = tempdir().unwrap();
        let config = fixtures::config_in(dir.path());
        let err    = ProfileUseCase::new(&config).execute().unwrap_err();
        assert!(err.to_string().contains("run `ingest` first"));
    }
}
