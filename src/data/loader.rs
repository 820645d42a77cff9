// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Fetches the raw Cleveland heart-disease file.
//
// The UCI file is headerless CSV, one patient per line, with
// "?" marking unknown values:
//
//   63.0,1.0,1.0,145.0,233.0,1.0,2.0,150.0,0.0,2.3,3.0,0.0,6.0,0
//   ...
//
// Two sources implement DatasetSource:
//   - UciDownloader  → HTTP GET from the UCI repository
//   - CsvFileSource  → a local copy of the same file (offline runs)

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::data::table::Table;
use crate::domain::patient::COLUMN_NAMES;
use crate::error::Result;

/// Marker the UCI file uses for unknown values.
pub const NA_MARKER: &str = "?";

/// Default location of the processed Cleveland data.
pub const UCI_CLEVELAND_URL: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/heart-disease/processed.cleveland.data";

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce the raw patient table.
pub trait DatasetSource {
    /// Human-readable origin, for logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Table>;
}

/// Parse headerless UCI text into a table with the standard column names.
pub fn parse_uci(text: &str) -> Result<Table> {
    Table::from_csv_reader(text.as_bytes(), Some(&COLUMN_NAMES[..]), &[NA_MARKER])
}

// ─── UciDownloader ────────────────────────────────────────────────────────────
pub struct UciDownloader {
    url:     String,
    timeout: Duration,
}

impl UciDownloader {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), timeout: Duration::from_secs(30) }
    }
}

impl DatasetSource for UciDownloader {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn load(&self) -> Result<Table> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        // error_for_status turns 4xx/5xx into an Err instead of parsing an error page
        let body = client.get(&self.url).send()?.error_for_status()?.text()?;
        tracing::info!("Downloaded {} bytes from {}", body.len(), self.url);

        parse_uci(&body)
    }
}

// ─── CsvFileSource ────────────────────────────────────────────────────────────
/// A local file in UCI format (headerless, "?" for unknowns).
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Table> {
        let text = fs::read_to_string(&self.path)?;
        parse_uci(&text)
    }
}
