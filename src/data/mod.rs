// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the UCI repository and a numeric dataset:
//
//   UCI file (or local copy)
//       │
//       ▼
//   DatasetSource     → downloads / reads, parses "?" as missing
//       │
//       ▼
//   Table             → named numeric columns, CSV in and out
//       │
//       ▼
//   Cleaner           → binary target, median imputation
//       │
//       ▼
//   (ml::features transforms the table)
//       │
//       ▼
//   Dataset           → dense f32 rows + u8 labels
//       │
//       ▼
//   splitter          → hold-out split and stratified CV folds
//
// profile summarises a cleaned table for exploratory analysis.

/// Downloads or reads the raw UCI file
pub mod loader;

/// Named numeric table with CSV I/O
pub mod table;

/// Binarises the target and imputes missing values
pub mod cleaner;

/// Dense feature matrix and labels
pub mod dataset;

/// Hold-out split and stratified k-fold
pub mod splitter;

/// Class balance and correlation summaries
pub mod profile;
