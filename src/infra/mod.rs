// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem and process concerns shared by the other layers:
//
//   artifact_store.rs — atomic JSON writes; the preprocessor and
//                       promoted model the server loads
//
//   tracking.rs       — FileTracker: experiments, runs, params,
//                       metrics, artifacts and the model registry
//                       stored as JSON under mlruns/
//
//   reports.rs        — CSV reports: CV results, confusion
//                       matrices, EDA summaries
//
//   logging.rs        — JSON tracing to stderr and a daily file

/// Atomic JSON persistence of pipeline artifacts
pub mod artifact_store;

/// File-backed experiment tracker and model registry
pub mod tracking;

/// CSV report writers
pub mod reports;

/// tracing-subscriber setup
pub mod logging;
