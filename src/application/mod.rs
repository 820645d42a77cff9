// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case drives one stage of the offline pipeline by
// coordinating the data, ml and infra layers:
//
//   ingest     → raw + cleaned CSV
//   profile    → EDA reports
//   transform  → transformed CSV + frozen preprocessor
//   train      → one tracked run per candidate model family
//   evaluate   → best run exported, registered and promoted
//   pipeline   → all of the above in order
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Errors are anyhow, with context naming the failed step

/// Paths, names and knobs shared by every stage
pub mod config;

pub mod ingest_use_case;
pub mod profile_use_case;
pub mod transform_use_case;
pub mod train_use_case;
pub mod evaluate_use_case;
pub mod pipeline_use_case;

#[cfg(test)]
pub(crate) mod fixtures;
