// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing the core concepts:
// patients and predictions, tracked experiments and runs,
// registered model versions.
//
// Rules for this layer:
//   - NO burn framework types
//   - NO file I/O or network calls
//   - Only plain structs, enums and traits

// Patient feature schema and prediction responses
pub mod patient;

// Experiments, runs and registered model versions
pub mod experiment;

// Core abstractions (traits) that other layers implement
pub mod traits;
