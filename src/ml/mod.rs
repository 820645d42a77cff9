// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Everything that learns from or scores the feature matrix.
// Burn is only imported by logistic.rs; every fitted model is
// copied out into plain serde structs, so the rest of the
// crate (and the HTTP server) never touches tensors.
//
//   features.rs    — ColumnTransformer: standard scaling of the
//                    numerical columns, one-hot encoding of the
//                    categorical ones; frozen as preprocessor.json
//
//   params.rs      — ParamValue / ParamSet / ParamGrid
//
//   logistic.rs    — L2-regularised logistic regression trained
//                    with Burn autodiff (Adam or SGD)
//
//   forest.rs      — random forest of gini CART trees, grown in
//                    parallel with rayon
//
//   model.rs       — EstimatorKind (what to fit) and TrainedModel
//                    (the fitted artifact, model.json)
//
//   grid_search.rs — stratified k-fold CV over a ParamGrid
//
//   scoring.rs     — accuracy / precision / recall / ROC AUC and
//                    the confusion matrix
//
//   inferencer.rs  — loads both artifacts and predicts one patient

pub mod features;
pub mod params;
pub mod logistic;
pub mod forest;
pub mod model;
pub mod grid_search;
pub mod scoring;
pub mod inferencer;
