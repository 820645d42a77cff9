// ============================================================
// Layer 5 — Grid Search with Stratified Cross-Validation
// ============================================================
// For every candidate of the grid:
//
//   for fold in stratified_k_fold(labels, k):
//     fit on fold.train, score on fold.test
//   mean_score = mean of fold scores
//
// The best candidate has the highest mean score; among equal
// means the earlier candidate wins. It is then refit on the
// whole training set.
//
// Candidates are scored in parallel with rayon. The collected
// results keep grid order, so the outcome does not depend on
// thread scheduling.
//
// Reference: scikit-learn GridSearchCV user guide
//            rayon crate documentation

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::data::splitter::{stratified_k_fold, Fold};
use crate::domain::traits::Classifier;
use crate::error::{PipelineError, Result};
use crate::ml::model::{EstimatorKind, TrainedModel};
use crate::ml::params::{ParamGrid, ParamSet};
use crate::ml::scoring::Metric;

pub struct GridSearch {
    pub kind:    EstimatorKind,
    pub grid:    ParamGrid,
    pub folds:   usize,
    pub scoring: Metric,
    pub seed:    u64,
}

/// Cross-validation outcome of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    pub params:      ParamSet,
    pub fold_scores: Vec<f64>,
    pub mean_score:  f64,
    pub std_score:   f64,
    /// 1 is best; equal means share a rank.
    pub rank:        usize,
}

#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_params: ParamSet,
    pub best_score:  f64,
    pub best_model:  TrainedModel,
    pub cv_results:  Vec<CvResult>,
}

impl GridSearch {
    pub fn new(kind: EstimatorKind, grid: ParamGrid) -> Self {
        Self { kind, grid, folds: 5, scoring: Metric::Accuracy, seed: 42 }
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_scoring(mut self, scoring: Metric) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&self, data: &Dataset) -> Result<GridSearchResult> {
        if self.grid.is_empty() {
            return Err(PipelineError::InvalidParam {
                name:   "param_grid".into(),
                reason: "grid has no candidates".into(),
            });
        }
        let folds = stratified_k_fold(&data.labels, self.folds)?;
        tracing::info!(
            "Grid search for {}: {} candidates x {} folds, scoring={}",
            self.kind, self.grid.len(), folds.len(), self.scoring,
        );
        let candidates = self.grid.expand();

        let scored: Vec<(ParamSet, Vec<f64>)> = candidates
            .into_par_iter()
            .map(|params| {
                let scores = self.cross_validate(&params, data, &folds)?;
                Ok((params, scores))
            })
            .collect::<Result<_>>()?;

        // ── Summarise and rank ────────────────────────────────────────────────
        let mut cv_results: Vec<CvResult> = scored
            .into_iter()
            .map(|(params, fold_scores)| {
                let (mean_score, std_score) = mean_std(&fold_scores);
                CvResult { params, fold_scores, mean_score, std_score, rank: 0 }
            })
            .collect();
        let means: Vec<f64> = cv_results.iter().map(|r| r.mean_score).collect();
        for r in &mut cv_results {
            r.rank = 1 + means.iter().filter(|&&m| m > r.mean_score).count();
        }

        let mut best = 0;
        for (i, r) in cv_results.iter().enumerate() {
            if r.mean_score > cv_results[best].mean_score {
                best = i;
            }
        }
        let best_params = cv_results[best].params.clone();
        let best_score  = cv_results[best].mean_score;
        tracing::info!("Best params for {}: {} (mean {}={:.4})", self.kind, best_params, self.scoring, best_score);

        // ── Refit on the full training set ────────────────────────────────────
        let best_model = self.kind.fit(&best_params, data, self.seed)?;

        Ok(GridSearchResult { best_params, best_score, best_model, cv_results })
    }

    fn cross_validate(&self, params: &ParamSet, data: &Dataset, folds: &[Fold]) -> Result<Vec<f64>> {
        folds
            .iter()
            .map(|fold| {
                let train = data.subset(&fold.train);
                let test  = data.subset(&fold.test);
                let model = self.kind.fit(params, &train, self.seed)?;
                let proba = model.predict_proba(&test.features)?;
                let pred: Vec<u8>  = proba.iter().map(|p| if p[1] > p[0] { 1 } else { 0 }).collect();
                let p1:   Vec<f64> = proba.iter().map(|p| p[1]).collect();
                self.scoring.score(&test.labels, &pred, &p1)
            })
            .collect()
    }
}

/// Mean and population standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n    = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var  = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
