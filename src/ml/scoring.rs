// ============================================================
// Layer 5 — Classification Metrics
// ============================================================
// Binary metrics with class 1 ("disease present") as positive:
//
//   accuracy  = (tp + tn) / n
//   precision = tp / (tp + fp)      0 when nothing predicted positive
//   recall    = tp / (tp + fn)      0 when there are no positives
//   roc_auc   = P(score(pos) > score(neg)), ties count half
//
// Recall drives model promotion: a missed diagnosis (false
// negative) is the costly error for this task.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    RocAuc,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Accuracy, Metric::Precision, Metric::Recall, Metric::RocAuc];

    /// Key the metric is logged under.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Accuracy  => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall    => "recall",
            Metric::RocAuc    => "roc_auc",
        }
    }

    /// Score predictions. `proba` is p(class 1) per sample and is only
    /// used by ROC AUC.
    pub fn score(&self, actual: &[u8], predicted: &[u8], proba: &[f64]) -> Result<f64> {
        match self {
            Metric::Accuracy  => accuracy(actual, predicted),
            Metric::Precision => Ok(ConfusionMatrix::from_labels(actual, predicted)?.precision()),
            Metric::Recall    => Ok(ConfusionMatrix::from_labels(actual, predicted)?.recall()),
            Metric::RocAuc    => roc_auc(actual, proba),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| PipelineError::Parse { kind: "metric", value: s.to_string() })
    }
}

// ─── Confusion matrix ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        check_lengths(actual.len(), predicted.len())?;
        let mut cm = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a == 1, p == 1) {
                (false, false) => cm.tn  += 1,
                (false, true)  => cm.fp  += 1,
                (true, false)  => cm.fn_ += 1,
                (true, true)   => cm.tp  += 1,
            }
        }
        Ok(cm)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Rows are actual classes, columns predicted: `[[tn, fp], [fn, tp]]`.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn check_lengths(a: usize, b: usize) -> Result<()> {
    if a != b {
        return Err(PipelineError::ShapeMismatch { expected: a, got: b });
    }
    if a == 0 {
        return Err(PipelineError::EmptyDataset);
    }
    Ok(())
}

pub fn accuracy(actual: &[u8], predicted: &[u8]) -> Result<f64> {
    check_lengths(actual.len(), predicted.len())?;
    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Area under the ROC curve via the rank-sum statistic, with tied
/// scores sharing their average rank.
pub fn roc_auc(actual: &[u8], scores: &[f64]) -> Result<f64> {
    check_lengths(actual.len(), scores.len())?;
    let n_pos = actual.iter().filter(|&&y| y == 1).count();
    let n_neg = actual.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::UndefinedMetric {
            metric: "roc_auc",
            reason: "only one class present in y_true".into(),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0f64; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = actual
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y == 1)
        .map(|(_, r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

// ─── Evaluation report ────────────────────────────────────────────────────────
/// Hold-out scores logged for every trained candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub roc_auc:   f64,
    pub confusion: ConfusionMatrix,
}

impl EvaluationReport {
    pub fn compute(actual: &[u8], predicted: &[u8], proba: &[f64]) -> Result<Self> {
        let confusion = ConfusionMatrix::from_labels(actual, predicted)?;
        Ok(Self {
            accuracy:  accuracy(actual, predicted)?,
            precision: confusion.precision(),
            recall:    confusion.recall(),
            roc_auc:   roc_auc(actual, proba)?,
            confusion,
        })
    }

    /// (key, value) pairs in logging order.
    pub fn metrics(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy",  self.accuracy),
            ("precision", self.precision),
            ("recall",    self.recall),
            ("roc_auc",   self.roc_auc),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_counts_caught_positives() {
        // 1 out of 2 positives caught
        let actual = [1, 0, 1, 0];
        let pred   = [1, 0, 0, 0];
        let proba  = [0.9, 0.1, 0.2, 0.3];
        let r = EvaluationReport::compute(&actual, &pred, &proba).unwrap();
        assert_eq!(r.recall, 0.5);
        assert_eq!(r.precision, 1.0);
        assert_eq!(r.accuracy, 0.75);
        assert!((0.0..=1.0).contains(&r.roc_auc));
    }

    #[test]
    fn test_precision_zero_when_nothing_predicted_positive() {
        let cm = ConfusionMatrix::from_labels(&[1, 0], &[0, 0]).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.as_rows(), [[1, 0], [1, 0]]);
    }

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]).unwrap(), 1.0);
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.9, 0.8, 0.2, 0.1]).unwrap(), 0.0);
    }

    #[test]
    fn test_roc_auc_ties_count_half() {
        assert_eq!(roc_auc(&[0, 1], &[0.5, 0.5]).unwrap(), 0.5);
        // pos scores {0.4, 0.8}, neg {0.4, 0.1}: pairs won 1 + 0.5 + 1 + 1 = 3.5 of 4
        assert_eq!(roc_auc(&[1, 0, 1, 0], &[0.4, 0.4, 0.8, 0.1]).unwrap(), 0.875);
    }

    #[test]
    fn test_roc_auc_single_class_is_undefined() {
        let err = roc_auc(&[1, 1], &[0.2, 0.3]).unwrap_err();
        assert!(matches!(err, PipelineError::UndefinedMetric { metric: "roc_auc", .. }));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(accuracy(&[1, 0], &[1]).is_err());
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("recall".parse::<Metric>().unwrap(), Metric::Recall);
        assert_eq!(Metric::RocAuc.to_string(), "roc_auc");
        assert!("f1".parse::<Metric>().is_err());
    }
}
