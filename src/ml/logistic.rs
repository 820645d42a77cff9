// ============================================================
// Layer 5 — Logistic Regression (Burn)
// ============================================================
// A single Linear(d → 1) layer trained with Burn's autodiff on
// the NdArray CPU backend.
//
// Objective (full batch, n samples):
//
//   mean BCE(sigmoid(Xw + b), y)  +  ||w||² / (2·C·n)
//
// which is the usual C-regularised logistic loss divided by C·n.
// Smaller C means stronger regularisation. The bias is not
// penalised.
//
// Training stops after `max_iter` steps or once the loss moves
// less than `tol` between steps. Weights start at zero; the
// problem is convex so the start point only affects speed.
//
// The fitted weights are copied out of the tensors into a plain
// `LogisticRegression`, so inference and persistence never need
// the Burn runtime.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    nn::{Initializer, Linear, LinearConfig},
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::{activation::log_sigmoid, backend::AutodiffBackend},
};
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::domain::traits::Classifier;
use crate::error::{PipelineError, Result};
use crate::ml::params::ParamSet;

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Which optimiser drives the weight updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    Adam,
    Sgd,
}

impl Solver {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "adam" => Ok(Solver::Adam),
            "sgd"  => Ok(Solver::Sgd),
            other  => Err(PipelineError::InvalidParam {
                name:   "solver".into(),
                reason: format!("unknown solver '{other}', expected adam or sgd"),
            }),
        }
    }

    fn default_learning_rate(&self) -> f64 {
        match self {
            Solver::Adam => 0.05,
            Solver::Sgd  => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularisation strength.
    pub c:             f64,
    pub solver:        Solver,
    pub max_iter:      usize,
    pub tol:           f64,
    pub learning_rate: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c:             1.0,
            solver:        Solver::Adam,
            max_iter:      1000,
            tol:           1e-6,
            learning_rate: Solver::Adam.default_learning_rate(),
        }
    }
}

impl LogisticParams {
    /// Read `C` and `solver` from a grid point; anything absent keeps its default.
    pub fn from_params(params: &ParamSet) -> Result<Self> {
        let mut p = Self::default();
        if let Some(c) = params.float("C")? {
            if c <= 0.0 {
                return Err(PipelineError::InvalidParam { name: "C".into(), reason: "must be positive".into() });
            }
            p.c = c;
        }
        if let Some(s) = params.text("solver")? {
            p.solver = Solver::parse(s)?;
            p.learning_rate = p.solver.default_learning_rate();
        }
        if let Some(m) = params.int("max_iter")? {
            p.max_iter = m.max(1) as usize;
        }
        Ok(p)
    }

    /// Fit on `data`.
    pub fn fit(&self, data: &Dataset) -> Result<LogisticRegression> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let device = burn::backend::ndarray::NdArrayDevice::default();
        match self.solver {
            Solver::Adam => train(self, data, AdamConfig::new().init(), &device),
            Solver::Sgd  => train(self, data, SgdConfig::new().init(), &device),
        }
    }
}

// ─── Burn module ──────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct LogisticModule<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> LogisticModule<B> {
    pub fn new(n_features: usize, device: &B::Device) -> Self {
        let linear = LinearConfig::new(n_features, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);
        Self { linear }
    }

    /// x: [n, d] → logits: [n, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(x)
    }

    /// Penalised binary cross-entropy on logits.
    pub fn forward_loss(&self, x: Tensor<B, 2>, y: Tensor<B, 2>, l2: f64) -> Tensor<B, 1>
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(x);
        // log(1 - sigmoid(z)) = log_sigmoid(-z)
        let pos = y.clone() * log_sigmoid(logits.clone());
        let neg = (y.neg() + 1.0) * log_sigmoid(logits.neg());
        let bce = (pos + neg).mean().neg();

        let penalty = self.linear.weight.val().powf_scalar(2.0).sum() * l2;
        bce + penalty
    }
}

/// Loss history of the gradient loop.
struct LossTrace {
    tol:        f64,
    iterations: usize,
    last:       f64,
}

impl LossTrace {
    fn new(tol: f64) -> Self {
        Self { tol, iterations: 0, last: f64::INFINITY }
    }

    /// Record one iteration's loss; true once it moved less than `tol`.
    fn record(&mut self, loss: f64) -> bool {
        let converged = (self.last - loss).abs() < self.tol;
        self.iterations += 1;
        self.last = loss;
        converged
    }
}

fn train<O>(
    params: &LogisticParams,
    data:   &Dataset,
    mut optim: O,
    device: &burn::backend::ndarray::NdArrayDevice,
) -> Result<LogisticRegression>
where
    O: Optimizer<LogisticModule<TrainBackend>, TrainBackend>,
{
    let n = data.len();
    let d = data.n_features();

    // ── Build full-batch tensors ──────────────────────────────────────────────
    let flat: Vec<f32> = data.features.iter().flatten().copied().collect();
    let labels: Vec<f32> = data.labels.iter().map(|&y| y as f32).collect();
    let x = Tensor::<TrainBackend, 2>::from_data(TensorData::new(flat, [n, d]), device);
    let y = Tensor::<TrainBackend, 2>::from_data(TensorData::new(labels, [n, 1]), device);

    let l2 = 1.0 / (2.0 * params.c * n as f64);
    let mut model = LogisticModule::<TrainBackend>::new(d, device);
    let mut trace = LossTrace::new(params.tol);

    // ── Gradient loop ─────────────────────────────────────────────────────────
    for _ in 0..params.max_iter {
        let loss = model.forward_loss(x.clone(), y.clone(), l2);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(params.learning_rate, model, grads);

        if trace.record(loss_val) {
            break;
        }
    }
    tracing::debug!(
        "Logistic regression (C={}, solver={:?}) stopped after {} iterations, loss={:.6}",
        params.c, params.solver, trace.iterations, trace.last,
    );

    // ── Copy weights out of the tensors ───────────────────────────────────────
    let coefficients = model
        .linear
        .weight
        .val()
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| PipelineError::Backend(format!("{e:?}")))?;
    let intercept = match &model.linear.bias {
        Some(bias) => bias
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::Backend(format!("{e:?}")))?
            .first()
            .copied()
            .unwrap_or(0.0),
        None => 0.0,
    };

    Ok(LogisticRegression { coefficients, intercept })
}

// ─── Fitted model ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f32>,
    pub intercept:    f32,
}

impl LogisticRegression {
    fn decision(&self, row: &[f32]) -> f64 {
        let z: f64 = row
            .iter()
            .zip(&self.coefficients)
            .map(|(&x, &w)| x as f64 * w as f64)
            .sum();
        z + self.intercept as f64
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_proba(&self, rows: &[Vec<f32>]) -> Result<Vec<[f64; 2]>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(PipelineError::ShapeMismatch {
                        expected: self.coefficients.len(),
                        got:      row.len(),
                    });
                }
                let p = sigmoid(self.decision(row));
                Ok([1.0 - p, p])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::params::ParamValue;

    /// Positive class iff the first feature is positive; the second is noise.
    fn separable() -> Dataset {
        let mut features = Vec::new();
        let mut labels   = Vec::new();
        for i in 0..40 {
            let x0 = (i as f32 - 19.5) / 10.0;
            let x1 = ((i * 7) % 5) as f32 / 5.0 - 0.4;
            features.push(vec![x0, x1]);
            labels.push((x0 > 0.0) as u8);
        }
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_adam_learns_separable_data() {
        let params = LogisticParams { max_iter: 300, ..Default::default() };
        let model  = params.fit(&separable()).unwrap();
        let data   = separable();
        let pred   = model.predict(&data.features).unwrap();
        let correct = pred.iter().zip(&data.labels).filter(|(p, y)| p == y).count();
        assert!(correct >= 38, "only {correct}/40 correct");
        assert!(model.coefficients[0] > 0.0);
    }

    #[test]
    fn test_sgd_learns_separable_data() {
        let mut grid = ParamSet::new();
        grid.insert("solver", ParamValue::Text("sgd".into()));
        let params = LogisticParams { max_iter: 300, ..LogisticParams::from_params(&grid).unwrap() };
        assert_eq!(params.solver, Solver::Sgd);

        let model = params.fit(&separable()).unwrap();
        let proba = model.predict_proba(&[vec![1.5, 0.0], vec![-1.5, 0.0]]).unwrap();
        assert!(proba[0][1] > 0.5);
        assert!(proba[1][1] < 0.5);
    }

    #[test]
    fn test_stronger_regularisation_shrinks_weights() {
        let weak   = LogisticParams { c: 10.0, max_iter: 300, ..Default::default() };
        let strong = LogisticParams { c: 0.01, max_iter: 300, ..Default::default() };
        let w_weak   = weak.fit(&separable()).unwrap().coefficients[0].abs();
        let w_strong = strong.fit(&separable()).unwrap().coefficients[0].abs();
        assert!(w_strong < w_weak);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = LogisticRegression { coefficients: vec![0.5, -1.0], intercept: 0.1 };
        for p in model.predict_proba(&[vec![1.0, 2.0], vec![-3.0, 0.5]]).unwrap() {
            assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let model = LogisticRegression { coefficients: vec![0.5, -1.0], intercept: 0.0 };
        assert!(matches!(
            model.predict_proba(&[vec![1.0]]),
            Err(PipelineError::ShapeMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_loss_trace_reports_latest_loss() {
        let mut trace = LossTrace::new(1e-4);
        assert!(!trace.record(0.69));
        assert_eq!(trace.iterations, 1);
        assert_eq!(trace.last, 0.69);

        assert!(!trace.record(0.5));
        assert!(trace.record(0.49995));
        assert_eq!(trace.iterations, 3);
        assert_eq!(trace.last, 0.49995);
    }

    #[test]
    fn test_invalid_params() {
        let mut grid = ParamSet::new();
        grid.insert("solver", ParamValue::Text("newton".into()));
        assert!(LogisticParams::from_params(&grid).is_err());

        let mut grid = ParamSet::new();
        grid.insert("C", ParamValue::Float(0.0));
        assert!(LogisticParams::from_params(&grid).is_err());
    }
}
