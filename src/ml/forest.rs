// ============================================================
// Layer 5 — Random Forest
// ============================================================
// Bagged CART trees for binary classification.
//
//   for tree i in 0..n_estimators (in parallel, rayon):
//     rng    = StdRng(seed + i)
//     sample = n draws with replacement
//     grow a gini tree on the sample, trying sqrt(d) features
//     per split
//
//   p(class 1 | x) = mean over trees of the leaf's class-1 share
//
// Each tree owns its RNG, so the forest is identical however
// rayon schedules the work.
//
// Reference: Breiman (2001) Random Forests

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::domain::traits::Classifier;
use crate::error::{PipelineError, Result};
use crate::ml::params::ParamSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators:      usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    pub seed:              u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self { n_estimators: 100, max_depth: None, min_samples_split: 2, seed: 42 }
    }
}

impl ForestParams {
    /// Read the forest hyperparameters from a grid point.
    pub fn from_params(params: &ParamSet, seed: u64) -> Result<Self> {
        let mut p = Self { seed, ..Self::default() };
        if let Some(n) = params.int("n_estimators")? {
            p.n_estimators = positive("n_estimators", n)?;
        }
        p.max_depth = params
            .optional_int("max_depth")?
            .map(|d| positive("max_depth", d))
            .transpose()?;
        if let Some(m) = params.int("min_samples_split")? {
            if m < 2 {
                return Err(PipelineError::InvalidParam {
                    name:   "min_samples_split".into(),
                    reason: "must be at least 2".into(),
                });
            }
            p.min_samples_split = m as usize;
        }
        Ok(p)
    }

    pub fn fit(&self, data: &Dataset) -> Result<RandomForest> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let n_features = data.n_features();
        let n_try = ((n_features as f64).sqrt() as usize).max(1);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
                let sample: Vec<usize> = (0..data.len()).map(|_| rng.gen_range(0..data.len())).collect();
                let mut builder = TreeBuilder { data, params: self, n_try, nodes: Vec::new() };
                builder.grow(sample, 0, &mut rng);
                DecisionTree { nodes: builder.nodes }
            })
            .collect();

        tracing::debug!(
            "Random forest: {} trees, max_depth={:?}, min_samples_split={}",
            trees.len(), self.max_depth, self.min_samples_split,
        );
        Ok(RandomForest { n_features, trees })
    }
}

fn positive(name: &str, v: i64) -> Result<usize> {
    if v < 1 {
        return Err(PipelineError::InvalidParam { name: name.into(), reason: "must be positive".into() });
    }
    Ok(v as usize)
}

// ─── Tree ─────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf { proba: [f64; 2] },
    /// `x[feature] <= threshold` goes left.
    Split { feature: usize, threshold: f32, left: usize, right: usize },
}

/// Nodes in pre-order; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    fn proba(&self, row: &[f32]) -> [f64; 2] {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { proba } => return *proba,
                Node::Split { feature, threshold, left, right } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }
}

struct TreeBuilder<'a> {
    data:   &'a Dataset,
    params: &'a ForestParams,
    n_try:  usize,
    nodes:  Vec<Node>,
}

struct Candidate {
    feature:   usize,
    threshold: f32,
    impurity:  f64,
}

fn gini(n: usize, pos: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// Threshold between two distinct sorted values. For adjacent floats the
/// midpoint rounds up to `hi`, which would send both sides left; fall back
/// to `lo` so `x <= threshold` still separates them.
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi { mid } else { lo }
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `sample` and return its root index.
    fn grow(&mut self, sample: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let id  = self.nodes.len();
        let pos = sample.iter().filter(|&&i| self.data.labels[i] == 1).count();
        let n   = sample.len();
        let p1  = if n == 0 { 0.0 } else { pos as f64 / n as f64 };
        self.nodes.push(Node::Leaf { proba: [1.0 - p1, p1] });

        let pure      = pos == 0 || pos == n;
        let too_small = n < self.params.min_samples_split;
        let too_deep  = self.params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_small || too_deep {
            return id;
        }

        let Some(best) = self.best_split(&sample, rng) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.data.features[i][best.feature] <= best.threshold);
        if left.is_empty() || right.is_empty() {
            return id;
        }
        let left  = self.grow(left, depth + 1, rng);
        let right = self.grow(right, depth + 1, rng);
        self.nodes[id] = Node::Split { feature: best.feature, threshold: best.threshold, left, right };
        id
    }

    /// Visit features in random order until `n_try` of them have offered a
    /// split; constant features do not count towards the budget.
    fn best_split(&self, sample: &[usize], rng: &mut StdRng) -> Option<Candidate> {
        let mut features: Vec<usize> = (0..self.data.n_features()).collect();
        features.shuffle(rng);

        let n         = sample.len();
        let total_pos = sample.iter().filter(|&&i| self.data.labels[i] == 1).count();
        let mut best: Option<Candidate> = None;
        let mut tried = 0;

        for feature in features {
            if tried == self.n_try {
                break;
            }
            let mut points: Vec<(f32, u8)> = sample
                .iter()
                .map(|&i| (self.data.features[i][feature], self.data.labels[i]))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            if points[0].0 == points[n - 1].0 {
                continue;
            }
            tried += 1;

            let mut left_pos = 0;
            for k in 1..n {
                left_pos += points[k - 1].1 as usize;
                if points[k].0 == points[k - 1].0 {
                    continue;
                }
                let impurity = (k as f64 * gini(k, left_pos)
                    + (n - k) as f64 * gini(n - k, total_pos - left_pos))
                    / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(Candidate { feature, threshold: midpoint(points[k - 1].0, points[k].0), impurity });
                }
            }
        }
        best
    }
}

// ─── Fitted forest ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees:      Vec<DecisionTree>,
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, rows: &[Vec<f32>]) -> Result<Vec<[f64; 2]>> {
        let n_trees = self.trees.len().max(1) as f64;
        rows.iter()
            .map(|row| {
                if row.len() != self.n_features {
                    return Err(PipelineError::ShapeMismatch { expected: self.n_features, got: row.len() });
                }
                let p1 = self.trees.iter().map(|t| t.proba(row)[1]).sum::<f64>() / n_trees;
                Ok([1.0 - p1, p1])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::params::ParamValue;

    /// Class 1 iff both features share a sign: needs at least two splits.
    fn quadrants() -> Dataset {
        let mut features = Vec::new();
        let mut labels   = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                let x = i as f32 - 4.5;
                let y = j as f32 - 4.5;
                features.push(vec![x, y]);
                labels.push(((x > 0.0) == (y > 0.0)) as u8);
            }
        }
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_forest_fits_training_data() {
        let params = ForestParams { n_estimators: 25, ..Default::default() };
        let data   = quadrants();
        let forest = params.fit(&data).unwrap();
        let pred   = forest.predict(&data.features).unwrap();
        let correct = pred.iter().zip(&data.labels).filter(|(p, y)| p == y).count();
        assert!(correct >= 95, "only {correct}/100 correct");
    }

    #[test]
    fn test_same_seed_same_forest() {
        let params = ForestParams { n_estimators: 10, ..Default::default() };
        let a = params.fit(&quadrants()).unwrap();
        let b = params.fit(&quadrants()).unwrap();
        assert_eq!(a, b);

        let other = ForestParams { seed: 7, ..params }.fit(&quadrants()).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_max_depth_limits_trees() {
        let params = ForestParams { n_estimators: 5, max_depth: Some(1), ..Default::default() };
        let forest = params.fit(&quadrants()).unwrap();
        assert!(forest.trees.iter().all(|t| t.depth() <= 1));
    }

    #[test]
    fn test_single_class_gives_single_leaf() {
        let data   = Dataset::new(vec![vec![1.0], vec![2.0], vec![3.0]], vec![0, 0, 0]).unwrap();
        let forest = ForestParams { n_estimators: 3, ..Default::default() }.fit(&data).unwrap();
        assert!(forest.trees.iter().all(|t| t.nodes.len() == 1));
        assert_eq!(forest.predict_proba(&[vec![2.0]]).unwrap(), vec![[1.0, 0.0]]);
    }

    #[test]
    fn test_params_from_grid_point() {
        let mut p = ParamSet::new();
        p.insert("n_estimators", ParamValue::Int(50));
        p.insert("max_depth", ParamValue::None);
        p.insert("min_samples_split", ParamValue::Int(5));
        let fp = ForestParams::from_params(&p, 42).unwrap();
        assert_eq!(fp, ForestParams { n_estimators: 50, max_depth: None, min_samples_split: 5, seed: 42 });

        p.insert("min_samples_split", ParamValue::Int(1));
        assert!(ForestParams::from_params(&p, 42).is_err());
    }

    #[test]
    fn test_midpoint_of_adjacent_floats_separates_them() {
        let lo = 1.000_000_1_f32;
        let hi = f32::from_bits(lo.to_bits() + 1);
        let t  = midpoint(lo, hi);
        assert!(lo <= t && t < hi);
        assert_eq!(midpoint(1.0, 2.0), 1.5);
    }

    #[test]
    fn test_adjacent_float_feature_grows_finite_tree() {
        let lo = 1.000_000_1_f32;
        let hi = f32::from_bits(lo.to_bits() + 1);
        let data = Dataset::new(vec![vec![lo], vec![hi], vec![lo], vec![hi]], vec![0, 1, 0, 1]).unwrap();

        for max_depth in [None, Some(5)] {
            let params = ForestParams { n_estimators: 8, max_depth, ..Default::default() };
            let forest = params.fit(&data).unwrap();
            for tree in &forest.trees {
                assert!(tree.depth() <= 1);
                for node in &tree.nodes {
                    if let Node::Leaf { proba } = node {
                        assert!(proba.iter().all(|p| p.is_finite()));
                    }
                }
            }
            let proba = forest.predict_proba(&[vec![lo], vec![hi]]).unwrap();
            assert!(proba.iter().flatten().all(|p| p.is_finite()));
        }
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let forest = ForestParams { n_estimators: 2, ..Default::default() }.fit(&quadrants()).unwrap();
        assert!(forest.predict_proba(&[vec![0.0]]).is_err());
    }
}
