// ============================================================
// Layer 4 — Train/Test Splitter and Cross-Validation Folds
// ============================================================
// Two ways of carving up samples:
//
//   split_train_test   → one seeded shuffle, then a hold-out
//                        test set of ceil(n * test_fraction)
//   stratified_k_fold  → k folds that each keep the class
//                        balance of the whole set
//
// Both are deterministic: the same seed and input always give
// the same split, so reruns of the pipeline are comparable.
//
// Why stratify the CV folds?
//   The cleaned data is close to balanced, but a 5-way split of
//   a few hundred rows can still leave a fold with far fewer
//   positives than the rest. Recall on such a fold is noisy, and
//   recall is what the grid search ranks by. Cutting each class
//   into k near-equal chunks keeps every fold's per-class count
//   within one sample of the other folds.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

/// Shuffle `samples` with `seed` and split into (train, test).
///
/// The first `ceil(n * test_fraction)` shuffled samples form the
/// test set; the rest form the training set.
pub fn split_train_test<T>(mut samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let test_len = ((total as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let test_len = test_len.min(total);

    // split_off(n) keeps [0..n) in `samples` and returns [n..total)
    let train = samples.split_off(test_len);

    tracing::debug!(
        "Dataset split: {} training, {} test ({}% / {}%)",
        train.len(),
        samples.len(),
        (train.len()   * 100) / total.max(1),
        (samples.len() * 100) / total.max(1),
    );

    (train, samples)
}

/// One cross-validation fold: row indices to fit on and to score on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// Stratified k-fold without shuffling.
///
/// Each class's indices (in original order) are cut into `k`
/// contiguous chunks whose sizes differ by at most one; fold `i`
/// tests on chunk `i` of every class and trains on the rest.
pub fn stratified_k_fold(labels: &[u8], k: usize) -> Result<Vec<Fold>> {
    if k < 2 || k > labels.len() {
        return Err(PipelineError::InvalidParam {
            name:   "cv".into(),
            reason: format!("need 2 <= folds <= {} samples, got {}", labels.len(), k),
        });
    }

    let mut classes: Vec<u8> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    let mut test_sets: Vec<Vec<usize>> = vec![Vec::new(); k];
    for class in classes {
        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();

        let base  = members.len() / k;
        let extra = members.len() % k;
        let mut start = 0;
        for (fold, test) in test_sets.iter_mut().enumerate() {
            let size = base + usize::from(fold < extra);
            test.extend_from_slice(&members[start..start + size]);
            start += size;
        }
    }

    Ok(test_sets
        .into_iter()
        .map(|mut test| {
            test.sort_unstable();
            let train = (0..labels.len()).filter(|i| test.binary_search(i).is_err()).collect();
            Fold { train, test }
        })
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_test_size_rounds_up() {
        // 303 * 0.2 = 60.6 → 61 test rows
        let items: Vec<usize> = (0..303).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert_eq!(test.len(),  61);
        assert_eq!(train.len(), 242);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_train_test(items, 0.3, 7);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_test((0..40).collect::<Vec<usize>>(), 0.25, 42);
        let b = split_train_test((0..40).collect::<Vec<usize>>(), 0.25, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, test) = split_train_test(Vec::<usize>::new(), 0.2, 42);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_folds_partition_every_index_once() {
        let labels: Vec<u8> = (0..23).map(|i| (i % 3 == 0) as u8).collect();
        let folds = stratified_k_fold(&labels, 5).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for f in &folds {
            assert_eq!(f.train.len() + f.test.len(), 23);
            assert!(f.test.iter().all(|i| !f.train.contains(i)));
        }
    }

    #[test]
    fn test_folds_keep_class_balance() {
        // 10 positives, 40 negatives → every fold has 2 positives and 8 negatives
        let labels: Vec<u8> = (0..50).map(|i| (i < 10) as u8).collect();
        for f in stratified_k_fold(&labels, 5).unwrap() {
            let pos = f.test.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(pos, 2);
            assert_eq!(f.test.len(), 10);
        }
    }

    #[test]
    fn test_invalid_fold_count() {
        assert!(stratified_k_fold(&[0, 1, 0], 1).is_err());
        assert!(stratified_k_fold(&[0, 1, 0], 4).is_err());
    }
}
