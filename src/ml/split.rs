//! Stratified data splitting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::ml::MLError;

/// Row indices for one train/evaluate partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn indices_by_class(y: &[usize], n_classes: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut by_class = vec![Vec::new(); n_classes];
    for (i, &label) in y.iter().enumerate() {
        if label < n_classes {
            by_class[label].push(i);
        }
    }
    for members in &mut by_class {
        members.shuffle(rng);
    }
    by_class
}

/// Split rows so every class keeps roughly `test_fraction` of its members
/// in the test part.
///
/// Classes with a single member stay entirely in the training part; every
/// other class keeps at least one member on each side.
pub fn stratified_train_test_split(
    y: &[usize],
    n_classes: usize,
    test_fraction: f64,
    seed: u64,
) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let fraction = test_fraction.clamp(0.0, 1.0);

    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();
    for members in indices_by_class(y, n_classes, &mut rng) {
        let n = members.len();
        let n_test = if n < 2 || fraction == 0.0 {
            0
        } else {
            ((n as f64 * fraction).round() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

/// Stratified k-fold partitions.
///
/// # Errors
///
/// Fails with [`MLError::TrainingDataInsufficient`] when `k < 2` or any
/// present class has fewer than `k` members.
pub fn stratified_k_fold(y: &[usize], n_classes: usize, k: usize, seed: u64) -> Result<Vec<Split>> {
    if k < 2 {
        return Err(MLError::TrainingDataInsufficient {
            message: format!("k-fold needs at least 2 folds, got {k}"),
        }
        .into());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let by_class = indices_by_class(y, n_classes, &mut rng);
    if let Some((class, members)) = by_class
        .iter()
        .enumerate()
        .find(|(_, m)| !m.is_empty() && m.len() < k)
    {
        return Err(MLError::TrainingDataInsufficient {
            message: format!(
                "class {class} has only {} members, fewer than {k} folds",
                members.len()
            ),
        }
        .into());
    }

    let mut fold_of = vec![0usize; y.len()];
    for members in &by_class {
        for (pos, &i) in members.iter().enumerate() {
            fold_of[i] = pos % k;
        }
    }

    let folds = (0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&i| fold_of[i] == fold);
            Split { train, test }
        })
        .collect();
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<usize> {
        // 10 of class 0, 5 of class 1, 1 of class 2
        let mut y = vec![0; 10];
        y.extend(vec![1; 5]);
        y.push(2);
        y
    }

    #[test]
    fn test_train_test_split_is_stratified() {
        let y = labels();
        let split = stratified_train_test_split(&y, 3, 0.2, 42);

        assert_eq!(split.train.len() + split.test.len(), y.len());
        let test_class = |c: usize| split.test.iter().filter(|&&i| y[i] == c).count();
        assert_eq!(test_class(0), 2);
        assert_eq!(test_class(1), 1);
        assert_eq!(test_class(2), 0);
    }

    #[test]
    fn test_train_test_split_is_deterministic() {
        let y = labels();
        assert_eq!(
            stratified_train_test_split(&y, 3, 0.2, 7),
            stratified_train_test_split(&y, 3, 0.2, 7)
        );
    }

    #[test]
    fn test_k_fold_covers_each_row_once() {
        let y = vec![0, 0, 0, 1, 1, 1, 0, 1, 0, 1];
        let folds = stratified_k_fold(&y, 2, 3, 42).unwrap();
        assert_eq!(folds.len(), 3);

        let mut seen = vec![0; y.len()];
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), y.len());
            for &i in &fold.test {
                seen[i] += 1;
            }
            // every class is represented in every training part
            assert!(fold.train.iter().any(|&i| y[i] == 0));
            assert!(fold.train.iter().any(|&i| y[i] == 1));
        }
        assert!(seen.iter().all(|&s| s == 1));
    }

    #[test]
    fn test_k_fold_rejects_small_classes() {
        assert!(stratified_k_fold(&labels(), 3, 5, 42).is_err());
        assert!(stratified_k_fold(&[0, 1], 2, 1, 42).is_err());
    }
}
