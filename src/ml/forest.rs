//! Bagged decision-tree classifier.
//!
//! Each tree is a CART classifier grown on a bootstrap sample with Gini
//! impurity, considering a random subset of features at every split. Leaves
//! store the weighted class distribution of their samples; the forest
//! averages the leaf distributions of all trees.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::MLError;
use crate::ml::classifier::ProbabilisticClassifier;
use crate::ml::dataset::{TrainDataset, balanced_class_weights};
use crate::ml::sparse::SparseVector;

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Features considered per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree.
    pub bootstrap: bool,
    /// Weight samples inversely to class frequency.
    pub balance_classes: bool,
    /// Base seed; tree `t` uses `seed + t`.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            balance_classes: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
    n_classes: usize,
}

impl DecisionTree {
    /// Grow a tree on dense rows with per-sample weights.
    ///
    /// Rows with zero weight are left out entirely.
    pub fn fit(
        rows: &[Vec<f64>],
        y: &[usize],
        sample_weights: &[f64],
        n_classes: usize,
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self> {
        if rows.len() != y.len() || rows.len() != sample_weights.len() {
            return Err(MLError::DimensionMismatch {
                expected: rows.len(),
                actual: y.len().min(sample_weights.len()),
            }
            .into());
        }

        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let max_features = features_per_split(config.max_features, n_features);

        let indices: Vec<usize> = (0..rows.len())
            .filter(|&i| sample_weights[i] > 0.0)
            .collect();
        if indices.is_empty() {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            }
            .into());
        }

        let mut builder = TreeBuilder {
            rows,
            y,
            weights: sample_weights,
            n_classes,
            n_features,
            max_features,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            rng: StdRng::seed_from_u64(seed),
        };
        let root = builder.build(&indices, 0);

        Ok(Self { root, n_classes })
    }

    /// Leaf distribution reached by the given features.
    pub fn predict_proba(&self, features: &SparseVector) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features.get(*feature) <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        fn depth_of(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    n_features: usize,
    max_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    rng: StdRng,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeBuilder<'_> {
    fn class_weights(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += self.weights[i];
        }
        counts
    }

    fn build(&mut self, indices: &[usize], depth: usize) -> TreeNode {
        let counts = self.class_weights(indices);
        let total: f64 = counts.iter().sum();
        let parent_impurity = gini(&counts, total);

        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if parent_impurity <= 1e-12 || indices.len() < self.min_samples_split || depth_reached {
            return leaf(counts, total);
        }

        let Some(split) = self.find_best_split(indices, &counts, total) else {
            return leaf(counts, total);
        };
        if split.impurity >= parent_impurity - 1e-12 {
            return leaf(counts, total);
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][split.feature] <= split.threshold);

        let left = self.build(&left_idx, depth + 1);
        let right = self.build(&right_idx, depth + 1);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate features in random order until `max_features` non-constant
    /// ones have been scored.
    fn find_best_split(
        &mut self,
        indices: &[usize],
        counts: &[f64],
        total: f64,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<SplitCandidate> = None;
        let mut evaluated = 0;
        let mut values: Vec<(f64, usize)> = Vec::with_capacity(indices.len());

        for feature in features {
            if evaluated >= self.max_features {
                break;
            }

            values.clear();
            values.extend(indices.iter().map(|&i| (self.rows[i][feature], i)));
            values.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (Some(first), Some(last)) = (values.first(), values.last()) else {
                continue;
            };
            if first.0 == last.0 {
                continue;
            }
            evaluated += 1;

            let mut left = vec![0.0; self.n_classes];
            let mut left_total = 0.0;
            for pos in 0..values.len() - 1 {
                let (value, i) = values[pos];
                left[self.y[i]] += self.weights[i];
                left_total += self.weights[i];

                let next = values[pos + 1].0;
                if value >= next {
                    continue;
                }

                let right_total = total - left_total;
                let right: Vec<f64> = counts.iter().zip(&left).map(|(c, l)| c - l).collect();
                let impurity = (left_total * gini(&left, left_total)
                    + right_total * gini(&right, right_total))
                    / total;

                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: value + (next - value) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

fn leaf(counts: Vec<f64>, total: f64) -> TreeNode {
    let distribution = if total > 0.0 {
        counts.into_iter().map(|c| c / total).collect()
    } else {
        let k = counts.len().max(1) as f64;
        vec![1.0 / k; counts.len()]
    };
    TreeNode::Leaf { distribution }
}

/// An ensemble of bagged decision trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit `n_estimators` trees in parallel. Each tree gets its own seeded
    /// RNG so results do not depend on thread scheduling.
    pub fn fit(dataset: &TrainDataset, config: &ForestConfig) -> Result<Self> {
        if dataset.is_empty() {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            }
            .into());
        }
        if config.n_estimators == 0 {
            return Err(MLError::TrainingDataInsufficient {
                message: "n_estimators must be positive".to_string(),
            }
            .into());
        }

        let rows: Vec<Vec<f64>> = dataset.x.iter().map(SparseVector::to_dense).collect();
        let class_weights = if config.balance_classes {
            balanced_class_weights(&dataset.y, dataset.n_classes)
        } else {
            vec![1.0; dataset.n_classes]
        };
        let n = dataset.len();

        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|t| {
                let seed = config.seed.wrapping_add(t as u64);
                let mut rng = StdRng::seed_from_u64(seed);

                let mut multiplicity = vec![0.0; n];
                if config.bootstrap {
                    for _ in 0..n {
                        multiplicity[rng.random_range(0..n)] += 1.0;
                    }
                } else {
                    multiplicity.iter_mut().for_each(|m| *m = 1.0);
                }

                let sample_weights: Vec<f64> = multiplicity
                    .iter()
                    .zip(&dataset.y)
                    .map(|(m, &y)| m * class_weights[y])
                    .collect();

                DecisionTree::fit(
                    &rows,
                    &dataset.y,
                    &sample_weights,
                    dataset.n_classes,
                    config,
                    rng.random(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Random forest grown: {} trees, max depth {}",
            trees.len(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        Ok(Self {
            trees,
            n_classes: dataset.n_classes,
            n_features: dataset.n_features,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        if self.trees.is_empty() {
            return probs;
        }
        for tree in &self.trees {
            for (p, q) in probs.iter_mut().zip(tree.predict_proba(features)) {
                *p += q;
            }
        }
        let scale = 1.0 / self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p *= scale);
        probs
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

/// Features tried at each split: the configured count, or `floor(sqrt(n))`,
/// kept within `1..=n_features`.
fn features_per_split(configured: Option<usize>, n_features: usize) -> usize {
    configured
        .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
        .clamp(1, n_features.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> TrainDataset {
        let rows = vec![
            SparseVector::from_dense(&[1.0, 0.0, 0.0, 0.2]),
            SparseVector::from_dense(&[0.8, 0.0, 0.0, 0.0]),
            SparseVector::from_dense(&[0.9, 0.1, 0.0, 0.1]),
            SparseVector::from_dense(&[0.0, 1.0, 0.0, 0.3]),
            SparseVector::from_dense(&[0.0, 0.7, 0.0, 0.0]),
            SparseVector::from_dense(&[0.1, 0.9, 0.0, 0.2]),
            SparseVector::from_dense(&[0.0, 0.0, 1.0, 0.1]),
            SparseVector::from_dense(&[0.0, 0.0, 0.8, 0.0]),
            SparseVector::from_dense(&[0.0, 0.1, 0.9, 0.3]),
        ];
        TrainDataset::new(rows, vec![0, 0, 0, 1, 1, 1, 2, 2, 2], 3, 4)
    }

    #[test]
    fn test_single_tree_fits_training_data() {
        let data = dataset();
        let rows: Vec<Vec<f64>> = data.x.iter().map(SparseVector::to_dense).collect();
        let config = ForestConfig {
            max_features: Some(4),
            ..ForestConfig::default()
        };
        let tree = DecisionTree::fit(&rows, &data.y, &vec![1.0; 9], 3, &config, 7).unwrap();

        for (x, &y) in data.x.iter().zip(&data.y) {
            let dist = tree.predict_proba(x);
            assert_eq!(dist[y], 1.0);
        }
        assert!(tree.depth() >= 2);
    }

    #[test]
    fn test_features_per_split_rounds_down() {
        assert_eq!(features_per_split(None, 8), 2);
        assert_eq!(features_per_split(None, 15), 3);
        assert_eq!(features_per_split(None, 16), 4);
        assert_eq!(features_per_split(None, 1), 1);
        assert_eq!(features_per_split(None, 0), 1);
        assert_eq!(features_per_split(Some(10), 4), 4);
        assert_eq!(features_per_split(Some(0), 4), 1);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let rows = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let tree =
            DecisionTree::fit(&rows, &[1, 1], &[1.0, 1.0], 2, &ForestConfig::default(), 1).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_proba(&SparseVector::zeros(2)), &[0.0, 1.0]);
    }

    #[test]
    fn test_forest_probabilities_and_determinism() {
        let config = ForestConfig {
            n_estimators: 25,
            ..ForestConfig::default()
        };
        let a = RandomForest::fit(&dataset(), &config).unwrap();
        let b = RandomForest::fit(&dataset(), &config).unwrap();
        assert_eq!(a.n_trees(), 25);

        let probe = SparseVector::from_dense(&[0.95, 0.0, 0.0, 0.1]);
        let pa = a.predict_proba(&probe);
        let pb = b.predict_proba(&probe);
        assert_eq!(pa, pb);

        let sum: f64 = pa.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(a.predict(&probe).0, 0);
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let config = ForestConfig {
            n_estimators: 0,
            ..ForestConfig::default()
        };
        assert!(RandomForest::fit(&dataset(), &config).is_err());
    }
}
