//! Multinomial logistic regression over sparse features.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::MLError;
use crate::ml::classifier::{ProbabilisticClassifier, softmax};
use crate::ml::dataset::{TrainDataset, balanced_class_weights};
use crate::ml::sparse::SparseVector;

/// Training options for logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// Inverse L2 regularization strength.
    pub c: f64,
    /// Upper bound on full-batch gradient steps.
    pub max_iter: usize,
    /// Gradient step size.
    pub learning_rate: f64,
    /// Stop once the largest gradient component falls below this.
    pub tol: f64,
    /// Weight samples inversely to class frequency.
    pub balance_classes: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            learning_rate: 1.0,
            tol: 1e-4,
            balance_classes: true,
        }
    }
}

/// Softmax-linear classifier. Weights are stored row-major, one row per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    n_classes: usize,
    n_features: usize,
    weights: Vec<f64>,
    bias: Vec<f64>,
    iterations: usize,
    converged: bool,
}

impl LogisticRegression {
    /// Fit the model with full-batch gradient descent on the weighted
    /// cross-entropy plus an L2 penalty of `1 / (2 * C * n)`.
    pub fn fit(dataset: &TrainDataset, config: &LogisticConfig) -> Result<Self> {
        if dataset.is_empty() {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            }
            .into());
        }
        let classes = dataset.n_classes;
        let dim = dataset.n_features;
        if classes == 0 {
            return Err(MLError::TrainingDataInsufficient {
                message: "no classes available for training".to_string(),
            }
            .into());
        }

        let sample_weights: Vec<f64> = if config.balance_classes {
            let class_weights = balanced_class_weights(&dataset.y, classes);
            dataset.y.iter().map(|&y| class_weights[y]).collect()
        } else {
            vec![1.0; dataset.len()]
        };
        let total_weight: f64 = sample_weights.iter().sum();
        let l2 = 1.0 / (config.c.max(1e-12) * total_weight.max(1.0));
        let lr = config.learning_rate;

        let mut model = Self {
            n_classes: classes,
            n_features: dim,
            weights: vec![0.0; classes * dim],
            bias: vec![0.0; classes],
            iterations: 0,
            converged: false,
        };

        let mut grad_w = vec![0.0; classes * dim];
        let mut grad_b = vec![0.0; classes];

        for iteration in 0..config.max_iter {
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            grad_b.iter_mut().for_each(|g| *g = 0.0);

            for ((x, &y), &weight) in dataset.x.iter().zip(&dataset.y).zip(&sample_weights) {
                if weight == 0.0 {
                    continue;
                }
                let probs = model.predict_proba(x);
                for c in 0..classes {
                    let diff = (probs[c] - if c == y { 1.0 } else { 0.0 }) * weight;
                    let base = c * dim;
                    for (i, v) in x.iter() {
                        if i < dim {
                            grad_w[base + i] += diff * v;
                        }
                    }
                    grad_b[c] += diff;
                }
            }

            let inv = 1.0 / total_weight.max(f64::MIN_POSITIVE);
            let mut max_grad = 0.0f64;
            for (idx, g) in grad_w.iter_mut().enumerate() {
                *g = *g * inv + l2 * model.weights[idx];
                max_grad = max_grad.max(g.abs());
            }
            for g in grad_b.iter_mut() {
                *g *= inv;
                max_grad = max_grad.max(g.abs());
            }

            model.iterations = iteration + 1;
            if max_grad < config.tol {
                model.converged = true;
                break;
            }

            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= lr * g;
            }
            for (b, g) in model.bias.iter_mut().zip(&grad_b) {
                *b -= lr * g;
            }
        }

        debug!(
            "Logistic regression stopped after {} iterations (converged: {})",
            model.iterations, model.converged
        );
        Ok(model)
    }

    fn logits(&self, features: &SparseVector) -> Vec<f64> {
        (0..self.n_classes)
            .map(|c| {
                let base = c * self.n_features;
                let dot: f64 = features
                    .iter()
                    .filter(|&(i, _)| i < self.n_features)
                    .map(|(i, v)| self.weights[base + i] * v)
                    .sum();
                self.bias[c] + dot
            })
            .collect()
    }

    /// Number of gradient steps taken during fitting.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        softmax(&self.logits(features))
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
