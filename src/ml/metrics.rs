//! Evaluation metrics for the category classifier.

use serde::{Deserialize, Serialize};

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Build from parallel truth/prediction slices.
    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Rows of the matrix, one per true class.
    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.counts
            .chunks(self.n_classes.max(1))
            .map(<[u32]>::to_vec)
            .collect()
    }

    /// Per-class precision/recall/F1. Zero divisions yield zero.
    pub fn class_reports(&self, classes: &[String]) -> Vec<ClassReport> {
        let k = self.n_classes;
        (0..k)
            .map(|c| {
                let tp = self.get(c, c) as f64;
                let support: u32 = (0..k).map(|j| self.get(c, j)).sum();
                let predicted: u32 = (0..k).map(|i| self.get(i, c)).sum();
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                ClassReport {
                    category: classes.get(c).cloned().unwrap_or_else(|| c.to_string()),
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support,
                    predicted,
                }
            })
            .collect()
    }

    /// Unweighted mean F1 over classes that appear in truth or predictions.
    pub fn f1_macro(&self) -> f64 {
        let reports: Vec<ClassReport> = self
            .class_reports(&[])
            .into_iter()
            .filter(|r| r.support > 0 || r.predicted > 0)
            .collect();
        if reports.is_empty() {
            return 0.0;
        }
        reports.iter().map(|r| r.f1).sum::<f64>() / reports.len() as f64
    }

    /// Support-weighted mean F1.
    pub fn f1_weighted(&self) -> f64 {
        let reports = self.class_reports(&[]);
        let total: u32 = reports.iter().map(|r| r.support).sum();
        if total == 0 {
            return 0.0;
        }
        reports
            .iter()
            .map(|r| r.f1 * r.support as f64)
            .sum::<f64>()
            / total as f64
    }

    /// Fraction of correct predictions.
    pub fn accuracy(&self) -> f64 {
        let total: u32 = self.counts.iter().sum();
        let correct: u32 = (0..self.n_classes).map(|c| self.get(c, c)).sum();
        ratio(correct as f64, total as f64)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

fn f1(precision: f64, recall: f64) -> f64 {
    ratio(2.0 * precision * recall, precision + recall)
}

/// Precision/recall statistics for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub category: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true examples of the category.
    pub support: u32,
    /// Number of times the category was predicted.
    pub predicted: u32,
}

/// Metrics artifact written after training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub f1_macro: f64,
    pub f1_weighted: f64,
    pub cv_mean: f64,
    pub cv_std: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub categories: Vec<String>,
    /// RFC 3339 timestamp of the training run.
    pub timestamp: String,
}

/// Mean and population standard deviation; zeros for empty input.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
