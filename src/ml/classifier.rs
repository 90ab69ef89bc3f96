//! Probability-producing classifier trait definition.

use crate::ml::sparse::SparseVector;

/// A classifier that outputs a probability distribution over a fixed class index.
///
/// Implementations are frozen after training and safe to share across
/// threads. The ensemble and the router only ever talk to this trait, so new
/// base learners can be added without touching either.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Predict class probabilities for one feature vector.
    ///
    /// The returned vector has [`n_classes`](Self::n_classes) entries that sum to 1.
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64>;

    /// Number of classes in the output distribution.
    fn n_classes(&self) -> usize;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;

    /// Predict the most probable class index and its probability.
    fn predict(&self, features: &SparseVector) -> (usize, f64) {
        argmax(&self.predict_proba(features))
    }
}

/// Index and value of the largest entry; the first one wins on ties.
///
/// Returns `(0, 0.0)` for an empty slice.
pub fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &value) in values.iter().enumerate() {
        if value > best_val {
            best_val = value;
            best = idx;
        }
    }
    if values.is_empty() { (0, 0.0) } else { (best, best_val) }
}

/// Numerically stable softmax.
pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![1.0 / logits.len() as f64; logits.len()]
    }
}
