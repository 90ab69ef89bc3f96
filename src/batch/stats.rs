//! Aggregate statistics over prediction results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::predict::{PredictionResult, REVIEW_THRESHOLD};

/// Upper bound on reported low-confidence samples.
pub const MAX_LOW_CONFIDENCE_SAMPLES: usize = 10;

/// A prediction worth a second look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowConfidenceSample {
    pub original_text: String,
    pub category: String,
    pub confidence: f64,
}

/// Summary of a batch of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total_predictions: usize,
    pub rule_matches: usize,
    pub ml_predictions: usize,
    pub needs_review: usize,
    /// Mean confidence, zero for an empty batch.
    pub avg_confidence: f64,
    /// Number of predictions per category.
    pub category_distribution: BTreeMap<String, usize>,
    /// Lowest-confidence predictions below the review threshold, ascending.
    pub low_confidence_samples: Vec<LowConfidenceSample>,
}

/// Summarize prediction results.
pub fn get_statistics(results: &[PredictionResult]) -> BatchStatistics {
    let mut category_distribution = BTreeMap::new();
    let mut rule_matches = 0;
    let mut needs_review = 0;
    let mut confidence_sum = 0.0;

    for result in results {
        *category_distribution
            .entry(result.category.clone())
            .or_insert(0) += 1;
        if result.is_rule_match() {
            rule_matches += 1;
        }
        if result.needs_review {
            needs_review += 1;
        }
        confidence_sum += result.confidence;
    }

    let mut low: Vec<&PredictionResult> = results
        .iter()
        .filter(|r| r.confidence < REVIEW_THRESHOLD)
        .collect();
    // stable: equal confidences keep input order
    low.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
    let low_confidence_samples = low
        .into_iter()
        .take(MAX_LOW_CONFIDENCE_SAMPLES)
        .map(|r| LowConfidenceSample {
            original_text: r.original_text.clone(),
            category: r.category.clone(),
            confidence: r.confidence,
        })
        .collect();

    BatchStatistics {
        total_predictions: results.len(),
        rule_matches,
        ml_predictions: results.len() - rule_matches,
        needs_review,
        avg_confidence: if results.is_empty() {
            0.0
        } else {
            confidence_sum / results.len() as f64
        },
        category_distribution,
        low_confidence_samples,
    }
}
