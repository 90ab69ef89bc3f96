//! Prediction result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::explain::Explanation;
use crate::rules::{RULE_CONFIDENCE, RuleMatch};

/// Predictions below this confidence are flagged for human review.
pub const REVIEW_THRESHOLD: f64 = 0.7;

/// Which stage of the pipeline produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// A taxonomy keyword matched.
    RuleMatch,
    /// The ensemble classifier decided.
    MlModel,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::RuleMatch => "rule_match",
            Method::MlModel => "ml_model",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of categorizing one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: String,
    pub confidence: f64,
    pub method: Method,
    /// Keyword that fired. Only set for rule matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    /// Full class distribution. Only set for model predictions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    pub needs_review: bool,
    /// Only set for model predictions made with explanations enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    /// Input exactly as received, before normalization.
    pub original_text: String,
}

impl PredictionResult {
    /// Result for a keyword hit.
    pub fn from_rule<S: Into<String>>(hit: RuleMatch, original_text: S) -> Self {
        Self {
            category: hit.category,
            confidence: RULE_CONFIDENCE,
            method: Method::RuleMatch,
            matched_keyword: Some(hit.keyword),
            probabilities: None,
            needs_review: needs_review(RULE_CONFIDENCE),
            explanation: None,
            original_text: original_text.into(),
        }
    }

    /// Result for a model prediction from its class distribution.
    ///
    /// The predicted category is the first one with the highest probability.
    pub fn from_model<S: Into<String>>(
        categories: &[String],
        probabilities: &[f64],
        original_text: S,
    ) -> Self {
        let (idx, confidence) = crate::ml::argmax(probabilities);
        let category = categories.get(idx).cloned().unwrap_or_default();
        Self {
            category,
            confidence,
            method: Method::MlModel,
            matched_keyword: None,
            probabilities: Some(
                categories
                    .iter()
                    .cloned()
                    .zip(probabilities.iter().copied())
                    .collect(),
            ),
            needs_review: needs_review(confidence),
            explanation: None,
            original_text: original_text.into(),
        }
    }

    pub fn is_rule_match(&self) -> bool {
        self.method == Method::RuleMatch
    }
}

/// Review policy shared by every prediction path.
pub fn needs_review(confidence: f64) -> bool {
    confidence < REVIEW_THRESHOLD
}
