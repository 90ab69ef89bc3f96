//! Local explanations for ensemble predictions.
//!
//! The [`Explainer`] treats the classifier as a black box: it removes random
//! subsets of the words of a text, asks the classifier for probabilities of
//! every perturbed variant, and fits a proximity-weighted linear surrogate on
//! word presence. The surrogate coefficients of the most influential words
//! are the explanation.
//!
//! # Examples
//!
//! ```
//! use txcat::explain::{ExplainConfig, Explainer, Explanation};
//!
//! let explainer = Explainer::new(
//!     vec!["Other".to_string(), "Transportation".to_string()],
//!     ExplainConfig::default(),
//! )
//! .unwrap();
//!
//! let classify = |texts: &[String]| -> txcat::error::Result<Vec<Vec<f64>>> {
//!     Ok(texts
//!         .iter()
//!         .map(|t| if t.contains("uber") { vec![0.1, 0.9] } else { vec![0.8, 0.2] })
//!         .collect())
//! };
//!
//! match explainer.explain("uber ride home", &classify, 2) {
//!     Explanation::Words { top_words, predicted_class } => {
//!         assert_eq!(predicted_class, "Transportation");
//!         assert_eq!(top_words[0].0, "uber");
//!     }
//!     Explanation::Failed { error } => panic!("{error}"),
//! }
//! ```

pub mod ridge;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::{RegexTokenizer, Tokenizer};
use crate::error::{Result, TxcatError};
use crate::ml::argmax;

use self::ridge::weighted_ridge;

/// Regularization strength of the surrogate model.
const SURROGATE_ALPHA: f64 = 1.0;

/// Black-box probability function: one distribution per input text.
pub type ClassifierFn<'a> = dyn Fn(&[String]) -> Result<Vec<Vec<f64>>> + 'a;

/// Explainer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    /// Number of words reported.
    pub num_features: usize,
    /// Perturbed samples per explanation, including the original text.
    pub num_samples: usize,
    /// Width of the exponential proximity kernel.
    pub kernel_width: f64,
    pub seed: u64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            num_features: 5,
            num_samples: 500,
            kernel_width: 25.0,
            seed: 42,
        }
    }
}

/// Result of explaining one prediction.
///
/// Serialized untagged, so JSON carries either `{top_words, predicted_class}`
/// or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Explanation {
    /// Most influential words with signed weights, strongest first.
    Words {
        top_words: Vec<(String, f64)>,
        predicted_class: String,
    },
    /// Explanation could not be produced.
    Failed { error: String },
}

impl Explanation {
    pub fn is_failed(&self) -> bool {
        matches!(self, Explanation::Failed { .. })
    }
}

/// Perturbation-based explainer over a fixed list of class names.
#[derive(Debug, Clone)]
pub struct Explainer {
    class_names: Vec<String>,
    config: ExplainConfig,
    words: RegexTokenizer,
}

impl Explainer {
    pub fn new(class_names: Vec<String>, config: ExplainConfig) -> Result<Self> {
        if class_names.is_empty() {
            return Err(TxcatError::invalid_argument("at least one class name is required"));
        }
        if config.num_samples == 0 {
            return Err(TxcatError::invalid_argument("num_samples must be positive"));
        }
        if config.kernel_width <= 0.0 {
            return Err(TxcatError::invalid_argument("kernel_width must be positive"));
        }
        Ok(Self {
            class_names,
            config,
            words: RegexTokenizer::words()?,
        })
    }

    pub fn config(&self) -> &ExplainConfig {
        &self.config
    }

    /// Explain the classifier's decision for `text`.
    ///
    /// Never fails: any problem is reported as [`Explanation::Failed`].
    pub fn explain(
        &self,
        text: &str,
        classifier_fn: &ClassifierFn<'_>,
        num_features: usize,
    ) -> Explanation {
        match self.try_explain(text, classifier_fn, num_features) {
            Ok(explanation) => explanation,
            Err(e) => {
                debug!("Explanation failed for {text:?}: {e}");
                Explanation::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn try_explain(
        &self,
        text: &str,
        classifier_fn: &ClassifierFn<'_>,
        num_features: usize,
    ) -> Result<Explanation> {
        let tokens = self.words.tokenize(text);
        let mut vocabulary: Vec<String> = Vec::new();
        let token_features: Vec<usize> = tokens
            .iter()
            .map(|token| match vocabulary.iter().position(|w| w == token) {
                Some(idx) => idx,
                None => {
                    vocabulary.push(token.clone());
                    vocabulary.len() - 1
                }
            })
            .collect();
        let d = vocabulary.len();
        if d == 0 {
            return Err(TxcatError::explanation("text has no words to explain"));
        }

        let (presence, texts) = self.perturb(text, &tokens, &token_features, d);

        let probabilities = classifier_fn(&texts)?;
        if probabilities.len() != texts.len() {
            return Err(TxcatError::explanation(format!(
                "classifier returned {} rows for {} samples",
                probabilities.len(),
                texts.len()
            )));
        }
        if let Some(row) = probabilities.iter().find(|row| row.len() != self.class_names.len()) {
            return Err(TxcatError::explanation(format!(
                "classifier returned {} probabilities for {} classes",
                row.len(),
                self.class_names.len()
            )));
        }

        let (label, _) = argmax(&probabilities[0]);
        let targets: Vec<f64> = probabilities.iter().map(|row| row[label]).collect();
        let weights: Vec<f64> = presence
            .iter()
            .map(|row| self.kernel(cosine_distance_to_full(row) * 100.0))
            .collect();

        let all: Vec<usize> = (0..d).collect();
        let full = weighted_ridge(&presence, &targets, &weights, SURROGATE_ALPHA, &all)?;
        let mut selected = all;
        selected.sort_by(|&a, &b| full.coef[b].abs().total_cmp(&full.coef[a].abs()).then(a.cmp(&b)));
        selected.truncate(num_features.min(d));

        let local = weighted_ridge(&presence, &targets, &weights, SURROGATE_ALPHA, &selected)?;
        let mut top_words: Vec<(String, f64)> = selected
            .iter()
            .zip(&local.coef)
            .map(|(&feature, &weight)| (vocabulary[feature].clone(), weight))
            .collect();
        top_words.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

        Ok(Explanation::Words {
            top_words,
            predicted_class: self.class_names[label].clone(),
        })
    }

    /// Presence matrix and texts for the perturbed samples. The first sample
    /// is always the untouched text.
    fn perturb(
        &self,
        text: &str,
        tokens: &[String],
        token_features: &[usize],
        d: usize,
    ) -> (Vec<Vec<f64>>, Vec<String>) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let n = self.config.num_samples;
        let mut presence = Vec::with_capacity(n);
        let mut texts = Vec::with_capacity(n);

        presence.push(vec![1.0; d]);
        texts.push(text.to_string());

        for _ in 1..n {
            let n_removed = rng.random_range(1..=d);
            let mut row = vec![1.0; d];
            for feature in rand::seq::index::sample(&mut rng, d, n_removed) {
                row[feature] = 0.0;
            }
            let kept: Vec<&str> = tokens
                .iter()
                .zip(token_features)
                .filter(|&(_, &feature)| row[feature] > 0.0)
                .map(|(token, _)| token.as_str())
                .collect();
            texts.push(kept.join(" "));
            presence.push(row);
        }
        (presence, texts)
    }

    fn kernel(&self, distance: f64) -> f64 {
        let width = self.config.kernel_width;
        (-(distance * distance) / (width * width)).exp().sqrt()
    }
}

/// Cosine distance between a binary presence row and the all-ones row.
fn cosine_distance_to_full(row: &[f64]) -> f64 {
    let present: f64 = row.iter().sum();
    if present == 0.0 || row.is_empty() {
        return 1.0;
    }
    1.0 - (present / row.len() as f64).sqrt()
}
