//! Prediction routing: rules first, ensemble as fallback.

pub mod result;

pub use result::{Method, PredictionResult, REVIEW_THRESHOLD, needs_review};

use std::sync::Arc;

use log::{debug, info};

use crate::analysis::normalize;
use crate::batch::BatchConfig;
use crate::config::CategorizerConfig;
use crate::error::Result;
use crate::explain::{ExplainConfig, Explainer, Explanation};
use crate::ml::TrainedModel;
use crate::rules::{MatchStrategy, RuleEngine};
use crate::taxonomy::Taxonomy;

/// Immutable prediction context.
///
/// Built once from a trained model and a taxonomy, then shared freely across
/// threads. Taxonomy edits take effect only by building a new categorizer.
#[derive(Debug, Clone)]
pub struct Categorizer {
    model: Arc<TrainedModel>,
    taxonomy: Arc<Taxonomy>,
    rules: RuleEngine,
    explainer: Explainer,
    batch: BatchConfig,
}

impl Categorizer {
    /// Create a categorizer with substring rules and default explanations.
    pub fn new(model: Arc<TrainedModel>, taxonomy: Arc<Taxonomy>) -> Result<Self> {
        Self::with_options(
            model,
            taxonomy,
            MatchStrategy::default(),
            ExplainConfig::default(),
        )
    }

    pub fn with_options(
        model: Arc<TrainedModel>,
        taxonomy: Arc<Taxonomy>,
        strategy: MatchStrategy,
        explain: ExplainConfig,
    ) -> Result<Self> {
        let rules = RuleEngine::with_strategy(&taxonomy, strategy)?;
        let explainer = Explainer::new(model.categories().to_vec(), explain)?;
        Ok(Self {
            model,
            taxonomy,
            rules,
            explainer,
            batch: BatchConfig::default(),
        })
    }

    /// Replace the batch settings.
    pub fn with_batch_config(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Load the model and taxonomy named by `config`.
    ///
    /// A missing taxonomy file degrades to model-only prediction; a missing
    /// model is an error.
    pub fn from_config(config: &CategorizerConfig) -> Result<Self> {
        let model = TrainedModel::load(&config.models_directory)?;
        let taxonomy = Taxonomy::load_or_empty(&config.taxonomy_path)?;
        let categorizer = Self::with_options(
            Arc::new(model),
            Arc::new(taxonomy),
            config.match_strategy,
            config.explain.clone(),
        )?
        .with_batch_config(config.batch.clone());

        info!(
            "Categorizer ready: {} categories, {} rule keywords ({:?} matching)",
            categorizer.model.categories().len(),
            categorizer.rules.keyword_count(),
            categorizer.rules.strategy()
        );
        Ok(categorizer)
    }

    /// Categorize one raw transaction description.
    ///
    /// Explanations are only attached to model predictions.
    pub fn predict(&self, raw_text: &str, explain: bool) -> PredictionResult {
        let text = normalize(raw_text);
        if let Some(result) = self.rules.predict(&text, raw_text) {
            return result;
        }

        let probabilities = self.model.predict_proba(&text);
        let mut result =
            PredictionResult::from_model(self.model.categories(), &probabilities, raw_text);
        debug!(
            "Model prediction for '{}': {} ({:.3})",
            raw_text, result.category, result.confidence
        );

        if explain {
            result.explanation = Some(self.explain_normalized(&text));
        }
        result
    }

    /// Explain the model's decision for raw text, regardless of rules.
    pub fn explain(&self, raw_text: &str) -> Explanation {
        self.explain_normalized(&normalize(raw_text))
    }

    fn explain_normalized(&self, text: &str) -> Explanation {
        let classifier = |texts: &[String]| self.predict_proba_texts(texts);
        self.explainer
            .explain(text, &classifier, self.explainer.config().num_features)
    }

    /// Model probabilities for already-normalized texts.
    pub fn predict_proba_texts(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|t| self.model.predict_proba(t)).collect())
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }
}
