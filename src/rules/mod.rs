//! Keyword rule engine.
//!
//! Rules are the first stage of the pipeline. Categories are tried in
//! taxonomy order and keywords in list order; the first keyword found in the
//! normalized text decides the category with a fixed confidence.

pub mod matcher;

pub use matcher::{KeywordMatcher, MatchStrategy};

use log::debug;

use crate::error::Result;
use crate::predict::PredictionResult;
use crate::taxonomy::Taxonomy;

/// Confidence assigned to every rule match.
pub const RULE_CONFIDENCE: f64 = 0.95;

/// A successful rule lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Category that owns the keyword.
    pub category: String,
    /// Keyword as written in the taxonomy.
    pub keyword: String,
}

#[derive(Debug, Clone)]
struct CategoryRules {
    name: String,
    matchers: Vec<KeywordMatcher>,
}

/// Deterministic keyword classifier compiled from a taxonomy.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<CategoryRules>,
    strategy: MatchStrategy,
}

impl RuleEngine {
    /// Compile a rule engine using substring matching.
    pub fn new(taxonomy: &Taxonomy) -> Result<Self> {
        Self::with_strategy(taxonomy, MatchStrategy::default())
    }

    /// Compile a rule engine with an explicit matching strategy.
    pub fn with_strategy(taxonomy: &Taxonomy, strategy: MatchStrategy) -> Result<Self> {
        let mut rules = Vec::with_capacity(taxonomy.len());
        for category in taxonomy.categories() {
            let mut matchers = Vec::with_capacity(category.keywords.len());
            for keyword in &category.keywords {
                if keyword.trim().is_empty() {
                    continue;
                }
                matchers.push(KeywordMatcher::compile(keyword, strategy)?);
            }
            rules.push(CategoryRules {
                name: category.name.clone(),
                matchers,
            });
        }

        Ok(Self { rules, strategy })
    }

    /// Find the first matching keyword for already-normalized text.
    pub fn matches(&self, normalized_text: &str) -> Option<RuleMatch> {
        let text = normalized_text.to_lowercase();
        for category in &self.rules {
            for matcher in &category.matchers {
                if matcher.is_match(&text) {
                    debug!(
                        "Rule hit: '{}' -> {} via '{}'",
                        normalized_text,
                        category.name,
                        matcher.keyword()
                    );
                    return Some(RuleMatch {
                        category: category.name.clone(),
                        keyword: matcher.keyword().to_string(),
                    });
                }
            }
        }
        None
    }

    /// Classify normalized text, returning a rule-based prediction if any keyword fires.
    ///
    /// `original_text` is carried into the result unchanged.
    pub fn predict(&self, normalized_text: &str, original_text: &str) -> Option<PredictionResult> {
        self.matches(normalized_text)
            .map(|hit| PredictionResult::from_rule(hit, original_text))
    }

    /// The matching strategy in use.
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Number of compiled keywords across all categories.
    pub fn keyword_count(&self) -> usize {
        self.rules.iter().map(|r| r.matchers.len()).sum()
    }

    /// True when no keyword can ever match (empty or missing taxonomy).
    pub fn is_empty(&self) -> bool {
        self.keyword_count() == 0
    }
}
