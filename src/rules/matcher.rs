//! Keyword matching strategies.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TxcatError};

/// How a keyword is located inside normalized text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Plain substring containment. Matches inside longer words.
    #[default]
    Substring,
    /// Keyword must start and end on word boundaries.
    WordBoundary,
}

/// A single compiled keyword.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// Keyword as configured, used for reporting.
    keyword: String,
    /// Lower-cased keyword, used for substring matching.
    needle: String,
    /// Compiled pattern for word-boundary matching.
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    /// Compile a keyword for the given strategy.
    pub fn compile(keyword: &str, strategy: MatchStrategy) -> Result<Self> {
        let needle = keyword.to_lowercase();
        let pattern = match strategy {
            MatchStrategy::Substring => None,
            MatchStrategy::WordBoundary => {
                let source = format!(r"\b{}\b", regex::escape(&needle));
                let regex = Regex::new(&source).map_err(|e| {
                    TxcatError::taxonomy(format!("keyword '{keyword}' cannot be compiled: {e}"))
                })?;
                Some(regex)
            }
        };

        Ok(Self {
            keyword: keyword.to_string(),
            needle,
            pattern,
        })
    }

    /// Test lower-cased text against this keyword.
    pub fn is_match(&self, lowered_text: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(lowered_text),
            None => lowered_text.contains(&self.needle),
        }
    }

    /// Keyword as configured.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}
