//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use super::Tokenizer;
use crate::error::{Result, TxcatError};

/// Pattern used for vectorizer terms: runs of two or more word characters.
pub const TERM_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Pattern used to split text into explainable words: any run of word characters.
pub const WORD_PATTERN: &str = r"\w+";

/// A regex-based tokenizer that extracts every match of a pattern.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
}

impl RegexTokenizer {
    /// Create a new regex tokenizer with the term pattern [`TERM_PATTERN`].
    pub fn new() -> Result<Self> {
        Self::with_pattern(TERM_PATTERN)
    }

    /// Create a tokenizer that keeps single-character words too.
    pub fn words() -> Result<Self> {
        Self::with_pattern(WORD_PATTERN)
    }

    /// Create a new regex tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| TxcatError::invalid_argument(format!("Invalid regex pattern: {e}")))?;

        Ok(RegexTokenizer {
            pattern: Arc::new(regex),
        })
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new().expect("Default regex pattern should be valid")
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_tokenizer_drops_single_chars() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens = tokenizer.tokenize("h&m store - purchase 2");
        assert_eq!(tokens, vec!["store", "purchase"]);
    }

    #[test]
    fn test_word_tokenizer() {
        let tokenizer = RegexTokenizer::words().unwrap();
        let tokens = tokenizer.tokenize("h&m store, 2");
        assert_eq!(tokens, vec!["h", "m", "store", "2"]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RegexTokenizer::with_pattern("(").is_err());
    }
}
