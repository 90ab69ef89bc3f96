//! Word n-gram tokenizer implementation.

use super::Tokenizer;
use super::regex::RegexTokenizer;
use crate::error::{Result, TxcatError};

/// A tokenizer that emits contiguous word n-grams joined by a single space.
///
/// All unigrams are emitted first, then bigrams, and so on up to `max_n`.
///
/// ```
/// use txcat::analysis::{NgramTokenizer, Tokenizer};
///
/// let tokenizer = NgramTokenizer::new(1, 2).unwrap();
/// assert_eq!(
///     tokenizer.tokenize("shell gas station"),
///     vec!["shell", "gas", "station", "shell gas", "gas station"]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct NgramTokenizer {
    /// Minimum n-gram size
    min_n: usize,
    /// Maximum n-gram size
    max_n: usize,
    /// Word splitter applied before n-gram expansion
    words: RegexTokenizer,
}

impl NgramTokenizer {
    /// Create a new word n-gram tokenizer over [`RegexTokenizer::new`] terms.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_n` is zero or greater than `max_n`.
    pub fn new(min_n: usize, max_n: usize) -> Result<Self> {
        if min_n == 0 {
            return Err(TxcatError::invalid_argument("min_n must be at least 1"));
        }
        if min_n > max_n {
            return Err(TxcatError::invalid_argument(format!(
                "min_n ({min_n}) must not exceed max_n ({max_n})"
            )));
        }

        Ok(Self {
            min_n,
            max_n,
            words: RegexTokenizer::new()?,
        })
    }
}

impl Default for NgramTokenizer {
    fn default() -> Self {
        Self::new(1, 1).expect("Unigram range should be valid")
    }
}

impl Tokenizer for NgramTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let words = self.words.tokenize(text);
        let mut grams = Vec::new();

        for n in self.min_n..=self.max_n {
            if n > words.len() {
                break;
            }
            if n == 1 {
                grams.extend(words.iter().cloned());
                continue;
            }
            grams.extend(words.windows(n).map(|window| window.join(" ")));
        }

        grams
    }

    fn name(&self) -> &'static str {
        "word_ngram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigrams_only() {
        let tokenizer = NgramTokenizer::new(2, 2).unwrap();
        assert_eq!(
            tokenizer.tokenize("uber ride to airport"),
            vec!["uber ride", "ride to", "to airport"]
        );
    }

    #[test]
    fn test_short_input() {
        let tokenizer = NgramTokenizer::new(1, 2).unwrap();
        assert_eq!(tokenizer.tokenize("netflix"), vec!["netflix"]);
        assert!(tokenizer.tokenize("").is_empty());
    }

    #[test]
    fn test_invalid_range() {
        assert!(NgramTokenizer::new(0, 2).is_err());
        assert!(NgramTokenizer::new(3, 2).is_err());
    }
}
