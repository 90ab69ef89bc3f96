//! Tokenizers that split normalized text into terms.

pub mod ngram;
pub mod regex;

pub use ngram::NgramTokenizer;
pub use regex::RegexTokenizer;

/// Trait for tokenizers that convert text into terms.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into terms, in order of appearance.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}
