//! Text analysis for transaction descriptions.
//!
//! Normalization and tokenization are shared by the training path and the
//! inference path so that both see exactly the same text.

pub mod normalizer;
pub mod tokenizer;

pub use normalizer::{normalize, normalize_opt};
pub use tokenizer::{NgramTokenizer, RegexTokenizer, Tokenizer};
