//! TF-IDF vectorizer for text feature extraction.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::{NgramTokenizer, Tokenizer};
use crate::error::{Result, TxcatError};
use crate::ml::MLError;
use crate::ml::sparse::SparseVector;

/// Vectorizer hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfIdfConfig {
    /// Maximum vocabulary size, keeping the most frequent terms.
    pub max_features: usize,
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Smallest n-gram length.
    pub ngram_min: usize,
    /// Largest n-gram length.
    pub ngram_max: usize,
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_df: 2,
            ngram_min: 1,
            ngram_max: 2,
        }
    }
}

/// TF-IDF vectorizer over word n-grams.
///
/// Fit once on training text, then frozen: [`transform`](Self::transform)
/// only reads the vocabulary and IDF weights.
#[derive(Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    config: TfIdfConfig,
    /// Vocabulary: term -> index mapping. Indices follow ascending term order.
    vocabulary: HashMap<String, usize>,
    /// Inverse document frequency for each index.
    idf: Vec<f64>,
    /// Total number of documents seen during fitting.
    n_documents: usize,
    #[serde(skip)]
    tokenizer: OnceLock<NgramTokenizer>,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("config", &self.config)
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(config: TfIdfConfig) -> Self {
        Self {
            config,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
            tokenizer: OnceLock::new(),
        }
    }

    /// Fit the vectorizer on normalized training documents.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        self.validate_config()?;
        let tokenizer = self.tokenizer();

        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut term_frequency: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            let grams = tokenizer.tokenize(doc);
            let mut unique: HashSet<&str> = HashSet::with_capacity(grams.len());
            for gram in &grams {
                *term_frequency.entry(gram.clone()).or_insert(0) += 1;
                if unique.insert(gram.as_str()) {
                    *document_frequency.entry(gram.clone()).or_insert(0) += 1;
                }
            }
        }

        // Prune rare terms, then keep the most frequent ones.
        let mut candidates: Vec<(String, usize)> = term_frequency
            .into_iter()
            .filter(|(term, _)| document_frequency.get(term).copied().unwrap_or(0) >= self.config.min_df)
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(self.config.max_features);

        if candidates.is_empty() {
            return Err(MLError::EmptyVocabulary.into());
        }

        let mut terms: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n = documents.len() as f64;
        let mut idf = Vec::with_capacity(terms.len());
        let mut vocabulary = HashMap::with_capacity(terms.len());
        for (idx, term) in terms.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or(0) as f64;
            // IDF = ln((N + 1) / (df + 1)) + 1
            idf.push(((n + 1.0) / (df + 1.0)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.n_documents = documents.len();

        Ok(())
    }

    /// Fit on documents and return their vectors.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        Ok(documents.iter().map(|doc| self.transform(doc)).collect())
    }

    /// Transform a normalized document into an L2-normalized TF-IDF vector.
    ///
    /// Terms outside the vocabulary are ignored; text with no known term maps
    /// to the zero vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let pairs: Vec<(usize, f64)> = self
            .tokenizer()
            .tokenize(document)
            .iter()
            .filter_map(|gram| self.vocabulary.get(gram).map(|&idx| (idx, self.idf[idx])))
            .collect();

        let mut vector = SparseVector::from_pairs(self.idf.len(), pairs);
        let norm = vector.norm();
        if norm > 0.0 {
            vector.scale(1.0 / norm);
        }
        vector
    }

    /// Check that a loaded vectorizer is internally consistent.
    pub fn validate(&self) -> Result<()> {
        self.validate_config()?;
        if self.vocabulary.is_empty() {
            return Err(MLError::ModelNotTrained {
                message: "vectorizer has no vocabulary".to_string(),
            }
            .into());
        }
        if self.vocabulary.len() != self.idf.len()
            || self.vocabulary.values().any(|&idx| idx >= self.idf.len())
        {
            return Err(MLError::DimensionMismatch {
                expected: self.vocabulary.len(),
                actual: self.idf.len(),
            }
            .into());
        }
        Ok(())
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.max_features == 0 {
            return Err(TxcatError::invalid_argument("max_features must be positive"));
        }
        NgramTokenizer::new(self.config.ngram_min, self.config.ngram_max)?;
        Ok(())
    }

    fn tokenizer(&self) -> &NgramTokenizer {
        self.tokenizer.get_or_init(|| {
            NgramTokenizer::new(self.config.ngram_min, self.config.ngram_max).unwrap_or_default()
        })
    }

    /// Index of a term, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Get the size of the vocabulary (the output dimension).
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn config(&self) -> &TfIdfConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<String> {
        vec![
            "shell gas station".to_string(),
            "shell gas online".to_string(),
            "chevron station".to_string(),
            "netflix monthly".to_string(),
        ]
    }

    #[test]
    fn test_min_df_prunes_rare_terms() {
        let mut vectorizer = TfIdfVectorizer::new(TfIdfConfig::default());
        vectorizer.fit(&docs()).unwrap();

        // Only terms seen in at least two documents survive.
        assert_eq!(vectorizer.vocabulary_size(), 4);
        assert!(vectorizer.term_index("shell gas").is_some());
        assert!(vectorizer.term_index("station").is_some());
        assert!(vectorizer.term_index("netflix").is_none());
        // Indices follow ascending term order.
        assert_eq!(vectorizer.term_index("gas"), Some(0));
        assert_eq!(vectorizer.term_index("station"), Some(3));
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let config = TfIdfConfig {
            max_features: 1,
            min_df: 1,
            ..TfIdfConfig::default()
        };
        let mut vectorizer = TfIdfVectorizer::new(config);
        vectorizer
            .fit(&["coffee coffee tea".to_string(), "coffee".to_string()])
            .unwrap();
        assert_eq!(vectorizer.vocabulary_size(), 1);
        assert!(vectorizer.term_index("coffee").is_some());
    }

    #[test]
    fn test_transform_is_normalized_and_deterministic() {
        let mut vectorizer = TfIdfVectorizer::new(TfIdfConfig::default());
        vectorizer.fit(&docs()).unwrap();

        let a = vectorizer.transform("shell gas station downtown");
        let b = vectorizer.transform("shell gas station downtown");
        assert_eq!(a, b);
        assert_eq!(a.dim(), vectorizer.vocabulary_size());
        assert!((a.norm() - 1.0).abs() < 1e-12);

        let unknown = vectorizer.transform("xyz123 unknown merchant");
        assert_eq!(unknown.nnz(), 0);
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        let mut vectorizer = TfIdfVectorizer::new(TfIdfConfig::default());
        let err = vectorizer
            .fit(&["alpha".to_string(), "beta".to_string()])
            .unwrap_err();
        assert!(matches!(err, TxcatError::Model(MLError::EmptyVocabulary)));
    }

    #[test]
    fn test_serde_round_trip_rebuilds_tokenizer() {
        let mut vectorizer = TfIdfVectorizer::new(TfIdfConfig::default());
        vectorizer.fit(&docs()).unwrap();

        let bytes = bincode::serialize(&vectorizer).unwrap();
        let restored: TfIdfVectorizer = bincode::deserialize(&bytes).unwrap();
        restored.validate().unwrap();
        assert_eq!(
            restored.transform("shell gas station"),
            vectorizer.transform("shell gas station")
        );
    }
}
