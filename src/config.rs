//! Categorizer configuration.
//!
//! Every field has a default, so a configuration file only needs to name
//! what it changes:
//!
//! ```json
//! {
//!   "models_directory": "/var/lib/txcat/models",
//!   "match_strategy": "word_boundary",
//!   "training": { "forest": { "n_estimators": 200 } }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::error::Result;
use crate::explain::ExplainConfig;
use crate::ml::TrainConfig;
use crate::rules::MatchStrategy;

/// Top-level settings for training and prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    /// Directory holding the model artifacts.
    pub models_directory: PathBuf,

    /// Taxonomy YAML file. Missing means model-only prediction.
    pub taxonomy_path: PathBuf,

    /// Directory receiving `metrics.json` after training.
    pub outputs_directory: PathBuf,

    /// How taxonomy keywords are matched.
    pub match_strategy: MatchStrategy,

    pub training: TrainConfig,

    pub explain: ExplainConfig,

    pub batch: BatchConfig,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            models_directory: PathBuf::from("./models"),
            taxonomy_path: PathBuf::from("config/taxonomy.yaml"),
            outputs_directory: PathBuf::from("./outputs"),
            match_strategy: MatchStrategy::default(),
            training: TrainConfig::default(),
            explain: ExplainConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl CategorizerConfig {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Path of the training metrics artifact.
    pub fn metrics_path(&self) -> PathBuf {
        self.outputs_directory.join("metrics.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("txcat.json");
        fs::write(
            &path,
            r#"{"match_strategy": "word_boundary", "training": {"cv_folds": 3}, "batch": {"parallel": false}}"#,
        )
        .unwrap();

        let config = CategorizerConfig::load(&path).unwrap();
        assert_eq!(config.match_strategy, MatchStrategy::WordBoundary);
        assert_eq!(config.training.cv_folds, 3);
        assert_eq!(config.training.test_fraction, 0.2);
        assert!(!config.batch.parallel);
        assert_eq!(config.batch.progress_interval, 100);
        assert_eq!(config.models_directory, PathBuf::from("./models"));
        assert_eq!(config.explain.num_samples, 500);
    }

    #[test]
    fn test_defaults() {
        let config = CategorizerConfig::default();
        assert_eq!(config.taxonomy_path, PathBuf::from("config/taxonomy.yaml"));
        assert_eq!(config.metrics_path(), PathBuf::from("./outputs/metrics.json"));
        assert_eq!(config.training.forest.n_estimators, 100);
        assert_eq!(config.training.tfidf.max_features, 1000);
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(CategorizerConfig::load(&path).is_err());
    }
}
