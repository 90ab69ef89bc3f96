//! Error types for the txcat library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`TxcatError`] enum. Model-specific failures live in [`MLError`] and are
//! wrapped by the [`TxcatError::Model`] variant.
//!
//! # Examples
//!
//! ```
//! use txcat::error::{Result, TxcatError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TxcatError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::ml::MLError;

/// The main error type for txcat operations.
#[derive(Error, Debug)]
pub enum TxcatError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No trained model artifacts at the expected location. Fatal at startup.
    #[error("Model not found at {path}; run training first")]
    ModelNotFound { path: String },

    /// Taxonomy file is absent. Callers usually degrade to ML-only mode instead.
    #[error("Taxonomy not found at {path}")]
    TaxonomyMissing { path: String },

    /// Taxonomy file exists but is malformed or violates its invariants
    #[error("Taxonomy error: {0}")]
    Taxonomy(String),

    /// Model training or inference errors
    #[error("Model error: {0}")]
    Model(#[from] MLError),

    /// Explanation could not be produced
    #[error("Explanation failed: {0}")]
    Explanation(String),

    /// Binary artifact encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TxcatError.
pub type Result<T> = std::result::Result<T, TxcatError>;

impl From<bincode::Error> for TxcatError {
    fn from(err: bincode::Error) -> Self {
        TxcatError::Serialization(err.to_string())
    }
}

impl TxcatError {
    /// Create a new model-not-found error for the given directory.
    pub fn model_not_found<P: AsRef<Path>>(path: P) -> Self {
        TxcatError::ModelNotFound {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create a new taxonomy-missing error for the given file.
    pub fn taxonomy_missing<P: AsRef<Path>>(path: P) -> Self {
        TxcatError::TaxonomyMissing {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create a new taxonomy error.
    pub fn taxonomy<S: Into<String>>(msg: S) -> Self {
        TxcatError::Taxonomy(msg.into())
    }

    /// Create a new explanation error.
    pub fn explanation<S: Into<String>>(msg: S) -> Self {
        TxcatError::Explanation(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TxcatError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TxcatError::Other(msg.into())
    }
}
