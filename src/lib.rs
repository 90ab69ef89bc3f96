//! # txcat
//!
//! Transaction description categorization in two stages.
//!
//! 1. A keyword [`rules`] engine driven by a YAML [`taxonomy`] decides every
//!    transaction that mentions a configured keyword.
//! 2. Everything else goes to a trained [`ml`] ensemble (TF-IDF features,
//!    logistic regression and a random forest, soft-voted).
//!
//! Each [`PredictionResult`] carries a confidence and is flagged for review
//! below 0.7. Model predictions can be explained word by word with the
//! [`explain`] module, and the [`batch`] module runs many predictions at once
//! and summarizes them.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use txcat::ml::TrainedModel;
//! use txcat::predict::Categorizer;
//! use txcat::taxonomy::Taxonomy;
//!
//! # fn main() -> txcat::error::Result<()> {
//! let model = TrainedModel::load("models")?;
//! let taxonomy = Taxonomy::load_or_empty("config/taxonomy.yaml")?;
//! let categorizer = Categorizer::new(Arc::new(model), Arc::new(taxonomy))?;
//!
//! let result = categorizer.predict("Shell Gas Station", false);
//! println!("{} ({:.2})", result.category, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod explain;
pub mod ml;
pub mod predict;
pub mod rules;
pub mod taxonomy;

pub use batch::{BatchStatistics, get_statistics};
pub use config::CategorizerConfig;
pub use error::{Result, TxcatError};
pub use predict::{Categorizer, Method, PredictionResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
