//! Category taxonomy loaded from YAML configuration.
//!
//! The taxonomy is an ordered list of categories. Order matters: the rule
//! engine walks categories in declaration order, so the file doubles as a
//! priority list and is never re-sorted.
//!
//! ```yaml
//! categories:
//!   - name: Fuel
//!     threshold: 0.7
//!     keywords: [Shell Gas, Chevron]
//!     description: Transactions related to fuel
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TxcatError};

/// Default per-category confidence threshold.
pub const DEFAULT_CATEGORY_THRESHOLD: f64 = 0.7;

fn default_threshold() -> f64 {
    DEFAULT_CATEGORY_THRESHOLD
}

/// A single category definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category name.
    pub name: String,
    /// Confidence threshold configured for this category.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Keywords in priority order.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl Category {
    /// Create a category with the default threshold and a generated description.
    pub fn new<S: Into<String>>(name: S, keywords: Vec<String>) -> Self {
        let name = name.into();
        let description = format!("Transactions related to {}", name.to_lowercase());
        Self {
            name,
            threshold: DEFAULT_CATEGORY_THRESHOLD,
            keywords,
            description,
        }
    }
}

/// Ordered, immutable collection of categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy from categories, validating their invariants.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        let taxonomy = Self { categories };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// An empty taxonomy. The rule engine never matches against it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a taxonomy from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::empty());
        }
        let taxonomy: Taxonomy = serde_yaml::from_str(content)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load a taxonomy from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`TxcatError::TaxonomyMissing`] if the file does not exist and
    /// [`TxcatError::Yaml`] / [`TxcatError::Taxonomy`] if it is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TxcatError::taxonomy_missing(path));
        }
        let content = fs::read_to_string(path)?;
        let taxonomy = Self::from_yaml_str(&content)?;
        info!(
            "Loaded rules for {} categories from {}",
            taxonomy.len(),
            path.display()
        );
        Ok(taxonomy)
    }

    /// Load a taxonomy, falling back to an empty one when the file is missing.
    ///
    /// A missing file puts the pipeline in ML-only mode. Malformed files are
    /// still reported as errors.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path) {
            Ok(taxonomy) => Ok(taxonomy),
            Err(TxcatError::TaxonomyMissing { path }) => {
                warn!("{path} not found; running without rule engine");
                Ok(Self::empty())
            }
            Err(e) => Err(e),
        }
    }

    /// Write the taxonomy as YAML, creating parent directories as needed.
    pub fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        info!("Wrote taxonomy configuration to {}", path.display());
        Ok(())
    }

    /// Check name uniqueness and threshold ranges.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(TxcatError::taxonomy("category name must not be empty"));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(TxcatError::taxonomy(format!(
                    "duplicate category name '{}'",
                    category.name
                )));
            }
            if !(0.0..=1.0).contains(&category.threshold) {
                return Err(TxcatError::taxonomy(format!(
                    "threshold {} for '{}' is outside [0, 1]",
                    category.threshold, category.name
                )));
            }
        }
        Ok(())
    }

    /// Categories in declaration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Configured threshold for a category, if it exists.
    pub fn threshold_for(&self, name: &str) -> Option<f64> {
        self.get(name).map(|c| c.threshold)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
