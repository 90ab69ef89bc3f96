//! Training data types.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::sparse::SparseVector;

/// One labeled transaction used for training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Raw transaction description.
    pub description: String,
    /// Category label.
    pub category: String,
    /// Transaction amount. Carried through but not used as a feature.
    #[serde(default)]
    pub amount: Option<f64>,
}

impl TrainingExample {
    pub fn new<D: Into<String>, C: Into<String>>(description: D, category: C) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
            amount: None,
        }
    }
}

/// Load training examples from a JSON array or a JSON Lines file.
pub fn load_training_data<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingExample>> {
    let content = fs::read_to_string(path)?;
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&content)?);
    }

    let mut examples = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let example: TrainingExample = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("line {}: {e}", number + 1))?;
        examples.push(example);
    }
    Ok(examples)
}

/// Vectorized, index-labeled training set shared by the base learners.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Feature rows.
    pub x: Vec<SparseVector>,
    /// Class index per row.
    pub y: Vec<usize>,
    /// Number of classes in the label space.
    pub n_classes: usize,
    /// Feature dimension.
    pub n_features: usize,
}

impl TrainDataset {
    pub fn new(x: Vec<SparseVector>, y: Vec<usize>, n_classes: usize, n_features: usize) -> Self {
        Self {
            x,
            y,
            n_classes,
            n_features,
        }
    }

    /// Select rows by index, keeping the label space.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            n_classes: self.n_classes,
            n_features: self.n_features,
        }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Inverse-frequency class weights: `n_samples / (n_classes * count_c)`.
///
/// Classes absent from `y` get weight zero.
pub fn balanced_class_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0f64; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1.0;
        }
    }
    let total: f64 = counts.iter().sum();
    let present = counts.iter().filter(|&&c| c > 0.0).count().max(1) as f64;
    counts
        .into_iter()
        .map(|count| {
            if count == 0.0 {
                0.0
            } else {
                total / (present * count)
            }
        })
        .collect()
}
