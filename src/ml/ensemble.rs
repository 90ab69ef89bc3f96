//! Soft-voting ensemble over probability-producing classifiers.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::MLError;
use crate::ml::classifier::ProbabilisticClassifier;
use crate::ml::dataset::TrainDataset;
use crate::ml::forest::{ForestConfig, RandomForest};
use crate::ml::logistic::{LogisticConfig, LogisticRegression};
use crate::ml::sparse::SparseVector;

/// A base learner that can be persisted inside the ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BaseLearner {
    Logistic(LogisticRegression),
    Forest(RandomForest),
}

impl BaseLearner {
    fn as_classifier(&self) -> &dyn ProbabilisticClassifier {
        match self {
            BaseLearner::Logistic(model) => model,
            BaseLearner::Forest(model) => model,
        }
    }
}

impl ProbabilisticClassifier for BaseLearner {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        self.as_classifier().predict_proba(features)
    }

    fn n_classes(&self) -> usize {
        self.as_classifier().n_classes()
    }

    fn name(&self) -> &str {
        self.as_classifier().name()
    }
}

/// Averages member probabilities with equal weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftVotingEnsemble {
    members: Vec<BaseLearner>,
    n_classes: usize,
}

impl SoftVotingEnsemble {
    /// Combine already-trained members. All must share one class index.
    pub fn new(members: Vec<BaseLearner>) -> Result<Self> {
        let Some(first) = members.first() else {
            return Err(MLError::ModelNotTrained {
                message: "ensemble needs at least one member".to_string(),
            }
            .into());
        };
        let n_classes = first.n_classes();
        if let Some(bad) = members.iter().find(|m| m.n_classes() != n_classes) {
            return Err(MLError::DimensionMismatch {
                expected: n_classes,
                actual: bad.n_classes(),
            }
            .into());
        }
        Ok(Self { members, n_classes })
    }

    /// Train the default pair: logistic regression and a random forest,
    /// independently, on the same data.
    pub fn fit(
        dataset: &TrainDataset,
        logistic: &LogisticConfig,
        forest: &ForestConfig,
    ) -> Result<Self> {
        info!(
            "Training ensemble on {} samples, {} features, {} classes",
            dataset.len(),
            dataset.n_features,
            dataset.n_classes
        );
        let (lr, rf) = rayon::join(
            || LogisticRegression::fit(dataset, logistic),
            || RandomForest::fit(dataset, forest),
        );
        Self::new(vec![BaseLearner::Logistic(lr?), BaseLearner::Forest(rf?)])
    }

    pub fn members(&self) -> &[BaseLearner] {
        &self.members
    }
}

impl ProbabilisticClassifier for SoftVotingEnsemble {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        for member in &self.members {
            for (p, q) in probs.iter_mut().zip(member.predict_proba(features)) {
                *p += q;
            }
        }
        let scale = 1.0 / self.members.len().max(1) as f64;
        probs.iter_mut().for_each(|p| *p *= scale);
        probs
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn name(&self) -> &str {
        "soft_voting"
    }
}
