//! Training pipeline for the category classifier.
//!
//! [`Trainer::train`] normalizes descriptions, fixes the category index by
//! sorting names, holds out a stratified test part, fits the vectorizer and
//! the ensemble on the remaining rows and then scores the result. Stratified
//! cross-validation runs on the training vectors for reporting only; when it
//! cannot run (too few examples in some class) the scores are logged and
//! reported as zero instead of failing the run.

use std::collections::BTreeSet;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::normalize;
use crate::error::Result;
use crate::ml::MLError;
use crate::ml::classifier::ProbabilisticClassifier;
use crate::ml::dataset::{TrainDataset, TrainingExample};
use crate::ml::ensemble::SoftVotingEnsemble;
use crate::ml::forest::ForestConfig;
use crate::ml::logistic::LogisticConfig;
use crate::ml::metrics::{ClassReport, ConfusionMatrix, TrainingMetrics, mean_std};
use crate::ml::model::TrainedModel;
use crate::ml::split::{stratified_k_fold, stratified_train_test_split};
use crate::ml::tfidf::{TfIdfConfig, TfIdfVectorizer};

/// End-to-end training settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub tfidf: TfIdfConfig,
    pub logistic: LogisticConfig,
    pub forest: ForestConfig,
    /// Fraction of each class held out for evaluation.
    pub test_fraction: f64,
    /// Number of cross-validation folds.
    pub cv_folds: usize,
    /// Seed for the train/test split and fold assignment.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            tfidf: TfIdfConfig::default(),
            logistic: LogisticConfig::default(),
            forest: ForestConfig::default(),
            test_fraction: 0.2,
            cv_folds: 5,
            seed: 42,
        }
    }
}

/// Evaluation results of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metrics: TrainingMetrics,
    /// Per-category precision/recall on the held-out part.
    pub per_class: Vec<ClassReport>,
    /// Held-out confusion matrix, rows are true categories.
    pub confusion_matrix: Vec<Vec<u32>>,
}

/// Fits a [`TrainedModel`] from labeled examples.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train and evaluate a model.
    ///
    /// # Errors
    ///
    /// Fails when fewer than two examples or two categories are supplied, when
    /// the pruned vocabulary is empty, or when a base learner cannot be fit.
    pub fn train(&self, examples: &[TrainingExample]) -> Result<(TrainedModel, TrainingReport)> {
        if examples.len() < 2 {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 2,
                actual: examples.len(),
            }
            .into());
        }

        let texts: Vec<String> = examples.iter().map(|e| normalize(&e.description)).collect();
        let categories: Vec<String> = examples
            .iter()
            .map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if categories.len() < 2 {
            return Err(MLError::TrainingDataInsufficient {
                message: format!("need at least 2 categories, got {}", categories.len()),
            }
            .into());
        }
        info!("Categories: {}", categories.join(", "));

        let y = examples
            .iter()
            .map(|e| {
                categories
                    .binary_search(&e.category)
                    .map_err(|_| MLError::UnknownCategory {
                        name: e.category.clone(),
                    })
            })
            .collect::<std::result::Result<Vec<usize>, MLError>>()?;
        let n_classes = categories.len();

        let split = stratified_train_test_split(&y, n_classes, self.config.test_fraction, self.config.seed);
        info!(
            "Training samples: {}, testing samples: {}",
            split.train.len(),
            split.test.len()
        );

        let train_texts: Vec<String> = split.train.iter().map(|&i| texts[i].clone()).collect();
        let mut vectorizer = TfIdfVectorizer::new(self.config.tfidf.clone());
        let x_train = vectorizer.fit_transform(&train_texts)?;
        debug!("Vocabulary size: {}", vectorizer.vocabulary_size());

        let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();
        let dataset = TrainDataset::new(x_train, y_train, n_classes, vectorizer.vocabulary_size());
        let ensemble = SoftVotingEnsemble::fit(&dataset, &self.config.logistic, &self.config.forest)?;

        let (cv_mean, cv_std) = match self.cross_validate(&dataset) {
            Ok(scores) => {
                let (mean, std) = mean_std(&scores);
                info!("Cross-validation F1 (macro): {mean:.3} ± {std:.3}");
                (mean, std)
            }
            Err(e) => {
                warn!("Cross-validation skipped: {e}");
                (0.0, 0.0)
            }
        };

        let truth: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();
        let predicted: Vec<usize> = split
            .test
            .iter()
            .map(|&i| ensemble.predict(&vectorizer.transform(&texts[i])).0)
            .collect();
        let confusion = ConfusionMatrix::from_predictions(n_classes, &truth, &predicted);

        let metrics = TrainingMetrics {
            f1_macro: confusion.f1_macro(),
            f1_weighted: confusion.f1_weighted(),
            cv_mean,
            cv_std,
            train_samples: split.train.len(),
            test_samples: split.test.len(),
            categories: categories.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };
        info!(
            "Held-out F1: macro {:.3}, weighted {:.3}",
            metrics.f1_macro, metrics.f1_weighted
        );

        let report = TrainingReport {
            per_class: confusion.class_reports(&categories),
            confusion_matrix: confusion.rows(),
            metrics,
        };
        let model = TrainedModel::new(vectorizer, ensemble, categories)?;
        Ok((model, report))
    }

    /// Macro-F1 per fold, with the vectorizer held fixed.
    fn cross_validate(&self, dataset: &TrainDataset) -> Result<Vec<f64>> {
        let folds = stratified_k_fold(&dataset.y, dataset.n_classes, self.config.cv_folds, self.config.seed)?;
        folds
            .iter()
            .map(|fold| {
                let train = dataset.subset(&fold.train);
                let test = dataset.subset(&fold.test);
                let model = SoftVotingEnsemble::fit(&train, &self.config.logistic, &self.config.forest)?;
                let predicted: Vec<usize> = test.x.iter().map(|x| model.predict(x).0).collect();
                Ok(ConfusionMatrix::from_predictions(dataset.n_classes, &test.y, &predicted).f1_macro())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> TrainConfig {
        TrainConfig {
            forest: ForestConfig {
                n_estimators: 10,
                ..ForestConfig::default()
            },
            logistic: LogisticConfig {
                max_iter: 200,
                ..LogisticConfig::default()
            },
            cv_folds: 3,
            ..TrainConfig::default()
        }
    }

    fn corpus() -> Vec<TrainingExample> {
        let mut examples = Vec::new();
        let suffixes = ["", " downtown", " online", " store", " #123", " - purchase"];
        for (category, merchants) in [
            ("Fuel", ["shell gas", "chevron fuel", "exxon gas"]),
            ("Transportation", ["uber ride", "lyft ride", "metro card"]),
            ("Entertainment", ["netflix monthly", "spotify monthly", "movie theater"]),
        ] {
            for (i, suffix) in suffixes.iter().enumerate() {
                for merchant in merchants {
                    if (i + merchant.len()) % 2 == 0 || i < 3 {
                        examples.push(TrainingExample::new(format!("{merchant}{suffix}"), category));
                    }
                }
            }
        }
        examples
    }

    #[test]
    fn test_train_reports_metrics() {
        let examples = corpus();
        let (model, report) = Trainer::new(fast_config()).train(&examples).unwrap();

        assert_eq!(model.categories(), &["Entertainment", "Fuel", "Transportation"]);
        let metrics = &report.metrics;
        assert_eq!(metrics.train_samples + metrics.test_samples, examples.len());
        assert!(metrics.test_samples > 0);
        assert!(metrics.f1_macro > 0.5);
        assert!(metrics.cv_mean > 0.0);
        assert_eq!(report.per_class.len(), 3);
        assert_eq!(report.confusion_matrix.len(), 3);
        let total: u32 = report.confusion_matrix.iter().flatten().sum();
        assert_eq!(total as usize, metrics.test_samples);
    }

    #[test]
    fn test_cross_validation_degrades_on_tiny_data() {
        let examples = vec![
            TrainingExample::new("shell gas a", "Fuel"),
            TrainingExample::new("shell gas b", "Fuel"),
            TrainingExample::new("uber ride a", "Transportation"),
            TrainingExample::new("uber ride b", "Transportation"),
        ];
        let config = TrainConfig {
            tfidf: TfIdfConfig {
                min_df: 1,
                ..TfIdfConfig::default()
            },
            cv_folds: 5,
            ..fast_config()
        };
        let (_, report) = Trainer::new(config).train(&examples).unwrap();
        assert_eq!(report.metrics.cv_mean, 0.0);
        assert_eq!(report.metrics.cv_std, 0.0);
    }

    #[test]
    fn test_single_category_rejected() {
        let examples = vec![
            TrainingExample::new("shell gas", "Fuel"),
            TrainingExample::new("chevron gas", "Fuel"),
        ];
        assert!(Trainer::new(fast_config()).train(&examples).is_err());
        assert!(Trainer::default().train(&examples[..1]).is_err());
    }
}
