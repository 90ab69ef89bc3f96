//! Statistical classification for transactions that no rule covers.
//!
//! The pieces compose bottom-up: [`TfIdfVectorizer`] turns normalized text
//! into a [`SparseVector`], the base learners ([`LogisticRegression`],
//! [`RandomForest`]) each produce a probability distribution over the
//! category index, and [`SoftVotingEnsemble`] averages them. [`Trainer`]
//! drives fitting and evaluation and yields a [`TrainedModel`] bundle that is
//! persisted and loaded as a unit.

pub mod classifier;
pub mod dataset;
pub mod ensemble;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod model;
pub mod sparse;
pub mod split;
pub mod tfidf;
pub mod train;

pub use classifier::{ProbabilisticClassifier, argmax};
pub use dataset::{TrainDataset, TrainingExample, balanced_class_weights, load_training_data};
pub use ensemble::{BaseLearner, SoftVotingEnsemble};
pub use forest::{DecisionTree, ForestConfig, RandomForest};
pub use logistic::{LogisticConfig, LogisticRegression};
pub use metrics::{ClassReport, ConfusionMatrix, TrainingMetrics};
pub use model::TrainedModel;
pub use sparse::SparseVector;
pub use tfidf::{TfIdfConfig, TfIdfVectorizer};
pub use train::{TrainConfig, Trainer, TrainingReport};

/// Machine learning error types.
#[derive(Debug, thiserror::Error)]
pub enum MLError {
    #[error("Model not trained: {message}")]
    ModelNotTrained { message: String },

    #[error("Training data insufficient: need at least {min_samples} samples, got {actual}")]
    InsufficientTrainingData { min_samples: usize, actual: usize },

    #[error("Training data insufficient: {message}")]
    TrainingDataInsufficient { message: String },

    #[error("Vocabulary is empty after pruning; provide more varied training text")]
    EmptyVocabulary,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown category: {name}")]
    UnknownCategory { name: String },
}
