//! Persisted bundle of a fitted vectorizer, ensemble and category index.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TxcatError};
use crate::ml::MLError;
use crate::ml::classifier::ProbabilisticClassifier;
use crate::ml::ensemble::SoftVotingEnsemble;
use crate::ml::tfidf::TfIdfVectorizer;

/// File holding the bincode-encoded vectorizer.
pub const VECTORIZER_FILE: &str = "vectorizer.bin";
/// File holding the bincode-encoded ensemble.
pub const MODEL_FILE: &str = "model.bin";
/// File holding the ordered category names as JSON.
pub const CATEGORIES_FILE: &str = "categories.json";

const ARTIFACTS: [&str; 3] = [VECTORIZER_FILE, MODEL_FILE, CATEGORIES_FILE];

/// Everything needed to classify normalized text.
///
/// `categories[i]` names the class at probability index `i`; the list is
/// sorted ascending at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    vectorizer: TfIdfVectorizer,
    ensemble: SoftVotingEnsemble,
    categories: Vec<String>,
}

impl TrainedModel {
    /// Bundle fitted parts, checking that they agree with each other.
    pub fn new(
        vectorizer: TfIdfVectorizer,
        ensemble: SoftVotingEnsemble,
        categories: Vec<String>,
    ) -> Result<Self> {
        vectorizer.validate()?;
        if ensemble.n_classes() != categories.len() {
            return Err(MLError::DimensionMismatch {
                expected: categories.len(),
                actual: ensemble.n_classes(),
            }
            .into());
        }
        Ok(Self {
            vectorizer,
            ensemble,
            categories,
        })
    }

    /// Write the three artifacts into `dir`, creating it if needed.
    ///
    /// Artifacts are staged under temporary names and renamed only after all
    /// of them were written and flushed, so a failed save never leaves a
    /// partial model behind.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut staged = Vec::with_capacity(ARTIFACTS.len());
        if let Err(e) = self.write_staged(dir, &mut staged) {
            for path in &staged {
                let _ = fs::remove_file(path);
            }
            return Err(e);
        }
        for (path, name) in staged.iter().zip(ARTIFACTS) {
            fs::rename(path, dir.join(name))?;
        }

        info!("Model saved to {}", dir.display());
        Ok(())
    }

    fn write_staged(&self, dir: &Path, staged: &mut Vec<PathBuf>) -> Result<()> {
        staged.push(stage(dir, VECTORIZER_FILE, |w| {
            Ok(bincode::serialize_into(w, &self.vectorizer)?)
        })?);
        staged.push(stage(dir, MODEL_FILE, |w| {
            Ok(bincode::serialize_into(w, &self.ensemble)?)
        })?);
        staged.push(stage(dir, CATEGORIES_FILE, |w| {
            Ok(serde_json::to_writer_pretty(w, &self.categories)?)
        })?);
        Ok(())
    }

    /// Load a model saved with [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`TxcatError::ModelNotFound`] when any artifact is missing.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !Self::exists(dir) {
            return Err(TxcatError::model_not_found(dir));
        }

        let vectorizer: TfIdfVectorizer =
            bincode::deserialize_from(BufReader::new(File::open(dir.join(VECTORIZER_FILE))?))?;
        let ensemble: SoftVotingEnsemble =
            bincode::deserialize_from(BufReader::new(File::open(dir.join(MODEL_FILE))?))?;
        let categories: Vec<String> =
            serde_json::from_str(&fs::read_to_string(dir.join(CATEGORIES_FILE))?)?;

        let model = Self::new(vectorizer, ensemble, categories)?;
        info!(
            "Model loaded from {} ({} categories, {} features)",
            dir.display(),
            model.categories.len(),
            model.vectorizer.vocabulary_size()
        );
        Ok(model)
    }

    /// Whether all artifacts are present in `dir`.
    pub fn exists<P: AsRef<Path>>(dir: P) -> bool {
        let dir = dir.as_ref();
        ARTIFACTS.iter().all(|file| dir.join(file).is_file())
    }

    /// Class probabilities for already-normalized text, in category order.
    pub fn predict_proba(&self, normalized_text: &str) -> Vec<f64> {
        self.ensemble
            .predict_proba(&self.vectorizer.transform(normalized_text))
    }

    /// Most probable category and its probability.
    pub fn predict(&self, normalized_text: &str) -> (&str, f64) {
        let (idx, confidence) = self
            .ensemble
            .predict(&self.vectorizer.transform(normalized_text));
        (self.categories[idx].as_str(), confidence)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn ensemble(&self) -> &SoftVotingEnsemble {
        &self.ensemble
    }
}

/// Write one artifact under `<name>.tmp`, removing it again on failure.
fn stage<F>(dir: &Path, name: &str, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let path = dir.join(format!("{name}.tmp"));
    let mut writer = BufWriter::new(File::create(&path)?);
    let written = write(&mut writer).and_then(|()| Ok(writer.flush()?));
    drop(writer);
    if let Err(e) = written {
        let _ = fs::remove_file(&path);
        return Err(e);
    }
    Ok(path)
}
