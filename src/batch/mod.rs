//! Batch prediction and aggregate statistics.

pub mod stats;

pub use stats::{BatchStatistics, LowConfidenceSample, MAX_LOW_CONFIDENCE_SAMPLES, get_statistics};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::predict::{Categorizer, PredictionResult};

/// Configuration for batch processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Predict on the rayon thread pool. Output order is preserved either way.
    pub parallel: bool,

    /// Log progress after this many items. Zero disables progress logging.
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            progress_interval: 100,
        }
    }
}

/// Results of one batch run with timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun {
    /// One result per input, in input order.
    pub results: Vec<PredictionResult>,

    /// Wall-clock time of the run.
    pub elapsed: Duration,

    /// Items per second; zero when no time elapsed.
    pub throughput: f64,
}

impl Categorizer {
    /// Categorize many texts without explanations, preserving input order.
    pub fn batch_predict<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<PredictionResult> {
        let config = self.batch_config();
        let total = texts.len();
        let done = AtomicUsize::new(0);
        let predict_one = |text: &S| {
            let result = self.predict(text.as_ref(), false);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if config.progress_interval > 0 && n % config.progress_interval == 0 {
                info!("Processed {n}/{total} transactions...");
            }
            result
        };

        if config.parallel {
            texts.par_iter().map(predict_one).collect()
        } else {
            texts.iter().map(predict_one).collect()
        }
    }

    /// [`batch_predict`](Self::batch_predict) with elapsed time and throughput.
    pub fn run_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> BatchRun {
        let start = Instant::now();
        let results = self.batch_predict(texts);
        let elapsed = start.elapsed();

        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            results.len() as f64 / secs
        } else {
            0.0
        };
        info!(
            "Batch prediction complete: {} transactions in {:.2}s ({:.0} transactions/second)",
            results.len(),
            secs,
            throughput
        );

        BatchRun {
            results,
            elapsed,
            throughput,
        }
    }
}
