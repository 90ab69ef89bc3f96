//! Output formatting for CLI commands.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::batch::BatchStatistics;
use crate::cli::args::{OutputFormat, TxcatArgs};
use crate::error::Result;
use crate::explain::Explanation;
use crate::ml::TrainingReport;
use crate::predict::{Method, PredictionResult};
use crate::taxonomy::Taxonomy;

/// Result structure for batch runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_file: String,
    pub total_transactions: usize,
    pub duration_ms: u64,
    pub transactions_per_second: f64,
    pub statistics: BatchStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<PredictionResult>>,
}

/// Result structure for taxonomy inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaxonomySummary {
    pub path: String,
    pub categories: Vec<CategorySummary>,
}

/// One category row of a [`TaxonomySummary`].
#[derive(Debug, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub threshold: f64,
    pub keywords: Vec<String>,
}

impl TaxonomySummary {
    pub fn new(path: &Path, taxonomy: &Taxonomy) -> Self {
        Self {
            path: path.display().to_string(),
            categories: taxonomy
                .categories()
                .iter()
                .map(|c| CategorySummary {
                    name: c.name.clone(),
                    threshold: c.threshold,
                    keywords: c.keywords.clone(),
                })
                .collect(),
        }
    }
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self, args: &TxcatArgs);
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(
    message: &str,
    result: &T,
    args: &TxcatArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &TxcatArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for Vec<PredictionResult> {
    fn print_human(&self, args: &TxcatArgs) {
        for result in self {
            print_prediction(result, args);
            println!();
        }
    }
}

fn print_prediction(result: &PredictionResult, args: &TxcatArgs) {
    println!("Transaction: {}", result.original_text);
    println!("  → Category: {}", result.category);
    println!("  → Confidence: {}", format_percent(result.confidence));
    println!("  → Method: {}", result.method);
    if let Some(keyword) = &result.matched_keyword {
        println!("  → Matched Keyword: {keyword}");
    }
    if result.needs_review {
        println!("  ⚠ Needs Review (low confidence)");
    }

    if result.method == Method::MlModel
        && args.verbosity() > 1
        && let Some(probabilities) = &result.probabilities
    {
        let mut ranked: Vec<(&String, &f64)> = probabilities.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(a.1));
        println!("  Probabilities:");
        for (category, p) in ranked.into_iter().take(5) {
            println!("    {category}: {}", format_percent(*p));
        }
    }

    match &result.explanation {
        Some(Explanation::Words { top_words, .. }) => {
            println!("  Top words:");
            for (word, weight) in top_words {
                println!("    {word}: {weight:+.4}");
            }
        }
        Some(Explanation::Failed { error }) => println!("  Explanation unavailable: {error}"),
        None => {}
    }
}

impl HumanOutput for BatchReport {
    fn print_human(&self, args: &TxcatArgs) {
        if let Some(results) = &self.results {
            results.print_human(args);
        }

        println!("Batch Results:");
        println!("══════════════");
        println!("Input: {}", self.input_file);
        println!("Total transactions: {}", self.total_transactions);
        println!("Time elapsed: {:.2}s", self.duration_ms as f64 / 1000.0);
        println!(
            "Throughput: {:.0} transactions/second",
            self.transactions_per_second
        );
        println!();
        self.statistics.print_human(args);
    }
}

impl HumanOutput for BatchStatistics {
    fn print_human(&self, _args: &TxcatArgs) {
        println!("Statistics:");
        println!("───────────");
        println!("Rule matches: {}", self.rule_matches);
        println!("ML predictions: {}", self.ml_predictions);
        println!("Needs review: {}", self.needs_review);
        println!("Average confidence: {}", format_percent(self.avg_confidence));

        if !self.category_distribution.is_empty() {
            println!();
            println!("Categories:");
            let mut counts: Vec<(&String, &usize)> = self.category_distribution.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (category, count) in counts {
                println!("  {category} ({count})");
            }
        }

        if !self.low_confidence_samples.is_empty() {
            println!();
            println!("Lowest confidence:");
            for sample in &self.low_confidence_samples {
                println!(
                    "  {} → {} ({})",
                    sample.original_text,
                    sample.category,
                    format_percent(sample.confidence)
                );
            }
        }
    }
}

impl HumanOutput for TrainingReport {
    fn print_human(&self, args: &TxcatArgs) {
        let metrics = &self.metrics;
        println!("Model Performance:");
        println!("══════════════════");
        println!("Training samples: {}", metrics.train_samples);
        println!("Testing samples: {}", metrics.test_samples);
        println!("Macro F1 Score: {:.3}", metrics.f1_macro);
        println!("Weighted F1 Score: {:.3}", metrics.f1_weighted);
        println!(
            "Cross-validation F1 (macro): {:.3} ± {:.3}",
            metrics.cv_mean, metrics.cv_std
        );

        if args.verbosity() > 1 {
            println!();
            println!(
                "{:<24} {:>9} {:>9} {:>9} {:>9}",
                "category", "precision", "recall", "f1", "support"
            );
            for class in &self.per_class {
                println!(
                    "{:<24} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                    class.category, class.precision, class.recall, class.f1, class.support
                );
            }
        }
    }
}

impl HumanOutput for TaxonomySummary {
    fn print_human(&self, _args: &TxcatArgs) {
        println!("Taxonomy: {}", self.path);
        println!("═════════");
        if self.categories.is_empty() {
            println!("No categories (rule engine disabled)");
            return;
        }
        for category in &self.categories {
            println!(
                "{} (threshold {:.2}, {} keywords)",
                category.name,
                category.threshold,
                category.keywords.len()
            );
            if !category.keywords.is_empty() {
                println!("  {}", category.keywords.join(", "));
            }
        }
    }
}

/// Format a probability as a percentage.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}
