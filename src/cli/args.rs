//! Command line argument parsing for the txcat CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// txcat - rule-first transaction categorizer with an explainable ML fallback
#[derive(Parser, Debug, Clone)]
#[command(name = "txcat")]
#[command(about = "Categorize transaction descriptions with keyword rules and a trained ensemble")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TxcatArgs {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "FILE", env = "TXCAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model directory, overriding the configuration
    #[arg(long, value_name = "DIR", env = "TXCAT_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Taxonomy file, overriding the configuration
    #[arg(long, value_name = "FILE", env = "TXCAT_TAXONOMY")]
    pub taxonomy: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TxcatArgs {
    /// Get the effective verbosity level (0=quiet, 1=normal, 2=verbose, 3+=debug)
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from labeled transactions
    Train(TrainArgs),

    /// Categorize one or more transaction descriptions
    Predict(PredictArgs),

    /// Categorize a file of descriptions and report statistics
    Batch(BatchArgs),

    /// Show or generate the keyword taxonomy
    Taxonomy(TaxonomyArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training data (JSON array or JSON Lines of {description, category, amount})
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// Directory for metrics.json, overriding the configuration
    #[arg(short, long, value_name = "DIR")]
    pub outputs_dir: Option<PathBuf>,

    /// Number of cross-validation folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Number of trees in the random forest
    #[arg(long)]
    pub trees: Option<usize>,
}

/// Arguments for single predictions
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Transaction descriptions
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,

    /// Attach word-level explanations to model predictions
    #[arg(short, long)]
    pub explain: bool,
}

/// Arguments for batch prediction
#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// Input file: one description per line, or JSON/JSONL records with a description field
    #[arg(value_name = "INPUT_FILE")]
    pub input_file: PathBuf,

    /// Process inputs on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Include every prediction in the output, not just statistics
    #[arg(long)]
    pub results: bool,
}

/// Arguments for taxonomy inspection
#[derive(Parser, Debug, Clone)]
pub struct TaxonomyArgs {
    /// Generate the taxonomy from a JSON map of category name to keywords
    #[arg(long, value_name = "KEYWORDS_FILE")]
    pub generate_from: Option<PathBuf>,

    /// Overwrite an existing taxonomy when generating
    #[arg(long, requires = "generate_from")]
    pub force: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
