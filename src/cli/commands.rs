//! Command implementations for the txcat CLI.

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::batch::get_statistics;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::CategorizerConfig;
use crate::error::{Result, TxcatError};
use crate::ml::{Trainer, load_training_data};
use crate::predict::{Categorizer, PredictionResult};
use crate::taxonomy::{Category, Taxonomy};

/// Execute a CLI command.
pub fn execute_command(args: TxcatArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    match &args.command {
        Command::Train(train_args) => train_model(train_args, &config, &args),
        Command::Predict(predict_args) => predict_texts(predict_args, &config, &args),
        Command::Batch(batch_args) => run_batch(batch_args, &config, &args),
        Command::Taxonomy(taxonomy_args) => show_taxonomy(taxonomy_args, &config, &args),
    }
}

/// Load the configuration file, if any, and apply command line overrides.
pub fn resolve_config(args: &TxcatArgs) -> Result<CategorizerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            CategorizerConfig::load(path)?
        }
        None => CategorizerConfig::default(),
    };
    if let Some(dir) = &args.models_dir {
        config.models_directory = dir.clone();
    }
    if let Some(path) = &args.taxonomy {
        config.taxonomy_path = path.clone();
    }
    Ok(config)
}

/// Train a model and write its artifacts and metrics.
fn train_model(args: &TrainArgs, config: &CategorizerConfig, cli_args: &TxcatArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Loading training data from: {}", args.data_file.display());
    }

    let examples = load_training_data(&args.data_file)?;
    let mut training = config.training.clone();
    if let Some(folds) = args.cv_folds {
        training.cv_folds = folds;
    }
    if let Some(trees) = args.trees {
        training.forest.n_estimators = trees;
    }

    let (model, report) = Trainer::new(training).train(&examples)?;
    model.save(&config.models_directory)?;

    let outputs = args
        .outputs_dir
        .clone()
        .unwrap_or_else(|| config.outputs_directory.clone());
    fs::create_dir_all(&outputs)?;
    let metrics_path = outputs.join("metrics.json");
    fs::write(&metrics_path, serde_json::to_string_pretty(&report.metrics)?)?;
    info!("Metrics written to {}", metrics_path.display());

    output_result(
        &format!(
            "Model trained on {} transactions and saved to {}",
            examples.len(),
            config.models_directory.display()
        ),
        &report,
        cli_args,
    )
}

/// Categorize texts given on the command line.
fn predict_texts(
    args: &PredictArgs,
    config: &CategorizerConfig,
    cli_args: &TxcatArgs,
) -> Result<()> {
    let categorizer = Categorizer::from_config(config)?;
    let results: Vec<PredictionResult> = args
        .texts
        .iter()
        .map(|text| categorizer.predict(text, args.explain))
        .collect();

    output_result("Predictions", &results, cli_args)
}

/// Categorize every description of an input file.
fn run_batch(args: &BatchArgs, config: &CategorizerConfig, cli_args: &TxcatArgs) -> Result<()> {
    let mut batch = config.batch.clone();
    if args.sequential {
        batch.parallel = false;
    }
    let categorizer = Categorizer::from_config(config)?.with_batch_config(batch);

    let texts = read_descriptions(&args.input_file)?;
    if cli_args.verbosity() > 1 {
        println!(
            "Processing {} transactions from: {}",
            texts.len(),
            args.input_file.display()
        );
    }

    let run = categorizer.run_batch(&texts);
    let statistics = get_statistics(&run.results);

    output_result(
        "Batch prediction complete",
        &BatchReport {
            input_file: args.input_file.display().to_string(),
            total_transactions: run.results.len(),
            duration_ms: run.elapsed.as_millis() as u64,
            transactions_per_second: run.throughput,
            statistics,
            results: args.results.then_some(run.results),
        },
        cli_args,
    )
}

/// Descriptions from a JSON/JSONL record file or a plain text file with one
/// description per non-empty line.
pub fn read_descriptions(path: &Path) -> Result<Vec<String>> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json") || e.eq_ignore_ascii_case("jsonl"));

    if is_json {
        #[derive(Deserialize)]
        struct Record {
            description: String,
        }

        let content = fs::read_to_string(path)?;
        let records: Vec<Record> = if content.trim_start().starts_with('[') {
            serde_json::from_str(&content)?
        } else {
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str)
                .collect::<std::result::Result<_, _>>()?
        };
        return Ok(records.into_iter().map(|r| r.description).collect());
    }

    Ok(fs::read_to_string(path)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// One entry of a keyword file used to generate a taxonomy.
#[derive(Debug, Deserialize)]
struct KeywordGroup {
    name: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Show the taxonomy, or generate it from a keyword file first.
fn show_taxonomy(
    args: &TaxonomyArgs,
    config: &CategorizerConfig,
    cli_args: &TxcatArgs,
) -> Result<()> {
    let path = &config.taxonomy_path;

    if let Some(source) = &args.generate_from {
        if path.exists() && !args.force {
            return Err(TxcatError::invalid_argument(format!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            )));
        }

        let groups: Vec<KeywordGroup> = serde_json::from_str(&fs::read_to_string(source)?)?;
        let taxonomy = Taxonomy::new(
            groups
                .into_iter()
                .map(|g| Category::new(g.name, g.keywords))
                .collect(),
        )?;
        taxonomy.save_yaml(path)?;

        return output_result(
            &format!("Generated taxonomy configuration at {}", path.display()),
            &TaxonomySummary::new(path, &taxonomy),
            cli_args,
        );
    }

    let taxonomy = Taxonomy::load_or_empty(path)?;
    output_result("Taxonomy", &TaxonomySummary::new(path, &taxonomy), cli_args)
}
