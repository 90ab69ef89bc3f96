use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tempfile::TempDir;
use txcat::batch::{BatchConfig, get_statistics};
use txcat::config::CategorizerConfig;
use txcat::error::{Result, TxcatError};
use txcat::explain::Explanation;
use txcat::ml::{ForestConfig, LogisticConfig, TrainConfig, TrainedModel, Trainer, TrainingExample};
use txcat::predict::{Categorizer, Method, REVIEW_THRESHOLD};
use txcat::rules::RULE_CONFIDENCE;
use txcat::taxonomy::{Category, Taxonomy};

const MERCHANTS: &[(&str, &[&str])] = &[
    ("Coffee/Dining", &["Starbucks", "Dunkin Donuts", "Pizza Hut", "Food Court", "Lunch"]),
    ("Fuel", &["Shell Gas", "Chevron", "BP Station", "Gas Station", "Fuel Stop"]),
    ("Groceries", &["Walmart", "Whole Foods", "Costco", "Supermarket", "Grocery Store"]),
    ("Transportation", &["Uber", "Lyft", "Metro Card", "Bus Pass", "Parking Fee"]),
    ("Utilities", &["Electric Bill", "Water Bill", "Internet Bill", "Phone Bill", "Gas Bill"]),
];

const NOISE: &[&str] = &["", " Downtown", " Online", " Store", " #123", " - Purchase"];

/// Deterministic synthetic transactions, 30 per category.
fn synthetic_examples() -> Vec<TrainingExample> {
    let mut examples = Vec::new();
    for (category, merchants) in MERCHANTS {
        for i in 0..30 {
            let merchant = merchants[i % merchants.len()];
            let noise = NOISE[(i / merchants.len() + i) % NOISE.len()];
            examples.push(TrainingExample::new(format!("{merchant}{noise}"), *category));
        }
    }
    examples
}

fn test_config() -> TrainConfig {
    TrainConfig {
        forest: ForestConfig {
            n_estimators: 20,
            ..ForestConfig::default()
        },
        logistic: LogisticConfig {
            max_iter: 300,
            ..LogisticConfig::default()
        },
        cv_folds: 3,
        ..TrainConfig::default()
    }
}

struct Fixture {
    _dir: TempDir,
    models: PathBuf,
    taxonomy: PathBuf,
}

/// Train once and persist model plus taxonomy into a temp directory.
fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let models = dir.path().join("models");
        let taxonomy = dir.path().join("config").join("taxonomy.yaml");

        let (model, _) = Trainer::new(test_config()).train(&synthetic_examples()).unwrap();
        model.save(&models).unwrap();

        Taxonomy::new(vec![
            Category::new("Fuel", vec!["Shell Gas".to_string(), "Chevron".to_string()]),
            Category::new("Transportation", vec!["Uber".to_string(), "Lyft".to_string()]),
        ])
        .unwrap()
        .save_yaml(&taxonomy)
        .unwrap();

        Fixture {
            _dir: dir,
            models,
            taxonomy,
        }
    })
}

fn config() -> CategorizerConfig {
    let fixture = fixture();
    CategorizerConfig {
        models_directory: fixture.models.clone(),
        taxonomy_path: fixture.taxonomy.clone(),
        ..CategorizerConfig::default()
    }
}

fn categorizer() -> Categorizer {
    Categorizer::from_config(&config()).unwrap()
}

#[test]
fn test_rule_match_scenario() {
    let result = categorizer().predict("Shell Gas Station", true);

    assert_eq!(result.category, "Fuel");
    assert_eq!(result.method, Method::RuleMatch);
    assert_eq!(result.confidence, RULE_CONFIDENCE);
    assert_eq!(result.matched_keyword.as_deref(), Some("Shell Gas"));
    assert!(!result.needs_review);
    assert!(result.probabilities.is_none());
    // rule matches are never explained
    assert!(result.explanation.is_none());
    assert_eq!(result.original_text, "Shell Gas Station");
}

#[test]
fn test_rule_match_ignores_noise_characters() {
    let result = categorizer().predict("  **UBER** #4411 ", false);
    assert_eq!(result.method, Method::RuleMatch);
    assert_eq!(result.category, "Transportation");
    assert_eq!(result.matched_keyword.as_deref(), Some("Uber"));
    assert_eq!(result.original_text, "  **UBER** #4411 ");
}

#[test]
fn test_model_scenario() {
    let categorizer = categorizer();
    for text in ["xyz123 unknown merchant", "Walmart Supermarket", "Electric Bill Online"] {
        let result = categorizer.predict(text, false);

        assert_eq!(result.method, Method::MlModel);
        assert!(result.matched_keyword.is_none());
        assert!(result.explanation.is_none());

        let probabilities = result.probabilities.as_ref().unwrap();
        assert_eq!(probabilities.len(), MERCHANTS.len());
        let sum: f64 = probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);

        let max = probabilities.values().cloned().fold(f64::MIN, f64::max);
        assert_eq!(result.confidence, max);
        assert_eq!(probabilities[&result.category], result.confidence);
        assert_eq!(result.needs_review, result.confidence < REVIEW_THRESHOLD);
    }

    assert_eq!(categorizer.predict("Walmart Supermarket", false).category, "Groceries");
    assert_eq!(categorizer.predict("Electric Bill Online", false).category, "Utilities");
}

#[test]
fn test_predictions_are_idempotent() {
    let categorizer = categorizer();
    for text in ["Starbucks Downtown", "Shell Gas", "Costco Online", ""] {
        assert_eq!(categorizer.predict(text, true), categorizer.predict(text, true));
    }
}

#[test]
fn test_explanation_for_model_prediction() {
    let result = categorizer().predict("Starbucks Coffee Downtown", true);
    assert_eq!(result.method, Method::MlModel);

    match result.explanation {
        Some(Explanation::Words {
            top_words,
            predicted_class,
        }) => {
            assert_eq!(predicted_class, result.category);
            assert!(!top_words.is_empty() && top_words.len() <= 5);
            for pair in top_words.windows(2) {
                assert!(pair[0].1.abs() >= pair[1].1.abs());
            }
        }
        other => panic!("expected word explanation, got {other:?}"),
    }
}

#[test]
fn test_explain_ignores_rules() {
    let categorizer = categorizer();
    let routed = categorizer.predict("Starbucks Coffee Downtown", true);
    assert_eq!(
        Some(categorizer.explain("Starbucks Coffee Downtown")),
        routed.explanation
    );

    // rule-matched text still gets a model explanation on request
    match categorizer.explain("Shell Gas Station") {
        Explanation::Words { top_words, .. } => assert!(!top_words.is_empty()),
        other => panic!("expected word explanation, got {other:?}"),
    }
}

#[test]
fn test_empty_text_explanation_fails_softly() {
    let result = categorizer().predict("", true);
    assert_eq!(result.method, Method::MlModel);
    assert!(matches!(result.explanation, Some(Explanation::Failed { .. })));
}

#[test]
fn test_missing_taxonomy_runs_model_only() {
    let config = CategorizerConfig {
        taxonomy_path: PathBuf::from("/nonexistent/taxonomy.yaml"),
        ..config()
    };
    let categorizer = Categorizer::from_config(&config).unwrap();
    assert!(categorizer.rules().is_empty());

    let result = categorizer.predict("Shell Gas Station", false);
    assert_eq!(result.method, Method::MlModel);
    assert_eq!(result.category, "Fuel");
    assert!(result.matched_keyword.is_none());
}

#[test]
fn test_missing_model_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = CategorizerConfig {
        models_directory: dir.path().join("models"),
        ..config()
    };
    match Categorizer::from_config(&config) {
        Err(TxcatError::ModelNotFound { .. }) => {}
        other => panic!("expected ModelNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_malformed_taxonomy_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxonomy.yaml");
    std::fs::write(&path, "categories: [name: {").unwrap();
    let config = CategorizerConfig {
        taxonomy_path: path,
        ..config()
    };
    assert!(Categorizer::from_config(&config).is_err());
}

#[test]
fn test_batch_preserves_order_and_matches_single_predictions() {
    let categorizer = categorizer();
    let texts: Vec<String> = synthetic_examples()
        .into_iter()
        .map(|e| e.description)
        .chain(["xyz123 unknown merchant".to_string(), String::new()])
        .collect();

    let parallel = categorizer.batch_predict(&texts);
    let sequential = categorizer
        .clone()
        .with_batch_config(BatchConfig {
            parallel: false,
            progress_interval: 50,
        })
        .batch_predict(&texts);

    assert_eq!(parallel.len(), texts.len());
    assert_eq!(parallel, sequential);
    for (text, result) in texts.iter().zip(&parallel) {
        assert_eq!(&result.original_text, text);
        assert!(result.explanation.is_none());
        assert_eq!(*result, categorizer.predict(text, false));
    }
}

#[test]
fn test_batch_statistics_consistency() {
    let categorizer = categorizer();
    let texts = [
        "Shell Gas Station",
        "Uber to airport",
        "xyz123 unknown merchant",
        "Walmart Downtown",
        "Chevron #44",
    ];
    let run = categorizer.run_batch(&texts);
    assert!(run.throughput >= 0.0);

    let stats = get_statistics(&run.results);
    assert_eq!(stats.total_predictions, texts.len());
    assert_eq!(stats.rule_matches, 3);
    assert_eq!(stats.rule_matches + stats.ml_predictions, stats.total_predictions);
    assert_eq!(
        stats.category_distribution.values().sum::<usize>(),
        stats.total_predictions
    );
    assert_eq!(
        stats.needs_review,
        run.results.iter().filter(|r| r.confidence < REVIEW_THRESHOLD).count()
    );
    assert!(stats.low_confidence_samples.len() <= 10);
    assert!(
        stats
            .low_confidence_samples
            .iter()
            .all(|s| s.confidence < REVIEW_THRESHOLD)
    );

    let mean = run.results.iter().map(|r| r.confidence).sum::<f64>() / texts.len() as f64;
    assert!((stats.avg_confidence - mean).abs() < 1e-12);
}

#[test]
fn test_empty_batch_statistics() {
    let run = categorizer().run_batch::<&str>(&[]);
    assert!(run.results.is_empty());

    let stats = get_statistics(&run.results);
    assert_eq!(stats.total_predictions, 0);
    assert_eq!(stats.rule_matches, 0);
    assert_eq!(stats.ml_predictions, 0);
    assert_eq!(stats.needs_review, 0);
    assert_eq!(stats.avg_confidence, 0.0);
    assert!(stats.category_distribution.is_empty());
    assert!(stats.low_confidence_samples.is_empty());
}

#[test]
fn test_shared_model_across_threads() -> Result<()> {
    let model = Arc::new(TrainedModel::load(&fixture().models)?);
    let taxonomy = Arc::new(Taxonomy::load(&fixture().taxonomy)?);
    let categorizer = Arc::new(Categorizer::new(model, taxonomy)?);

    let handles: Vec<_> = ["Lyft Online", "Costco Store", "Gas Bill"]
        .into_iter()
        .map(|text| {
            let categorizer = Arc::clone(&categorizer);
            std::thread::spawn(move || categorizer.predict(text, false))
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(!result.category.is_empty());
    }
    Ok(())
}
