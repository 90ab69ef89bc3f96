//! Criterion benchmarks for txcat.
//!
//! Covers the hot paths of prediction:
//! - Text normalization and TF-IDF transformation
//! - Rule matching and model fallback
//! - Sequential and parallel batch prediction

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use txcat::analysis::normalize;
use txcat::batch::BatchConfig;
use txcat::ml::{ForestConfig, TrainConfig, TrainedModel, Trainer, TrainingExample};
use txcat::predict::Categorizer;
use txcat::taxonomy::{Category, Taxonomy};

const MERCHANTS: &[(&str, &[&str])] = &[
    ("Coffee/Dining", &["Starbucks", "Dunkin", "Pizza Hut", "Food Court"]),
    ("Fuel", &["Shell Gas", "Chevron", "Gas Station", "Fuel Stop"]),
    ("Groceries", &["Walmart", "Whole Foods", "Costco", "Supermarket"]),
    ("Transportation", &["Uber", "Lyft", "Metro Card", "Parking Fee"]),
    ("Utilities", &["Electric Bill", "Water Bill", "Internet Bill", "Phone Bill"]),
];

const SUFFIXES: &[&str] = &["", " Downtown", " Online", " #1042", " *Purchase", " Store"];

/// Generate labeled transactions for benchmarking.
fn generate_examples(count: usize) -> Vec<TrainingExample> {
    (0..count)
        .map(|i| {
            let (category, merchants) = MERCHANTS[i % MERCHANTS.len()];
            let merchant = merchants[(i * 7) % merchants.len()];
            let suffix = SUFFIXES[(i * 13) % SUFFIXES.len()];
            TrainingExample::new(format!("{merchant}{suffix}"), category)
        })
        .collect()
}

fn build_categorizer() -> Categorizer {
    let config = TrainConfig {
        forest: ForestConfig {
            n_estimators: 30,
            ..ForestConfig::default()
        },
        cv_folds: 2,
        ..TrainConfig::default()
    };
    let (model, _) = Trainer::new(config)
        .train(&generate_examples(500))
        .expect("training failed");

    let taxonomy = Taxonomy::new(vec![
        Category::new("Fuel", vec!["Shell Gas".to_string()]),
        Category::new("Transportation", vec!["Uber".to_string()]),
    ])
    .expect("invalid taxonomy");

    Categorizer::new(Arc::new(model), Arc::new(taxonomy)).expect("invalid categorizer")
}

fn bench_text_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_processing");
    let categorizer = build_categorizer();
    let model: &TrainedModel = categorizer.model();
    let texts: Vec<String> = generate_examples(100)
        .into_iter()
        .map(|e| e.description)
        .collect();

    group.bench_function("normalize_single", |b| {
        b.iter(|| black_box(normalize(black_box("  SQ *STARBUCKS #1042 Downtown "))))
    });

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("tfidf_transform_batch", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(model.vectorizer().transform(&normalize(text)));
            }
        })
    });

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");
    let categorizer = build_categorizer();

    group.bench_function("rule_match", |b| {
        b.iter(|| black_box(categorizer.predict(black_box("Shell Gas Station"), false)))
    });

    group.bench_function("model_fallback", |b| {
        b.iter(|| black_box(categorizer.predict(black_box("Whole Foods Online"), false)))
    });

    group.sample_size(10);
    group.bench_function("model_fallback_explained", |b| {
        b.iter(|| black_box(categorizer.predict(black_box("Whole Foods Online"), true)))
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(20);

    let parallel = build_categorizer();
    let sequential = parallel.clone().with_batch_config(BatchConfig {
        parallel: false,
        ..BatchConfig::default()
    });
    let texts: Vec<String> = generate_examples(1000)
        .into_iter()
        .map(|e| e.description)
        .collect();

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("parallel_batch_predict", |b| {
        b.iter(|| black_box(parallel.batch_predict(&texts)))
    });
    group.bench_function("sequential_batch_predict", |b| {
        b.iter(|| black_box(sequential.batch_predict(&texts)))
    });

    group.finish();
}

criterion_group!(benches, bench_text_processing, bench_prediction, bench_batch);
criterion_main!(benches);
