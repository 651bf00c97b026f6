//! Selection and scoring benchmarks
//!
//! - Candidate ranking across run collections
//! - ROC AUC over validation-sized score vectors
//! - Model scoring of feature records
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::array;

use churn_guard::data::{FeatureRecord, FeatureValue};
use churn_guard::deploy::selector::rank_candidates;
use churn_guard::deploy::CandidateSummary;
use churn_guard::metrics::roc_auc_score;
use churn_guard::model::{ChurnModel, DictVectorizer, Standardizer};

/// Candidates with repeating f1 values so ties exercise the latency key
#[allow(clippy::cast_precision_loss)]
fn create_candidates(n: usize) -> Vec<CandidateSummary> {
    (0..n)
        .map(|i| CandidateSummary {
            run_id: format!("run-{i}"),
            experiment_id: format!("exp-{}", i % 4),
            f1_score: (i % 50) as f64 / 50.0,
            accuracy_score: 0.0,
            precision_score: 0.0,
            recall_score: 0.0,
            inference_time: ((i * 7919) % 1000) as f64 / 100.0,
            model_name: "logistic_regression".to_string(),
            artifact_uri: String::new(),
        })
        .collect()
}

fn bench_rank_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_candidates");

    for size in [10, 100, 1_000, 10_000] {
        let candidates = create_candidates(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &candidates, |b, cands| {
            b.iter(|| {
                let mut ranked = cands.clone();
                rank_candidates(black_box(&mut ranked));
                ranked
            });
        });
    }

    group.finish();
}

#[allow(clippy::cast_precision_loss)]
fn bench_roc_auc(c: &mut Criterion) {
    let mut group = c.benchmark_group("roc_auc");

    for size in [100, 10_000] {
        let labels: Vec<bool> = (0..size).map(|i| i % 3 == 0).collect();
        let scores: Vec<f64> = (0..size).map(|i| ((i * 31) % 97) as f64 / 97.0).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| roc_auc_score(black_box(&labels), black_box(&scores)));
        });
    }

    group.finish();
}

#[allow(clippy::cast_precision_loss)]
fn bench_predict_proba(c: &mut Criterion) {
    let template = vec![FeatureRecord::from([
        ("tenure".to_string(), FeatureValue::Number(0.0)),
        ("contract".to_string(), FeatureValue::Text("monthly".to_string())),
    ])];
    let vectorizer = DictVectorizer::fit(&template);
    let model = ChurnModel::new(
        vectorizer,
        Standardizer::fit(&array![[0.0, 0.0]]),
        vec![0.8, -0.05],
        0.1,
    )
    .unwrap();

    let records: Vec<FeatureRecord> = (0..10_000)
        .map(|i| {
            FeatureRecord::from([
                ("tenure".to_string(), FeatureValue::Number(f64::from(i % 72))),
                ("contract".to_string(), FeatureValue::Text("monthly".to_string())),
            ])
        })
        .collect();

    c.bench_function("predict_proba_10k", |b| {
        b.iter(|| model.predict_proba(black_box(&records)));
    });
}

criterion_group!(benches, bench_rank_candidates, bench_roc_auc, bench_predict_proba);
criterion_main!(benches);
