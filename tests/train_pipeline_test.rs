//! File-backed end-to-end: train -> deploy -> predict -> retrain
//!
//! Toyota Way: Genchi Genbutsu (exercise the on-disk stores, not mocks)

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use churn_guard::config::AppConfig;
use churn_guard::context::ServiceContext;
use churn_guard::deploy::{DeploymentOutcome, PredictionOutcome};
use churn_guard::experiment::{FileRunRepository, RunRepository, RunStatus, ViewType};
use churn_guard::registry::PRODUCTION_ALIAS;
use churn_guard::storage::{DataStore, ParquetDataStore, WriteMode};
use churn_guard::train::TrainingPipeline;

/// 40 customers; short-tenure monthly contracts churn.
fn customer_batch() -> RecordBatch {
    let n = 40_i64;
    let churned = |i: i64| (i % 4 != 0 && i < 20) || i % 7 == 0;
    let schema = Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("tenure", DataType::Int64, false),
        Field::new("monthly_charges", DataType::Float64, false),
        Field::new("contract", DataType::Utf8, false),
        Field::new("churn", DataType::Utf8, false),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from_iter_values(
                (0..n).map(|i| format!("2024-02-{:02}", i % 28 + 1)),
            )),
            Arc::new(Int64Array::from_iter_values(
                (0..n).map(|i| if churned(i) { i % 12 } else { 12 + i }),
            )),
            Arc::new(Float64Array::from_iter_values(
                (0..n).map(|i| 20.0 + (i % 9) as f64 * 7.5),
            )),
            Arc::new(StringArray::from_iter_values((0..n).map(|i| {
                if churned(i) {
                    "monthly"
                } else if i % 2 == 0 {
                    "one_year"
                } else {
                    "two_year"
                }
            }))),
            Arc::new(StringArray::from_iter_values(
                (0..n).map(|i| if churned(i) { "yes" } else { "no" }),
            )),
        ],
    )
    .unwrap()
}

fn file_context(dir: &std::path::Path) -> ServiceContext {
    let mut config = AppConfig::default();
    config.database.tracking.tracking_url = format!("file://{}", dir.join("mlruns").display());
    config.database.customer.database_path = dir.join("customer").display().to_string();
    ServiceContext::from_config(config).unwrap()
}

#[test]
fn test_train_deploy_predict_cycle_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let context = file_context(dir.path());
    context
        .data
        .push_table("processdata", customer_batch(), WriteMode::Replace)
        .unwrap();

    // Train
    let report = context.train().unwrap();
    assert!(report.train.accuracy > 0.8);
    let run = context.repository.get_run(&report.run_id).unwrap().unwrap();
    assert_eq!(run.status(), RunStatus::Success);
    assert!(run.ended_at().is_some());
    assert_eq!(run.metric("f1_score"), Some(report.test.f1));
    assert_eq!(run.tag("model_name"), Some("logistic_regression"));
    assert_eq!(run.params()["max_iterations"], "100");
    assert!(run.artifact_path().join("model/model.json").is_file());

    // Deploy
    let outcome = context.deploy();
    assert_eq!(outcome, DeploymentOutcome::FirstModel { model_version: 1 });

    // Predict
    assert_eq!(context.predict(), PredictionOutcome::Saved { rows: 40 });
    assert!(dir.path().join("customer/predictions.parquet").is_file());

    // Retrain on identical data: same model, so the gate cannot pass
    context.train().unwrap();
    let outcome = context.deploy();
    assert_eq!(outcome.deployed(), Some(false), "{outcome:?}");
    assert_eq!(outcome.model_version(), Some(2));

    // State survives a reopen
    let reopened = file_context(dir.path());
    let production = reopened
        .registry
        .get_model_version_by_alias("customerchurn", PRODUCTION_ALIAS)
        .unwrap()
        .unwrap();
    assert_eq!(production.version(), 1);
    assert_eq!(reopened.predict(), PredictionOutcome::Saved { rows: 40 });
    assert_eq!(reopened.data.pull_table("predictions").unwrap().num_rows(), 80);
}

#[test]
fn test_failed_training_run_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let repository = FileRunRepository::open(dir.path().join("mlruns")).unwrap();
    let data = ParquetDataStore::open(dir.path().join("customer")).unwrap();

    let err = TrainingPipeline::new(&repository, &data, Default::default())
        .run()
        .unwrap_err();
    assert!(err.to_string().contains("Table not found"));

    let experiment = repository.get_or_create_experiment("customer-churn").unwrap();
    let runs = repository
        .search_runs(experiment.experiment_id(), ViewType::ActiveOnly)
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status(), RunStatus::Failed);
}
