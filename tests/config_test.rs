//! Configuration loading from YAML files

use std::io::Write;

use churn_guard::config::{load_config, AppConfig, TESTING_ENV};
use churn_guard::Error;

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("parameters.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_full_config() {
    let dir = tempfile::tempdir().unwrap();
    let processed = dir.path().join("processed");
    let yaml = format!(
        r"
base:
  random_state: 11
database:
  customer:
    database_path: {customer}
    prediction_logs: prediction_log
  tracking:
    tracking_url: file://{mlruns}
data:
  process:
    path: {processed}
hyperparameters:
  max_iterations: 250
  alpha: 0.1
  test_size: 0.2
deployment:
  model_name: churn-v2
  drop_columns: [date, customer_id]
server:
  port: 9000
",
        customer = dir.path().join("customer").display(),
        mlruns = dir.path().join("mlruns").display(),
        processed = processed.display(),
    );
    let path = write_config(dir.path(), &yaml);

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.base.random_state, 11);
    assert_eq!(config.hyperparameters.max_iterations, 250);
    assert_eq!(config.tracking_root().unwrap(), dir.path().join("mlruns"));
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");

    let settings = config.deployment_settings();
    assert_eq!(settings.model_name, "churn-v2");
    assert_eq!(settings.drop_columns, vec!["date", "customer_id"]);
    assert_eq!(settings.label_column, "churn");
    assert_eq!(settings.prediction_table, "prediction_log");

    if std::env::var(TESTING_ENV).map_or(true, |v| v != "True") {
        assert!(processed.is_dir());
    }
}

#[test]
fn test_load_rejects_missing_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "base:\n  random_state: 1\n");

    let err = load_config(Some(&path)).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("Missing required section: database"));
}

#[test]
fn test_load_rejects_wrong_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "base:\n  random_state: forty-two\ndatabase: {}\ndata: {}\nhyperparameters: {}\n",
    );
    assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
}

#[test]
fn test_defaults_match_service_layout() {
    let config = AppConfig::default();
    assert_eq!(config.base.random_state, 42);
    assert_eq!(config.deployment.model_name, "customerchurn");
    assert_eq!(config.deployment.data_table, "processdata");
    assert_eq!(config.server.port, 8002);
    assert_eq!(
        config.database_dir().unwrap(),
        std::path::PathBuf::from("./data/customer")
    );
}
