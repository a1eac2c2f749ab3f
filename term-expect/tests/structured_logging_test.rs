//! Tests that logging settings change what is emitted.

mod common;

use common::{memory_backend_for, readings_batch, sql_backend_for};
use serde_json::json;
use std::sync::{Arc, Mutex};
use term_expect::core::{Dataset, DatasetConfig};
use term_expect::logging::LogConfig;

/// Test helper to capture structured logs
#[derive(Clone, Default)]
struct LogCapture {
    logs: Arc<Mutex<Vec<String>>>,
}

impl LogCapture {
    fn captured(&self) -> String {
        self.logs.lock().unwrap().join("")
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(buf).to_string());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_subscriber(capture: &LogCapture) -> impl tracing::Subscriber + Send + Sync {
    let writer = capture.clone();
    tracing_subscriber::fmt()
        .json()
        .with_writer(move || writer.clone())
        .with_env_filter("term_expect=debug")
        .finish()
}

async fn run_between(dataset: &Dataset) {
    dataset
        .expect_column_values_to_be_between("x", Some(json!(1)), Some(json!(9)), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_logging_follows_backend_config() {
    let quiet = LogCapture::default();
    {
        let _guard = tracing::subscriber::set_default(capture_subscriber(&quiet));
        let backend = sql_backend_for(readings_batch()).await;
        run_between(&Dataset::new(Arc::new(backend), DatasetConfig::default())).await;
    }
    let quiet = quiet.captured();
    assert!(!quiet.contains("Executing query"));
    assert!(!quiet.contains("Computed map counts"));

    let verbose = LogCapture::default();
    {
        let _guard = tracing::subscriber::set_default(capture_subscriber(&verbose));
        let backend = sql_backend_for(readings_batch())
            .await
            .with_log_config(LogConfig::verbose());
        run_between(&Dataset::new(Arc::new(backend), DatasetConfig::default())).await;
    }
    let verbose = verbose.captured();
    assert!(verbose.contains(r#""message":"Executing query""#));
    assert!(verbose.contains("SUM(CASE WHEN"));
    assert!(verbose.contains(r#""message":"Computed map counts""#));
}

#[tokio::test]
async fn test_query_text_is_truncated() {
    let capture = LogCapture::default();
    {
        let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));
        let backend = sql_backend_for(readings_batch()).await.with_log_config(LogConfig {
            max_field_length: 16,
            ..LogConfig::verbose()
        });
        run_between(&Dataset::new(Arc::new(backend), DatasetConfig::default())).await;
    }
    let logs = capture.captured();
    assert!(logs.contains("...(truncated)"));
    assert!(!logs.contains("SUM(CASE WHEN"));
}

#[tokio::test]
async fn test_evaluation_details_on_memory_backend() {
    let capture = LogCapture::default();
    {
        let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));
        let backend = memory_backend_for(readings_batch()).with_log_config(LogConfig::verbose());
        run_between(&Dataset::new(Arc::new(backend), DatasetConfig::default())).await;
    }
    let logs = capture.captured();
    assert!(logs.contains(r#""message":"Scanning batches""#));
    assert!(logs.contains(r#""operation":"count_and_null_and_unexpected""#));
}

#[tokio::test]
async fn test_failure_logging_follows_dataset_config() {
    let enabled = LogCapture::default();
    {
        let _guard = tracing::subscriber::set_default(capture_subscriber(&enabled));
        let backend = memory_backend_for(readings_batch());
        run_between(&Dataset::new(Arc::new(backend), DatasetConfig::default())).await;
    }
    let enabled = enabled.captured();
    assert!(enabled.contains(r#""level":"WARN""#));
    assert!(enabled.contains(r#""message":"Expectation failed""#));

    let disabled = LogCapture::default();
    {
        let _guard = tracing::subscriber::set_default(capture_subscriber(&disabled));
        let backend = memory_backend_for(readings_batch());
        let config = DatasetConfig::default().with_log_failures(false);
        run_between(&Dataset::new(Arc::new(backend), config)).await;
    }
    assert!(!disabled.captured().contains("Expectation failed"));
}
