//! Suite capture, persistence and replay.

mod common;

use common::{datasets, memory_backend_for, readings_batch, sql_backend_for};
use serde_json::json;
use std::sync::Arc;
use term_expect::core::{ExpectationConfig, ExpectationSuite, ResultFormat};
use term_expect::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ReportFormatter};
use term_expect::prelude::*;

fn readings_suite() -> ExpectationSuite {
    let mut suite = ExpectationSuite::new("readings");
    suite.meta = Some(json!({"owner": "quality-team"}));

    for (name, kwargs) in [
        ("expect_table_row_count_to_be_between", json!({"min_value": 5, "max_value": 20})),
        ("expect_column_to_exist", json!({"column": "status"})),
        ("expect_column_values_to_not_be_null", json!({"column": "x", "mostly": 0.9})),
        (
            "expect_column_values_to_be_in_set",
            json!({"column": "status", "values_set": ["ok", "warn"]}),
        ),
        (
            "expect_column_values_to_match_regex",
            json!({"column": "code", "regex": "^[A-C]-[0-9]+$"}),
        ),
        (
            "expect_column_mean_to_be_between",
            json!({"column": "ratio", "min_value": 1, "max_value": 5}),
        ),
        ("expect_column_max_to_be_between", json!({"column": "level", "max_value": 2})),
    ] {
        let config = ExpectationConfig::new(name);
        let kwargs = kwargs.as_object().cloned().unwrap();
        suite.add_expectation(ExpectationConfig { kwargs, ..config });
    }
    suite
}

#[tokio::test]
async fn test_validation_report_statistics() {
    for (backend, dataset) in datasets(DatasetConfig::default()).await {
        let report = dataset
            .validate(&readings_suite(), ValidateOptions::new())
            .await
            .unwrap();

        assert!(!report.success, "{backend}");
        assert_eq!(report.statistics.evaluated_expectations, 7, "{backend}");
        assert_eq!(report.statistics.successful_expectations, 5, "{backend}");
        assert_eq!(report.statistics.unsuccessful_expectations, 2, "{backend}");
        let percent = report.statistics.success_percent.unwrap();
        assert!((percent - 500.0 / 7.0).abs() < 1e-9, "{backend}");

        let failed: Vec<_> = report
            .failures()
            .map(|outcome| outcome.expectation_config.as_ref().unwrap().expectation_type.as_str())
            .collect();
        assert_eq!(
            failed,
            vec![
                "expect_column_values_to_be_in_set",
                "expect_column_max_to_be_between"
            ],
            "{backend}"
        );

        assert_eq!(report.meta["data_asset_name"], json!("readings"));
        assert_eq!(report.meta["expectation_suite_meta"], json!({"owner": "quality-team"}));
        assert!(report.meta["validation_time"].is_string());
    }
}

#[tokio::test]
async fn test_validation_is_deterministic() {
    for (backend, dataset) in datasets(DatasetConfig::default()).await {
        let suite = readings_suite();
        let first = dataset.validate(&suite, ValidateOptions::new()).await.unwrap();
        let second = dataset.validate(&suite, ValidateOptions::new()).await.unwrap();

        assert_eq!(first.results, second.results, "{backend}");
        assert_eq!(first.statistics, second.statistics, "{backend}");
    }
}

#[tokio::test]
async fn test_backends_agree_on_every_result() {
    let suite = readings_suite();
    let options = ValidateOptions::new().with_result_format(ResultFormat::complete());

    let sql = Dataset::new(
        Arc::new(sql_backend_for(readings_batch()).await),
        DatasetConfig::default(),
    );
    let memory = Dataset::new(
        Arc::new(memory_backend_for(readings_batch())),
        DatasetConfig::default(),
    );

    let from_sql = sql.validate(&suite, options.clone()).await.unwrap();
    let from_memory = memory.validate(&suite, options).await.unwrap();
    assert_eq!(from_sql.results, from_memory.results);
}

#[tokio::test]
async fn test_captured_suite_round_trips_through_json() {
    let mut pairs = datasets(DatasetConfig::default()).await;
    let (_, memory) = pairs.pop().unwrap();
    let (_, sql) = pairs.pop().unwrap();

    memory
        .expect_column_values_to_be_between("x", Some(json!(1)), Some(json!(9)), Some(0.8))
        .await
        .unwrap();
    memory
        .expect(
            "expect_column_values_to_not_be_in_set",
            json!({"column": "status", "values_set": ["fail"], "result_format": "COMPLETE"}),
        )
        .await
        .unwrap();
    memory.expect_table_row_count_to_equal(10).await.unwrap();

    let saved = memory.expectation_suite().to_json().unwrap();
    let restored = ExpectationSuite::from_json(&saved).unwrap();
    assert_eq!(restored, memory.expectation_suite());
    assert!(restored
        .expectations
        .iter()
        .all(|config| !config.kwargs.contains_key("result_format")));

    let report = sql.validate(&restored, ValidateOptions::new()).await.unwrap();
    assert_eq!(report.statistics.evaluated_expectations, 3);
    assert_eq!(report.statistics.successful_expectations, 2);
    assert!(sql.expectation_suite().is_empty());
}

#[tokio::test]
async fn test_validate_overrides_and_failure_filter() {
    for (backend, dataset) in datasets(DatasetConfig::default()).await {
        let options = ValidateOptions::new()
            .with_result_format(ResultFormat::boolean_only())
            .only_failures();
        let report = dataset.validate(&readings_suite(), options).await.unwrap();

        assert_eq!(report.results.len(), 2, "{backend}");
        assert_eq!(report.statistics.evaluated_expectations, 7, "{backend}");
        for outcome in &report.results {
            assert!(outcome.result_obj.is_none(), "{backend}");
            assert!(outcome.expectation_config.is_some(), "{backend}");
        }
    }
}

#[tokio::test]
async fn test_unknown_expectation_in_suite_aborts_validation() {
    let mut suite = readings_suite();
    suite.add_expectation(
        ExpectationConfig::new("expect_column_values_to_be_dateutil_parseable")
            .with_kwarg("column", json!("code")),
    );

    for (_, dataset) in datasets(DatasetConfig::lenient()).await {
        let err = dataset
            .validate(&suite, ValidateOptions::new().with_catch_exceptions(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ExpectError::Configuration(_)));
    }
}

#[tokio::test]
async fn test_reports_render() {
    let (_, dataset) = datasets(DatasetConfig::default()).await.pop().unwrap();
    let report = dataset
        .validate(&readings_suite(), ValidateOptions::new())
        .await
        .unwrap();

    let text = HumanFormatter::with_config(FormatterConfig::ci())
        .format(&report)
        .unwrap();
    assert!(text.contains("Validation FAILED"));
    assert!(text.contains("Data asset: readings"));
    assert!(text.contains("expect_column_values_to_be_in_set (status)"));
    assert!(text.contains("Unexpected: 1 (11.1%)"));
    assert!(text.contains("Observed: 3"));
    assert!(!text.contains("\x1b["));

    let json = JsonFormatter::new()
        .with_pretty(false)
        .format_with_config(&report, &FormatterConfig::default().with_statistics(false))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("statistics").is_none());
    assert_eq!(value["results"].as_array().unwrap().len(), 7);
}
