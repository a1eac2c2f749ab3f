//! Expectation suites and validation reports.

use super::{EvaluationOutcome, ExpectationConfig, ResultFormat};
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered collection of expectation configs for one data asset.
///
/// A suite is usually accumulated by a [`Dataset`](super::Dataset) as
/// expectations are invoked, then saved as JSON and replayed later with
/// [`Dataset::validate`](super::Dataset::validate).
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use term_expect::core::{ExpectationConfig, ExpectationSuite};
///
/// let mut suite = ExpectationSuite::new("orders");
/// suite.add_expectation(
///     ExpectationConfig::new("expect_column_values_to_not_be_null")
///         .with_kwarg("column", json!("order_id")),
/// );
///
/// let json = suite.to_json().unwrap();
/// let restored = ExpectationSuite::from_json(&json).unwrap();
/// assert_eq!(restored, suite);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpectationSuite {
    /// Name of the data asset the suite describes
    #[serde(default)]
    pub data_asset_name: Option<String>,
    /// Expectation configs in insertion order
    #[serde(default)]
    pub expectations: Vec<ExpectationConfig>,
    /// Free-form annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ExpectationSuite {
    /// Creates an empty suite for a data asset.
    pub fn new(data_asset_name: impl Into<String>) -> Self {
        Self {
            data_asset_name: Some(data_asset_name.into()),
            expectations: Vec::new(),
            meta: None,
        }
    }

    /// Adds a config, replacing an earlier one of the same type on the same column.
    ///
    /// Returns true if an existing config was replaced.
    pub fn add_expectation(&mut self, config: ExpectationConfig) -> bool {
        if let Some(existing) = self
            .expectations
            .iter_mut()
            .find(|existing| existing.is_equivalent_to(&config))
        {
            *existing = config;
            true
        } else {
            self.expectations.push(config);
            false
        }
    }

    /// Removes configs of the given type and column. Returns how many were removed.
    pub fn remove_expectation(&mut self, expectation_type: &str, column: Option<&str>) -> usize {
        let before = self.expectations.len();
        self.expectations.retain(|config| {
            !(config.expectation_type == expectation_type && config.column() == column)
        });
        before - self.expectations.len()
    }

    /// Finds the config of the given type and column.
    pub fn find(&self, expectation_type: &str, column: Option<&str>) -> Option<&ExpectationConfig> {
        self.expectations.iter().find(|config| {
            config.expectation_type == expectation_type && config.column() == column
        })
    }

    /// Number of configs.
    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    /// Returns true if the suite holds no configs.
    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    /// Serializes the suite as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a suite from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Options for a validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateOptions {
    /// Overrides the result format of every expectation in the suite
    pub result_format: Option<ResultFormat>,
    /// Overrides the catch-exceptions mode of every expectation
    pub catch_exceptions: Option<bool>,
    /// Drop successful outcomes from the report (statistics still count them)
    pub only_return_failures: bool,
}

impl ValidateOptions {
    /// Creates options that keep every expectation's own settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the result format.
    pub fn with_result_format(mut self, result_format: impl Into<ResultFormat>) -> Self {
        self.result_format = Some(result_format.into());
        self
    }

    /// Overrides catch-exceptions mode.
    pub fn with_catch_exceptions(mut self, enabled: bool) -> Self {
        self.catch_exceptions = Some(enabled);
        self
    }

    /// Keeps only failed outcomes in the report.
    pub fn only_failures(mut self) -> Self {
        self.only_return_failures = true;
        self
    }
}

/// Aggregate counts over a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationStatistics {
    /// Expectations evaluated
    pub evaluated_expectations: usize,
    /// Expectations that held
    pub successful_expectations: usize,
    /// Expectations that failed, including captured exceptions
    pub unsuccessful_expectations: usize,
    /// `successful / evaluated * 100`, `None` for an empty run
    pub success_percent: Option<f64>,
}

impl ValidationStatistics {
    /// Computes statistics from a list of outcomes.
    pub fn from_outcomes(outcomes: &[EvaluationOutcome]) -> Self {
        let evaluated = outcomes.len();
        let successful = outcomes.iter().filter(|o| o.success).count();
        Self {
            evaluated_expectations: evaluated,
            successful_expectations: successful,
            unsuccessful_expectations: evaluated - successful,
            success_percent: (evaluated > 0)
                .then(|| successful as f64 / evaluated as f64 * 100.0),
        }
    }
}

/// The result of validating a dataset against a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True if every expectation held
    pub success: bool,
    /// One outcome per expectation, in suite order
    pub results: Vec<EvaluationOutcome>,
    /// Run statistics
    pub statistics: ValidationStatistics,
    /// Run metadata (data asset, suite meta, validation time)
    pub meta: Value,
}

impl ValidationReport {
    /// Returns the failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &EvaluationOutcome> {
        self.results.iter().filter(|outcome| !outcome.success)
    }

    /// Serializes the report as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(expectation: &str, column: &str) -> ExpectationConfig {
        ExpectationConfig::new(expectation).with_kwarg("column", json!(column))
    }

    #[test]
    fn test_add_replaces_equivalent() {
        let mut suite = ExpectationSuite::new("orders");
        assert!(!suite.add_expectation(config("expect_column_values_to_be_null", "a")));
        assert!(!suite.add_expectation(config("expect_column_values_to_be_null", "b")));
        assert!(suite.add_expectation(
            config("expect_column_values_to_be_null", "a").with_kwarg("mostly", json!(0.9))
        ));

        assert_eq!(suite.len(), 2);
        let replaced = suite
            .find("expect_column_values_to_be_null", Some("a"))
            .unwrap();
        assert_eq!(replaced.kwargs.get("mostly"), Some(&json!(0.9)));
    }

    #[test]
    fn test_remove_expectation() {
        let mut suite = ExpectationSuite::new("orders");
        suite.add_expectation(config("expect_column_to_exist", "a"));
        suite.add_expectation(ExpectationConfig::new("expect_table_row_count_to_equal"));

        assert_eq!(suite.remove_expectation("expect_table_row_count_to_equal", None), 1);
        assert_eq!(suite.remove_expectation("expect_column_to_exist", Some("b")), 0);
        assert_eq!(suite.len(), 1);
    }

    #[test]
    fn test_suite_from_json() {
        let suite = ExpectationSuite::from_json(
            r#"{
                "data_asset_name": "orders",
                "expectations": [
                    {"expectation_type": "expect_table_row_count_to_equal", "kwargs": {"value": 10}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(suite.data_asset_name.as_deref(), Some("orders"));
        assert_eq!(suite.expectations[0].kwargs["value"], json!(10));

        assert!(matches!(
            ExpectationSuite::from_json("{not json"),
            Err(ExpectError::Serialization(_))
        ));
    }

    #[test]
    fn test_statistics() {
        let outcomes = vec![
            EvaluationOutcome::boolean(true),
            EvaluationOutcome::boolean(false),
            EvaluationOutcome::boolean(true),
            EvaluationOutcome::boolean(true),
        ];
        let stats = ValidationStatistics::from_outcomes(&outcomes);
        assert_eq!(stats.evaluated_expectations, 4);
        assert_eq!(stats.successful_expectations, 3);
        assert_eq!(stats.unsuccessful_expectations, 1);
        assert_eq!(stats.success_percent, Some(75.0));

        assert_eq!(ValidationStatistics::from_outcomes(&[]).success_percent, None);
    }
}
