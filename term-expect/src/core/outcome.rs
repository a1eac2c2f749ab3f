//! The normalized result of evaluating one expectation.

use super::ExpectationConfig;
use crate::error::ExpectError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result object of a column map expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapResult {
    /// Total number of rows
    pub element_count: u64,
    /// Rows where the column is null
    pub missing_count: u64,
    /// `missing_count / element_count`, `None` for an empty table
    pub missing_percent: Option<f64>,
    /// Rows that violate the expectation
    pub unexpected_count: u64,
    /// `unexpected_count` over the evaluated rows, `None` when there were none
    pub unexpected_percent: Option<f64>,
    /// A bounded sample of violating values
    pub partial_unexpected_list: Vec<Value>,
    /// The sample grouped by value (SUMMARY and above)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_unexpected_counts: Option<Vec<ValueCount>>,
}

/// How often a value occurs in the unexpected sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    /// The sampled value
    pub value: Value,
    /// Occurrences within the sample
    pub count: u64,
}

/// The result object of a column aggregate expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// The computed statistic, `null` when the backend returned none
    pub observed_value: Value,
    /// Total number of rows
    pub element_count: u64,
    /// Rows where the column is null
    pub missing_count: u64,
    /// `missing_count / element_count`, `None` for an empty table
    pub missing_percent: Option<f64>,
    /// Implementation-specific details (SUMMARY and above)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// The result object of a table-level expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    /// The observed table property (e.g. the row count)
    pub observed_value: Value,
}

/// Kind-specific payload of an [`EvaluationOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultObject {
    /// Column map payload
    Map(MapResult),
    /// Column aggregate payload
    Aggregate(AggregateResult),
    /// Table payload
    Table(TableResult),
}

/// Details about a backend failure captured in catch-exceptions mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    /// Always true when present
    pub raised_exception: bool,
    /// The top-level error message
    pub exception_message: Option<String>,
    /// The error and its chain of causes
    pub exception_traceback: Option<String>,
}

impl ExceptionInfo {
    /// Captures an error.
    pub fn from_error(err: &ExpectError) -> Self {
        Self {
            raised_exception: true,
            exception_message: Some(err.to_string()),
            exception_traceback: Some(err.chain()),
        }
    }
}

/// The universal outcome shape returned for every expectation invocation.
///
/// `success` is always present. The remaining fields are omitted from the
/// serialized form when absent, so a `BOOLEAN_ONLY` outcome serializes to
/// exactly `{"success": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// Whether the expectation held
    pub success: bool,
    /// Counts, samples and observed values (BASIC and above)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_obj: Option<ResultObject>,
    /// The evaluated config, when `include_config` was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation_config: Option<ExpectationConfig>,
    /// Caller annotations, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Present when a backend error was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_info: Option<ExceptionInfo>,
}

impl EvaluationOutcome {
    /// Creates an outcome carrying only `success`.
    pub fn boolean(success: bool) -> Self {
        Self {
            success,
            result_obj: None,
            expectation_config: None,
            meta: None,
            exception_info: None,
        }
    }

    /// Creates an outcome with a result object.
    pub fn with_result(success: bool, result_obj: ResultObject) -> Self {
        Self {
            result_obj: Some(result_obj),
            ..Self::boolean(success)
        }
    }

    /// Creates the failed outcome recorded for a captured backend error.
    pub fn from_exception(err: &ExpectError) -> Self {
        Self {
            exception_info: Some(ExceptionInfo::from_error(err)),
            ..Self::boolean(false)
        }
    }

    /// Returns true if the expectation held.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns true if a backend error was captured.
    pub fn raised_exception(&self) -> bool {
        self.exception_info
            .as_ref()
            .is_some_and(|info| info.raised_exception)
    }

    /// Returns the map payload, if this is a map outcome at BASIC or above.
    pub fn map_result(&self) -> Option<&MapResult> {
        match &self.result_obj {
            Some(ResultObject::Map(result)) => Some(result),
            _ => None,
        }
    }

    /// Returns the aggregate payload, if this is an aggregate outcome at BASIC or above.
    pub fn aggregate_result(&self) -> Option<&AggregateResult> {
        match &self.result_obj {
            Some(ResultObject::Aggregate(result)) => Some(result),
            _ => None,
        }
    }

    /// Returns the observed value of an aggregate or table outcome.
    pub fn observed_value(&self) -> Option<&Value> {
        match &self.result_obj {
            Some(ResultObject::Aggregate(result)) => Some(&result.observed_value),
            Some(ResultObject::Table(result)) => Some(&result.observed_value),
            _ => None,
        }
    }

    /// Returns the serialized top-level and `result_obj` field names, sorted.
    ///
    /// Result fields are prefixed with `result_obj.`.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(Value::Object(map)) = serde_json::to_value(self) {
            for (key, value) in map {
                if key == "result_obj" {
                    if let Value::Object(inner) = value {
                        names.extend(inner.keys().map(|k| format!("result_obj.{k}")));
                    }
                }
                names.push(key);
            }
        }
        names.sort();
        names
    }
}
