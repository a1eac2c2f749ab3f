use crate::backend::BackendAdapter;
use crate::core::{EvaluationOutcome, ResultFormat, ResultFormatLevel};
use crate::formatters::OutcomeFormatter;
use crate::prelude::*;
use serde_json::Value;
use tracing::{debug, instrument};

/// The validated output of an aggregate statistic implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticOutput {
    /// Whether the statistic satisfied the expectation
    pub success: bool,
    /// The computed statistic; `null` when the backend returned none
    pub observed_value: Value,
    /// Optional implementation-specific details
    pub details: Option<Value>,
}

impl StatisticOutput {
    /// Validates the raw JSON returned by an aggregate implementation.
    ///
    /// The value must be an object with a boolean `success` and a
    /// `result_obj` object carrying `observed_value` (which may be null).
    pub fn from_raw(expectation: &str, raw: Value) -> Result<Self> {
        let Value::Object(mut object) = raw else {
            return Err(ExpectError::contract_violation(
                expectation,
                "statistic output must be a JSON object",
            ));
        };

        let success = match object.remove("success") {
            Some(Value::Bool(success)) => success,
            Some(other) => {
                return Err(ExpectError::contract_violation(
                    expectation,
                    format!("'success' must be a boolean, got {other}"),
                ))
            }
            None => {
                return Err(ExpectError::contract_violation(
                    expectation,
                    "statistic output is missing 'success'",
                ))
            }
        };

        let Some(Value::Object(mut result_obj)) = object.remove("result_obj") else {
            return Err(ExpectError::contract_violation(
                expectation,
                "statistic output is missing a 'result_obj' object",
            ));
        };

        let observed_value = result_obj.remove("observed_value").ok_or_else(|| {
            ExpectError::contract_violation(
                expectation,
                "'result_obj' is missing 'observed_value'",
            )
        })?;

        let details = result_obj.remove("details").filter(|d| !d.is_null());

        Ok(Self {
            success,
            observed_value,
            details,
        })
    }
}

/// Evaluates a column aggregate expectation from its statistic output.
///
/// The raw output is validated first, so a malformed implementation fails
/// with a contract violation at every verbosity. Counts are fetched only at
/// `BASIC` and above.
#[instrument(
    skip(backend, raw, result_format),
    fields(backend = backend.name(), expectation = %expectation, column = %column)
)]
pub async fn evaluate_aggregate(
    backend: &dyn BackendAdapter,
    expectation: &str,
    column: &str,
    raw: Value,
    result_format: &ResultFormat,
) -> Result<EvaluationOutcome> {
    let output = StatisticOutput::from_raw(expectation, raw)?;

    if result_format.level == ResultFormatLevel::BooleanOnly {
        return Ok(EvaluationOutcome::boolean(output.success));
    }

    let counts = backend.count_and_null(column).await?;
    debug!(
        observed_value = %output.observed_value,
        element_count = counts.element_count,
        null_count = counts.null_count,
        success = output.success,
        "Evaluated aggregate expectation"
    );

    Ok(OutcomeFormatter::format_aggregate(
        result_format,
        output.success,
        output.observed_value,
        counts.element_count,
        counts.null_count,
        output.details,
    ))
}
