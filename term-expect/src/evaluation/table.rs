use crate::core::{EvaluationOutcome, ResultFormat};
use crate::formatters::OutcomeFormatter;
use crate::prelude::*;
use serde_json::Value;
use tracing::instrument;

/// The validated output of a table expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutput {
    /// Whether the expectation held
    pub success: bool,
    /// The observed table property, if the expectation reports one
    pub observed_value: Option<Value>,
}

impl TableOutput {
    /// Validates the raw JSON returned by a table expectation.
    pub fn from_raw(expectation: &str, raw: Value) -> Result<Self> {
        let success = raw
            .get("success")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                ExpectError::contract_violation(
                    expectation,
                    "table output must contain a boolean 'success'",
                )
            })?;

        let observed_value = raw
            .get("result_obj")
            .and_then(|result| result.get("observed_value"))
            .cloned();

        Ok(Self {
            success,
            observed_value,
        })
    }
}

/// Evaluates a table-level expectation from its output.
#[instrument(skip(raw, result_format), fields(expectation = %expectation))]
pub fn evaluate_table(
    expectation: &str,
    raw: Value,
    result_format: &ResultFormat,
) -> Result<EvaluationOutcome> {
    let output = TableOutput::from_raw(expectation, raw)?;
    Ok(OutcomeFormatter::format_table(
        result_format,
        output.success,
        output.observed_value,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_outcome() {
        let outcome = evaluate_table(
            "expect_table_row_count_to_equal",
            json!({"success": true, "result_obj": {"observed_value": 10}}),
            &ResultFormat::basic(),
        )
        .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.observed_value(), Some(&json!(10)));
    }

    #[test]
    fn test_missing_success_is_contract_violation() {
        let err = evaluate_table("custom", json!({"ok": true}), &ResultFormat::basic()).unwrap_err();
        assert!(matches!(err, ExpectError::ContractViolation { .. }));
    }
}
