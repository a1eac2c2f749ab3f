//! Built-in column map expectations.

use super::{check_parameter_type, Bounds, MapExpectation};
use crate::core::{
    ColumnInfo, CompareOp, Condition, ExpectationParams, Literal, NullPolicy, SemanticType,
};
use crate::prelude::*;
use serde_json::Value;

/// `expect_column_values_to_be_null`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesNull;

impl MapExpectation for ValuesNull {
    fn condition(&self, column: &ColumnInfo, _params: &ExpectationParams) -> Result<Condition> {
        Ok(Condition::is_not_null(&column.name))
    }

    fn null_policy(&self) -> NullPolicy {
        NullPolicy::IncludeNulls
    }
}

/// `expect_column_values_to_not_be_null`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesNotNull;

impl MapExpectation for ValuesNotNull {
    fn condition(&self, column: &ColumnInfo, _params: &ExpectationParams) -> Result<Condition> {
        Ok(Condition::is_null(&column.name))
    }

    fn null_policy(&self) -> NullPolicy {
        NullPolicy::IncludeNulls
    }
}

fn value_set(column: &ColumnInfo, params: &ExpectationParams) -> Result<Vec<Literal>> {
    let values = params.get_array("values_set")?.ok_or_else(|| {
        ExpectError::configuration(format!(
            "{} requires parameter(s): values_set",
            params.expectation()
        ))
    })?;
    values
        .iter()
        .map(|value| {
            check_parameter_type(column, params, "values_set member", value)?;
            Literal::from_json(value)
        })
        .collect()
}

/// `expect_column_values_to_be_in_set`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesInSet;

impl MapExpectation for ValuesInSet {
    fn condition(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<Condition> {
        let values = value_set(column, params)?;
        Ok(Condition::not(Condition::in_set(&column.name, values)))
    }
}

/// `expect_column_values_to_not_be_in_set`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesNotInSet;

impl MapExpectation for ValuesNotInSet {
    fn condition(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<Condition> {
        let values = value_set(column, params)?;
        Ok(Condition::in_set(&column.name, values))
    }
}

/// `expect_column_values_to_be_between`
///
/// Bounds are inclusive; either may be omitted but not both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesBetween;

impl MapExpectation for ValuesBetween {
    fn condition(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<Condition> {
        let bounds = Bounds::from_params(params)?;

        if !column.semantic_type.is_orderable() {
            return Err(ExpectError::configuration(format!(
                "{}: column '{}' has {} type and cannot be range checked",
                params.expectation(),
                column.name,
                column.semantic_type
            )));
        }
        bounds.check_column(column, params)?;

        let below = bounds
            .min
            .as_ref()
            .map(|min| bound_condition(column, CompareOp::Lt, min))
            .transpose()?;
        let above = bounds
            .max
            .as_ref()
            .map(|max| bound_condition(column, CompareOp::Gt, max))
            .transpose()?;

        match (below, above) {
            (Some(below), Some(above)) => Ok(below.or(above)),
            (Some(condition), None) | (None, Some(condition)) => Ok(condition),
            (None, None) => Err(ExpectError::configuration(format!(
                "{}: min_value and max_value cannot both be None",
                params.expectation()
            ))),
        }
    }
}

fn bound_condition(column: &ColumnInfo, op: CompareOp, bound: &Value) -> Result<Condition> {
    Condition::compare(&column.name, op, Literal::from_json(bound)?)
}

fn require_string_column(column: &ColumnInfo, params: &ExpectationParams) -> Result<()> {
    if column.semantic_type != SemanticType::String {
        return Err(ExpectError::configuration(format!(
            "{}: column '{}' has {} type; regex matching requires a string column",
            params.expectation(),
            column.name,
            column.semantic_type
        )));
    }
    Ok(())
}

fn regex(params: &ExpectationParams) -> Result<&str> {
    params.get_str("regex")?.ok_or_else(|| {
        ExpectError::configuration(format!(
            "{} requires parameter(s): regex",
            params.expectation()
        ))
    })
}

/// `expect_column_values_to_match_regex`
///
/// The match is unanchored: a value conforms if the pattern occurs anywhere in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesMatchRegex;

impl MapExpectation for ValuesMatchRegex {
    fn condition(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<Condition> {
        let pattern = regex(params)?;
        require_string_column(column, params)?;
        Ok(Condition::not(Condition::matches(&column.name, pattern)?))
    }
}

/// `expect_column_values_to_not_match_regex`
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesNotMatchRegex;

impl MapExpectation for ValuesNotMatchRegex {
    fn condition(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<Condition> {
        let pattern = regex(params)?;
        require_string_column(column, params)?;
        Condition::matches(&column.name, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;
    use serde_json::json;

    fn column(name: &str, data_type: DataType) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            index: 0,
            semantic_type: SemanticType::from_arrow(&data_type),
            data_type,
        }
    }

    fn params(value: Value) -> ExpectationParams {
        ExpectationParams::new(
            "expect_test",
            value.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_between_condition() {
        let age = column("age", DataType::Int64);
        let cond = ValuesBetween
            .condition(&age, &params(json!({"min_value": 0, "max_value": 120})))
            .unwrap();
        assert_eq!(cond.to_sql().unwrap(), "((\"age\" < 0) OR (\"age\" > 120))");

        let lower_only = ValuesBetween
            .condition(&age, &params(json!({"min_value": 18})))
            .unwrap();
        assert_eq!(lower_only.to_sql().unwrap(), "(\"age\" < 18)");
    }

    #[test]
    fn test_between_rejects_bad_configuration() {
        let age = column("age", DataType::Int64);
        assert!(ValuesBetween.condition(&age, &params(json!({}))).is_err());
        assert!(ValuesBetween
            .condition(&age, &params(json!({"min_value": 10, "max_value": 1})))
            .is_err());

        let flag = column("flag", DataType::Boolean);
        assert!(ValuesBetween
            .condition(&flag, &params(json!({"min_value": 0})))
            .is_err());
    }

    #[test]
    fn test_in_set_conditions() {
        let status = column("status", DataType::Utf8);
        let p = params(json!({"values_set": ["a", "b"]}));

        let in_set = ValuesInSet.condition(&status, &p).unwrap();
        assert_eq!(in_set.to_sql().unwrap(), "(NOT (\"status\" IN ('a', 'b')))");

        let not_in_set = ValuesNotInSet.condition(&status, &p).unwrap();
        assert_eq!(not_in_set.to_sql().unwrap(), "(\"status\" IN ('a', 'b'))");

        assert!(ValuesInSet
            .condition(&status, &params(json!({"values_set": "a"})))
            .is_err());
    }

    #[test]
    fn test_mismatched_literals_are_configuration_errors() {
        let amount = column("amount", DataType::Int64);
        let status = column("status", DataType::Utf8);

        assert!(matches!(
            ValuesBetween.condition(&amount, &params(json!({"min_value": "abc"}))),
            Err(ExpectError::Configuration(_))
        ));
        assert!(matches!(
            ValuesInSet.condition(&status, &params(json!({"values_set": ["ok", 1]}))),
            Err(ExpectError::Configuration(_))
        ));
        assert!(matches!(
            ValuesNotInSet.condition(&amount, &params(json!({"values_set": ["1"]}))),
            Err(ExpectError::Configuration(_))
        ));
        assert!(ValuesInSet
            .condition(&amount, &params(json!({"values_set": [1, 2.5, null]})))
            .is_ok());
    }

    #[test]
    fn test_null_expectations_include_nulls() {
        let x = column("x", DataType::Int64);
        assert_eq!(ValuesNull.null_policy(), NullPolicy::IncludeNulls);
        assert_eq!(
            ValuesNotNull.condition(&x, &params(json!({}))).unwrap(),
            Condition::is_null("x")
        );
        assert_eq!(ValuesInSet.null_policy(), NullPolicy::IgnoreNulls);
    }

    #[test]
    fn test_regex_requires_string_column() {
        let id = column("id", DataType::Int64);
        let p = params(json!({"regex": "^\\d+$"}));
        assert!(matches!(
            ValuesMatchRegex.condition(&id, &p),
            Err(ExpectError::Configuration(_))
        ));

        let code = column("code", DataType::Utf8);
        assert_eq!(
            ValuesNotMatchRegex.condition(&code, &p).unwrap(),
            Condition::matches("code", "^\\d+$").unwrap()
        );
        assert!(ValuesMatchRegex
            .condition(&code, &params(json!({"regex": "("})))
            .is_err());
    }
}
