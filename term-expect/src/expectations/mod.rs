//! Expectation definitions and the built-in expectation catalogue.
//!
//! An expectation is one of three kinds, each with its own trait:
//!
//! - [`MapExpectation`] describes the unexpected rows of a column as a
//!   [`Condition`]. The map evaluator does the counting and sampling.
//! - [`AggregateExpectation`] computes one column statistic and reports
//!   whether it meets the expectation.
//! - [`TableExpectation`] checks a property of the whole table.
//!
//! Implementations validate their parameters before touching the backend,
//! so a broken configuration never costs a query.
//!
//! # Registering a custom expectation
//!
//! ```rust
//! use std::sync::Arc;
//! use term_expect::core::{ColumnInfo, CompareOp, Condition, ExpectationParams, Literal};
//! use term_expect::expectations::{
//!     ExpectationDefinition, ExpectationRegistry, MapExpectation,
//! };
//! use term_expect::prelude::Result;
//!
//! struct Positive;
//!
//! impl MapExpectation for Positive {
//!     fn condition(&self, column: &ColumnInfo, _params: &ExpectationParams) -> Result<Condition> {
//!         Condition::compare(&column.name, CompareOp::LtEq, Literal::Int(0))
//!     }
//! }
//!
//! let mut registry = ExpectationRegistry::builtin();
//! registry.register(ExpectationDefinition::map(
//!     "expect_column_values_to_be_positive",
//!     &["column"],
//!     Arc::new(Positive),
//! ));
//! assert!(registry.get("expect_column_values_to_be_positive").is_some());
//! ```

mod aggregate;
mod map;
mod registry;
mod table;

pub use aggregate::StatisticBetween;
pub use map::{
    ValuesBetween, ValuesInSet, ValuesMatchRegex, ValuesNotInSet, ValuesNotMatchRegex, ValuesNotNull,
    ValuesNull,
};
pub use registry::{ExpectationDefinition, ExpectationKind, ExpectationRegistry};
pub use table::{ColumnToExist, RowCountBetween, RowCountEqual};

use crate::backend::BackendAdapter;
use crate::core::{ColumnInfo, Condition, ExpectationParams, NullPolicy};
use crate::prelude::*;
use crate::value::compare_json;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

/// A per-row expectation over one column.
pub trait MapExpectation: Send + Sync {
    /// Builds the condition matching the rows that violate the expectation.
    fn condition(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<Condition>;

    /// How null rows participate in the evaluation.
    fn null_policy(&self) -> NullPolicy {
        NullPolicy::IgnoreNulls
    }
}

/// An expectation about a single column statistic.
///
/// `compute` returns raw JSON of the form
/// `{"success": bool, "result_obj": {"observed_value": ..., "details": ...}}`;
/// anything else is reported as a contract violation.
#[async_trait]
pub trait AggregateExpectation: Send + Sync {
    /// Computes the statistic and decides success.
    async fn compute(
        &self,
        backend: &dyn BackendAdapter,
        column: &ColumnInfo,
        params: &ExpectationParams,
    ) -> Result<Value>;
}

/// An expectation about the table as a whole.
#[async_trait]
pub trait TableExpectation: Send + Sync {
    /// Computes `{"success": bool, "result_obj": {"observed_value": ...}}`.
    async fn compute(&self, backend: &dyn BackendAdapter, params: &ExpectationParams)
        -> Result<Value>;
}

/// Inclusive `min_value` / `max_value` bounds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bounds {
    /// Lower bound, if any
    pub min: Option<Value>,
    /// Upper bound, if any
    pub max: Option<Value>,
}

impl Bounds {
    /// Reads `min_value` and `max_value`, requiring at least one of them.
    ///
    /// Fails when `min_value > max_value`, when the bounds are not
    /// comparable with each other, or when `parse_strings_as_datetimes` is
    /// requested.
    pub fn from_params(params: &ExpectationParams) -> Result<Self> {
        if params.get_bool("parse_strings_as_datetimes")? == Some(true) {
            return Err(ExpectError::configuration(format!(
                "{}: parse_strings_as_datetimes is not supported",
                params.expectation()
            )));
        }

        let min = Self::bound(params, "min_value")?;
        let max = Self::bound(params, "max_value")?;

        if min.is_none() && max.is_none() {
            return Err(ExpectError::configuration(format!(
                "{}: min_value and max_value cannot both be None",
                params.expectation()
            )));
        }

        if let (Some(lo), Some(hi)) = (&min, &max) {
            match compare_json(lo, hi) {
                Some(Ordering::Greater) => {
                    return Err(ExpectError::configuration(format!(
                        "{}: min_value ({lo}) cannot be greater than max_value ({hi})",
                        params.expectation()
                    )))
                }
                None => {
                    return Err(ExpectError::configuration(format!(
                        "{}: min_value ({lo}) and max_value ({hi}) are not comparable",
                        params.expectation()
                    )))
                }
                _ => {}
            }
        }

        Ok(Self { min, max })
    }

    fn bound(params: &ExpectationParams, name: &str) -> Result<Option<Value>> {
        match params.get(name) {
            None => Ok(None),
            Some(Value::Number(_)) => Ok(params.get_f64(name)?.and(params.get(name).cloned())),
            Some(value @ Value::String(_)) => Ok(Some(value.clone())),
            Some(other) => Err(ExpectError::configuration(format!(
                "{}: {name} must be a number or a string, got {other}",
                params.expectation()
            ))),
        }
    }

    /// Fails unless every bound can be compared with values of `column`.
    pub fn check_column(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<()> {
        for (name, bound) in [("min_value", &self.min), ("max_value", &self.max)] {
            if let Some(bound) = bound {
                check_parameter_type(column, params, name, bound)?;
            }
        }
        Ok(())
    }

    /// Returns true if `value` lies within the bounds.
    ///
    /// Values that cannot be compared with a bound are outside it.
    pub fn contains(&self, value: &Value) -> bool {
        let above_min = self.min.as_ref().map_or(true, |min| {
            matches!(
                compare_json(value, min),
                Some(Ordering::Greater | Ordering::Equal)
            )
        });
        let below_max = self.max.as_ref().map_or(true, |max| {
            matches!(
                compare_json(value, max),
                Some(Ordering::Less | Ordering::Equal)
            )
        });
        above_min && below_max
    }

    /// Renders the bounds as JSON for outcome details.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "min_value": self.min.clone().unwrap_or(Value::Null),
            "max_value": self.max.clone().unwrap_or(Value::Null),
        })
    }
}

/// Rejects a parameter value whose type does not match the column's.
///
/// Backends coerce mismatched literals differently, so the mismatch is a
/// configuration error raised before any query.
pub(crate) fn check_parameter_type(
    column: &ColumnInfo,
    params: &ExpectationParams,
    name: &str,
    value: &Value,
) -> Result<()> {
    if column.semantic_type.accepts(value) {
        return Ok(());
    }
    Err(ExpectError::configuration(format!(
        "{}: {name} {value} cannot be compared with {} column '{}'",
        params.expectation(),
        column.semantic_type,
        column.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SemanticType;
    use arrow::datatypes::DataType;
    use serde_json::json;

    fn params(value: Value) -> ExpectationParams {
        ExpectationParams::new(
            "expect_test",
            value.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::from_params(&params(json!({}))).is_err());
        assert!(Bounds::from_params(&params(json!({"min_value": 5, "max_value": 1}))).is_err());
        assert!(Bounds::from_params(&params(json!({"min_value": "a", "max_value": 1}))).is_err());
        assert!(Bounds::from_params(&params(json!({"min_value": [1]}))).is_err());
        assert!(Bounds::from_params(&params(
            json!({"min_value": 1, "parse_strings_as_datetimes": true})
        ))
        .is_err());

        let bounds = Bounds::from_params(&params(json!({"min_value": 1, "max_value": null}))).unwrap();
        assert_eq!(bounds.min, Some(json!(1)));
        assert_eq!(bounds.max, None);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = Bounds::from_params(&params(json!({"min_value": 1, "max_value": 3}))).unwrap();
        assert!(bounds.contains(&json!(1)));
        assert!(bounds.contains(&json!(3.0)));
        assert!(!bounds.contains(&json!(3.5)));
        assert!(!bounds.contains(&json!("2")));
        assert!(!bounds.contains(&Value::Null));
    }

    #[test]
    fn test_bounds_must_match_column_type() {
        let column = |name: &str, data_type: DataType| ColumnInfo {
            name: name.to_string(),
            index: 0,
            semantic_type: SemanticType::from_arrow(&data_type),
            data_type,
        };
        let amount = column("amount", DataType::Int64);
        let code = column("code", DataType::Utf8);
        let day = column("day", DataType::Date32);

        let text = params(json!({"min_value": "abc"}));
        let numeric = params(json!({"min_value": 0, "max_value": 10}));
        let text_bounds = Bounds::from_params(&text).unwrap();
        let numeric_bounds = Bounds::from_params(&numeric).unwrap();

        assert!(matches!(
            text_bounds.check_column(&amount, &text),
            Err(ExpectError::Configuration(_))
        ));
        assert!(numeric_bounds.check_column(&amount, &numeric).is_ok());
        assert!(numeric_bounds.check_column(&code, &numeric).is_err());
        assert!(text_bounds.check_column(&code, &text).is_ok());
        assert!(text_bounds.check_column(&day, &text).is_ok());
        assert!(numeric_bounds.check_column(&day, &numeric).is_err());
    }

    #[test]
    fn test_string_bounds() {
        let bounds = Bounds::from_params(&params(
            json!({"min_value": "2024-01-01", "max_value": "2024-12-31"}),
        ))
        .unwrap();
        assert!(bounds.contains(&json!("2024-06-30")));
        assert!(!bounds.contains(&json!("2025-01-01")));
    }
}
