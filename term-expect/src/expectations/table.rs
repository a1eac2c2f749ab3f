//! Built-in table-level expectations.

use super::TableExpectation;
use crate::backend::BackendAdapter;
use crate::core::ExpectationParams;
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};

/// `expect_table_row_count_to_equal`
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCountEqual;

#[async_trait]
impl TableExpectation for RowCountEqual {
    async fn compute(
        &self,
        backend: &dyn BackendAdapter,
        params: &ExpectationParams,
    ) -> Result<Value> {
        let expected = params.get_integer("value")?.ok_or_else(|| {
            ExpectError::configuration(format!(
                "{} requires parameter(s): value",
                params.expectation()
            ))
        })?;

        let row_count = backend.row_count().await?;
        Ok(json!({
            "success": i128::from(row_count) == i128::from(expected),
            "result_obj": {"observed_value": row_count},
        }))
    }
}

/// `expect_table_row_count_to_be_between`
///
/// `min_value` defaults to 0; a missing `max_value` leaves the range open.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCountBetween;

#[async_trait]
impl TableExpectation for RowCountBetween {
    async fn compute(
        &self,
        backend: &dyn BackendAdapter,
        params: &ExpectationParams,
    ) -> Result<Value> {
        let min = params.get_integer("min_value")?.unwrap_or(0);
        let max = params.get_integer("max_value")?;

        if let Some(max) = max {
            if min > max {
                return Err(ExpectError::configuration(format!(
                    "{}: min_value ({min}) cannot be greater than max_value ({max})",
                    params.expectation()
                )));
            }
        }

        let row_count = i128::from(backend.row_count().await?);
        let success =
            row_count >= i128::from(min) && max.map_or(true, |max| row_count <= i128::from(max));

        Ok(json!({
            "success": success,
            "result_obj": {"observed_value": row_count as u64},
        }))
    }
}

/// `expect_column_to_exist`
///
/// With `column_index`, the column must also sit at that position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnToExist;

#[async_trait]
impl TableExpectation for ColumnToExist {
    async fn compute(
        &self,
        backend: &dyn BackendAdapter,
        params: &ExpectationParams,
    ) -> Result<Value> {
        let column = params.column()?;
        let expected_index = params.get_integer("column_index")?;

        let actual_index = backend.schema().index_of(column);
        let success = match (actual_index, expected_index) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => i64::try_from(actual).ok() == Some(expected),
        };

        Ok(json!({ "success": success }))
    }
}
