//! Built-in column aggregate expectations.

use super::{AggregateExpectation, Bounds};
use crate::backend::{BackendAdapter, Statistic};
use crate::core::{ColumnInfo, ExpectationParams, SemanticType};
use crate::prelude::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// `expect_column_{min,max,sum,mean}_to_be_between`
///
/// The statistic is computed over non-null values and must lie within the
/// inclusive bounds. When the backend returns no value (empty or all-null
/// column) the expectation fails with `observed_value: null`.
#[derive(Debug, Clone, Copy)]
pub struct StatisticBetween {
    statistic: Statistic,
}

impl StatisticBetween {
    /// Creates the expectation for a statistic.
    pub fn new(statistic: Statistic) -> Self {
        Self { statistic }
    }

    /// The statistic this expectation bounds.
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    fn check_column_type(&self, column: &ColumnInfo, params: &ExpectationParams) -> Result<()> {
        let supported = if self.statistic.requires_numeric() {
            column.semantic_type.is_numeric()
        } else {
            column.semantic_type != SemanticType::Other
        };

        if supported {
            Ok(())
        } else {
            Err(ExpectError::configuration(format!(
                "{}: cannot compute {} of column '{}' with {} type",
                params.expectation(),
                self.statistic,
                column.name,
                column.semantic_type
            )))
        }
    }
}

#[async_trait]
impl AggregateExpectation for StatisticBetween {
    async fn compute(
        &self,
        backend: &dyn BackendAdapter,
        column: &ColumnInfo,
        params: &ExpectationParams,
    ) -> Result<Value> {
        let bounds = Bounds::from_params(params)?;
        self.check_column_type(column, params)?;
        bounds.check_column(column, params)?;

        let observed = backend
            .aggregate_statistic(&column.name, self.statistic)
            .await?;
        let success = observed.as_ref().is_some_and(|value| bounds.contains(value));

        debug!(
            statistic = %self.statistic,
            column = %column.name,
            observed = ?observed,
            success,
            "Computed column statistic"
        );

        Ok(json!({
            "success": success,
            "result_obj": {
                "observed_value": observed.unwrap_or(Value::Null),
                "details": {
                    "statistic": self.statistic.to_string(),
                    "bounds": bounds.to_json(),
                },
            },
        }))
    }
}
