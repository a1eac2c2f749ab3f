//! Push-down backend executing SQL through DataFusion.

use super::{BackendAdapter, ColumnCounts, MapCounts, RoundTripCounter, Statistic};
use crate::core::{Condition, SchemaSnapshot};
use crate::error::SchemaError;
use crate::logging::LogConfig;
use crate::prelude::*;
use crate::security::SqlSecurity;
use crate::value::{array_to_json, scalar_to_json};
use arrow::array::{Array, Int64Array, RecordBatch};
use async_trait::async_trait;
use datafusion::common::TableReference;
use datafusion::prelude::SessionContext;
use datafusion::scalar::ScalarValue;
use serde_json::Value;
use std::fmt;
use tracing::{debug, instrument};

/// A backend that renders every question into a single SQL statement.
///
/// # Examples
///
/// ```rust,no_run
/// use datafusion::prelude::*;
/// use term_expect::backend::{BackendAdapter, SqlBackend};
///
/// # async fn example() -> term_expect::prelude::Result<()> {
/// let ctx = SessionContext::new();
/// ctx.register_csv("orders", "orders.csv", CsvReadOptions::new()).await?;
///
/// let backend = SqlBackend::connect(ctx, "orders").await?;
/// println!("{} rows", backend.row_count().await?);
/// # Ok(())
/// # }
/// ```
pub struct SqlBackend {
    ctx: SessionContext,
    table: String,
    table_ref: String,
    schema: SchemaSnapshot,
    log_config: LogConfig,
    round_trips: RoundTripCounter,
}

impl fmt::Debug for SqlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBackend")
            .field("table", &self.table)
            .field("columns", &self.schema.len())
            .field("round_trips", &self.round_trips.get())
            .finish()
    }
}

impl SqlBackend {
    /// Connects to a registered table and introspects its schema once.
    ///
    /// `table` is resolved the way DataFusion resolves it: unquoted parts
    /// are case-normalized, so `Orders` and `orders` name the same table.
    /// Fails with [`SchemaError::TableNotFound`] if the table is not
    /// registered in `ctx`.
    #[instrument(skip(ctx), fields(backend = "sql"))]
    pub async fn connect(ctx: SessionContext, table: &str) -> Result<Self> {
        SqlSecurity::validate_table_reference(table)?;
        let reference = TableReference::from(table);
        let table_ref = quote_resolved_reference(&reference)?;

        if !ctx.table_exist(reference.clone())? {
            return Err(SchemaError::TableNotFound {
                table: table.to_string(),
            }
            .into());
        }

        let df = ctx.table(reference).await?;
        let schema = SchemaSnapshot::from_arrow(df.schema().as_arrow());
        debug!(
            table = %table,
            columns = schema.len(),
            "Captured schema snapshot"
        );

        Ok(Self {
            ctx,
            table: table.to_string(),
            table_ref,
            schema,
            log_config: LogConfig::default(),
            round_trips: RoundTripCounter::default(),
        })
    }

    /// Replaces the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// The table this backend queries.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The underlying DataFusion context.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    async fn run(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        crate::log_query!(self.log_config, "sql", sql);
        self.round_trips.record();

        let df = self.ctx.sql(sql).await?;
        Ok(df.collect().await?)
    }

    fn column_ref(&self, column: &str) -> Result<String> {
        self.schema.column(column)?;
        SqlSecurity::escape_identifier(column)
    }
}

/// Quotes each part of an already resolved reference so the query text
/// names exactly the table the existence check found.
fn quote_resolved_reference(reference: &TableReference) -> Result<String> {
    let parts = [reference.catalog(), reference.schema(), Some(reference.table())]
        .into_iter()
        .flatten()
        .map(SqlSecurity::escape_identifier)
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("."))
}

/// Reads a count from the first row of an aggregate result.
///
/// `SUM` over zero rows is NULL and is read as 0.
fn read_count(batches: &[RecordBatch], index: usize, name: &str) -> Result<u64> {
    let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
        return Ok(0);
    };

    let array = batch
        .column(index)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| {
            ExpectError::backend(
                "sql",
                format!(
                    "Expected Int64 for {name}, got {:?}",
                    batch.column(index).data_type()
                ),
            )
        })?;

    if array.is_null(0) {
        Ok(0)
    } else {
        Ok(array.value(0).max(0) as u64)
    }
}

#[async_trait]
impl BackendAdapter for SqlBackend {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn description(&self) -> String {
        format!("DataFusion table '{}'", self.table)
    }

    fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    #[instrument(skip(self), fields(backend = "sql", table = %self.table))]
    async fn row_count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) AS row_count FROM {}", self.table_ref);
        let batches = self.run(&sql).await?;
        read_count(&batches, 0, "row_count")
    }

    #[instrument(skip(self, condition), fields(backend = "sql", column = %column))]
    async fn count_and_null_and_unexpected(
        &self,
        column: &str,
        condition: &Condition,
    ) -> Result<MapCounts> {
        let column_ref = self.column_ref(column)?;
        let predicate = condition.to_sql()?;
        let sql = format!(
            "SELECT COUNT(*) AS element_count, \
             SUM(CASE WHEN {column_ref} IS NULL THEN 1 ELSE 0 END) AS null_count, \
             SUM(CASE WHEN {predicate} THEN 1 ELSE 0 END) AS unexpected_count \
             FROM {}",
            self.table_ref
        );

        let batches = self.run(&sql).await?;
        let counts = MapCounts {
            element_count: read_count(&batches, 0, "element_count")?,
            null_count: read_count(&batches, 1, "null_count")?,
            unexpected_count: read_count(&batches, 2, "unexpected_count")?,
        };

        crate::log_evaluation!(
            self.log_config,
            backend = "sql",
            element_count = counts.element_count,
            null_count = counts.null_count,
            unexpected_count = counts.unexpected_count,
            "Computed map counts"
        );
        Ok(counts)
    }

    #[instrument(skip(self), fields(backend = "sql", column = %column))]
    async fn count_and_null(&self, column: &str) -> Result<ColumnCounts> {
        let column_ref = self.column_ref(column)?;
        let sql = format!(
            "SELECT COUNT(*) AS element_count, \
             SUM(CASE WHEN {column_ref} IS NULL THEN 1 ELSE 0 END) AS null_count \
             FROM {}",
            self.table_ref
        );

        let batches = self.run(&sql).await?;
        Ok(ColumnCounts {
            element_count: read_count(&batches, 0, "element_count")?,
            null_count: read_count(&batches, 1, "null_count")?,
        })
    }

    #[instrument(skip(self, condition), fields(backend = "sql", column = %column, limit = ?limit))]
    async fn sample_unexpected(
        &self,
        column: &str,
        condition: &Condition,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let column_ref = self.column_ref(column)?;
        let predicate = condition.to_sql()?;
        let mut sql = format!(
            "SELECT {column_ref} FROM {} WHERE {predicate}",
            self.table_ref
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let batches = self.run(&sql).await?;
        let mut values = Vec::new();
        for batch in &batches {
            values.extend(array_to_json(batch.column(0).as_ref())?);
        }
        if let Some(limit) = limit {
            values.truncate(limit);
        }
        Ok(values)
    }

    #[instrument(skip(self), fields(backend = "sql", column = %column, statistic = %statistic))]
    async fn aggregate_statistic(
        &self,
        column: &str,
        statistic: Statistic,
    ) -> Result<Option<Value>> {
        let column_ref = self.column_ref(column)?;
        let sql = format!(
            "SELECT {}({column_ref}) AS value FROM {}",
            statistic.sql_function(),
            self.table_ref
        );

        let batches = self.run(&sql).await?;
        let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
            return Ok(None);
        };

        let scalar = ScalarValue::try_from_array(batch.column(0).as_ref(), 0)?;
        Ok(match scalar_to_json(&scalar) {
            Value::Null => None,
            value => Some(value),
        })
    }

    fn round_trips(&self) -> u64 {
        self.round_trips.get()
    }
}
