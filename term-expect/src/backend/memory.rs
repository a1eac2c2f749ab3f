//! In-process backend evaluating conditions over Arrow record batches.

use super::{BackendAdapter, ColumnCounts, MapCounts, RoundTripCounter, Statistic};
use crate::core::{CompareOp, Condition, Literal, SchemaSnapshot, SemanticType};
use crate::logging::LogConfig;
use crate::prelude::*;
use crate::value::{array_to_json, scalar_to_json};
use arrow::array::{
    new_null_array, Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, RecordBatch,
    Scalar, StringArray,
};
use arrow::compute::kernels::cmp;
use arrow::compute::{
    and_kleene, cast_with_options, filter, is_not_null, is_null, not, or_kleene, sum, sum_checked,
    CastOptions,
};
use arrow::datatypes::{DataType, Float64Type, Int64Type, SchemaRef, UInt64Type};
use async_trait::async_trait;
use datafusion::error::DataFusionError;
use datafusion::scalar::ScalarValue;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// A backend over record batches held in memory.
///
/// Conditions are evaluated to boolean masks with Kleene logic, so a row
/// whose predicate is NULL is treated exactly as the SQL backend treats it.
///
/// # Examples
///
/// ```rust
/// use arrow::array::Int64Array;
/// use arrow::datatypes::{DataType, Field, Schema};
/// use arrow::record_batch::RecordBatch;
/// use std::sync::Arc;
/// use term_expect::backend::{BackendAdapter, InMemoryBackend};
///
/// let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, true)]));
/// let batch = RecordBatch::try_new(
///     schema,
///     vec![Arc::new(Int64Array::from(vec![Some(1), None, Some(3)]))],
/// )
/// .unwrap();
///
/// let backend = InMemoryBackend::from_batch("numbers", batch);
/// assert_eq!(backend.schema().column_names(), vec!["x"]);
/// ```
pub struct InMemoryBackend {
    name: String,
    batches: Vec<RecordBatch>,
    schema: SchemaSnapshot,
    log_config: LogConfig,
    round_trips: RoundTripCounter,
}

impl fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("name", &self.name)
            .field("batches", &self.batches.len())
            .field("columns", &self.schema.len())
            .field("round_trips", &self.round_trips.get())
            .finish()
    }
}

impl InMemoryBackend {
    /// Creates a backend over `batches`, all of which must share `schema`.
    pub fn try_new(
        name: impl Into<String>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(batch) = batches.iter().find(|b| b.schema().fields() != schema.fields()) {
            return Err(ExpectError::configuration(format!(
                "Record batch schema {:?} does not match table schema for '{name}'",
                batch.schema().fields()
            )));
        }

        Ok(Self {
            name,
            schema: SchemaSnapshot::from_arrow(&schema),
            batches,
            log_config: LogConfig::default(),
            round_trips: RoundTripCounter::default(),
        })
    }

    /// Creates a backend over a single batch.
    pub fn from_batch(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            schema: SchemaSnapshot::from_arrow(&batch.schema()),
            batches: vec![batch],
            log_config: LogConfig::default(),
            round_trips: RoundTripCounter::default(),
        }
    }

    /// Replaces the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// The batches backing this table.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    fn column<'a>(&self, batch: &'a RecordBatch, column: &str) -> Result<&'a ArrayRef> {
        let index = self
            .schema
            .index_of(column)
            .ok_or_else(|| ExpectError::column_not_found(column))?;
        Ok(batch.column(index))
    }

    fn record_round_trip(&self, operation: &str) {
        crate::log_evaluation!(self.log_config, backend = "memory", operation, "Scanning batches");
        self.round_trips.record();
    }

    /// Evaluates a condition to a mask; NULL entries mean "unknown".
    fn evaluate(&self, batch: &RecordBatch, condition: &Condition) -> Result<BooleanArray> {
        match condition {
            Condition::IsNull { column } => Ok(is_null(self.column(batch, column)?.as_ref())?),
            Condition::IsNotNull { column } => {
                Ok(is_not_null(self.column(batch, column)?.as_ref())?)
            }
            Condition::Compare { column, op, value } => {
                compare(self.column(batch, column)?, *op, value)
            }
            Condition::InSet { column, values } => {
                let array = self.column(batch, column)?;
                let mut mask = BooleanArray::from(vec![false; array.len()]);
                for value in values {
                    let member = if value.is_null() {
                        is_null(array.as_ref())?
                    } else {
                        compare(array, CompareOp::Eq, value)?
                    };
                    mask = or_kleene(&mask, &member)?;
                }
                Ok(mask)
            }
            Condition::Matches { column, pattern } => {
                regex_mask(self.column(batch, column)?, pattern)
            }
            Condition::Not(inner) => Ok(not(&self.evaluate(batch, inner)?)?),
            Condition::And(left, right) => Ok(and_kleene(
                &self.evaluate(batch, left)?,
                &self.evaluate(batch, right)?,
            )?),
            Condition::Or(left, right) => Ok(or_kleene(
                &self.evaluate(batch, left)?,
                &self.evaluate(batch, right)?,
            )?),
        }
    }

    fn sum(&self, column: &str) -> Result<Option<Value>> {
        let info = self.schema.column(column)?;
        if !info.semantic_type.is_numeric() {
            return Err(ExpectError::backend(
                "memory",
                format!("Cannot sum non-numeric column '{column}' ({})", info.data_type),
            ));
        }

        if info.data_type == DataType::UInt64 {
            let mut total: Option<u64> = None;
            for batch in &self.batches {
                let values = strict_cast(self.column(batch, column)?, &DataType::UInt64)?;
                if let Some(partial) = sum_checked(values.as_primitive::<UInt64Type>())? {
                    let running = total.unwrap_or(0);
                    total = Some(running.checked_add(partial).ok_or_else(|| {
                        ExpectError::backend("memory", format!("Sum of '{column}' overflows"))
                    })?);
                }
            }
            Ok(total.map(Value::from))
        } else if info.data_type.is_integer() {
            let mut total: Option<i64> = None;
            for batch in &self.batches {
                let values = strict_cast(self.column(batch, column)?, &DataType::Int64)?;
                if let Some(partial) = sum_checked(values.as_primitive::<Int64Type>())? {
                    let running = total.unwrap_or(0);
                    total = Some(running.checked_add(partial).ok_or_else(|| {
                        ExpectError::backend("memory", format!("Sum of '{column}' overflows"))
                    })?);
                }
            }
            Ok(total.map(Value::from))
        } else {
            let mut total: Option<f64> = None;
            for batch in &self.batches {
                let values = strict_cast(self.column(batch, column)?, &DataType::Float64)?;
                if let Some(partial) = sum(values.as_primitive::<Float64Type>()) {
                    total = Some(total.unwrap_or(0.0) + partial);
                }
            }
            Ok(total.map(|t| scalar_to_json(&ScalarValue::Float64(Some(t)))))
        }
    }

    fn mean(&self, column: &str) -> Result<Option<Value>> {
        let info = self.schema.column(column)?;
        if !info.semantic_type.is_numeric() {
            return Err(ExpectError::backend(
                "memory",
                format!("Cannot average non-numeric column '{column}' ({})", info.data_type),
            ));
        }

        let mut total = 0.0;
        let mut count = 0usize;
        for batch in &self.batches {
            let values = strict_cast(self.column(batch, column)?, &DataType::Float64)?;
            let values = values.as_primitive::<Float64Type>();
            count += values.len() - values.null_count();
            total += sum(values).unwrap_or(0.0);
        }

        if count == 0 {
            Ok(None)
        } else {
            Ok(Some(scalar_to_json(&ScalarValue::Float64(Some(
                total / count as f64,
            )))))
        }
    }

    fn extreme(&self, column: &str, wanted: Ordering) -> Result<Option<Value>> {
        let mut best: Option<ScalarValue> = None;
        for batch in &self.batches {
            let array = self.column(batch, column)?;
            for row in 0..array.len() {
                if array.is_null(row) {
                    continue;
                }
                let candidate =
                    ScalarValue::try_from_array(array.as_ref(), row).map_err(memory_error)?;
                let replace = match &best {
                    None => true,
                    Some(current) => candidate.partial_cmp(current) == Some(wanted),
                };
                if replace {
                    best = Some(candidate);
                }
            }
        }
        Ok(best.map(|scalar| scalar_to_json(&scalar)))
    }
}

/// Attributes a DataFusion error raised while converting values to this backend.
fn memory_error(err: DataFusionError) -> ExpectError {
    ExpectError::backend_with_source("memory", err.to_string(), Box::new(err))
}

fn strict_cast(array: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    Ok(cast_with_options(array.as_ref(), to, &options)?)
}

fn literal_array(literal: &Literal) -> ArrayRef {
    match literal {
        Literal::Null => new_null_array(&DataType::Null, 1),
        Literal::Bool(b) => Arc::new(BooleanArray::from(vec![*b])),
        Literal::Int(i) => Arc::new(Int64Array::from(vec![*i])),
        Literal::Float(f) => Arc::new(Float64Array::from(vec![*f])),
        Literal::Str(s) => Arc::new(StringArray::from(vec![s.as_str()])),
    }
}

/// Picks the type both sides of a comparison are cast to.
///
/// Integer columns compared with integer literals stay integral (UInt64 in
/// Decimal128(20, 0), which holds every u64 and i64); any other numeric
/// comparison happens in Float64; strings compare as Utf8. Other columns
/// keep their own type and the literal is cast to it.
fn comparison_type(column: &DataType, literal: &Literal) -> DataType {
    match (SemanticType::from_arrow(column), literal) {
        (SemanticType::Numeric, Literal::Int(_)) if *column == DataType::UInt64 => {
            DataType::Decimal128(20, 0)
        }
        (SemanticType::Numeric, Literal::Int(_)) if column.is_integer() => DataType::Int64,
        (SemanticType::Numeric, _) => DataType::Float64,
        (SemanticType::String, _) => DataType::Utf8,
        _ => column.clone(),
    }
}

fn compare(array: &ArrayRef, op: CompareOp, literal: &Literal) -> Result<BooleanArray> {
    if literal.is_null() {
        return Err(ExpectError::configuration(
            "Comparison with null must use IS NULL",
        ));
    }

    let target = comparison_type(array.data_type(), literal);
    let left = strict_cast(array, &target)?;
    let right = Scalar::new(strict_cast(&literal_array(literal), &target)?);

    let mask = match op {
        CompareOp::Eq => cmp::eq(&left, &right)?,
        CompareOp::NotEq => cmp::neq(&left, &right)?,
        CompareOp::Lt => cmp::lt(&left, &right)?,
        CompareOp::LtEq => cmp::lt_eq(&left, &right)?,
        CompareOp::Gt => cmp::gt(&left, &right)?,
        CompareOp::GtEq => cmp::gt_eq(&left, &right)?,
    };
    Ok(mask)
}

fn regex_mask(array: &ArrayRef, pattern: &str) -> Result<BooleanArray> {
    if SemanticType::from_arrow(array.data_type()) != SemanticType::String {
        return Err(ExpectError::backend(
            "memory",
            format!(
                "Regex match requires a string column, got {}",
                array.data_type()
            ),
        ));
    }

    let regex = Regex::new(pattern)
        .map_err(|e| ExpectError::configuration(format!("Invalid regex pattern: {e}")))?;
    let strings = strict_cast(array, &DataType::Utf8)?;
    Ok(strings
        .as_string::<i32>()
        .iter()
        .map(|value| value.map(|s| regex.is_match(s)))
        .collect())
}

#[async_trait]
impl BackendAdapter for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn table_name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "In-memory table '{}' ({} batches)",
            self.name,
            self.batches.len()
        )
    }

    fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    #[instrument(skip(self), fields(backend = "memory", table = %self.name))]
    async fn row_count(&self) -> Result<u64> {
        self.record_round_trip("row_count");
        Ok(self.batches.iter().map(|b| b.num_rows() as u64).sum())
    }

    #[instrument(skip(self, condition), fields(backend = "memory", column = %column))]
    async fn count_and_null_and_unexpected(
        &self,
        column: &str,
        condition: &Condition,
    ) -> Result<MapCounts> {
        self.record_round_trip("count_and_null_and_unexpected");

        let mut counts = MapCounts::default();
        for batch in &self.batches {
            let array = self.column(batch, column)?;
            counts.element_count += batch.num_rows() as u64;
            counts.null_count += array.null_count() as u64;
            counts.unexpected_count += self.evaluate(batch, condition)?.true_count() as u64;
        }

        crate::log_evaluation!(
            self.log_config,
            backend = "memory",
            element_count = counts.element_count,
            null_count = counts.null_count,
            unexpected_count = counts.unexpected_count,
            "Computed map counts"
        );
        Ok(counts)
    }

    #[instrument(skip(self), fields(backend = "memory", column = %column))]
    async fn count_and_null(&self, column: &str) -> Result<ColumnCounts> {
        self.record_round_trip("count_and_null");

        let mut counts = ColumnCounts::default();
        for batch in &self.batches {
            counts.element_count += batch.num_rows() as u64;
            counts.null_count += self.column(batch, column)?.null_count() as u64;
        }
        Ok(counts)
    }

    #[instrument(skip(self, condition), fields(backend = "memory", column = %column, limit = ?limit))]
    async fn sample_unexpected(
        &self,
        column: &str,
        condition: &Condition,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        self.record_round_trip("sample_unexpected");

        let mut values = Vec::new();
        for batch in &self.batches {
            if limit.is_some_and(|limit| values.len() >= limit) {
                break;
            }
            let mask = self.evaluate(batch, condition)?;
            let matching = filter(self.column(batch, column)?.as_ref(), &mask)?;
            values.extend(array_to_json(matching.as_ref()).map_err(memory_error)?);
        }

        if let Some(limit) = limit {
            values.truncate(limit);
        }
        Ok(values)
    }

    #[instrument(skip(self), fields(backend = "memory", column = %column, statistic = %statistic))]
    async fn aggregate_statistic(
        &self,
        column: &str,
        statistic: Statistic,
    ) -> Result<Option<Value>> {
        self.record_round_trip("aggregate_statistic");

        match statistic {
            Statistic::Min => self.extreme(column, Ordering::Less),
            Statistic::Max => self.extreme(column, Ordering::Greater),
            Statistic::Sum => self.sum(column),
            Statistic::Mean => self.mean(column),
        }
    }

    fn round_trips(&self) -> u64 {
        self.round_trips.get()
    }
}
