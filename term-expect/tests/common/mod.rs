//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use serde_json::{json, Value};
use std::sync::Arc;
use term_expect::backend::{
    BackendAdapter, ColumnCounts, InMemoryBackend, MapCounts, RoundTripCounter, SqlBackend,
    Statistic,
};
use term_expect::core::{
    ColumnInfo, Condition, Dataset, DatasetConfig, ExpectationParams, SchemaSnapshot,
    SessionSettings,
};
use term_expect::expectations::AggregateExpectation;
use term_expect::prelude::*;

pub const TABLE: &str = "readings";

/// Ten rows:
///
/// | x    | level | status | code  | ratio |
/// |------|-------|--------|-------|-------|
/// | 1    | 1     | ok     | A-1   | 0.5   |
/// | 2    | 2     | ok     | A-2   | 1.5   |
/// | 3    | 3     | warn   | B-3   | null  |
/// | null | 1     | null   | null  | 2.5   |
/// | 5    | 2     | ok     | A-5   | 3.5   |
/// | 6    | 3     | fail   | C-6   | 4.5   |
/// | 7    | null  | ok     | A-7   | null  |
/// | 8    | 1     | ok     | A-8   | 5.5   |
/// | 9    | 2     | warn   | B-9   | 6.5   |
/// | 10   | 3     | ok     | A-10  | 7.5   |
pub fn readings_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::Int64, true),
        Field::new("level", DataType::Int64, true),
        Field::new("status", DataType::Utf8, true),
        Field::new("code", DataType::Utf8, true),
        Field::new("ratio", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![
            Some(1),
            Some(2),
            Some(3),
            None,
            Some(5),
            Some(6),
            Some(7),
            Some(8),
            Some(9),
            Some(10),
        ])),
        Arc::new(Int64Array::from(vec![
            Some(1),
            Some(2),
            Some(3),
            Some(1),
            Some(2),
            Some(3),
            None,
            Some(1),
            Some(2),
            Some(3),
        ])),
        Arc::new(StringArray::from(vec![
            Some("ok"),
            Some("ok"),
            Some("warn"),
            None,
            Some("ok"),
            Some("fail"),
            Some("ok"),
            Some("ok"),
            Some("warn"),
            Some("ok"),
        ])),
        Arc::new(StringArray::from(vec![
            Some("A-1"),
            Some("A-2"),
            Some("B-3"),
            None,
            Some("A-5"),
            Some("C-6"),
            Some("A-7"),
            Some("A-8"),
            Some("B-9"),
            Some("A-10"),
        ])),
        Arc::new(Float64Array::from(vec![
            Some(0.5),
            Some(1.5),
            None,
            Some(2.5),
            Some(3.5),
            Some(4.5),
            None,
            Some(5.5),
            Some(6.5),
            Some(7.5),
        ])),
    ];

    RecordBatch::try_new(schema, columns).unwrap()
}

/// A single-partition context so scan order matches batch order.
pub fn deterministic_context() -> SessionContext {
    SessionSettings::deterministic().session_context().unwrap()
}

pub async fn sql_backend_for(batch: RecordBatch) -> SqlBackend {
    let ctx = deterministic_context();
    let table = MemTable::try_new(batch.schema(), vec![vec![batch]]).unwrap();
    ctx.register_table(TABLE, Arc::new(table)).unwrap();
    SqlBackend::connect(ctx, TABLE).await.unwrap()
}

pub fn memory_backend_for(batch: RecordBatch) -> InMemoryBackend {
    InMemoryBackend::try_new(TABLE, batch.schema(), vec![batch]).unwrap()
}

/// The readings table behind each backend, labelled for assertion messages.
pub async fn datasets(config: DatasetConfig) -> Vec<(&'static str, Dataset)> {
    vec![
        (
            "sql",
            Dataset::new(
                Arc::new(sql_backend_for(readings_batch()).await),
                config.clone(),
            ),
        ),
        (
            "memory",
            Dataset::new(Arc::new(memory_backend_for(readings_batch())), config),
        ),
    ]
}

/// A backend whose every query fails.
#[derive(Debug)]
pub struct FailingBackend {
    schema: SchemaSnapshot,
    round_trips: RoundTripCounter,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self {
            schema: SchemaSnapshot::from_arrow(&readings_batch().schema()),
            round_trips: RoundTripCounter::default(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        self.round_trips.record();
        Err(ExpectError::backend("failing", "connection reset by peer"))
    }
}

#[async_trait]
impl BackendAdapter for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn table_name(&self) -> &str {
        TABLE
    }

    fn description(&self) -> String {
        "backend that always fails".to_string()
    }

    fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    async fn row_count(&self) -> Result<u64> {
        self.fail()
    }

    async fn count_and_null_and_unexpected(
        &self,
        _column: &str,
        _condition: &Condition,
    ) -> Result<MapCounts> {
        self.fail()
    }

    async fn count_and_null(&self, _column: &str) -> Result<ColumnCounts> {
        self.fail()
    }

    async fn sample_unexpected(
        &self,
        _column: &str,
        _condition: &Condition,
        _limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        self.fail()
    }

    async fn aggregate_statistic(
        &self,
        _column: &str,
        _statistic: Statistic,
    ) -> Result<Option<Value>> {
        self.fail()
    }

    fn round_trips(&self) -> u64 {
        self.round_trips.get()
    }
}

/// A custom aggregate that forgets to report `success`.
pub struct MalformedAggregate;

#[async_trait]
impl AggregateExpectation for MalformedAggregate {
    async fn compute(
        &self,
        _backend: &dyn BackendAdapter,
        _column: &ColumnInfo,
        _params: &ExpectationParams,
    ) -> Result<Value> {
        Ok(json!({"result_obj": {"observed_value": 42}}))
    }
}
