//! Shared fixtures for unit tests.

use crate::backend::{InMemoryBackend, SqlBackend};
use crate::core::SessionSettings;
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use std::sync::Arc;

/// Six sales rows with a null amount, a null region and an all-null note.
pub fn sales_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("amount", DataType::Float64, true),
        Field::new("region", DataType::Utf8, true),
        Field::new("note", DataType::Utf8, true),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])),
            Arc::new(Float64Array::from(vec![
                Some(50.0),
                Some(150.0),
                None,
                Some(200.0),
                Some(75.0),
                Some(100.0),
            ])),
            Arc::new(StringArray::from(vec![
                Some("north"),
                Some("south"),
                None,
                Some("north"),
                Some("east"),
                Some("west"),
            ])),
            Arc::new(StringArray::from(vec![None::<&str>; 6])),
        ],
    )
    .unwrap()
}

/// A single-partition context with the sales rows registered as `sales`.
pub async fn sales_context() -> SessionContext {
    let ctx = SessionSettings::deterministic().session_context().unwrap();
    let batch = sales_batch();
    let table = MemTable::try_new(batch.schema(), vec![vec![batch]]).unwrap();
    ctx.register_table("sales", Arc::new(table)).unwrap();
    ctx
}

/// The sales rows behind the SQL backend.
pub async fn sales_sql() -> SqlBackend {
    SqlBackend::connect(sales_context().await, "sales")
        .await
        .unwrap()
}

/// The sales rows behind the in-memory backend.
pub fn sales_memory() -> InMemoryBackend {
    InMemoryBackend::from_batch("sales", sales_batch())
}
