//! Core types for declaring and evaluating expectations.
//!
//! ## Overview
//!
//! - **[`Dataset`]**: a backend plus defaults; the entry point for invoking
//!   expectations one at a time or validating a whole suite
//! - **[`ExpectationConfig`]**: an expectation name and its kwargs
//! - **[`ExpectationSuite`]**: an ordered, serializable list of configs
//! - **[`EvaluationOutcome`]**: the result of one invocation, shaped by a
//!   [`ResultFormat`]
//! - **[`Condition`]**: the row predicate a map expectation hands to a backend
//! - **[`SchemaSnapshot`]**: column names and semantic types captured once
//!   per backend
//!
//! ## Invocation flow
//!
//! ```text
//! Dataset::expect(name, kwargs)
//!     ├── registry lookup
//!     ├── InvocationOptions::split  (result_format, include_config, catch_exceptions, meta)
//!     ├── required parameters, column resolution
//!     ├── evaluator (map / aggregate / table)  ──► BackendAdapter
//!     └── EvaluationOutcome  ──► captured into the dataset's ExpectationSuite
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::Int64Array;
//! use arrow::record_batch::RecordBatch;
//! use arrow::datatypes::{DataType, Field, Schema};
//! use serde_json::json;
//! use term_expect::backend::InMemoryBackend;
//! use term_expect::core::{Dataset, DatasetConfig, ResultFormat};
//!
//! # async fn example() -> term_expect::prelude::Result<()> {
//! let schema = Arc::new(Schema::new(vec![Field::new("age", DataType::Int64, true)]));
//! let batch = RecordBatch::try_new(
//!     schema.clone(),
//!     vec![Arc::new(Int64Array::from(vec![Some(34), Some(51), None, Some(230)]))],
//! )?;
//! let backend = InMemoryBackend::try_new("people", schema, vec![batch])?;
//!
//! let dataset = Dataset::new(
//!     Arc::new(backend),
//!     DatasetConfig::default().with_result_format(ResultFormat::summary()),
//! );
//!
//! let outcome = dataset
//!     .expect_column_values_to_be_between("age", Some(json!(0)), Some(json!(120)), Some(0.6))
//!     .await?;
//! assert!(outcome.success);
//! assert_eq!(outcome.map_result().unwrap().unexpected_count, 1);
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod config;
pub mod dataset;
pub mod expectation;
pub mod outcome;
pub mod result_format;
pub mod schema;
pub mod suite;

pub use condition::{CompareOp, Condition, Literal, NullPolicy};
pub use config::{DatasetConfig, SessionSettings};
pub use dataset::Dataset;
pub use expectation::{ExpectationConfig, ExpectationParams, InvocationOptions};
pub use outcome::{
    AggregateResult, EvaluationOutcome, ExceptionInfo, MapResult, ResultObject, TableResult,
    ValueCount,
};
pub use result_format::{ResultFormat, ResultFormatLevel};
pub use schema::{ColumnInfo, SchemaSnapshot, SemanticType};
pub use suite::{ExpectationSuite, ValidateOptions, ValidationReport, ValidationStatistics};
