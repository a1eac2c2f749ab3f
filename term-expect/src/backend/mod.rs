//! Execution substrates that expectations are pushed down to.
//!
//! A [`BackendAdapter`] answers a small, fixed set of questions about one
//! table: combined counts for a row predicate, a bounded sample of the rows
//! that match it, and column statistics. Evaluators never look at raw data;
//! everything they need comes through this trait.
//!
//! Two implementations ship with the crate:
//!
//! - [`SqlBackend`] renders each question into one SQL statement and runs it
//!   on a DataFusion [`SessionContext`](datafusion::prelude::SessionContext).
//! - [`InMemoryBackend`] evaluates directly over Arrow record batches with
//!   the compute kernels.
//!
//! Both return identical values for identical data.

use crate::core::{Condition, SchemaSnapshot};
use crate::prelude::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod memory;
pub mod sql;

pub use memory::InMemoryBackend;
pub use sql::SqlBackend;

/// Counts gathered for a column map expectation in a single round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapCounts {
    /// Total number of rows
    pub element_count: u64,
    /// Rows where the column is null
    pub null_count: u64,
    /// Rows where the unexpected-condition is TRUE
    pub unexpected_count: u64,
}

impl MapCounts {
    /// Rows where the column is not null.
    pub fn nonnull_count(&self) -> u64 {
        self.element_count.saturating_sub(self.null_count)
    }
}

/// Row and null counts of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnCounts {
    /// Total number of rows
    pub element_count: u64,
    /// Rows where the column is null
    pub null_count: u64,
}

impl ColumnCounts {
    /// Rows where the column is not null.
    pub fn nonnull_count(&self) -> u64 {
        self.element_count.saturating_sub(self.null_count)
    }
}

/// Column statistics a backend can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    /// Smallest non-null value
    Min,
    /// Largest non-null value
    Max,
    /// Sum of non-null values
    Sum,
    /// Arithmetic mean of non-null values
    Mean,
}

impl Statistic {
    /// The SQL aggregate function computing this statistic.
    pub fn sql_function(&self) -> &'static str {
        match self {
            Statistic::Min => "MIN",
            Statistic::Max => "MAX",
            Statistic::Sum => "SUM",
            Statistic::Mean => "AVG",
        }
    }

    /// Returns true if the statistic is only defined for numeric columns.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, Statistic::Sum | Statistic::Mean)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Sum => "sum",
            Statistic::Mean => "mean",
        };
        f.write_str(name)
    }
}

/// A dataset backend.
///
/// Implementations must treat a row whose condition evaluates to NULL as not
/// matching, exactly as SQL `CASE WHEN` and `WHERE` do.
#[async_trait]
pub trait BackendAdapter: Send + Sync + fmt::Debug {
    /// Short backend identifier used in logs and errors ("sql", "memory").
    fn name(&self) -> &'static str;

    /// Name of the table the backend reads.
    fn table_name(&self) -> &str;

    /// Human-readable description of the underlying table.
    fn description(&self) -> String;

    /// The schema captured when the backend was constructed.
    fn schema(&self) -> &SchemaSnapshot;

    /// Total number of rows.
    async fn row_count(&self) -> Result<u64>;

    /// Element, null and unexpected counts in one round trip.
    async fn count_and_null_and_unexpected(
        &self,
        column: &str,
        condition: &Condition,
    ) -> Result<MapCounts>;

    /// Element and null counts of a column in one round trip.
    async fn count_and_null(&self, column: &str) -> Result<ColumnCounts>;

    /// Values of `column` for rows matching `condition`, in backend order.
    ///
    /// `None` means unbounded.
    async fn sample_unexpected(
        &self,
        column: &str,
        condition: &Condition,
        limit: Option<usize>,
    ) -> Result<Vec<Value>>;

    /// Computes a statistic over the non-null values of a column.
    ///
    /// Returns `None` when there are no non-null values.
    async fn aggregate_statistic(&self, column: &str, statistic: Statistic)
        -> Result<Option<Value>>;

    /// Number of queries executed so far.
    fn round_trips(&self) -> u64;
}

/// Thread-safe counter of backend round trips.
#[derive(Debug, Default)]
pub struct RoundTripCounter(AtomicU64);

impl RoundTripCounter {
    /// Records one round trip.
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of recorded round trips.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
