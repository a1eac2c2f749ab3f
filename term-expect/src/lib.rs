//! # term-expect - Declarative Data Expectations for Rust
//!
//! term-expect evaluates declarative expectations ("values in `status` are
//! in this set", "the mean of `amount` is between 10 and 50", "the table
//! has 10 000 rows") against a tabular dataset and returns structured,
//! verbosity-controlled outcomes. Expectations run either pushed down to
//! DataFusion SQL or directly over in-memory Arrow batches; both backends
//! produce identical results.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use datafusion::prelude::SessionContext;
//! use serde_json::json;
//! use term_expect::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let ctx = SessionContext::new();
//! ctx.sql("CREATE TABLE orders (id BIGINT, status VARCHAR) AS VALUES \
//!          (1, 'open'), (2, 'shipped'), (3, 'lost')")
//!     .await?
//!     .collect()
//!     .await?;
//!
//! let backend = SqlBackend::connect(ctx, "orders").await?;
//! let dataset = Dataset::new(Arc::new(backend), DatasetConfig::default());
//!
//! let outcome = dataset
//!     .expect(
//!         "expect_column_values_to_be_in_set",
//!         json!({
//!             "column": "status",
//!             "values_set": ["open", "shipped"],
//!             "result_format": "SUMMARY",
//!         }),
//!     )
//!     .await?;
//!
//! assert!(!outcome.success);
//! assert_eq!(outcome.map_result().unwrap().partial_unexpected_list, vec![json!("lost")]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Expectation kinds
//!
//! - **Map** expectations test every row of a column. Nulls are excluded
//!   from the evaluated domain unless the expectation is about nulls itself.
//!   A `mostly` fraction relaxes the check to "at least this share of rows".
//! - **Aggregate** expectations bound a single column statistic
//!   (min, max, sum, mean).
//! - **Table** expectations check row counts and column presence.
//!
//! Custom expectations are added through the
//! [`ExpectationRegistry`](expectations::ExpectationRegistry).
//!
//! ## Result formats
//!
//! `BOOLEAN_ONLY` returns only `success`. `BASIC` adds counts and up to 20
//! unexpected values, `SUMMARY` adds value counts of the sample and
//! `COMPLETE` returns every unexpected value. Higher levels never drop a
//! field present at a lower one.
//!
//! ## Suites
//!
//! Every invocation is captured in the dataset's
//! [`ExpectationSuite`](core::ExpectationSuite). Suites serialize to JSON
//! and can be replayed against another dataset with
//! [`Dataset::validate`](core::Dataset::validate); reports can be rendered
//! with the [`formatters`].
//!
//! ## Architecture
//!
//! - **`core`**: dataset handle, configs, outcomes, suites, conditions
//! - **`expectations`**: expectation traits, registry and built-ins
//! - **`evaluation`**: shared map/aggregate/table evaluators
//! - **`backend`**: the backend trait with SQL and in-memory implementations
//! - **`formatters`**: outcome shaping and report rendering
//! - **`security`**: identifier escaping and input validation
//! - **`logging`**: `tracing` configuration helpers

pub mod backend;
pub mod core;
pub mod error;
pub mod evaluation;
pub mod expectations;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod security;
pub mod value;

#[cfg(test)]
pub mod test_helpers;
