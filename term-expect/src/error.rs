//! Error types for the term-expect library.
//!
//! All fallible operations return [`ExpectError`]. The variants follow the
//! taxonomy the evaluation engine depends on: configuration and schema errors
//! are raised before any backend work and always propagate, while
//! [`ExpectError::BackendExecution`] is the only variant an invocation may
//! capture into a failed outcome when catch-exceptions mode is enabled.

use thiserror::Error;

/// Errors raised when a referenced table or column is absent from the
/// introspected schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The column is not part of the dataset's schema snapshot.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// The table could not be found when the dataset was constructed.
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },
}

/// The main error type for the term-expect library.
#[derive(Error, Debug)]
pub enum ExpectError {
    /// The caller supplied invalid or contradictory parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A referenced column or table is absent from the schema.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An expectation implementation returned a malformed result.
    #[error("Contract violation in '{expectation}': {message}")]
    ContractViolation {
        /// Name of the expectation whose implementation misbehaved
        expectation: String,
        /// What was wrong with the returned value
        message: String,
    },

    /// The execution substrate failed (query planning, execution, I/O).
    #[error("Backend execution failed ({backend}): {message}")]
    BackendExecution {
        /// Which backend raised the error ("sql", "memory", ...)
        backend: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An identifier failed validation before being placed into a query.
    #[error("Security error: {0}")]
    Security(String),

    /// Expectation suites or outcomes could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, ExpectError>`.
pub type Result<T> = std::result::Result<T, ExpectError>;

impl ExpectError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a column-not-found schema error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::Schema(SchemaError::ColumnNotFound {
            column: column.into(),
        })
    }

    /// Creates a contract violation error.
    pub fn contract_violation(expectation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContractViolation {
            expectation: expectation.into(),
            message: message.into(),
        }
    }

    /// Creates a backend execution error without an underlying source.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendExecution {
            backend: backend.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backend execution error wrapping the error that caused it.
    pub fn backend_with_source(
        backend: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::BackendExecution {
            backend: backend.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true if this error may be captured into a failed outcome.
    ///
    /// Only runtime failures of the execution substrate qualify. Errors that
    /// point at a broken expectation suite must fail fast.
    pub fn is_catchable(&self) -> bool {
        matches!(self, Self::BackendExecution { .. })
    }

    /// Renders this error and its chain of sources, one per line.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(source) = current {
            rendered.push_str("\ncaused by: ");
            rendered.push_str(&source.to_string());
            current = source.source();
        }
        rendered
    }
}

impl From<datafusion::error::DataFusionError> for ExpectError {
    fn from(err: datafusion::error::DataFusionError) -> Self {
        Self::BackendExecution {
            backend: "sql".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<arrow::error::ArrowError> for ExpectError {
    fn from(err: arrow::error::ArrowError) -> Self {
        Self::BackendExecution {
            backend: "memory".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for ExpectError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ExpectError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            ExpectError::BackendExecution {
                backend,
                message,
                source,
            } => ExpectError::BackendExecution {
                backend,
                message: format!("{}: {message}", f()),
                source,
            },
            ExpectError::Configuration(inner) => {
                ExpectError::Configuration(format!("{}: {inner}", f()))
            }
            ExpectError::Internal(inner) => ExpectError::Internal(format!("{}: {inner}", f())),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_column_not_found() {
        let err = ExpectError::column_not_found("user_id");
        assert_eq!(
            err.to_string(),
            "Schema error: Column 'user_id' not found in dataset"
        );
        assert!(!err.is_catchable());
    }

    #[test]
    fn test_backend_error_is_catchable() {
        let source = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset");
        let err = ExpectError::backend_with_source("sql", "query failed", Box::new(source));

        assert!(err.is_catchable());
        assert!(err.source().is_some());
        assert!(err.chain().contains("caused by: connection reset"));
    }

    #[test]
    fn test_only_backend_errors_are_catchable() {
        assert!(!ExpectError::configuration("min_value > max_value").is_catchable());
        assert!(!ExpectError::contract_violation("x", "missing success").is_catchable());
        assert!(!ExpectError::Security("bad identifier".to_string()).is_catchable());
    }

    #[test]
    fn test_datafusion_error_maps_to_backend() {
        let df_err = datafusion::error::DataFusionError::Plan("no such function".to_string());
        let err: ExpectError = df_err.into();
        assert!(matches!(err, ExpectError::BackendExecution { ref backend, .. } if backend == "sql"));
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(ExpectError::backend("memory", "kernel failed"))
        }

        let err = failing_operation()
            .context("While counting nulls")
            .unwrap_err();
        assert!(err.is_catchable());
        assert!(err.to_string().contains("While counting nulls"));
    }
}
