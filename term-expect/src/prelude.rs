//! Prelude for commonly used types and traits in term-expect.

pub use crate::backend::{BackendAdapter, InMemoryBackend, SqlBackend};
pub use crate::core::{
    Dataset, DatasetConfig, EvaluationOutcome, ExpectationConfig, ExpectationSuite, ResultFormat,
    ValidateOptions, ValidationReport,
};
pub use crate::error::{ErrorContext, ExpectError, Result};
pub use crate::formatters::{FormatterConfig, HumanFormatter, JsonFormatter, ReportFormatter};
pub use crate::logging::LogConfig;
