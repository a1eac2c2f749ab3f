//! Result verbosity configuration.

use crate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Number of unexpected values sampled when no explicit count is requested.
pub const DEFAULT_PARTIAL_UNEXPECTED_COUNT: usize = 20;

/// The verbosity level of an evaluation outcome.
///
/// Levels are ordered: every field present at a level is also present at
/// every higher level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultFormatLevel {
    /// Only `success`
    BooleanOnly,
    /// Counts, percentages and a bounded sample of unexpected values
    #[default]
    Basic,
    /// Basic plus sample value counts (map) or details (aggregate)
    Summary,
    /// Summary with an unbounded unexpected sample
    Complete,
}

impl ResultFormatLevel {
    /// Returns the canonical name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFormatLevel::BooleanOnly => "BOOLEAN_ONLY",
            ResultFormatLevel::Basic => "BASIC",
            ResultFormatLevel::Summary => "SUMMARY",
            ResultFormatLevel::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for ResultFormatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultFormatLevel {
    type Err = ExpectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BOOLEAN_ONLY" => Ok(ResultFormatLevel::BooleanOnly),
            "BASIC" => Ok(ResultFormatLevel::Basic),
            "SUMMARY" => Ok(ResultFormatLevel::Summary),
            "COMPLETE" => Ok(ResultFormatLevel::Complete),
            other => Err(ExpectError::configuration(format!(
                "Unknown result_format '{other}'. Expected one of BOOLEAN_ONLY, BASIC, SUMMARY, COMPLETE"
            ))),
        }
    }
}

/// A resolved result format: verbosity plus an optional sample size override.
///
/// # Examples
///
/// ```rust
/// use term_expect::core::{ResultFormat, ResultFormatLevel};
///
/// let summary = ResultFormat::new(ResultFormatLevel::Summary);
/// assert_eq!(summary.unexpected_count_limit(), Some(20));
///
/// let complete = ResultFormat::new(ResultFormatLevel::Complete);
/// assert_eq!(complete.unexpected_count_limit(), None);
///
/// let bounded = complete.with_partial_unexpected_count(5);
/// assert_eq!(bounded.unexpected_count_limit(), Some(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResultFormat {
    /// The verbosity level
    #[serde(rename = "result_obj_format")]
    pub level: ResultFormatLevel,
    /// Overrides how many unexpected values are sampled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_unexpected_count: Option<usize>,
}

impl ResultFormat {
    /// Creates a result format with the default sample size for `level`.
    pub fn new(level: ResultFormatLevel) -> Self {
        Self {
            level,
            partial_unexpected_count: None,
        }
    }

    /// Shorthand for `BOOLEAN_ONLY`.
    pub fn boolean_only() -> Self {
        Self::new(ResultFormatLevel::BooleanOnly)
    }

    /// Shorthand for `BASIC`.
    pub fn basic() -> Self {
        Self::new(ResultFormatLevel::Basic)
    }

    /// Shorthand for `SUMMARY`.
    pub fn summary() -> Self {
        Self::new(ResultFormatLevel::Summary)
    }

    /// Shorthand for `COMPLETE`.
    pub fn complete() -> Self {
        Self::new(ResultFormatLevel::Complete)
    }

    /// Sets the number of unexpected values to sample.
    pub fn with_partial_unexpected_count(mut self, count: usize) -> Self {
        self.partial_unexpected_count = Some(count);
        self
    }

    /// Returns how many unexpected values to fetch; `None` means unbounded.
    pub fn unexpected_count_limit(&self) -> Option<usize> {
        match (self.partial_unexpected_count, self.level) {
            (Some(count), _) => Some(count),
            (None, ResultFormatLevel::Complete) => None,
            (None, _) => Some(DEFAULT_PARTIAL_UNEXPECTED_COUNT),
        }
    }

    /// Parses the `result_format` kwarg.
    ///
    /// Accepts a bare level string (`"SUMMARY"`) or an object of the form
    /// `{"result_obj_format": "SUMMARY", "partial_unexpected_count": 5}`.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(level) => Ok(Self::new(level.parse()?)),
            Value::Object(map) => {
                let level = match map.get("result_obj_format") {
                    Some(Value::String(level)) => level.parse()?,
                    Some(other) => {
                        return Err(ExpectError::configuration(format!(
                            "result_obj_format must be a string, got {other}"
                        )))
                    }
                    None => {
                        return Err(ExpectError::configuration(
                            "result_format object requires 'result_obj_format'",
                        ))
                    }
                };

                let partial_unexpected_count = match map.get("partial_unexpected_count") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(value.as_u64().ok_or_else(|| {
                        ExpectError::configuration(format!(
                            "partial_unexpected_count must be a non-negative integer, got {value}"
                        ))
                    })? as usize),
                };

                Ok(Self {
                    level,
                    partial_unexpected_count,
                })
            }
            other => Err(ExpectError::configuration(format!(
                "result_format must be a string or an object, got {other}"
            ))),
        }
    }
}

impl From<ResultFormatLevel> for ResultFormat {
    fn from(level: ResultFormatLevel) -> Self {
        Self::new(level)
    }
}
