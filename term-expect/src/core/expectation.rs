//! Expectation configurations, invocation options and typed parameter access.

use super::ResultFormat;
use crate::prelude::*;
use crate::security::InputValidator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A declarative expectation: its registered name plus keyword arguments.
///
/// # Examples
///
/// ```rust
/// use term_expect::core::ExpectationConfig;
/// use serde_json::json;
///
/// let config = ExpectationConfig::new("expect_column_values_to_be_between")
///     .with_kwarg("column", json!("age"))
///     .with_kwarg("min_value", json!(0))
///     .with_kwarg("max_value", json!(120))
///     .with_kwarg("mostly", json!(0.95));
///
/// assert_eq!(config.column(), Some("age"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationConfig {
    /// The registered expectation name
    pub expectation_type: String,
    /// Parameters and invocation options
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    /// Free-form annotations carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ExpectationConfig {
    /// Creates a config with no kwargs.
    pub fn new(expectation_type: impl Into<String>) -> Self {
        Self {
            expectation_type: expectation_type.into(),
            kwargs: Map::new(),
            meta: None,
        }
    }

    /// Creates a config from an existing kwargs map.
    pub fn with_kwargs(expectation_type: impl Into<String>, kwargs: Map<String, Value>) -> Self {
        Self {
            expectation_type: expectation_type.into(),
            kwargs,
            meta: None,
        }
    }

    /// Adds a single kwarg.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Attaches meta annotations.
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns the `column` kwarg if the expectation targets one.
    pub fn column(&self) -> Option<&str> {
        self.kwargs.get("column").and_then(Value::as_str)
    }

    /// Returns true if `other` configures the same expectation on the same column.
    pub fn is_equivalent_to(&self, other: &ExpectationConfig) -> bool {
        self.expectation_type == other.expectation_type && self.column() == other.column()
    }
}

/// Options that shape an invocation's outcome, extracted from the kwargs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationOptions {
    /// Requested verbosity; `None` means the dataset default
    pub result_format: Option<ResultFormat>,
    /// Attach the expectation config to the outcome
    pub include_config: Option<bool>,
    /// Capture backend errors into a failed outcome; `None` means the dataset default
    pub catch_exceptions: Option<bool>,
    /// Pass-through annotations
    pub meta: Option<Value>,
}

impl InvocationOptions {
    /// Splits a kwargs map into invocation options and expectation parameters.
    pub fn split(kwargs: &Map<String, Value>) -> Result<(Self, Map<String, Value>)> {
        let mut params = kwargs.clone();

        let result_format = match params.remove("result_format") {
            None | Some(Value::Null) => None,
            Some(value) => Some(ResultFormat::from_value(&value)?),
        };
        let include_config = optional_bool(params.remove("include_config"), "include_config")?;
        let catch_exceptions =
            optional_bool(params.remove("catch_exceptions"), "catch_exceptions")?;
        let meta = match params.remove("meta") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        };

        Ok((
            Self {
                result_format,
                include_config,
                catch_exceptions,
                meta,
            },
            params,
        ))
    }
}

fn optional_bool(value: Option<Value>, name: &str) -> Result<Option<bool>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(other) => Err(ExpectError::configuration(format!(
            "{name} must be a boolean or null, got {other}"
        ))),
    }
}

/// Typed read access to an expectation's parameters.
///
/// A parameter explicitly set to `null` is treated as absent.
#[derive(Debug, Clone)]
pub struct ExpectationParams {
    expectation: String,
    values: Map<String, Value>,
}

impl ExpectationParams {
    /// Wraps the parameters of `expectation`.
    pub fn new(expectation: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            expectation: expectation.into(),
            values,
        }
    }

    /// The expectation these parameters belong to.
    pub fn expectation(&self) -> &str {
        &self.expectation
    }

    /// Returns the raw value of a parameter, ignoring explicit nulls.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    /// Returns true if the parameter is present and not null.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fails with a configuration error naming every missing parameter.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExpectError::configuration(format!(
                "{} requires parameter(s): {}",
                self.expectation,
                missing.join(", ")
            )))
        }
    }

    /// Returns the target column.
    pub fn column(&self) -> Result<&str> {
        self.get_str("column")?.ok_or_else(|| {
            ExpectError::configuration(format!("{} requires a column", self.expectation))
        })
    }

    /// Reads an optional string parameter.
    pub fn get_str(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.type_error(name, "a string", other)),
        }
    }

    /// Reads an optional numeric parameter.
    pub fn get_f64(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| self.type_error(name, "a number", value))?;
                InputValidator::validate_finite(number, name)?;
                Ok(Some(number))
            }
        }
    }

    /// Reads an optional integral parameter. `10.0` is accepted, `10.5` is not.
    pub fn get_integer(&self, name: &str) -> Result<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => {
                if let Some(integer) = value.as_i64() {
                    return Ok(Some(integer));
                }
                match value.as_f64() {
                    Some(number) if number.fract() == 0.0 && number.is_finite() => {
                        Ok(Some(number as i64))
                    }
                    _ => Err(self.type_error(name, "an integer", value)),
                }
            }
        }
    }

    /// Reads an optional boolean parameter.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(other) => Err(self.type_error(name, "a boolean", other)),
        }
    }

    /// Reads an optional array parameter.
    pub fn get_array(&self, name: &str) -> Result<Option<&Vec<Value>>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Array(values)) => Ok(Some(values)),
            Some(other) => Err(self.type_error(name, "an array", other)),
        }
    }

    /// Reads and validates the `mostly` threshold.
    pub fn mostly(&self) -> Result<Option<f64>> {
        let mostly = self.get_f64("mostly")?;
        if let Some(fraction) = mostly {
            InputValidator::validate_fraction(fraction, "mostly")?;
        }
        Ok(mostly)
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    fn type_error(&self, name: &str, expected: &str, found: &Value) -> ExpectError {
        ExpectError::configuration(format!(
            "{}: parameter '{name}' must be {expected}, got {found}",
            self.expectation
        ))
    }
}
