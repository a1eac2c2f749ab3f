//! Backend-neutral row predicates.
//!
//! A map expectation describes the rows that *violate* it as a [`Condition`].
//! The SQL backend renders the tree into a `WHERE`/`CASE WHEN` fragment; the
//! in-memory backend evaluates it to a boolean mask. Both follow SQL
//! three-valued logic, so a row whose predicate is NULL is never counted.

use crate::prelude::*;
use crate::security::{InputValidator, SqlSecurity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A scalar literal used in a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// SQL NULL
    Null,
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating point literal, always finite
    Float(f64),
    /// String literal
    Str(String),
}

impl Literal {
    /// Converts a JSON parameter value into a literal.
    ///
    /// Arrays and objects are rejected, as are non-finite numbers.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Literal::Null),
            Value::Bool(b) => Ok(Literal::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Literal::Int(i))
                } else {
                    let f = n.as_f64().ok_or_else(|| {
                        ExpectError::configuration(format!("Unsupported numeric literal {n}"))
                    })?;
                    InputValidator::validate_finite(f, "literal")?;
                    Ok(Literal::Float(f))
                }
            }
            Value::String(s) => Ok(Literal::Str(s.clone())),
            other => Err(ExpectError::configuration(format!(
                "Expected a scalar value, got {other}"
            ))),
        }
    }

    /// Returns true for the NULL literal.
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Renders the literal as SQL.
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Literal::Null => Ok("NULL".to_string()),
            Literal::Bool(true) => Ok("TRUE".to_string()),
            Literal::Bool(false) => Ok("FALSE".to_string()),
            Literal::Int(i) => Ok(i.to_string()),
            Literal::Float(f) => {
                InputValidator::validate_finite(*f, "literal")?;
                Ok(format!("{f:?}"))
            }
            Literal::Str(s) => SqlSecurity::escape_string_literal(s),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Str(s) => write!(f, "'{s}'"),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl CompareOp {
    /// Returns the SQL operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// A predicate over the rows of a single table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// `column IS NULL`
    IsNull { column: String },
    /// `column IS NOT NULL`
    IsNotNull { column: String },
    /// `column <op> value`; never constructed with a NULL value
    Compare {
        column: String,
        op: CompareOp,
        value: Literal,
    },
    /// `column IN (values)`; a NULL member matches null rows
    InSet { column: String, values: Vec<Literal> },
    /// Unanchored regular expression match
    Matches { column: String, pattern: String },
    /// Logical negation
    Not(Box<Condition>),
    /// Logical conjunction
    And(Box<Condition>, Box<Condition>),
    /// Logical disjunction
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull {
            column: column.into(),
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Condition::IsNotNull {
            column: column.into(),
        }
    }

    /// Builds a comparison.
    ///
    /// Equality against NULL becomes `IS NULL` and inequality becomes
    /// `IS NOT NULL`; ordering comparisons against NULL are rejected.
    pub fn compare(column: impl Into<String>, op: CompareOp, value: Literal) -> Result<Self> {
        let column = column.into();
        if value.is_null() {
            return match op {
                CompareOp::Eq => Ok(Condition::IsNull { column }),
                CompareOp::NotEq => Ok(Condition::IsNotNull { column }),
                _ => Err(ExpectError::configuration(format!(
                    "Cannot compare column '{column}' with null using '{}'",
                    op.as_sql()
                ))),
            };
        }
        Ok(Condition::Compare { column, op, value })
    }

    /// `column IN (values)`
    pub fn in_set(column: impl Into<String>, values: Vec<Literal>) -> Self {
        Condition::InSet {
            column: column.into(),
            values,
        }
    }

    /// Regex match; the pattern is validated up front.
    pub fn matches(column: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        SqlSecurity::validate_regex_pattern(&pattern)?;
        Ok(Condition::Matches {
            column: column.into(),
            pattern,
        })
    }

    /// Negates a condition.
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Conjunction of two conditions.
    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of two conditions.
    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    /// Renders the condition as a SQL boolean expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use term_expect::core::{CompareOp, Condition, Literal};
    ///
    /// let cond = Condition::compare("age", CompareOp::Lt, Literal::Int(0))
    ///     .unwrap()
    ///     .or(Condition::compare("age", CompareOp::Gt, Literal::Int(120)).unwrap());
    /// assert_eq!(cond.to_sql().unwrap(), "((\"age\" < 0) OR (\"age\" > 120))");
    ///
    /// let null_eq = Condition::compare("age", CompareOp::Eq, Literal::Null).unwrap();
    /// assert_eq!(null_eq.to_sql().unwrap(), "(\"age\" IS NULL)");
    /// ```
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Condition::IsNull { column } => {
                Ok(format!("({} IS NULL)", SqlSecurity::escape_identifier(column)?))
            }
            Condition::IsNotNull { column } => Ok(format!(
                "({} IS NOT NULL)",
                SqlSecurity::escape_identifier(column)?
            )),
            Condition::Compare { column, op, value } => {
                if value.is_null() {
                    return Condition::compare(column.clone(), *op, Literal::Null)?.to_sql();
                }
                Ok(format!(
                    "({} {} {})",
                    SqlSecurity::escape_identifier(column)?,
                    op.as_sql(),
                    value.to_sql()?
                ))
            }
            Condition::InSet { column, values } => {
                let quoted = SqlSecurity::escape_identifier(column)?;
                let members = values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(Literal::to_sql)
                    .collect::<Result<Vec<_>>>()?;
                let has_null = values.iter().any(Literal::is_null);

                let in_list = if members.is_empty() {
                    "FALSE".to_string()
                } else {
                    format!("{quoted} IN ({})", members.join(", "))
                };
                if has_null {
                    Ok(format!("({in_list} OR {quoted} IS NULL)"))
                } else {
                    Ok(format!("({in_list})"))
                }
            }
            Condition::Matches { column, pattern } => Ok(format!(
                "({} ~ {})",
                SqlSecurity::escape_identifier(column)?,
                SqlSecurity::escape_string_literal(pattern)?
            )),
            Condition::Not(inner) => Ok(format!("(NOT {})", inner.to_sql()?)),
            Condition::And(left, right) => {
                Ok(format!("({} AND {})", left.to_sql()?, right.to_sql()?))
            }
            Condition::Or(left, right) => {
                Ok(format!("({} OR {})", left.to_sql()?, right.to_sql()?))
            }
        }
    }
}

/// How a map expectation treats null rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NullPolicy {
    /// Null rows are excluded; success is measured over non-null rows
    #[default]
    IgnoreNulls,
    /// The condition sees every row; success is measured over all rows
    IncludeNulls,
}

impl NullPolicy {
    /// Restricts `condition` to the rows this policy evaluates.
    pub fn apply(&self, column: &str, condition: Condition) -> Condition {
        match self {
            NullPolicy::IgnoreNulls => Condition::is_not_null(column).and(condition),
            NullPolicy::IncludeNulls => condition,
        }
    }
}
