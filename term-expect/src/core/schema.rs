//! Typed schema snapshot captured once when a dataset is constructed.

use crate::prelude::*;
use arrow::datatypes::{DataType, Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The semantic type of a column, derived from its physical Arrow type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Integers, floats and decimals
    Numeric,
    /// Booleans
    Boolean,
    /// UTF-8 strings
    String,
    /// Dates, times and timestamps
    Temporal,
    /// Anything else (binary, nested, ...)
    Other,
}

impl SemanticType {
    /// Classifies an Arrow data type.
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => SemanticType::Numeric,
            DataType::Boolean => SemanticType::Boolean,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => SemanticType::String,
            DataType::Date32
            | DataType::Date64
            | DataType::Time32(_)
            | DataType::Time64(_)
            | DataType::Timestamp(_, _) => SemanticType::Temporal,
            DataType::Dictionary(_, value) => Self::from_arrow(value),
            _ => SemanticType::Other,
        }
    }

    /// Returns true for numeric columns.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SemanticType::Numeric)
    }

    /// Returns true if a JSON parameter value can be compared with values of
    /// this type without coercion.
    ///
    /// Null is accepted everywhere. Temporal columns take ISO-8601 strings.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;

        match (self, value) {
            (_, Value::Null) => true,
            (SemanticType::Numeric, Value::Number(_)) => true,
            (SemanticType::Boolean, Value::Bool(_)) => true,
            (SemanticType::String | SemanticType::Temporal, Value::String(_)) => true,
            _ => false,
        }
    }

    /// Returns true if values of this type have a meaningful ordering.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            SemanticType::Numeric | SemanticType::String | SemanticType::Temporal
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Boolean => "boolean",
            SemanticType::String => "string",
            SemanticType::Temporal => "temporal",
            SemanticType::Other => "other",
        };
        f.write_str(name)
    }
}

/// One column of a [`SchemaSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name as reported by the backend
    pub name: String,
    /// Position in the table
    pub index: usize,
    /// Inferred semantic type
    pub semantic_type: SemanticType,
    /// Physical type
    pub data_type: DataType,
}

/// An immutable, ordered view of a table's columns.
///
/// The snapshot is taken once at dataset construction and never refreshed;
/// evaluators consult it instead of re-querying the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaSnapshot {
    columns: Vec<ColumnInfo>,
    by_name: HashMap<String, usize>,
}

impl SchemaSnapshot {
    /// Builds a snapshot from an Arrow schema.
    pub fn from_arrow(schema: &Schema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| ColumnInfo {
                name: field.name().clone(),
                index,
                semantic_type: SemanticType::from_arrow(field.data_type()),
                data_type: field.data_type().clone(),
            })
            .collect::<Vec<_>>();

        let by_name = columns
            .iter()
            .map(|column| (column.name.clone(), column.index))
            .collect();

        Self { columns, by_name }
    }

    /// Looks up a column, failing with a schema error if it does not exist.
    pub fn column(&self, name: &str) -> Result<&ColumnInfo> {
        self.get(name)
            .ok_or_else(|| ExpectError::column_not_found(name))
    }

    /// Looks up a column.
    pub fn get(&self, name: &str) -> Option<&ColumnInfo> {
        self.by_name.get(name).map(|&index| &self.columns[index])
    }

    /// Returns true if the column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the position of a column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in table order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
