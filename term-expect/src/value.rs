//! Conversion of backend values into JSON.
//!
//! Both backends route every value they report (samples, aggregate
//! statistics) through [`scalar_to_json`], so the two produce identical
//! outcomes for the same data.

use arrow::array::Array;
use chrono::{DateTime, NaiveDate, Utc};
use datafusion::scalar::ScalarValue;
use serde_json::{Number, Value};
use std::cmp::Ordering;

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converts a single scalar to JSON.
///
/// Dates render as `YYYY-MM-DD`, timestamps as ISO-8601, decimals as
/// floats. Nulls and non-finite floats become `null`.
pub fn scalar_to_json(value: &ScalarValue) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match value {
        ScalarValue::Boolean(Some(b)) => Value::Bool(*b),
        ScalarValue::Int8(Some(v)) => Value::from(*v),
        ScalarValue::Int16(Some(v)) => Value::from(*v),
        ScalarValue::Int32(Some(v)) => Value::from(*v),
        ScalarValue::Int64(Some(v)) => Value::from(*v),
        ScalarValue::UInt8(Some(v)) => Value::from(*v),
        ScalarValue::UInt16(Some(v)) => Value::from(*v),
        ScalarValue::UInt32(Some(v)) => Value::from(*v),
        ScalarValue::UInt64(Some(v)) => Value::from(*v),
        ScalarValue::Float32(Some(v)) => float_to_json(f64::from(*v)),
        ScalarValue::Float64(Some(v)) => float_to_json(*v),
        ScalarValue::Decimal128(Some(v), _, scale) => {
            float_to_json(*v as f64 / 10f64.powi(i32::from(*scale)))
        }
        ScalarValue::Utf8(Some(s))
        | ScalarValue::LargeUtf8(Some(s))
        | ScalarValue::Utf8View(Some(s)) => Value::String(s.clone()),
        ScalarValue::Date32(Some(days)) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| Value::String(value.to_string())),
        ScalarValue::Date64(Some(ms)) => DateTime::from_timestamp_millis(*ms)
            .map(|dt| Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| Value::String(value.to_string())),
        ScalarValue::TimestampSecond(Some(v), tz) => {
            timestamp_to_json(DateTime::from_timestamp(*v, 0), tz.is_some(), value)
        }
        ScalarValue::TimestampMillisecond(Some(v), tz) => {
            timestamp_to_json(DateTime::from_timestamp_millis(*v), tz.is_some(), value)
        }
        ScalarValue::TimestampMicrosecond(Some(v), tz) => {
            timestamp_to_json(DateTime::from_timestamp_micros(*v), tz.is_some(), value)
        }
        ScalarValue::TimestampNanosecond(Some(v), tz) => timestamp_to_json(
            Some(DateTime::from_timestamp_nanos(*v)),
            tz.is_some(),
            value,
        ),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn timestamp_to_json(dt: Option<DateTime<Utc>>, has_tz: bool, original: &ScalarValue) -> Value {
    match dt {
        Some(dt) if has_tz => Value::String(dt.to_rfc3339()),
        Some(dt) => Value::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        None => Value::String(original.to_string()),
    }
}

/// Converts every row of an array to JSON, in order.
///
/// Errors are left unlabelled; each backend attributes them to itself.
pub fn array_to_json(array: &dyn Array) -> datafusion::error::Result<Vec<Value>> {
    (0..array.len())
        .map(|row| ScalarValue::try_from_array(array, row).map(|scalar| scalar_to_json(&scalar)))
        .collect()
}

/// Orders two JSON values of the same kind.
///
/// Numbers compare numerically and strings lexically; any other pairing is
/// unordered.
pub fn compare_json(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
