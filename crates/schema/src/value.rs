//! Typed values for default clauses and record fields
//!
//! `DatabaseValue` carries the handful of types this engine moves between
//! Rust and the store: default-clause literals folded into column fragments,
//! and the fields of a migration record.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// A typed database value
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Json(JsonValue),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Render the value as a SQL literal for interpolation into DDL.
    ///
    /// Strings are quoted with embedded single quotes doubled, booleans
    /// become `1`/`0`, numerics render verbatim.
    pub fn to_sql_literal(&self) -> String {
        match self {
            DatabaseValue::Null => "NULL".to_string(),
            DatabaseValue::Bool(true) => "1".to_string(),
            DatabaseValue::Bool(false) => "0".to_string(),
            DatabaseValue::Int(value) => value.to_string(),
            DatabaseValue::UInt(value) => value.to_string(),
            DatabaseValue::Float(value) => value.to_string(),
            DatabaseValue::String(value) => quote_literal(value),
            DatabaseValue::DateTime(value) => {
                format!("'{}'", value.format("%Y-%m-%d %H:%M:%S"))
            }
            DatabaseValue::Json(value) => quote_literal(&value.to_string()),
        }
    }
}

/// Quote a string literal, doubling embedded single quotes
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int(i64::from(value))
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int(value)
    }
}

impl From<u64> for DatabaseValue {
    fn from(value: u64) -> Self {
        DatabaseValue::UInt(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for DatabaseValue {
    fn from(value: DateTime<Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_quoted_with_doubled_quotes() {
        assert_eq!(
            DatabaseValue::from("o'brien").to_sql_literal(),
            "'o''brien'"
        );
    }

    #[test]
    fn booleans_render_numeric() {
        assert_eq!(DatabaseValue::from(true).to_sql_literal(), "1");
        assert_eq!(DatabaseValue::from(false).to_sql_literal(), "0");
    }

    #[test]
    fn numerics_render_verbatim() {
        assert_eq!(DatabaseValue::from(42i64).to_sql_literal(), "42");
        assert_eq!(DatabaseValue::from(2.5f64).to_sql_literal(), "2.5");
        assert_eq!(DatabaseValue::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn json_renders_as_quoted_text() {
        let value = DatabaseValue::from(serde_json::json!({"k": "v"}));
        assert_eq!(value.to_sql_literal(), "'{\"k\":\"v\"}'");
    }

    #[test]
    fn option_none_maps_to_null() {
        assert!(DatabaseValue::from(Option::<i64>::None).is_null());
    }
}
