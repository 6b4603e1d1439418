use super::TidyDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell of a store row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Time(TidyDateTime),
}

impl Value {
    /// Numeric view of the value. Strings, booleans and timestamps are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn as_time(&self) -> Option<TidyDateTime> {
        match self {
            Value::Time(datetime) => Some(*datetime),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Time(datetime) => write!(f, "{}", datetime.to_rfc3339()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Time(datetime) => serializer.serialize_str(&datetime.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<TidyDateTime> for Value {
    fn from(datetime: TidyDateTime) -> Self {
        Value::Time(datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::TidyDateTimeExt;

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::from("12").as_f64(), None);
        assert_eq!(Value::Boolean(true).as_f64(), None);
        assert!(!Value::Time(TidyDateTime::from_unix_seconds_i64(0)).is_numeric());
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&Value::Integer(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&Value::from("on")).unwrap(), "\"on\"");
        assert_eq!(serde_json::to_string(&Value::Boolean(false)).unwrap(), "false");
    }
}
