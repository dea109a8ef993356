//! The closed tagged value type for record attributes.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Number;

/// A typed attribute value.
///
/// Every value a record can hold is one of these four variants; the schema's
/// declared [`AttrType`](crate::schema::AttrType) decides which variant an
/// attribute accepts. Numbers ride on [`serde_json::Number`], which admits no
/// NaN or infinity, keeps integers exact, and renders canonically.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(Number),
    Str(String),
    Json(serde_json::Value),
}

/// A record: attribute name to typed value.
pub type Record = BTreeMap<String, Value>;

impl Value {
    /// Build a number value from a float. Returns `None` for NaN/infinity.
    pub fn float(n: f64) -> Option<Self> {
        Number::from_f64(n).map(Value::Number)
    }

    /// The variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Json(_) => "json",
        }
    }

    /// Whether this value is the empty form of its variant.
    ///
    /// Empty values are treated identically to absent ones: an empty string
    /// and a json `null` are never written to storage.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Str(s) => s.is_empty(),
            Value::Json(v) => v.is_null(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(Value::float(3.25).is_some());
        assert!(Value::float(f64::NAN).is_none());
        assert!(Value::float(f64::INFINITY).is_none());
    }

    #[test]
    fn test_empty_forms() {
        assert!(Value::from("").is_empty());
        assert!(Value::Json(serde_json::Value::Null).is_empty());
        assert!(!Value::from("x").is_empty());
        assert!(!Value::from(0).is_empty());
        assert!(!Value::from(false).is_empty());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert!(Value::from("hi").as_bool().is_none());
        assert_eq!(Value::from(7).as_number().and_then(|n| n.as_i64()), Some(7));
    }
}
