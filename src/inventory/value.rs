//! Dynamically-typed configuration values.
//!
//! YAML host records arrive as loosely-typed key/value pairs. [`Value`] is
//! the closed set of shapes a raw value can take; all kind-dispatch in the
//! pipeline goes through it instead of ad-hoc downcasts.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A raw configuration value, as produced by YAML parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An explicit null (a key present without a value).
    Null,
    /// A boolean literal.
    Bool(bool),
    /// A signed integer literal.
    Integer(i64),
    /// A string.
    String(String),
    /// A sequence of values.
    List(Vec<Value>),
    /// A nested mapping, insertion-ordered.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts a scalar value to its string form.
    ///
    /// Strings, integers, and booleans are string-convertible; nulls, lists,
    /// and mappings are not and yield `None`.
    #[must_use]
    pub fn as_config_string(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Null | Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_scalars() {
        let value: Value = serde_yaml::from_str("22").unwrap();
        assert_eq!(value, Value::Integer(22));

        let value: Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(value, Value::Bool(true));

        let value: Value = serde_yaml::from_str("10.0.0.1").unwrap();
        assert_eq!(value, Value::String(String::from("10.0.0.1")));

        let value: Value = serde_yaml::from_str("~").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_deserialize_compounds() {
        let value: Value = serde_yaml::from_str("[a, 1]").unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::String(String::from("a")), Value::Integer(1)])
        );

        let value: Value = serde_yaml::from_str("{port: 22}").unwrap();
        let Value::Map(entries) = value else {
            panic!("expected mapping");
        };
        assert_eq!(entries["port"], Value::Integer(22));
    }

    #[test]
    fn test_as_config_string() {
        assert_eq!(Value::from("x").as_config_string().as_deref(), Some("x"));
        assert_eq!(Value::from(7).as_config_string().as_deref(), Some("7"));
        assert_eq!(Value::from(true).as_config_string().as_deref(), Some("true"));
        assert!(Value::Null.as_config_string().is_none());
        assert!(Value::List(Vec::new()).as_config_string().is_none());
        assert!(Value::Map(IndexMap::new()).as_config_string().is_none());
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![Value::from("a"), Value::from(1)]);
        assert_eq!(value.to_string(), "[a, 1]");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
