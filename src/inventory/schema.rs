//! Schema registry for known host-configuration keys.
//!
//! The registry maps each configuration key to its required value kind and
//! optional default. Coercion is centralized in [`Requirement::coerce`] so
//! the pre-render and post-render conversion passes cannot drift apart.

use std::path::PathBuf;
use std::sync::LazyLock;

use crate::error::InventoryError;

use super::value::Value;

/// Configuration key holding the identity name of a host.
pub const KEY_HOST: &str = "host";
/// Configuration key holding the network address.
pub const KEY_HOSTNAME: &str = "hostname";
/// Configuration key holding the SSH login user.
pub const KEY_USER: &str = "user";
/// Configuration key holding the SSH port.
pub const KEY_SSH_PORT: &str = "ssh_port";
/// Configuration key holding the private key path.
pub const KEY_PRIVATE_KEY_FILE: &str = "private_key_file";
/// Configuration key enabling SSH agent forwarding.
pub const KEY_FORWARD_AGENT: &str = "forward_agent";
/// Configuration key holding the privilege-escalation user.
pub const KEY_BECOME_USER: &str = "become_user";

/// Required kind for a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Accepted unmodified.
    Any,
    /// Must parse as a signed integer.
    Integer,
    /// Must convert to a string of non-zero length.
    NonEmptyString,
    /// Must parse as a boolean.
    Boolean,
    /// Must parse as an integer greater than zero.
    PositiveInteger,
}

impl Requirement {
    /// Coerces `value` to the required type.
    ///
    /// Used by both the pre-render pass (on raw YAML values) and the
    /// post-render pass (on rendered strings).
    ///
    /// # Errors
    ///
    /// Returns the conversion error kind matching the failed requirement.
    pub fn coerce(self, key: &str, value: &Value) -> Result<Value, InventoryError> {
        match self {
            Self::Any => Ok(value.clone()),
            Self::Integer => parse_integer(key, value).map(Value::Integer),
            Self::NonEmptyString => {
                let s = string_form(key, value)?;
                if s.is_empty() {
                    return Err(InventoryError::ValueRequiresNonEmptyString {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
                Ok(Value::String(s))
            }
            Self::Boolean => {
                let s = string_form(key, value)?;
                match s.to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err(InventoryError::ValueRequiresBool {
                        key: key.to_string(),
                        value: value.to_string(),
                    }),
                }
            }
            Self::PositiveInteger => {
                let parsed = parse_integer(key, value)?;
                if parsed <= 0 {
                    return Err(InventoryError::ValueRequiresPositiveInteger {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
                Ok(Value::Integer(parsed))
            }
        }
    }
}

/// String form of a scalar value, or the unsupported-type error.
fn string_form(key: &str, value: &Value) -> Result<String, InventoryError> {
    value
        .as_config_string()
        .ok_or_else(|| InventoryError::UnsupportedValueType {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Integer form of a scalar value.
fn parse_integer(key: &str, value: &Value) -> Result<i64, InventoryError> {
    let s = string_form(key, value)?;
    s.parse()
        .map_err(|_| InventoryError::ValueRequiresInteger {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// One known configuration key: its requirement and optional default.
#[derive(Debug, Clone)]
pub struct SchemaItem {
    key: String,
    requirement: Requirement,
    default: Option<Value>,
}

impl SchemaItem {
    /// Creates a new schema item.
    #[must_use]
    pub fn new(key: impl Into<String>, requirement: Requirement, default: Option<Value>) -> Self {
        Self {
            key: key.into(),
            requirement,
            default,
        }
    }

    /// The configuration key this item describes.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The required value kind.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// The default value, if the key has one.
    #[must_use]
    pub const fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Lookup table of known configuration keys, loaded once per process.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    items: Vec<SchemaItem>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds an item to the registry.
    pub fn register(&mut self, item: SchemaItem) {
        self.items.push(item);
    }

    /// Looks up the item for `key`, if the key is known.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SchemaItem> {
        self.items.iter().find(|item| item.key == key)
    }

    /// All registered items, in registration order.
    #[must_use]
    pub fn get_all(&self) -> &[SchemaItem] {
        &self.items
    }

    /// Coerces `value` to the type required for `key`.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-item error for unknown keys and the per-kind
    /// conversion error otherwise.
    pub fn build(&self, key: &str, value: &Value) -> Result<Value, InventoryError> {
        let Some(item) = self.get(key) else {
            return Err(InventoryError::UnsupportedConfigItem {
                context: key.to_string(),
            });
        };
        item.requirement.coerce(key, value)
    }
}

/// The process-wide schema registry for host-configuration keys.
pub fn hosts_schema() -> &'static SchemaRegistry {
    static SCHEMA: LazyLock<SchemaRegistry> = LazyLock::new(default_registry);
    &SCHEMA
}

/// Builds the registry of known host keys.
fn default_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register(SchemaItem::new(KEY_HOST, Requirement::NonEmptyString, None));
    registry.register(SchemaItem::new(
        KEY_HOSTNAME,
        Requirement::NonEmptyString,
        None,
    ));
    registry.register(SchemaItem::new(
        KEY_USER,
        Requirement::NonEmptyString,
        Some(Value::from("root")),
    ));
    registry.register(SchemaItem::new(
        KEY_SSH_PORT,
        Requirement::PositiveInteger,
        Some(Value::Integer(22)),
    ));
    registry.register(SchemaItem::new(
        KEY_PRIVATE_KEY_FILE,
        Requirement::NonEmptyString,
        Some(default_private_key_file()),
    ));
    registry.register(SchemaItem::new(
        KEY_FORWARD_AGENT,
        Requirement::Boolean,
        Some(Value::Bool(false)),
    ));
    registry.register(SchemaItem::new(KEY_BECOME_USER, Requirement::Any, None));
    registry
}

/// Default private key location, relative to the invoking user's home.
fn default_private_key_file() -> Value {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
    Value::String(home.join(".ssh").join("id_rsa").display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer() {
        let coerced = Requirement::Integer.coerce("p", &Value::from("42")).unwrap();
        assert_eq!(coerced, Value::Integer(42));

        let coerced = Requirement::Integer.coerce("p", &Value::Integer(7)).unwrap();
        assert_eq!(coerced, Value::Integer(7));

        let err = Requirement::Integer.coerce("p", &Value::from("abc")).unwrap_err();
        assert!(matches!(err, InventoryError::ValueRequiresInteger { .. }));
    }

    #[test]
    fn test_coerce_non_empty_string() {
        let coerced = Requirement::NonEmptyString
            .coerce("h", &Value::Integer(10))
            .unwrap();
        assert_eq!(coerced, Value::String(String::from("10")));

        let err = Requirement::NonEmptyString
            .coerce("h", &Value::from(""))
            .unwrap_err();
        assert!(matches!(err, InventoryError::ValueRequiresNonEmptyString { .. }));
    }

    #[test]
    fn test_coerce_boolean_spellings() {
        for raw in ["true", "True", "TRUE", "1"] {
            let coerced = Requirement::Boolean.coerce("f", &Value::from(raw)).unwrap();
            assert_eq!(coerced, Value::Bool(true), "spelling: {raw}");
        }
        for raw in ["false", "False", "0"] {
            let coerced = Requirement::Boolean.coerce("f", &Value::from(raw)).unwrap();
            assert_eq!(coerced, Value::Bool(false), "spelling: {raw}");
        }

        let err = Requirement::Boolean.coerce("f", &Value::from("maybe")).unwrap_err();
        assert!(matches!(err, InventoryError::ValueRequiresBool { .. }));
    }

    #[test]
    fn test_coerce_positive_integer() {
        let coerced = Requirement::PositiveInteger
            .coerce("n", &Value::from("3"))
            .unwrap();
        assert_eq!(coerced, Value::Integer(3));

        for raw in ["0", "-2"] {
            let err = Requirement::PositiveInteger
                .coerce("n", &Value::from(raw))
                .unwrap_err();
            assert!(
                matches!(err, InventoryError::ValueRequiresPositiveInteger { .. }),
                "value: {raw}"
            );
        }
    }

    #[test]
    fn test_coerce_rejects_compounds() {
        let err = Requirement::Integer
            .coerce("p", &Value::List(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, InventoryError::UnsupportedValueType { .. }));
    }

    #[test]
    fn test_any_passes_through() {
        let value = Value::List(vec![Value::from("x")]);
        assert_eq!(Requirement::Any.coerce("k", &value).unwrap(), value);
    }

    #[test]
    fn test_registry_lookup() {
        let schema = hosts_schema();
        assert!(schema.get(KEY_HOST).is_some());
        assert!(schema.get("gpu_count").is_none());
        assert_eq!(schema.get_all().len(), 7);

        let port = schema.get(KEY_SSH_PORT).unwrap();
        assert_eq!(port.default(), Some(&Value::Integer(22)));
        assert_eq!(port.requirement(), Requirement::PositiveInteger);
    }

    #[test]
    fn test_registry_build() {
        let schema = hosts_schema();
        let coerced = schema.build(KEY_SSH_PORT, &Value::from("2222")).unwrap();
        assert_eq!(coerced, Value::Integer(2222));

        let err = schema.build("unknown", &Value::from("x")).unwrap_err();
        assert!(matches!(err, InventoryError::UnsupportedConfigItem { .. }));
    }
}
