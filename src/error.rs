//! Error types for the hostfleet inventory compiler.
//!
//! This module provides the error hierarchy for the compilation pipeline:
//! parsing, merging, schema conversion, structural validation, instance
//! expansion, and variable rendering.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the hostfleet compiler.
#[derive(Debug, Error)]
pub enum HostfleetError {
    /// Inventory compilation errors.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Variable engine errors.
    #[error("Variable error: {0}")]
    Variable(#[from] VariableError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while compiling a host inventory.
///
/// Every variant carries formatted context identifying the offending host
/// index, key, or value. There is no local recovery: the first error aborts
/// processing of the entire inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The hosts file was not found.
    #[error("Hosts file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The hosts document could not be parsed as YAML.
    #[error("Failed to parse hosts: {message}")]
    ParseHostsFailed {
        /// Description of the parse error.
        message: String,
    },

    /// The hosts document contains no host records.
    #[error("Hosts document is empty")]
    EmptyHosts,

    /// A reserved list key held a non-list value or a non-string element.
    #[error("Value requires string list: hosts[{sequence}].{key} = {value}")]
    ValueRequiresStringSlice {
        /// Index of the host record.
        sequence: usize,
        /// The reserved key.
        key: String,
        /// The offending raw value.
        value: String,
    },

    /// A value could not be converted to its string form.
    #[error("Unsupported configure value type: {key} = {value}")]
    UnsupportedValueType {
        /// The configuration key.
        key: String,
        /// The offending raw value.
        value: String,
    },

    /// A value could not be parsed as an integer.
    #[error("Value requires integer: {key} = {value}")]
    ValueRequiresInteger {
        /// The configuration key.
        key: String,
        /// The offending raw value.
        value: String,
    },

    /// A value converted to an empty string.
    #[error("Value requires non-empty string: {key} = {value}")]
    ValueRequiresNonEmptyString {
        /// The configuration key.
        key: String,
        /// The offending raw value.
        value: String,
    },

    /// A value could not be parsed as a boolean.
    #[error("Value requires boolean: {key} = {value}")]
    ValueRequiresBool {
        /// The configuration key.
        key: String,
        /// The offending raw value.
        value: String,
    },

    /// An integer value was zero or negative.
    #[error("Value requires positive integer: {key} = {value}")]
    ValueRequiresPositiveInteger {
        /// The configuration key.
        key: String,
        /// The offending raw value.
        value: String,
    },

    /// A host record contains a key outside the schema registry's known set.
    #[error("Unsupported host configure item: {context}")]
    UnsupportedConfigItem {
        /// Formatted context naming the host index, key, and value.
        context: String,
    },

    /// The identity name field is missing or empty.
    #[error("Host field missing: hosts[{sequence}].host = nil")]
    HostFieldMissing {
        /// Index of the host record.
        sequence: usize,
    },

    /// The hostname field is missing or empty.
    #[error("Hostname field missing: hosts[{sequence}].hostname = nil")]
    HostnameFieldMissing {
        /// Index of the host record.
        sequence: usize,
    },

    /// The hostname is not a syntactically valid network address.
    #[error("Hostname requires valid IP address: hosts[{sequence}].hostname = {hostname}")]
    HostnameRequiresValidAddress {
        /// Index of the host record.
        sequence: usize,
        /// The invalid hostname.
        hostname: String,
    },

    /// The SSH port exceeds the platform maximum port number.
    #[error("SSH port exceeds max port number: hosts[{sequence}].ssh_port = {port}")]
    SshPortExceedsMaxPort {
        /// Index of the host record.
        sequence: usize,
        /// The out-of-range port.
        port: i64,
    },

    /// The private key path is not absolute.
    #[error("Private key file requires absolute path: hosts[{sequence}].private_key_file = {path}")]
    PrivateKeyRequiresAbsolutePath {
        /// Index of the host record.
        sequence: usize,
        /// The offending path.
        path: String,
    },

    /// The private key file does not exist on the local filesystem.
    #[error("Private key file not exist: {path}: no such file")]
    PrivateKeyNotExist {
        /// The missing path.
        path: String,
    },

    /// The private key file is not restricted to owner read/write.
    #[error("Private key file requires 600 permissions: {path}: mode ({mode:o})")]
    PrivateKeyRequires600Permissions {
        /// The offending path.
        path: String,
        /// The actual permission bits.
        mode: u32,
    },

    /// Two logical hosts share the same identity name.
    #[error("Duplicate host: {host}")]
    DuplicateHost {
        /// The repeated identity name.
        host: String,
    },

    /// The variable scope could not be resolved.
    #[error("Resolve variable failed: {source}")]
    ResolveVariableFailed {
        /// The underlying variable engine error.
        #[source]
        source: VariableError,
    },

    /// A string field could not be rendered against the variable scope.
    #[error("Rendering variable failed for {field}: {source}")]
    RenderingVariableFailed {
        /// The field being rendered when the failure occurred.
        field: String,
        /// The underlying variable engine error.
        #[source]
        source: VariableError,
    },
}

/// Errors raised by the variable engine.
#[derive(Debug, Error)]
pub enum VariableError {
    /// A variable with this name is already registered in the scope.
    #[error("Duplicate variable: {name}")]
    Duplicate {
        /// The repeated variable name.
        name: String,
    },

    /// A referenced variable is not registered in the scope.
    #[error("Variable not found: {name}")]
    NotFound {
        /// The unknown variable name.
        name: String,
    },

    /// Variable values reference each other cyclically.
    #[error("Cyclic variable reference involving: {name}")]
    CyclicReference {
        /// A variable on the cycle.
        name: String,
    },

    /// The scope was rendered before its variables were resolved.
    #[error("Variable scope has not been built")]
    NotBuilt,
}

/// Result type alias for hostfleet operations.
pub type Result<T> = std::result::Result<T, HostfleetError>;

impl HostfleetError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl InventoryError {
    /// Creates a parse error with the given message.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseHostsFailed {
            message: message.into(),
        }
    }
}
