//! Error types for schema compilation, expansion and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by either compiler direction.
///
/// Every variant names the offending kind, path or type so that a caller can
/// decide whether to abort a run or skip one discovered type.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    // Schema errors (exit code 2)
    #[error("unsupported type: {kind}")]
    UnsupportedType { kind: String },

    #[error("unresolved reference: {path}")]
    UnresolvedReference { path: String },

    #[error("unsupported recursion through {path}: only object schemas may refer to themselves")]
    UnsupportedRecursion { path: String },

    #[error("unsupported union shape at {path}: {detail}")]
    UnsupportedUnionShape { path: String, detail: String },

    #[error("unsupported array element at {path}: expected an object, got {actual}")]
    UnsupportedArrayElement { path: String, actual: String },

    #[error("name collision: cannot disambiguate {name} in namespace [{}]", namespace.join("."))]
    NameCollision {
        name: String,
        namespace: Vec<String>,
    },

    #[error("field conflict on {type_name}: base types disagree on the type of '{field}'")]
    FieldConflict { type_name: String, field: String },

    #[error("empty union at {path}")]
    EmptyUnion { path: String },

    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },
}

impl BridgeError {
    /// Short machine-readable kind, printed alongside the message by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::UnsupportedType { .. } => "UnsupportedType",
            BridgeError::UnresolvedReference { .. } => "UnresolvedReference",
            BridgeError::UnsupportedRecursion { .. } => "UnsupportedRecursion",
            BridgeError::UnsupportedUnionShape { .. } => "UnsupportedUnionShape",
            BridgeError::UnsupportedArrayElement { .. } => "UnsupportedArrayElement",
            BridgeError::NameCollision { .. } => "NameCollision",
            BridgeError::FieldConflict { .. } => "FieldConflict",
            BridgeError::EmptyUnion { .. } => "EmptyUnion",
            BridgeError::InvalidSchema { .. } => "InvalidSchema",
        }
    }

    /// Schema path of the offending node, for the variants that carry one.
    pub fn path(&self) -> Option<&str> {
        match self {
            BridgeError::UnresolvedReference { path }
            | BridgeError::UnsupportedRecursion { path }
            | BridgeError::UnsupportedUnionShape { path, .. }
            | BridgeError::UnsupportedArrayElement { path, .. }
            | BridgeError::EmptyUnion { path }
            | BridgeError::InvalidSchema { path, .. } => Some(path),
            BridgeError::UnsupportedType { .. }
            | BridgeError::NameCollision { .. }
            | BridgeError::FieldConflict { .. } => None,
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while reading schema documents or type graphs from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
