//! Loading schema documents and type graphs from files and strings.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BridgeError, LoadError};
use crate::types::TypeGraph;

/// Load a schema document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    load_json(path)
}

/// Load a schema document from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a native type graph description (`{"types": [...], "roots": [...]}`).
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the file isn't valid JSON or doesn't
/// describe a type graph.
pub fn load_type_graph(path: &Path) -> Result<TypeGraph, LoadError> {
    load_json(path)
}

/// Parse a native type graph description from a JSON string.
pub fn load_type_graph_str(content: &str) -> Result<TypeGraph, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson { source })
}

/// Navigate a JSON Pointer fragment (e.g., "#/$defs/foo" or "#/properties/bar").
///
/// Returns the value at the given JSON Pointer path within the schema.
/// The fragment should start with '#' (e.g., "#/$defs/foo").
pub fn navigate_fragment<'a>(schema: &'a Value, fragment: &str) -> Result<&'a Value, BridgeError> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(schema);
    }

    let mut current = schema;
    for part in path.split('/') {
        let key = unescape_pointer(part);
        let next = match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            other => other.get(&key),
        };
        current = next.ok_or_else(|| BridgeError::UnresolvedReference {
            path: fragment.to_string(),
        })?;
    }
    Ok(current)
}

/// Unescape JSON Pointer encoding (~1 = /, ~0 = ~).
pub(crate) fn unescape_pointer(part: &str) -> String {
    part.replace("~1", "/").replace("~0", "~")
}
