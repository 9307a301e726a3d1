//! Payload validation against portable schema documents.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};
use crate::portable::PortableEmitter;
use crate::types::{TypeGraph, TypeNode};

/// Validate a payload (typically a structured model response) against a
/// portable schema document.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the document itself cannot be
/// compiled, or `ValidateError::Invalid` with every violation found.
pub fn validate_payload(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(errors = errors.len(), "payload rejected");
        Err(ValidateError::Invalid { errors })
    }
}

/// Validate a payload against a native root type by emitting its portable
/// document first.
pub fn validate_against_type(
    graph: &TypeGraph,
    root: &TypeNode,
    payload: &Value,
) -> Result<(), ValidateError> {
    let schema = PortableEmitter::new(graph)
        .emit(root)
        .map_err(|e| ValidateError::InvalidSchema {
            message: e.to_string(),
        })?;
    validate_payload(&schema, payload)
}
