//! Reference expansion - inlines every `$ref` of a portable schema document.
//!
//! The output of [`expand`] contains no `$ref` keys. Each reference is
//! replaced by its (recursively expanded) target, with the annotations of
//! the referencing site merged over the target's own.
//!
//! # Recursion
//!
//! A reference that re-enters a definition already being expanded is only
//! accepted when that definition is an object schema. The inner occurrence
//! is then left as a deferred node:
//!
//! ```json
//! { "$recursiveRef": "#/$defs/Node", "title": "Node" }
//! ```
//!
//! Any other cycle (an array of itself, a union of itself) is rejected with
//! `BridgeError::UnsupportedRecursion`.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::annotations::{is_annotation_key, merge_schema, AnnotationBag};
use crate::error::BridgeError;
use crate::loader::{navigate_fragment, unescape_pointer};
use crate::types::json_type_name;

/// Key of a deferred self-reference left behind by expansion.
pub const RECURSIVE_REF_KEY: &str = "$recursiveRef";

/// Keys holding a definitions block.
pub const DEFINITION_KEYS: &[&str] = &["$defs", "definitions"];

/// Expand a document using the definitions found in its own `$defs` /
/// `definitions` blocks. The blocks are dropped from the output.
///
/// # Errors
///
/// See [`expand`].
pub fn expand_document(document: &Value) -> Result<Value, BridgeError> {
    let definitions = collect_definitions(document);
    expand(document, &definitions)
}

/// Expand `document`, resolving `#/$defs/<name>` and `#/definitions/<name>`
/// against `definitions` and any other internal pointer against `document`.
///
/// # Errors
///
/// - `BridgeError::UnresolvedReference` if a reference has no target
/// - `BridgeError::UnsupportedRecursion` for a cycle without an object boundary
pub fn expand(document: &Value, definitions: &Map<String, Value>) -> Result<Value, BridgeError> {
    let mut expander = Expander {
        root: document,
        definitions,
        // The root is being expanded, so `"#"` from inside it is a cycle.
        stack: vec!["#".to_string()],
    };
    expander.expand_value(document, "#")
}

/// Merge the `$defs` and `definitions` blocks of a document root.
pub fn collect_definitions(document: &Value) -> Map<String, Value> {
    let mut definitions = Map::new();
    for key in DEFINITION_KEYS {
        if let Some(Value::Object(defs)) = document.get(*key) {
            for (name, def) in defs {
                definitions.insert(name.clone(), def.clone());
            }
        }
    }
    definitions
}

/// Returns true if the schema node is an object schema.
pub fn is_object_schema(schema: &Value) -> bool {
    let type_is_object = match schema.get("type") {
        Some(Value::String(t)) => t == "object",
        Some(Value::Array(types)) => types.iter().any(|t| t == "object"),
        _ => false,
    };
    type_is_object || schema.get("properties").is_some()
}

struct Expander<'a> {
    root: &'a Value,
    definitions: &'a Map<String, Value>,
    /// References currently being expanded, innermost last.
    stack: Vec<String>,
}

impl<'a> Expander<'a> {
    fn expand_value(&mut self, value: &Value, path: &str) -> Result<Value, BridgeError> {
        match value {
            Value::Object(map) => self.expand_object(map, path),
            Value::Array(arr) => {
                let mut result = Vec::with_capacity(arr.len());
                for (i, item) in arr.iter().enumerate() {
                    result.push(self.expand_value(item, &format!("{}/{}", path, i))?);
                }
                Ok(Value::Array(result))
            }
            other => Ok(other.clone()),
        }
    }

    fn expand_object(&mut self, map: &Map<String, Value>, path: &str) -> Result<Value, BridgeError> {
        if let Some(reference) = map.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| BridgeError::InvalidSchema {
                path: path.to_string(),
                message: format!("$ref must be a string, got {}", json_type_name(reference)),
            })?;
            return self.expand_reference(map, reference);
        }

        if let Some(unwrapped) = unwrap_single_all_of(map) {
            return self.expand_object(&unwrapped, path);
        }

        let mut result = Map::new();
        for (key, child) in map {
            let child_path = format!("{}/{}", path, key);
            match key.as_str() {
                "properties" | "patternProperties" | "dependentSchemas" => {
                    let Some(props) = child.as_object() else {
                        result.insert(key.clone(), child.clone());
                        continue;
                    };
                    let mut expanded = Map::new();
                    for (name, prop) in props {
                        let prop_path = format!("{}/{}", child_path, name);
                        expanded.insert(name.clone(), self.expand_value(prop, &prop_path)?);
                    }
                    result.insert(key.clone(), Value::Object(expanded));
                }
                "items" | "additionalProperties" | "not" | "contains" | "anyOf" | "oneOf"
                | "allOf" | "prefixItems" | "if" | "then" | "else" | "propertyNames"
                | "unevaluatedItems" | "unevaluatedProperties" => {
                    result.insert(key.clone(), self.expand_value(child, &child_path)?);
                }
                k if DEFINITION_KEYS.contains(&k) => {
                    // Definitions are consumed through references only.
                }
                _ => {
                    result.insert(key.clone(), child.clone());
                }
            }
        }
        Ok(Value::Object(result))
    }

    fn expand_reference(
        &mut self,
        site: &Map<String, Value>,
        reference: &str,
    ) -> Result<Value, BridgeError> {
        let (target, def_name) = self.lookup(reference)?;

        if self.stack.iter().any(|p| p == reference) {
            if let Some((object, object_name)) = self.object_target(target, def_name.clone()) {
                return Ok(deferred_node(site, reference, object, object_name));
            }
            return Err(BridgeError::UnsupportedRecursion {
                path: reference.to_string(),
            });
        }

        self.stack.push(reference.to_string());
        let result = self.inline_target(site, reference, target, def_name);
        self.stack.pop();
        result
    }

    fn inline_target(
        &mut self,
        site: &Map<String, Value>,
        reference: &str,
        target: &Value,
        def_name: Option<String>,
    ) -> Result<Value, BridgeError> {
        // Chains of references resolve transitively here.
        let expanded = self.expand_value(target, reference)?;
        let Value::Object(mut inner) = expanded else {
            return Err(BridgeError::InvalidSchema {
                path: reference.to_string(),
                message: format!(
                    "reference target must be a schema object, got {}",
                    json_type_name(&expanded)
                ),
            });
        };

        if is_object_schema(&Value::Object(inner.clone())) && !inner.contains_key("title") {
            if let Some(name) = def_name {
                inner.insert("title".to_string(), Value::String(name));
            }
        }

        let merged = merge_schema(site, inner);
        self.expand_object(&merged, reference)
    }

    /// Find the target of a reference. Returns the definition name for
    /// `$defs`-style pointers.
    fn lookup(&self, reference: &str) -> Result<(&'a Value, Option<String>), BridgeError> {
        if !reference.starts_with('#') {
            return Err(BridgeError::UnresolvedReference {
                path: reference.to_string(),
            });
        }

        for key in DEFINITION_KEYS {
            let prefix = format!("#/{}/", key);
            if let Some(rest) = reference.strip_prefix(&prefix) {
                if !rest.contains('/') {
                    let name = unescape_pointer(rest);
                    return self
                        .definitions
                        .get(&name)
                        .map(|def| (def, Some(name.clone())))
                        .ok_or_else(|| BridgeError::UnresolvedReference {
                            path: reference.to_string(),
                        });
                }
            }
        }

        let target = navigate_fragment(self.root, reference)?;
        let name = target.get("title").and_then(Value::as_str).map(String::from);
        Ok((target, name))
    }

    /// Follow an alias chain (`A -> B -> {object}`) to an object schema.
    /// Returns `None` when the chain ends anywhere else.
    fn object_target(
        &self,
        target: &'a Value,
        def_name: Option<String>,
    ) -> Option<(&'a Value, Option<String>)> {
        let mut seen = HashSet::new();
        let mut current = (target, def_name);
        while let Some(next) = current.0.get("$ref").and_then(Value::as_str) {
            if !seen.insert(next.to_string()) {
                return None;
            }
            current = self.lookup(next).ok()?;
        }
        is_object_schema(current.0).then_some(current)
    }
}

fn deferred_node(
    site: &Map<String, Value>,
    reference: &str,
    target: &Value,
    def_name: Option<String>,
) -> Value {
    tracing::debug!(reference = %reference, "deferring recursive object reference");

    let mut node = Map::new();
    node.insert(
        RECURSIVE_REF_KEY.to_string(),
        Value::String(reference.to_string()),
    );
    let title = target
        .get("title")
        .cloned()
        .or_else(|| def_name.map(Value::String));
    if let Some(title) = title {
        node.insert("title".to_string(), title);
    }

    let target_bag = target
        .as_object()
        .map(AnnotationBag::from_schema)
        .unwrap_or_default();
    AnnotationBag::merge(&AnnotationBag::from_schema(site), &target_bag).apply_to(&mut node);
    Value::Object(node)
}

/// `{"allOf": [X], "description": ...}` becomes `X` with the wrapper's
/// annotations on top.
fn unwrap_single_all_of(map: &Map<String, Value>) -> Option<Map<String, Value>> {
    let branches = map.get("allOf")?.as_array()?;
    let [only] = branches.as_slice() else {
        return None;
    };
    let mut unwrapped = only.as_object()?.clone();
    for (key, value) in map {
        if is_annotation_key(key) {
            unwrapped.insert(key.clone(), value.clone());
        }
    }
    Some(unwrapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contains_ref(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.contains_key("$ref") || map.values().any(contains_ref),
            Value::Array(arr) => arr.iter().any(contains_ref),
            _ => false,
        }
    }

    #[test]
    fn outer_description_overrides_target() {
        let doc = json!({
            "type": "object",
            "properties": {
                "home": { "$ref": "#/$defs/Address", "description": "A" }
            },
            "$defs": {
                "Address": { "type": "object", "description": "B", "properties": {} }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(expanded["properties"]["home"]["description"], "A");
        assert_eq!(expanded["properties"]["home"]["type"], "object");
    }

    #[test]
    fn target_description_used_when_site_has_none() {
        let doc = json!({
            "properties": { "home": { "$ref": "#/$defs/Address" } },
            "$defs": { "Address": { "type": "object", "description": "B" } }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(expanded["properties"]["home"]["description"], "B");
    }

    #[test]
    fn definition_name_becomes_title() {
        let doc = json!({
            "properties": { "home": { "$ref": "#/$defs/Address" } },
            "$defs": { "Address": { "type": "object", "properties": {} } }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(expanded["properties"]["home"]["title"], "Address");
        assert!(expanded.get("$defs").is_none());
    }

    #[test]
    fn reference_chains_resolve_transitively() {
        let doc = json!({
            "properties": { "v": { "$ref": "#/$defs/A" } },
            "$defs": {
                "A": { "$ref": "#/$defs/B", "description": "alias" },
                "B": { "type": "string", "format": "email" }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(
            expanded["properties"]["v"],
            json!({ "type": "string", "format": "email", "description": "alias" })
        );
        assert!(!contains_ref(&expanded));
    }

    #[test]
    fn unresolved_reference_is_fatal() {
        let doc = json!({ "properties": { "v": { "$ref": "#/$defs/Nope" } } });
        let err = expand_document(&doc).unwrap_err();
        assert!(matches!(err, BridgeError::UnresolvedReference { path } if path == "#/$defs/Nope"));
    }

    #[test]
    fn external_references_are_unresolved() {
        let doc = json!({ "properties": { "v": { "$ref": "other.json#/$defs/X" } } });
        assert!(matches!(
            expand_document(&doc),
            Err(BridgeError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn self_referential_object_is_deferred() {
        let doc = json!({
            "$ref": "#/$defs/Node",
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "string" },
                        "children": {
                            "type": "array",
                            "items": { "$ref": "#/$defs/Node", "description": "child" }
                        }
                    }
                }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(expanded["title"], "Node");
        let child = &expanded["properties"]["children"]["items"];
        assert_eq!(child[RECURSIVE_REF_KEY], "#/$defs/Node");
        assert_eq!(child["title"], "Node");
        assert_eq!(child["description"], "child");
        assert!(!contains_ref(&expanded));
    }

    #[test]
    fn array_of_itself_is_unsupported_recursion() {
        let doc = json!({
            "properties": { "nested": { "$ref": "#/$defs/Nested" } },
            "$defs": {
                "Nested": { "type": "array", "items": { "$ref": "#/$defs/Nested" } }
            }
        });
        let err = expand_document(&doc).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedRecursion { path } if path == "#/$defs/Nested"));
    }

    #[test]
    fn internal_pointer_outside_defs() {
        let doc = json!({
            "properties": {
                "a": { "type": "integer", "description": "first" },
                "b": { "$ref": "#/properties/a" }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(expanded["properties"]["b"]["type"], "integer");
    }

    #[test]
    fn single_all_of_wrapper_is_unwrapped() {
        let doc = json!({
            "properties": {
                "addr": {
                    "allOf": [{ "$ref": "#/definitions/Address" }],
                    "description": "Billing address"
                }
            },
            "definitions": {
                "Address": { "type": "object", "description": "generic", "properties": {} }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        let addr = &expanded["properties"]["addr"];
        assert_eq!(addr["description"], "Billing address");
        assert_eq!(addr["type"], "object");
        assert!(addr.get("allOf").is_none());
    }

    #[test]
    fn default_values_are_not_rewritten() {
        let doc = json!({
            "properties": {
                "cfg": { "type": "object", "default": { "$ref": "literal" } }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        assert_eq!(expanded["properties"]["cfg"]["default"], json!({ "$ref": "literal" }));
    }

    #[test]
    fn root_self_reference_is_deferred() {
        let doc = json!({
            "title": "Node",
            "type": "object",
            "properties": {
                "children": { "type": "array", "items": { "$ref": "#" } }
            }
        });
        let expanded = expand_document(&doc).unwrap();
        let child = &expanded["properties"]["children"]["items"];
        assert_eq!(child[RECURSIVE_REF_KEY], "#");
        assert_eq!(child["title"], "Node");
        assert!(child.get("properties").is_none());
    }

    #[test]
    fn conditional_and_dependent_schemas_are_expanded() {
        let doc = json!({
            "type": "object",
            "if": { "$ref": "#/$defs/Flag" },
            "then": { "properties": { "a": { "$ref": "#/$defs/Flag" } } },
            "else": { "$ref": "#/$defs/Flag" },
            "propertyNames": { "$ref": "#/$defs/Flag" },
            "dependentSchemas": { "a": { "$ref": "#/$defs/Flag" } },
            "$defs": { "Flag": { "type": "boolean" } }
        });
        let expanded = expand_document(&doc).unwrap();
        assert!(!contains_ref(&expanded));
        assert_eq!(expanded["if"]["type"], "boolean");
        assert_eq!(expanded["dependentSchemas"]["a"]["type"], "boolean");
    }
}
