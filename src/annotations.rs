//! Descriptive metadata attached to a type occurrence, and its merge rules.
//!
//! An [`AnnotationBag`] holds the keys that describe a node without shaping
//! it: `description`, `default`, `examples`, and every custom `X-` key (field
//! prompts, reasoning hints and the like). When a `$ref` is resolved, the bag
//! of the referencing site wins over the bag of the shared target.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys that are always annotations.
pub const ANNOTATION_KEYS: &[&str] = &["description", "default", "examples"];

/// Returns true if `key` carries metadata rather than shape.
pub fn is_annotation_key(key: &str) -> bool {
    ANNOTATION_KEYS.contains(&key) || key.starts_with("X-") || key.starts_with("x-")
}

/// Unordered mapping of annotation keys to values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationBag(Map<String, Value>);

impl AnnotationBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the annotation keys of a schema node.
    pub fn from_schema(schema: &Map<String, Value>) -> Self {
        let bag = schema
            .iter()
            .filter(|(k, _)| is_annotation_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self(bag)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.0.get("default")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Merge two bags into a new one: `outer` wins per key, `inner` fills gaps.
    pub fn merge(outer: &AnnotationBag, inner: &AnnotationBag) -> AnnotationBag {
        let mut merged = inner.0.clone();
        for (key, value) in &outer.0 {
            merged.insert(key.clone(), value.clone());
        }
        AnnotationBag(merged)
    }

    /// Write every annotation into a schema node, replacing existing values.
    pub fn apply_to(&self, schema: &mut Map<String, Value>) {
        for (key, value) in &self.0 {
            schema.insert(key.clone(), value.clone());
        }
    }
}

/// Merge a referencing schema node into its resolved target.
///
/// The result has exactly the shape of `inner`. Annotations present on
/// `outer` override those of `inner`; all other keys of `outer` (the `$ref`
/// itself and any structural siblings) are dropped.
pub fn merge_schema(outer: &Map<String, Value>, inner: Map<String, Value>) -> Map<String, Value> {
    let mut merged = inner;
    for (key, value) in outer {
        if is_annotation_key(key) {
            merged.insert(key.clone(), value.clone());
        } else if key != "$ref" {
            tracing::debug!(key = %key, "dropping structural sibling of $ref");
        }
    }
    merged
}
