//! Collision-free external names for named object types.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::BridgeError;
use crate::types::TypeName;

/// Assigns stable external identifiers within one flat output namespace.
///
/// A registry lives for exactly one compilation invocation. Once a
/// `(namespace, name)` pair has been given a name, the name never changes.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    assigned: IndexMap<TypeName, String>,
    owners: HashMap<String, TypeName>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the external name for `(namespace, base_name)`, assigning one
    /// on first use.
    ///
    /// When the base name is already taken by another type, namespace
    /// segments are popped from the end, converted to PascalCase and
    /// prepended until the candidate is free.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NameCollision` when the namespace is exhausted
    /// and the candidate still collides.
    pub fn assign(&mut self, namespace: &[String], base_name: &str) -> Result<String, BridgeError> {
        let key = TypeName::qualified(namespace.iter().cloned(), base_name);
        self.assign_key(&key)
    }

    /// Same as [`NameRegistry::assign`] for an existing key.
    pub fn assign_key(&mut self, key: &TypeName) -> Result<String, BridgeError> {
        if let Some(existing) = self.assigned.get(key) {
            return Ok(existing.clone());
        }

        let mut remaining = key.namespace.clone();
        let mut candidate = key.name.clone();
        while self.owners.contains_key(&candidate) {
            let Some(segment) = remaining.pop() else {
                return Err(BridgeError::NameCollision {
                    name: key.name.clone(),
                    namespace: key.namespace.clone(),
                });
            };
            candidate = format!("{}{}", pascal_case(&segment), candidate);
        }

        tracing::trace!(key = %key, name = %candidate, "assigned external name");
        self.assigned.insert(key.clone(), candidate.clone());
        self.owners.insert(candidate.clone(), key.clone());
        Ok(candidate)
    }

    /// Map an assigned name back to the key it was assigned for.
    pub fn resolve(&self, name: &str) -> Option<&TypeName> {
        self.owners.get(name)
    }

    pub fn get(&self, key: &TypeName) -> Option<&str> {
        self.assigned.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

pub(crate) fn pascal_case(name: &str) -> String {
    split_words(name)
        .into_iter()
        .map(|w| capitalize(&w))
        .collect::<Vec<_>>()
        .join("")
}

/// Name for a submodel declared inline under `parent.field`.
pub(crate) fn inline_type_name(parent: &str, field: &str) -> String {
    let mut name = String::new();
    name.push_str(parent);
    name.push_str(&pascal_case(field));
    name
}

fn split_words(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == '/' || ch == '.' || ch == ':' || ch == ' ' {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev_upper = current.chars().last().map(char::is_uppercase).unwrap_or(false);
            if !prev_upper {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn assign_is_idempotent() {
        let mut registry = NameRegistry::new();
        let first = registry.assign(&ns(&["docs"]), "Page").unwrap();
        let second = registry.assign(&ns(&["docs"]), "Page").unwrap();
        assert_eq!(first, "Page");
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn colliding_base_names_get_namespace_qualifier() {
        let mut registry = NameRegistry::new();
        let a = registry.assign(&ns(&["billing", "invoice"]), "Item").unwrap();
        let b = registry.assign(&ns(&["shipping", "order_line"]), "Item").unwrap();
        assert_eq!(a, "Item");
        assert_eq!(b, "OrderLineItem");
        assert_eq!(
            registry.resolve("Item"),
            Some(&TypeName::qualified(["billing", "invoice"], "Item"))
        );
        assert_eq!(
            registry.resolve("OrderLineItem"),
            Some(&TypeName::qualified(["shipping", "order_line"], "Item"))
        );
    }

    #[test]
    fn qualifiers_accumulate_until_free() {
        let mut registry = NameRegistry::new();
        registry.assign(&ns(&["a", "shared"]), "Item").unwrap();
        registry.assign(&ns(&["b", "shared"]), "Item").unwrap();
        let third = registry.assign(&ns(&["c", "shared"]), "Item").unwrap();
        assert_eq!(third, "CSharedItem");
    }

    #[test]
    fn exhausted_namespace_is_a_collision() {
        let mut registry = NameRegistry::new();
        registry.assign(&ns(&["x"]), "Item").unwrap();
        registry.assign(&ns(&["y"]), "Item").unwrap();
        let err = registry.assign(&ns(&[]), "Item").unwrap_err();
        assert!(matches!(err, BridgeError::NameCollision { name, .. } if name == "Item"));
        // Nothing was overwritten.
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn pascal_case_splits_delimiters_and_camel_humps() {
        assert_eq!(pascal_case("order_line"), "OrderLine");
        assert_eq!(pascal_case("billing.v1"), "BillingV1");
        assert_eq!(pascal_case("lineItems"), "LineItems");
        assert_eq!(pascal_case("HTTPHeader"), "HTTPHeader");
    }

    #[test]
    fn inline_type_name_joins_parent_and_field() {
        assert_eq!(inline_type_name("Invoice", "billing_address"), "InvoiceBillingAddress");
    }
}
