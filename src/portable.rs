//! Emission of portable schema documents from native type graphs.
//!
//! Named objects become entries of `$defs` (keyed by registry name, each
//! carrying its `title`) and every occurrence is a `$ref`. The document root
//! is itself a `$ref`, so a self-referential root type round-trips through
//! [`crate::expand`] like any other definition.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::BridgeError;
use crate::naming::NameRegistry;
use crate::queue::{ConversionQueue, Necessity, QueueEntry};
use crate::types::{FieldSpec, ObjectType, PrimitiveKind, TypeGraph, TypeName, TypeNode};

/// Dialect declared by emitted documents.
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Writes a [`TypeGraph`] as a portable schema document.
pub struct PortableEmitter<'g> {
    graph: &'g TypeGraph,
    registry: NameRegistry,
    queue: ConversionQueue,
}

impl<'g> PortableEmitter<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self {
            graph,
            registry: NameRegistry::new(),
            queue: ConversionQueue::new(),
        }
    }

    /// Emit the document for one root type.
    ///
    /// # Errors
    ///
    /// Any compilation error aborts emission; a portable document is never
    /// written with holes in it.
    pub fn emit(mut self, root: &TypeNode) -> Result<Value, BridgeError> {
        let root_schema = self.schema_for(root)?;

        let mut defs = Map::new();
        while let Some(entry) = self.queue.pop() {
            let schema = self.object_schema(&entry.object, Some(&entry.name))?;
            defs.insert(entry.name, schema);
        }

        let mut document = Map::new();
        document.insert("$schema".to_string(), Value::from(SCHEMA_DIALECT));
        if let Value::Object(root_map) = root_schema {
            document.extend(root_map);
        }
        if !defs.is_empty() {
            document.insert("$defs".to_string(), Value::Object(defs));
        }
        Ok(Value::Object(document))
    }

    fn schema_for(&mut self, node: &TypeNode) -> Result<Value, BridgeError> {
        match node {
            TypeNode::Primitive { primitive } => primitive_schema(primitive),
            TypeNode::Object(object) if object.name.is_some() => self.reference(object),
            TypeNode::Object(object) => self.object_schema(object, None),
            TypeNode::Named(name) => {
                let object = self.lookup(name)?;
                self.reference(object)
            }
            TypeNode::Array { items } => Ok(json!({
                "type": "array",
                "items": self.schema_for(items)?,
            })),
            TypeNode::Tuple { items } => {
                let prefix = items
                    .iter()
                    .map(|item| self.schema_for(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({
                    "type": "array",
                    "prefixItems": prefix,
                    "items": false,
                    "minItems": items.len(),
                }))
            }
            TypeNode::Map { key, value } => {
                if !matches!(
                    key.as_ref(),
                    TypeNode::Primitive {
                        primitive: PrimitiveKind::String
                    }
                ) {
                    return Err(BridgeError::UnsupportedType {
                        kind: format!("map with {} keys", key.label()),
                    });
                }
                Ok(json!({
                    "type": "object",
                    "additionalProperties": self.schema_for(value)?,
                }))
            }
            TypeNode::Union { variants } => {
                if variants.is_empty() {
                    return Err(BridgeError::EmptyUnion {
                        path: "union".to_string(),
                    });
                }
                let has_null = variants.iter().any(TypeNode::is_null);
                let non_null: Vec<&TypeNode> = variants.iter().filter(|v| !v.is_null()).collect();
                let mut branches = non_null
                    .into_iter()
                    .map(|v| self.schema_for(v))
                    .collect::<Result<Vec<_>, _>>()?;
                if has_null {
                    branches.push(json!({ "type": "null" }));
                }
                if branches.len() == 1 {
                    return Ok(branches.remove(0));
                }
                Ok(json!({ "anyOf": branches }))
            }
            TypeNode::LiteralEnum { values } => {
                if values.is_empty() {
                    return Err(BridgeError::EmptyUnion {
                        path: "enum".to_string(),
                    });
                }
                Ok(json!({ "enum": values }))
            }
            TypeNode::Nullable { inner } => Ok(json!({
                "anyOf": [self.schema_for(inner)?, { "type": "null" }],
            })),
            TypeNode::Reference { path } => Err(BridgeError::UnresolvedReference { path: path.clone() }),
        }
    }

    fn reference(&mut self, object: &ObjectType) -> Result<Value, BridgeError> {
        let Some(key) = object.name.as_ref() else {
            return self.object_schema(object, None);
        };
        let canonical = self.graph.get(key).unwrap_or(object);
        let name = self.registry.assign_key(key)?;
        self.queue.push(QueueEntry {
            key: key.clone(),
            name: name.clone(),
            object: canonical.clone(),
            necessity: Necessity::Required,
        });
        Ok(json!({ "$ref": format!("#/$defs/{}", escape_pointer(&name)) }))
    }

    fn object_schema(&mut self, object: &ObjectType, title: Option<&str>) -> Result<Value, BridgeError> {
        let owner = title.unwrap_or("<anonymous>");
        let fields = self.flatten_fields(object, owner)?;

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("object"));
        if let Some(title) = title {
            schema.insert("title".to_string(), Value::from(title));
        }
        object.annotations.apply_to(&mut schema);

        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in fields {
            properties.insert(field.name.clone(), self.field_schema(field)?);
            if field.required {
                required.push(Value::from(field.name.as_str()));
            }
        }
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Ok(Value::Object(schema))
    }

    fn field_schema(&mut self, field: &FieldSpec) -> Result<Value, BridgeError> {
        let mut schema = match self.schema_for(&field.ty)? {
            Value::Object(map) => map,
            other => return Ok(other),
        };
        field.annotations.apply_to(&mut schema);
        if let Some(default) = &field.default {
            schema.insert("default".to_string(), default.clone());
        }
        Ok(Value::Object(schema))
    }

    /// Fields of an object with its bases folded in, base fields first.
    fn flatten_fields<'o>(
        &self,
        object: &'o ObjectType,
        owner: &str,
    ) -> Result<Vec<&'o FieldSpec>, BridgeError>
    where
        'g: 'o,
    {
        let mut fields: IndexMap<&'o str, &'o FieldSpec> = IndexMap::new();
        let mut visiting = Vec::new();
        self.collect_fields(object, owner, &mut fields, &mut visiting)?;
        Ok(fields.into_values().collect())
    }

    fn collect_fields<'o>(
        &self,
        object: &'o ObjectType,
        owner: &str,
        fields: &mut IndexMap<&'o str, &'o FieldSpec>,
        visiting: &mut Vec<TypeName>,
    ) -> Result<(), BridgeError>
    where
        'g: 'o,
    {
        if let Some(name) = &object.name {
            if visiting.contains(name) {
                return Err(BridgeError::UnsupportedRecursion {
                    path: name.to_string(),
                });
            }
            visiting.push(name.clone());
        }

        for base in &object.bases {
            let base_object: &'o ObjectType = match base {
                TypeNode::Named(name) => self.lookup(name)?,
                TypeNode::Object(inline) => inline,
                other => {
                    return Err(BridgeError::InvalidSchema {
                        path: owner.to_string(),
                        message: format!("base type must be an object, got {}", other.label()),
                    })
                }
            };
            self.collect_fields(base_object, owner, fields, visiting)?;
        }

        for field in &object.fields {
            if let Some(existing) = fields.get(field.name.as_str()) {
                if existing.ty != field.ty {
                    return Err(BridgeError::FieldConflict {
                        type_name: owner.to_string(),
                        field: field.name.clone(),
                    });
                }
            }
            fields.insert(field.name.as_str(), field);
        }

        if object.name.is_some() {
            visiting.pop();
        }
        Ok(())
    }

    fn lookup(&self, name: &TypeName) -> Result<&'g ObjectType, BridgeError> {
        self.graph
            .get(name)
            .ok_or_else(|| BridgeError::UnresolvedReference {
                path: name.to_string(),
            })
    }
}

fn primitive_schema(kind: &PrimitiveKind) -> Result<Value, BridgeError> {
    let schema = match kind {
        PrimitiveKind::String => json!({ "type": "string" }),
        PrimitiveKind::Integer => json!({ "type": "integer" }),
        PrimitiveKind::Float => json!({ "type": "number" }),
        PrimitiveKind::Boolean => json!({ "type": "boolean" }),
        PrimitiveKind::Any => json!({}),
        PrimitiveKind::Null => json!({ "type": "null" }),
        PrimitiveKind::Binary => json!({ "type": "string", "format": "binary" }),
        PrimitiveKind::Date => json!({ "type": "string", "format": "date" }),
        PrimitiveKind::DateTime => json!({ "type": "string", "format": "date-time" }),
        PrimitiveKind::Time => json!({ "type": "string", "format": "time" }),
        PrimitiveKind::Path => json!({ "type": "string", "format": "path" }),
        PrimitiveKind::Email => json!({ "type": "string", "format": "email" }),
        PrimitiveKind::Other(name) => {
            return Err(BridgeError::UnsupportedType { kind: name.clone() })
        }
    };
    Ok(schema)
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
