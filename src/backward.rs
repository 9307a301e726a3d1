//! Backward compiler - expanded portable schemas to native declarations.
//!
//! Building happens in two steps. Every property schema is first classified
//! into the shared [`TypeNode`] vocabulary; this is where the two-branch
//! nullable folding happens (`anyOf: [T, {"type": "null"}]` as well as
//! `type: [T, "null"]`). The classified tree is then lowered into a
//! [`ModelDecl`] tree, rejecting the shapes a native model cannot express:
//!
//! | Shape | Result |
//! |-------|--------|
//! | object | nested [`ModelDecl`] |
//! | array of objects | [`FieldType::List`] |
//! | array of anything else | `UnsupportedArrayElement` |
//! | union other than `T \| null` | `UnsupportedUnionShape` |
//! | deferred self-reference | [`FieldType::Recursive`] |
//! | tuple | `UnsupportedType("tuple")` |

use serde::Serialize;
use serde_json::{Map, Value};

use crate::annotations::AnnotationBag;
use crate::error::BridgeError;
use crate::expand::{expand_document, RECURSIVE_REF_KEY};
use crate::naming::inline_type_name;
use crate::types::{json_type_name, FieldSpec, ObjectType, PrimitiveKind, TypeName, TypeNode};

/// Options for building declarations.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Name given to an untitled root model.
    pub root_name: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root_name: "Model".to_string(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }
}

/// A native record type built from an object schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDecl {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDecl>,
}

/// One field of a [`ModelDecl`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    pub required: bool,
    /// Annotations of the property schema, carried verbatim.
    #[serde(skip_serializing_if = "AnnotationBag::is_empty")]
    pub metadata: AnnotationBag,
}

impl FieldDecl {
    pub fn default(&self) -> Option<&Value> {
        self.metadata.default_value()
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.description()
    }
}

/// Field types a native model can hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    Primitive { primitive: PrimitiveKind },
    Enum { values: Vec<Value> },
    Model { model: Box<ModelDecl> },
    List { items: Box<FieldType> },
    Map { values: Box<FieldType> },
    Nullable { inner: Box<FieldType> },
    /// Forward reference to a model that encloses this field.
    Recursive { name: String },
}

/// Expand a document's references and build its root model.
///
/// # Errors
///
/// Any expansion or build error; see [`crate::expand`] and
/// [`BackwardCompiler::build`].
pub fn build_schema(document: &Value, options: &BuildOptions) -> Result<ModelDecl, BridgeError> {
    let expanded = expand_document(document)?;
    BackwardCompiler::new(options.clone()).build(&expanded)
}

/// Builds [`ModelDecl`] trees from expanded schemas.
#[derive(Debug, Clone, Default)]
pub struct BackwardCompiler {
    options: BuildOptions,
}

impl BackwardCompiler {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Build the root model of an expanded schema.
    ///
    /// # Errors
    ///
    /// - `InvalidSchema` if the root is not an object schema
    /// - `UnresolvedReference` if the schema still contains a `$ref`
    /// - `UnsupportedUnionShape`, `UnsupportedArrayElement`, `UnsupportedType`
    ///   for shapes with no native counterpart
    pub fn build(&self, schema: &Value) -> Result<ModelDecl, BridgeError> {
        let root = self.classify(schema, "#")?;
        let TypeNode::Object(object) = root else {
            return Err(BridgeError::InvalidSchema {
                path: "#".to_string(),
                message: format!("root schema must be an object, got {}", root.label()),
            });
        };
        let name = self.options.root_name.clone();
        self.lower_object(&object, name, "#")
    }

    /// Classify one schema node.
    pub fn classify(&self, schema: &Value, path: &str) -> Result<TypeNode, BridgeError> {
        let map = match schema {
            Value::Object(map) => map,
            // `true` accepts anything.
            Value::Bool(true) => return Ok(TypeNode::primitive(PrimitiveKind::Any)),
            other => {
                return Err(BridgeError::InvalidSchema {
                    path: path.to_string(),
                    message: format!("expected a schema object, got {}", json_type_name(other)),
                })
            }
        };

        if map.contains_key(RECURSIVE_REF_KEY) {
            let name = map
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(self.options.root_name.as_str());
            return Ok(TypeNode::named(TypeName::new(name)));
        }
        if let Some(reference) = map.get("$ref") {
            return Ok(TypeNode::Reference {
                path: reference.as_str().unwrap_or_default().to_string(),
            });
        }
        if let Some(Value::Array(values)) = map.get("enum") {
            return Ok(classify_enum(values, map.get("type")));
        }
        if let Some(value) = map.get("const") {
            return Ok(TypeNode::literal_enum([value.clone()]));
        }
        for key in ["anyOf", "oneOf"] {
            if let Some(branches) = map.get(key) {
                return self.classify_union(branches, &format!("{}/{}", path, key));
            }
        }

        match map.get("type") {
            Some(Value::String(ty)) => self.classify_typed(ty, map, path),
            Some(Value::Array(types)) => self.classify_type_list(types, map, path),
            Some(other) => Err(BridgeError::InvalidSchema {
                path: path.to_string(),
                message: format!("type must be a string or array, got {}", json_type_name(other)),
            }),
            None if map.contains_key("properties") => self.classify_typed("object", map, path),
            None if map.contains_key("items") => self.classify_typed("array", map, path),
            None => Ok(TypeNode::primitive(PrimitiveKind::Any)),
        }
    }

    fn classify_union(&self, branches: &Value, path: &str) -> Result<TypeNode, BridgeError> {
        let Some(branches) = branches.as_array() else {
            return Err(BridgeError::InvalidSchema {
                path: path.to_string(),
                message: "union branches must be an array".to_string(),
            });
        };
        let variants = branches
            .iter()
            .enumerate()
            .map(|(i, branch)| self.classify(branch, &format!("{}/{}", path, i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fold_nullable(variants, path))
    }

    /// `type: [T, "null"]` is the compact spelling of a nullable `T`.
    fn classify_type_list(
        &self,
        types: &[Value],
        map: &Map<String, Value>,
        path: &str,
    ) -> Result<TypeNode, BridgeError> {
        let variants = types
            .iter()
            .map(|ty| match ty.as_str() {
                Some(ty) => self.classify_typed(ty, map, path),
                None => Err(BridgeError::InvalidSchema {
                    path: path.to_string(),
                    message: format!("type entries must be strings, got {}", json_type_name(ty)),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fold_nullable(variants, path))
    }

    fn classify_typed(
        &self,
        ty: &str,
        map: &Map<String, Value>,
        path: &str,
    ) -> Result<TypeNode, BridgeError> {
        let kind = match ty {
            "string" => match map.get("format").and_then(Value::as_str) {
                Some("date") => PrimitiveKind::Date,
                Some("date-time") => PrimitiveKind::DateTime,
                Some("time") => PrimitiveKind::Time,
                Some("email") => PrimitiveKind::Email,
                Some("binary") => PrimitiveKind::Binary,
                Some("path") => PrimitiveKind::Path,
                _ => PrimitiveKind::String,
            },
            "integer" => PrimitiveKind::Integer,
            "number" => PrimitiveKind::Float,
            "boolean" => PrimitiveKind::Boolean,
            "null" => PrimitiveKind::Null,
            "object" => return self.classify_object(map, path),
            "array" => return self.classify_array(map, path),
            other => {
                return Err(BridgeError::UnsupportedType {
                    kind: other.to_string(),
                })
            }
        };
        Ok(TypeNode::primitive(kind))
    }

    fn classify_object(&self, map: &Map<String, Value>, path: &str) -> Result<TypeNode, BridgeError> {
        let properties = map.get("properties").and_then(Value::as_object);

        // A property-less object with a value schema is a string-keyed map.
        if properties.is_none() {
            if let Some(values @ Value::Object(_)) = map.get("additionalProperties") {
                let value = self.classify(values, &format!("{}/additionalProperties", path))?;
                return Ok(TypeNode::map(TypeNode::string(), value));
            }
        }

        let required: Vec<&str> = map
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut object = ObjectType {
            name: map.get("title").and_then(Value::as_str).map(TypeName::new),
            annotations: AnnotationBag::from_schema(map),
            ..ObjectType::default()
        };
        for (name, schema) in properties.into_iter().flatten() {
            let ty = self.classify(schema, &format!("{}/properties/{}", path, name))?;
            object.fields.push(FieldSpec {
                name: name.clone(),
                ty,
                required: required.contains(&name.as_str()),
                default: schema.get("default").cloned(),
                annotations: schema
                    .as_object()
                    .map(AnnotationBag::from_schema)
                    .unwrap_or_default(),
            });
        }
        Ok(TypeNode::Object(object))
    }

    fn classify_array(&self, map: &Map<String, Value>, path: &str) -> Result<TypeNode, BridgeError> {
        if let Some(Value::Array(prefix)) = map.get("prefixItems") {
            let items = prefix
                .iter()
                .enumerate()
                .map(|(i, item)| self.classify(item, &format!("{}/prefixItems/{}", path, i)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(TypeNode::tuple(items));
        }
        let items = match map.get("items") {
            Some(items) => self.classify(items, &format!("{}/items", path))?,
            None => TypeNode::primitive(PrimitiveKind::Any),
        };
        Ok(TypeNode::array(items))
    }

    fn lower_object(&self, object: &ObjectType, fallback: String, path: &str) -> Result<ModelDecl, BridgeError> {
        let name = object
            .name
            .as_ref()
            .map(|n| n.name.clone())
            .unwrap_or(fallback);

        let mut fields = Vec::with_capacity(object.fields.len());
        for field in &object.fields {
            let field_path = format!("{}/properties/{}", path, field.name);
            fields.push(FieldDecl {
                name: field.name.clone(),
                ty: self.lower(&field.ty, &field_path, &name, &field.name)?,
                required: field.required,
                metadata: field.annotations.clone(),
            });
        }

        Ok(ModelDecl {
            description: object.annotations.description().map(String::from),
            name,
            fields,
        })
    }

    fn lower(&self, node: &TypeNode, path: &str, parent: &str, field: &str) -> Result<FieldType, BridgeError> {
        match node {
            TypeNode::Primitive { primitive } => Ok(FieldType::Primitive {
                primitive: primitive.clone(),
            }),
            TypeNode::LiteralEnum { values } => Ok(FieldType::Enum {
                values: values.clone(),
            }),
            TypeNode::Object(object) => {
                let model = self.lower_object(object, inline_type_name(parent, field), path)?;
                Ok(FieldType::Model {
                    model: Box::new(model),
                })
            }
            TypeNode::Named(name) => Ok(FieldType::Recursive {
                name: name.name.clone(),
            }),
            TypeNode::Array { items } => match items.as_ref() {
                TypeNode::Object(_) | TypeNode::Named(_) => Ok(FieldType::List {
                    items: Box::new(self.lower(items, &format!("{}/items", path), parent, field)?),
                }),
                other => Err(BridgeError::UnsupportedArrayElement {
                    path: format!("{}/items", path),
                    actual: describe(other),
                }),
            },
            TypeNode::Map { value, .. } => Ok(FieldType::Map {
                values: Box::new(self.lower(value, &format!("{}/additionalProperties", path), parent, field)?),
            }),
            TypeNode::Nullable { inner } => Ok(FieldType::Nullable {
                inner: Box::new(self.lower(inner, path, parent, field)?),
            }),
            TypeNode::Union { variants } => Err(BridgeError::UnsupportedUnionShape {
                path: path.to_string(),
                detail: format!(
                    "{} branches; only a single type or a type paired with null is supported",
                    variants.len()
                ),
            }),
            TypeNode::Tuple { .. } => Err(BridgeError::UnsupportedType {
                kind: "tuple".to_string(),
            }),
            TypeNode::Reference { path } => Err(BridgeError::UnresolvedReference { path: path.clone() }),
        }
    }
}

/// Collapse the union shapes a native model can hold: one branch, or one
/// branch plus null. Everything else stays a union and is rejected later.
fn fold_nullable(mut variants: Vec<TypeNode>, path: &str) -> TypeNode {
    match variants.len() {
        1 => variants.remove(0),
        2 => match variants.iter().position(TypeNode::is_null) {
            Some(null_at) => {
                let inner = variants.swap_remove(1 - null_at);
                if inner.is_null() {
                    tracing::debug!(path = %path, "union of two nulls");
                    inner
                } else {
                    TypeNode::nullable(inner)
                }
            }
            None => TypeNode::union(variants),
        },
        _ => TypeNode::union(variants),
    }
}

/// A `null` member (or a `"null"` entry in the type list) makes the enum
/// nullable. The remaining values keep their order.
fn classify_enum(values: &[Value], ty: Option<&Value>) -> TypeNode {
    let type_allows_null = match ty {
        Some(Value::Array(types)) => types.iter().any(|t| t == "null"),
        Some(Value::String(t)) => t == "null",
        _ => false,
    };
    let non_null: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
    if non_null.is_empty() {
        return TypeNode::primitive(PrimitiveKind::Null);
    }
    let nullable = type_allows_null || non_null.len() < values.len();
    let node = TypeNode::literal_enum(non_null);
    if nullable {
        TypeNode::nullable(node)
    } else {
        node
    }
}

fn describe(node: &TypeNode) -> String {
    match node {
        TypeNode::Primitive { primitive } => primitive.to_string(),
        other => other.label().to_string(),
    }
}

impl ModelDecl {
    /// Nested models in declaration order, this one first. Recursive
    /// references are not followed.
    pub fn models(&self) -> Vec<&ModelDecl> {
        let mut out = vec![self];
        for field in &self.fields {
            field.ty.collect_models(&mut out);
        }
        out
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render Rust struct declarations for this model and every nested one.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut seen: Vec<&str> = Vec::new();
        for model in self.models() {
            if seen.contains(&model.name.as_str()) {
                continue;
            }
            seen.push(&model.name);
            if !out.is_empty() {
                out.push('\n');
            }
            model.render_one(&mut out);
        }
        out
    }

    fn render_one(&self, out: &mut String) {
        if let Some(description) = &self.description {
            for line in description.lines() {
                out.push_str(&format!("/// {}\n", line));
            }
        }
        out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub struct {} {{\n", self.name));
        for field in &self.fields {
            if let Some(description) = field.description() {
                out.push_str(&format!("    /// {}\n", description));
            }
            if let FieldType::Enum { values } = &field.ty {
                let allowed: Vec<String> = values.iter().map(Value::to_string).collect();
                out.push_str(&format!("    /// One of: {}.\n", allowed.join(", ")));
            }
            let ident = rust_ident(&field.name);
            if ident.trim_start_matches("r#") != field.name {
                out.push_str(&format!("    #[serde(rename = {:?})]\n", field.name));
            }
            let mut ty = field.ty.rust_type();
            if !field.required && !matches!(field.ty, FieldType::Nullable { .. }) {
                ty = format!("Option<{}>", ty);
            }
            out.push_str(&format!("    pub {}: {},\n", ident, ty));
        }
        out.push_str("}\n");
    }
}

impl FieldType {
    fn collect_models<'a>(&'a self, out: &mut Vec<&'a ModelDecl>) {
        match self {
            FieldType::Model { model } => {
                out.push(model);
                for field in &model.fields {
                    field.ty.collect_models(out);
                }
            }
            FieldType::List { items: inner }
            | FieldType::Map { values: inner }
            | FieldType::Nullable { inner } => inner.collect_models(out),
            FieldType::Primitive { .. } | FieldType::Enum { .. } | FieldType::Recursive { .. } => {}
        }
    }

    /// Rust spelling of this type.
    pub fn rust_type(&self) -> String {
        match self {
            FieldType::Primitive { primitive } => match primitive {
                PrimitiveKind::Integer => "i64".to_string(),
                PrimitiveKind::Float => "f64".to_string(),
                PrimitiveKind::Boolean => "bool".to_string(),
                PrimitiveKind::Any => "serde_json::Value".to_string(),
                PrimitiveKind::Null => "()".to_string(),
                PrimitiveKind::Binary => "Vec<u8>".to_string(),
                PrimitiveKind::Path => "std::path::PathBuf".to_string(),
                _ => "String".to_string(),
            },
            FieldType::Enum { values } if values.iter().all(Value::is_string) => "String".to_string(),
            FieldType::Enum { .. } => "serde_json::Value".to_string(),
            FieldType::Model { model } => model.name.clone(),
            FieldType::List { items } => format!("Vec<{}>", items.rust_type()),
            FieldType::Map { values } => {
                format!("std::collections::HashMap<String, {}>", values.rust_type())
            }
            FieldType::Nullable { inner } => format!("Option<{}>", inner.rust_type()),
            FieldType::Recursive { name } => format!("Box<{}>", name),
        }
    }
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while",
];

fn rust_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RUST_KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    } else if matches!(ident.as_str(), "self" | "Self" | "super" | "crate") {
        ident.push('_');
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(schema: Value) -> Result<ModelDecl, BridgeError> {
        build_schema(&schema, &BuildOptions::default())
    }

    #[test]
    fn nullable_branch_pair_folds_to_optional() {
        let model = build(json!({
            "type": "object",
            "properties": {
                "note": { "anyOf": [{ "type": "string" }, { "type": "null" }] },
                "count": { "type": ["integer", "null"] }
            }
        }))
        .unwrap();
        let string = FieldType::Primitive {
            primitive: PrimitiveKind::String,
        };
        assert_eq!(
            model.field("note").unwrap().ty,
            FieldType::Nullable {
                inner: Box::new(string)
            }
        );
        assert!(matches!(
            &model.field("count").unwrap().ty,
            FieldType::Nullable { inner } if **inner == FieldType::Primitive { primitive: PrimitiveKind::Integer }
        ));
    }

    #[test]
    fn nullable_enum_keeps_its_values() {
        let model = build(json!({
            "type": "object",
            "properties": {
                "status": { "type": ["string", "null"], "enum": ["open", "closed", null] },
                "level": { "enum": ["low", null] },
                "kind": { "type": "string", "enum": ["a", "b"] }
            }
        }))
        .unwrap();
        assert_eq!(
            model.field("status").unwrap().ty,
            FieldType::Nullable {
                inner: Box::new(FieldType::Enum {
                    values: vec![json!("open"), json!("closed")]
                })
            }
        );
        assert!(matches!(
            &model.field("level").unwrap().ty,
            FieldType::Nullable { inner } if **inner == FieldType::Enum { values: vec![json!("low")] }
        ));
        assert_eq!(
            model.field("kind").unwrap().ty,
            FieldType::Enum {
                values: vec![json!("a"), json!("b")]
            }
        );
    }

    #[test]
    fn single_branch_union_unwraps() {
        let model = build(json!({
            "type": "object",
            "properties": { "flag": { "oneOf": [{ "type": "boolean" }] } }
        }))
        .unwrap();
        assert_eq!(
            model.field("flag").unwrap().ty,
            FieldType::Primitive {
                primitive: PrimitiveKind::Boolean
            }
        );
    }

    #[test]
    fn three_branch_union_is_rejected() {
        let err = build(json!({
            "type": "object",
            "properties": {
                "value": { "anyOf": [{ "type": "string" }, { "type": "integer" }, { "type": "null" }] }
            }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnsupportedUnionShape { path, .. } if path == "#/properties/value"
        ));
    }

    #[test]
    fn two_non_null_branches_are_rejected() {
        let err = build(json!({
            "type": "object",
            "properties": { "id": { "type": ["string", "integer"] } }
        }))
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedUnionShape { .. }));
    }

    #[test]
    fn array_of_scalars_is_rejected() {
        let err = build(json!({
            "type": "object",
            "properties": { "tags": { "type": "array", "items": { "type": "string" } } }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnsupportedArrayElement { path, actual }
                if path == "#/properties/tags/items" && actual == "string"
        ));
    }

    #[test]
    fn array_of_objects_becomes_list_of_models() {
        let model = build(json!({
            "title": "Invoice",
            "type": "object",
            "properties": {
                "line_items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "sku": { "type": "string" } },
                        "required": ["sku"]
                    }
                }
            }
        }))
        .unwrap();
        let FieldType::List { items } = &model.field("line_items").unwrap().ty else {
            panic!("expected a list");
        };
        let FieldType::Model { model: item } = items.as_ref() else {
            panic!("expected a model");
        };
        assert_eq!(item.name, "InvoiceLineItems");
        assert!(item.field("sku").unwrap().required);
    }

    #[test]
    fn self_reference_becomes_recursive_field() {
        let model = build(json!({
            "$ref": "#/$defs/Node",
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "integer" },
                        "children": { "type": "array", "items": { "$ref": "#/$defs/Node" } },
                        "parent": { "anyOf": [{ "$ref": "#/$defs/Node" }, { "type": "null" }] }
                    },
                    "required": ["value", "children"]
                }
            }
        }))
        .unwrap();
        assert_eq!(model.name, "Node");
        assert_eq!(
            model.field("children").unwrap().ty,
            FieldType::List {
                items: Box::new(FieldType::Recursive { name: "Node".into() })
            }
        );
        assert_eq!(
            model.field("parent").unwrap().ty,
            FieldType::Nullable {
                inner: Box::new(FieldType::Recursive { name: "Node".into() })
            }
        );
    }

    #[test]
    fn metadata_is_carried_verbatim() {
        let model = build(json!({
            "type": "object",
            "properties": {
                "total": {
                    "type": "number",
                    "description": "Grand total",
                    "default": 0,
                    "X-Prompt": "Read the last line of the receipt",
                    "x-reasoning": true
                }
            }
        }))
        .unwrap();
        let total = model.field("total").unwrap();
        assert_eq!(total.description(), Some("Grand total"));
        assert_eq!(total.default(), Some(&json!(0)));
        assert_eq!(total.metadata.get("X-Prompt"), Some(&json!("Read the last line of the receipt")));
        assert_eq!(total.metadata.get("x-reasoning"), Some(&json!(true)));
        assert!(!total.required);
    }

    #[test]
    fn untitled_root_uses_configured_name() {
        let schema = json!({ "type": "object", "properties": {} });
        let model = build_schema(&schema, &BuildOptions::new().root_name("Extraction")).unwrap();
        assert_eq!(model.name, "Extraction");

        let titled = build(json!({ "title": "Receipt", "type": "object" })).unwrap();
        assert_eq!(titled.name, "Receipt");
    }

    #[test]
    fn maps_and_tuples() {
        let model = build(json!({
            "type": "object",
            "properties": {
                "counts": { "type": "object", "additionalProperties": { "type": "integer" } }
            }
        }))
        .unwrap();
        assert!(matches!(model.field("counts").unwrap().ty, FieldType::Map { .. }));

        let err = build(json!({
            "type": "object",
            "properties": {
                "point": { "type": "array", "prefixItems": [{ "type": "number" }, { "type": "number" }] }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedType { kind } if kind == "tuple"));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = build(json!({ "type": "string" })).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidSchema { path, .. } if path == "#"));
    }

    #[test]
    fn render_emits_nested_structs() {
        let model = build(json!({
            "title": "Order",
            "description": "A purchase order",
            "type": "object",
            "properties": {
                "type": { "enum": ["retail", "wholesale"] },
                "ship-to": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }
            },
            "required": ["type"]
        }))
        .unwrap();
        let rendered = model.render();
        assert!(rendered.contains("/// A purchase order\n"));
        assert!(rendered.contains("pub struct Order {"));
        assert!(rendered.contains("    /// One of: \"retail\", \"wholesale\".\n    pub r#type: String,"));
        assert!(rendered.contains("    #[serde(rename = \"ship-to\")]\n    pub ship_to: Option<OrderShipTo>,"));
        assert!(rendered.contains("pub struct OrderShipTo {\n"));
        assert!(rendered.contains("    pub city: String,"));
    }
}
