//! Core types shared by both compiler directions.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::AnnotationBag;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Scalar primitive kinds.
///
/// Unknown spellings are kept as [`PrimitiveKind::Other`] so the compiler can
/// report them by name instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrimitiveKind {
    String,
    Integer,
    Float,
    Boolean,
    Any,
    Null,
    Binary,
    Date,
    DateTime,
    Time,
    Path,
    Email,
    Other(String),
}

impl PrimitiveKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "string" | "str" => PrimitiveKind::String,
            "integer" | "int" => PrimitiveKind::Integer,
            "float" | "number" => PrimitiveKind::Float,
            "boolean" | "bool" => PrimitiveKind::Boolean,
            "any" => PrimitiveKind::Any,
            "null" | "none" => PrimitiveKind::Null,
            "binary" | "bytes" => PrimitiveKind::Binary,
            "date" => PrimitiveKind::Date,
            "datetime" | "date-time" => PrimitiveKind::DateTime,
            "time" => PrimitiveKind::Time,
            "path" => PrimitiveKind::Path,
            "email" => PrimitiveKind::Email,
            other => PrimitiveKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Any => "any",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Binary => "binary",
            PrimitiveKind::Date => "date",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::Time => "time",
            PrimitiveKind::Path => "path",
            PrimitiveKind::Email => "email",
            PrimitiveKind::Other(name) => name,
        }
    }
}

impl From<String> for PrimitiveKind {
    fn from(s: String) -> Self {
        PrimitiveKind::parse(&s)
    }
}

impl From<PrimitiveKind> for String {
    fn from(kind: PrimitiveKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(namespace_path, base_name)` identity of a named object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeName {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespace: Vec<String>,
    pub name: String,
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: Vec::new(),
            name: name.into(),
        }
    }

    pub fn qualified<I, S>(namespace: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Parse a dotted path such as `billing.v1.Invoice`.
    pub fn parse(dotted: &str) -> Self {
        let mut parts: Vec<String> = dotted.split('.').map(String::from).collect();
        let name = parts.pop().unwrap_or_default();
        Self {
            namespace: parts,
            name,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.namespace {
            write!(f, "{}.", segment)?;
        }
        f.write_str(&self.name)
    }
}

fn default_required() -> bool {
    true
}

/// One field of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeNode,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "AnnotationBag::is_empty")]
    pub annotations: AnnotationBag,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            default: None,
            annotations: AnnotationBag::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn describe(self, description: impl Into<String>) -> Self {
        self.annotate("description", description.into())
    }

    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.annotations = self.annotations.with(key, value);
        self
    }
}

/// A class-like type with ordered fields and optional base types.
///
/// `name` is set when the type must be emitted as a standalone declaration;
/// anonymous objects are compiled inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TypeName>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<TypeNode>,
    #[serde(default, skip_serializing_if = "AnnotationBag::is_empty")]
    pub annotations: AnnotationBag,
}

impl ObjectType {
    pub fn named(name: TypeName) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn base(mut self, base: TypeNode) -> Self {
        self.bases.push(base);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.annotations = self.annotations.with("description", description.into());
        self
    }
}

impl PartialEq for ObjectType {
    // Named objects compare by identity key; the same logical type may be
    // presented through different instantiations.
    fn eq(&self, other: &Self) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.fields == other.fields && self.bases == other.bases,
            _ => false,
        }
    }
}

/// The universal intermediate representation of one type occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeNode {
    Primitive {
        primitive: PrimitiveKind,
    },
    Object(ObjectType),
    /// Handle to an object stored in a [`TypeGraph`].
    Named(TypeName),
    Array {
        items: Box<TypeNode>,
    },
    Tuple {
        items: Vec<TypeNode>,
    },
    Map {
        key: Box<TypeNode>,
        value: Box<TypeNode>,
    },
    Union {
        variants: Vec<TypeNode>,
    },
    LiteralEnum {
        values: Vec<Value>,
    },
    Nullable {
        inner: Box<TypeNode>,
    },
    /// Only found in unexpanded portable documents.
    Reference {
        path: String,
    },
}

impl TypeNode {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeNode::Primitive { primitive: kind }
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        Self::primitive(PrimitiveKind::Integer)
    }

    pub fn float() -> Self {
        Self::primitive(PrimitiveKind::Float)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn named(name: TypeName) -> Self {
        TypeNode::Named(name)
    }

    pub fn array(items: TypeNode) -> Self {
        TypeNode::Array {
            items: Box::new(items),
        }
    }

    pub fn tuple(items: Vec<TypeNode>) -> Self {
        TypeNode::Tuple { items }
    }

    pub fn map(key: TypeNode, value: TypeNode) -> Self {
        TypeNode::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn union(variants: Vec<TypeNode>) -> Self {
        TypeNode::Union { variants }
    }

    pub fn literal_enum<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        TypeNode::LiteralEnum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn nullable(inner: TypeNode) -> Self {
        TypeNode::Nullable {
            inner: Box::new(inner),
        }
    }

    /// The identity key of a named object occurrence, if any.
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            TypeNode::Named(name) => Some(name),
            TypeNode::Object(obj) => obj.name.as_ref(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            TypeNode::Primitive {
                primitive: PrimitiveKind::Null
            }
        )
    }

    /// Short variant label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            TypeNode::Primitive { .. } => "primitive",
            TypeNode::Object(_) | TypeNode::Named(_) => "object",
            TypeNode::Array { .. } => "array",
            TypeNode::Tuple { .. } => "tuple",
            TypeNode::Map { .. } => "map",
            TypeNode::Union { .. } => "union",
            TypeNode::LiteralEnum { .. } => "enum",
            TypeNode::Nullable { .. } => "nullable",
            TypeNode::Reference { .. } => "reference",
        }
    }
}

impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        use TypeNode::*;
        match (self, other) {
            (Primitive { primitive: a }, Primitive { primitive: b }) => a == b,
            (Object(a), Object(b)) => a == b,
            (Named(a), Named(b)) => a == b,
            (Named(a), Object(b)) | (Object(b), Named(a)) => b.name.as_ref() == Some(a),
            (Array { items: a }, Array { items: b }) => a == b,
            (Tuple { items: a }, Tuple { items: b }) => a == b,
            (Map { key: ka, value: va }, Map { key: kb, value: vb }) => ka == kb && va == vb,
            (Union { variants: a }, Union { variants: b }) => {
                a.len() == b.len()
                    && a.iter().all(|v| b.contains(v))
                    && b.iter().all(|v| a.contains(v))
            }
            (LiteralEnum { values: a }, LiteralEnum { values: b }) => a == b,
            (Nullable { inner: a }, Nullable { inner: b }) => a == b,
            (Reference { path: a }, Reference { path: b }) => a == b,
            _ => false,
        }
    }
}

/// Arena of named object types plus the root types requested for emission.
///
/// Objects are stored once and referenced elsewhere through
/// [`TypeNode::Named`], which is how self-referential graphs are expressed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "TypeGraphRepr", into = "TypeGraphRepr")]
pub struct TypeGraph {
    objects: IndexMap<TypeName, ObjectType>,
    roots: Vec<TypeNode>,
}

#[derive(Serialize, Deserialize)]
struct TypeGraphRepr {
    #[serde(default)]
    types: Vec<ObjectType>,
    #[serde(default)]
    roots: Vec<TypeNode>,
}

impl TryFrom<TypeGraphRepr> for TypeGraph {
    type Error = String;

    fn try_from(repr: TypeGraphRepr) -> Result<Self, Self::Error> {
        let mut objects = IndexMap::new();
        for (idx, obj) in repr.types.into_iter().enumerate() {
            let name = obj
                .name
                .clone()
                .ok_or_else(|| format!("types[{}] has no name", idx))?;
            if objects.insert(name.clone(), obj).is_some() {
                return Err(format!("type {} is declared twice", name));
            }
        }
        Ok(TypeGraph {
            objects,
            roots: repr.roots,
        })
    }
}

impl From<TypeGraph> for TypeGraphRepr {
    fn from(graph: TypeGraph) -> Self {
        TypeGraphRepr {
            types: graph.objects.into_values().collect(),
            roots: graph.roots,
        }
    }
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object under `name` and return a handle to it.
    pub fn insert(&mut self, name: TypeName, mut object: ObjectType) -> TypeNode {
        object.name = Some(name.clone());
        self.objects.insert(name.clone(), object);
        TypeNode::Named(name)
    }

    /// Builder-style variant of [`TypeGraph::insert`].
    pub fn with_type(mut self, object: ObjectType) -> Self {
        if let Some(name) = object.name.clone() {
            self.insert(name, object);
        }
        self
    }

    pub fn with_root(mut self, root: TypeNode) -> Self {
        self.roots.push(root);
        self
    }

    pub fn get(&self, name: &TypeName) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    pub fn roots(&self) -> &[TypeNode] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Find stored names by their unqualified base name.
    pub fn find_by_base_name(&self, base: &str) -> Vec<&TypeName> {
        self.objects.keys().filter(|n| n.name == base).collect()
    }
}
