//! Forward compiler - native type graph to validator expressions and type
//! declarations.
//!
//! Every type occurrence is compiled into a [`CompiledExpr`] pair: a
//! zod-style runtime validator and a TypeScript-style static type. Named
//! objects are never inlined; they compile to a reference and are pushed on
//! the [`ConversionQueue`], which [`ForwardCompiler::run`] drains until no
//! new types are discovered.
//!
//! # Example
//!
//! ```
//! use schema_bridge::{FieldSpec, ForwardCompiler, ObjectType, TypeGraph, TypeName, TypeNode};
//!
//! let mut graph = TypeGraph::new();
//! let node = graph.insert(
//!     TypeName::new("TreeNode"),
//!     ObjectType::anonymous()
//!         .field(FieldSpec::new("label", TypeNode::string()))
//!         .field(FieldSpec::new("children", TypeNode::array(TypeNode::named(TypeName::new("TreeNode"))))),
//! );
//!
//! let output = ForwardCompiler::new(&graph).run(&[node]).unwrap();
//! assert_eq!(output.artifacts.len(), 1);
//! assert!(output.artifacts[0].validator.contains("z.lazy(() => TreeNodeSchema)"));
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;
use crate::naming::NameRegistry;
use crate::queue::{ConversionQueue, Necessity, QueueEntry, SkippedType};
use crate::types::{json_type_name, FieldSpec, ObjectType, PrimitiveKind, TypeGraph, TypeName, TypeNode};

/// Options for a forward compilation run.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Suffix appended to a type name to form its validator identifier.
    pub validator_suffix: String,
    /// When true, failures in transitively discovered types abort the run
    /// instead of being skipped.
    pub strict: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validator_suffix: "Schema".to_string(),
            strict: false,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validator_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.validator_suffix = suffix.into();
        self
    }
}

/// A validator expression paired with the static type it checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledExpr {
    pub validator: String,
    pub type_decl: String,
}

impl CompiledExpr {
    fn new(validator: impl Into<String>, type_decl: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            type_decl: type_decl.into(),
        }
    }

    fn nullable(self) -> Self {
        Self {
            validator: format!("{}.nullable()", self.validator),
            type_decl: format!("{} | null", self.type_decl),
        }
    }
}

/// Both artifacts of one named type, keyed by its registry name.
#[derive(Debug, Clone, Serialize)]
pub struct NamedArtifact {
    pub name: String,
    pub key: TypeName,
    pub validator_name: String,
    pub validator: String,
    pub type_decl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NamedArtifact {
    /// Source text declaring the type and its validator.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(description) = &self.description {
            out.push_str(&format!("/** {} */\n", description.replace("*/", "*\\/")));
        }
        out.push_str(&format!("export type {} = {};\n", self.name, self.type_decl));
        out.push_str(&format!(
            "export const {}: z.ZodType<{}> = {};\n",
            self.validator_name, self.name, self.validator
        ));
        out
    }
}

/// Result of [`ForwardCompiler::run`].
#[derive(Debug, Clone, Serialize)]
pub struct ForwardOutput {
    /// Named types in discovery order.
    pub artifacts: Vec<NamedArtifact>,
    /// One expression per requested root, in request order.
    pub roots: Vec<CompiledExpr>,
    /// Discovered types that failed to compile.
    pub skipped: Vec<SkippedType>,
}

impl ForwardOutput {
    pub fn artifact(&self, name: &str) -> Option<&NamedArtifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Render a complete generated module.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("// This file is @generated by schema-bridge. DO NOT EDIT.\n");
        out.push_str("import { z } from \"zod\";\n");
        for skipped in &self.skipped {
            out.push_str(&format!(
                "// skipped {} ({} is not declared): {}\n",
                skipped.key, skipped.validator_name, skipped.reason
            ));
        }
        for artifact in &self.artifacts {
            out.push('\n');
            out.push_str(&artifact.render());
        }
        out
    }
}

/// Compiles native type graphs. One instance per invocation; the name
/// registry and conversion queue never outlive it.
pub struct ForwardCompiler<'g> {
    graph: &'g TypeGraph,
    options: CompileOptions,
    registry: NameRegistry,
    queue: ConversionQueue,
}

impl<'g> ForwardCompiler<'g> {
    pub fn new(graph: &'g TypeGraph) -> Self {
        Self::with_options(graph, CompileOptions::default())
    }

    pub fn with_options(graph: &'g TypeGraph, options: CompileOptions) -> Self {
        Self {
            graph,
            options,
            registry: NameRegistry::new(),
            queue: ConversionQueue::new(),
        }
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    /// Compile the requested roots and every named type reachable from them.
    ///
    /// # Errors
    ///
    /// Any error in a root, or in a named root's own declaration, aborts the
    /// run. Errors in transitively discovered types are logged and reported
    /// in [`ForwardOutput::skipped`] unless `strict` is set.
    pub fn run(mut self, roots: &[TypeNode]) -> Result<ForwardOutput, BridgeError> {
        let mut root_exprs = Vec::with_capacity(roots.len());
        for root in roots {
            if root.type_name().is_some() {
                let object = self.resolve_object(root)?;
                self.enqueue(object, Necessity::Required)?;
            }
            root_exprs.push(self.compile(root, true)?);
        }

        let mut artifacts = Vec::new();
        let mut skipped = Vec::new();
        while let Some(entry) = self.queue.pop() {
            match self.compile_named(&entry) {
                Ok(artifact) => artifacts.push(artifact),
                Err(err) if entry.necessity == Necessity::Discovered && !self.options.strict => {
                    tracing::warn!(
                        type_name = %entry.key,
                        kind = err.kind(),
                        error = %err,
                        "skipping discovered type"
                    );
                    let validator_name = self.validator_ident(&entry.name);
                    skipped.push(SkippedType::new(&entry, validator_name, &err));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(ForwardOutput {
            artifacts,
            roots: root_exprs,
            skipped,
        })
    }

    /// Compile one type occurrence.
    ///
    /// With `emit_name` set, named objects compile to a reference and are
    /// enqueued for standalone emission; otherwise their body is inlined.
    pub fn compile(&mut self, node: &TypeNode, emit_name: bool) -> Result<CompiledExpr, BridgeError> {
        match node {
            TypeNode::Primitive { primitive } => primitive_expr(primitive),
            TypeNode::Nullable { inner } => Ok(self.compile(inner, emit_name)?.nullable()),
            TypeNode::Union { variants } => self.compile_union(variants, emit_name),
            TypeNode::Object(object) => match &object.name {
                Some(_) if emit_name => self.reference(object),
                Some(name) => {
                    let owner = name.to_string();
                    self.compile_object_body(object, &owner)
                }
                None => self.compile_object_body(object, "<anonymous>"),
            },
            TypeNode::Named(name) => {
                let object = self.lookup(name)?;
                if emit_name {
                    self.reference(object)
                } else {
                    self.compile_object_body(object, &name.to_string())
                }
            }
            TypeNode::Array { items } => {
                let items = self.compile(items, true)?;
                Ok(CompiledExpr::new(
                    format!("z.array({})", items.validator),
                    format!("Array<{}>", items.type_decl),
                ))
            }
            TypeNode::Tuple { items } => {
                let compiled = items
                    .iter()
                    .map(|item| self.compile(item, true))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledExpr::new(
                    format!("z.tuple([{}])", join(compiled.iter().map(|c| &c.validator), ", ")),
                    format!("[{}]", join(compiled.iter().map(|c| &c.type_decl), ", ")),
                ))
            }
            TypeNode::Map { key, value } => {
                let key = self.compile(key, true)?;
                let value = self.compile(value, true)?;
                Ok(CompiledExpr::new(
                    format!("z.record({}, {})", key.validator, value.validator),
                    format!("Record<{}, {}>", key.type_decl, value.type_decl),
                ))
            }
            TypeNode::LiteralEnum { values } => literal_enum_expr(values),
            TypeNode::Reference { path } => Err(BridgeError::UnresolvedReference { path: path.clone() }),
        }
    }

    fn compile_named(&mut self, entry: &QueueEntry) -> Result<NamedArtifact, BridgeError> {
        tracing::debug!(type_name = %entry.key, name = %entry.name, "compiling named type");
        let body = self.compile_object_body(&entry.object, &entry.name)?;
        Ok(NamedArtifact {
            name: entry.name.clone(),
            key: entry.key.clone(),
            validator_name: self.validator_ident(&entry.name),
            validator: body.validator,
            type_decl: body.type_decl,
            description: entry.object.annotations.description().map(String::from),
        })
    }

    fn compile_union(&mut self, variants: &[TypeNode], emit_name: bool) -> Result<CompiledExpr, BridgeError> {
        if variants.is_empty() {
            return Err(BridgeError::EmptyUnion {
                path: "union".to_string(),
            });
        }

        let has_null = variants.iter().any(TypeNode::is_null);
        let non_null: Vec<&TypeNode> = variants.iter().filter(|v| !v.is_null()).collect();

        let inner = match non_null.as_slice() {
            [] => return primitive_expr(&PrimitiveKind::Null),
            [only] => self.compile(only, emit_name)?,
            many => {
                let compiled = many
                    .iter()
                    .map(|v| self.compile(v, emit_name))
                    .collect::<Result<Vec<_>, _>>()?;
                CompiledExpr::new(
                    format!("z.union([{}])", join(compiled.iter().map(|c| &c.validator), ", ")),
                    join(compiled.iter().map(|c| &c.type_decl), " | "),
                )
            }
        };

        Ok(if has_null { inner.nullable() } else { inner })
    }

    /// Register and enqueue a named object, returning a reference to it.
    fn reference(&mut self, object: &ObjectType) -> Result<CompiledExpr, BridgeError> {
        let name = self.enqueue(object, Necessity::Discovered)?;
        Ok(CompiledExpr::new(
            format!("z.lazy(() => {})", self.validator_ident(&name)),
            name,
        ))
    }

    fn enqueue(&mut self, object: &ObjectType, necessity: Necessity) -> Result<String, BridgeError> {
        let Some(key) = object.name.as_ref() else {
            return Err(BridgeError::InvalidSchema {
                path: "<anonymous>".to_string(),
                message: "only named objects can be enqueued".to_string(),
            });
        };
        // The graph holds the canonical declaration when there is one.
        let canonical = self.graph.get(key).unwrap_or(object);
        let name = self.registry.assign_key(key)?;
        self.queue.push(QueueEntry {
            key: key.clone(),
            name: name.clone(),
            object: canonical.clone(),
            necessity,
        });
        Ok(name)
    }

    fn compile_object_body(&mut self, object: &ObjectType, owner: &str) -> Result<CompiledExpr, BridgeError> {
        let inherited = self.inherited_fields(object, owner)?;
        for field in &object.fields {
            if let Some(base_ty) = inherited.get(&field.name) {
                if *base_ty != field.ty {
                    return Err(BridgeError::FieldConflict {
                        type_name: owner.to_string(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        let mut validator_parts = Vec::new();
        let mut type_parts = Vec::new();
        // Keyed by name so a field restated by an anonymous base appears once.
        let mut own_fields: IndexMap<&str, &FieldSpec> = IndexMap::new();

        for base in &object.bases {
            match base {
                TypeNode::Named(_) | TypeNode::Object(ObjectType { name: Some(_), .. }) => {
                    let compiled = self.compile(base, true)?;
                    validator_parts.push(compiled.validator);
                    type_parts.push(compiled.type_decl);
                }
                TypeNode::Object(anonymous) => {
                    for field in &anonymous.fields {
                        own_fields.insert(field.name.as_str(), field);
                    }
                }
                other => {
                    return Err(BridgeError::InvalidSchema {
                        path: owner.to_string(),
                        message: format!("base type must be an object, got {}", other.label()),
                    })
                }
            }
        }
        for field in &object.fields {
            own_fields.insert(field.name.as_str(), field);
        }

        if !own_fields.is_empty() || validator_parts.is_empty() {
            let own_fields: Vec<&FieldSpec> = own_fields.into_values().collect();
            let fields = self.compile_fields(&own_fields)?;
            validator_parts.push(fields.validator);
            type_parts.push(fields.type_decl);
        }

        let mut parts = validator_parts.into_iter();
        let first = parts.next().unwrap_or_default();
        let validator = parts.fold(first, |acc, next| format!("{}.and({})", acc, next));
        Ok(CompiledExpr::new(validator, type_parts.join(" & ")))
    }

    fn compile_fields(&mut self, fields: &[&FieldSpec]) -> Result<CompiledExpr, BridgeError> {
        if fields.is_empty() {
            return Ok(CompiledExpr::new("z.object({})", "{}"));
        }

        let mut validator_entries = Vec::with_capacity(fields.len());
        let mut type_entries = Vec::with_capacity(fields.len());
        for field in fields {
            let compiled = self.compile(&field.ty, true)?;
            let key = property_key(&field.name);

            let mut validator = compiled.validator;
            if let Some(description) = field.annotations.description() {
                validator.push_str(&format!(".describe({})", js_literal(&Value::from(description))));
            }
            if let Some(default) = &field.default {
                validator.push_str(&format!(".default({})", js_literal(default)));
            } else if !field.required {
                validator.push_str(".optional()");
            }

            let marker = if field.required { "" } else { "?" };
            validator_entries.push(format!("{}: {}", key, validator));
            type_entries.push(format!("{}{}: {}", key, marker, compiled.type_decl));
        }

        Ok(CompiledExpr::new(
            format!("z.object({{ {} }})", validator_entries.join(", ")),
            format!("{{ {} }}", type_entries.join("; ")),
        ))
    }

    /// Fields contributed by base types, keyed by name.
    ///
    /// # Errors
    ///
    /// `FieldConflict` when two bases disagree on a field's type, and
    /// `UnsupportedRecursion` for a cyclic inheritance chain.
    fn inherited_fields(
        &self,
        object: &ObjectType,
        owner: &str,
    ) -> Result<HashMap<String, TypeNode>, BridgeError> {
        let mut fields = HashMap::new();
        let mut visiting = HashSet::new();
        for base in &object.bases {
            self.collect_base_fields(base, owner, &mut fields, &mut visiting)?;
        }
        Ok(fields)
    }

    fn collect_base_fields(
        &self,
        base: &TypeNode,
        owner: &str,
        fields: &mut HashMap<String, TypeNode>,
        visiting: &mut HashSet<TypeName>,
    ) -> Result<(), BridgeError> {
        let object = match base {
            TypeNode::Named(name) => self.lookup(name)?,
            TypeNode::Object(object) => object,
            _ => return Ok(()),
        };

        if let Some(name) = &object.name {
            if !visiting.insert(name.clone()) {
                return Err(BridgeError::UnsupportedRecursion {
                    path: name.to_string(),
                });
            }
        }

        for parent in &object.bases {
            self.collect_base_fields(parent, owner, fields, visiting)?;
        }
        for field in &object.fields {
            match fields.get(&field.name) {
                Some(existing) if *existing != field.ty => {
                    return Err(BridgeError::FieldConflict {
                        type_name: owner.to_string(),
                        field: field.name.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    fields.insert(field.name.clone(), field.ty.clone());
                }
            }
        }

        if let Some(name) = &object.name {
            visiting.remove(name);
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

    fn resolve_object<'n>(&self, node: &'n TypeNode) -> Result<&'n ObjectType, BridgeError>
    where
        'g: 'n,
    {
        match node {
            TypeNode::Named(name) => self.lookup(name),
            TypeNode::Object(object) => Ok(object),
            other => Err(BridgeError::InvalidSchema {
                path: "root".to_string(),
                message: format!("expected an object, got {}", other.label()),
            }),
        }
    }

    fn validator_ident(&self, name: &str) -> String {
        format!("{}{}", name, self.options.validator_suffix)
    }
}

/// The fixed scalar mapping table.
fn primitive_expr(kind: &PrimitiveKind) -> Result<CompiledExpr, BridgeError> {
    let (validator, type_decl) = match kind {
        PrimitiveKind::String | PrimitiveKind::Path => ("z.string()", "string"),
        PrimitiveKind::Integer => ("z.number().int()", "number"),
        PrimitiveKind::Float => ("z.number()", "number"),
        PrimitiveKind::Boolean => ("z.boolean()", "boolean"),
        PrimitiveKind::Any => ("z.any()", "any"),
        PrimitiveKind::Null => ("z.null()", "null"),
        PrimitiveKind::Binary => ("z.instanceof(Blob)", "Blob"),
        PrimitiveKind::Date => ("z.string().date()", "string"),
        PrimitiveKind::DateTime => ("z.string().datetime()", "string"),
        PrimitiveKind::Time => ("z.string().time()", "string"),
        PrimitiveKind::Email => ("z.string().email()", "string"),
        PrimitiveKind::Other(name) => {
            return Err(BridgeError::UnsupportedType { kind: name.clone() })
        }
    };
    Ok(CompiledExpr::new(validator, type_decl))
}

fn literal_enum_expr(values: &[Value]) -> Result<CompiledExpr, BridgeError> {
    if values.is_empty() {
        return Err(BridgeError::EmptyUnion {
            path: "enum".to_string(),
        });
    }
    if let Some(bad) = values.iter().find(|v| v.is_object() || v.is_array()) {
        return Err(BridgeError::UnsupportedType {
            kind: format!("{} enum value", json_type_name(bad)),
        });
    }

    let literals: Vec<String> = values.iter().map(js_literal).collect();
    let type_decl = literals.join(" | ");
    let validator = if values.iter().all(Value::is_string) {
        format!("z.enum([{}])", literals.join(", "))
    } else if let [only] = literals.as_slice() {
        format!("z.literal({})", only)
    } else {
        let members: Vec<String> = literals.iter().map(|l| format!("z.literal({})", l)).collect();
        format!("z.union([{}])", members.join(", "))
    };
    Ok(CompiledExpr::new(validator, type_decl))
}

fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        None => false,
    };
    if valid {
        name.to_string()
    } else {
        js_literal(&Value::from(name))
    }
}

fn js_literal(value: &Value) -> String {
    value.to_string()
}

fn join<'a>(items: impl Iterator<Item = &'a String>, sep: &str) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSpec, ObjectType};
    use serde_json::json;

    fn compile_root(graph: &TypeGraph, root: TypeNode) -> ForwardOutput {
        ForwardCompiler::new(graph).run(&[root]).unwrap()
    }

    #[test]
    fn primitive_table() {
        let graph = TypeGraph::new();
        let mut compiler = ForwardCompiler::new(&graph);
        let email = compiler
            .compile(&TypeNode::primitive(PrimitiveKind::Email), true)
            .unwrap();
        assert_eq!(email, CompiledExpr::new("z.string().email()", "string"));
        let int = compiler.compile(&TypeNode::integer(), true).unwrap();
        assert_eq!(int, CompiledExpr::new("z.number().int()", "number"));
    }

    #[test]
    fn unknown_primitive_names_the_kind() {
        let graph = TypeGraph::new();
        let mut compiler = ForwardCompiler::new(&graph);
        let err = compiler
            .compile(&TypeNode::primitive(PrimitiveKind::parse("decimal")), true)
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedType { kind } if kind == "decimal"));
    }

    #[test]
    fn nullable_wraps_both_artifacts() {
        let graph = TypeGraph::new();
        let mut compiler = ForwardCompiler::new(&graph);
        let expr = compiler
            .compile(&TypeNode::nullable(TypeNode::string()), true)
            .unwrap();
        assert_eq!(expr, CompiledExpr::new("z.string().nullable()", "string | null"));
    }

    #[test]
    fn union_shapes() {
        let graph = TypeGraph::new();
        let mut compiler = ForwardCompiler::new(&graph);

        let single = compiler
            .compile(&TypeNode::union(vec![TypeNode::boolean()]), true)
            .unwrap();
        assert_eq!(single, CompiledExpr::new("z.boolean()", "boolean"));

        let with_null = compiler
            .compile(
                &TypeNode::union(vec![TypeNode::string(), TypeNode::primitive(PrimitiveKind::Null)]),
                true,
            )
            .unwrap();
        assert_eq!(with_null, CompiledExpr::new("z.string().nullable()", "string | null"));

        let two = compiler
            .compile(&TypeNode::union(vec![TypeNode::string(), TypeNode::integer()]), true)
            .unwrap();
        assert_eq!(
            two,
            CompiledExpr::new("z.union([z.string(), z.number().int()])", "string | number")
        );

        let empty = compiler.compile(&TypeNode::union(vec![]), true);
        assert!(matches!(empty, Err(BridgeError::EmptyUnion { .. })));
    }

    #[test]
    fn literal_enum_keeps_order() {
        let graph = TypeGraph::new();
        let mut compiler = ForwardCompiler::new(&graph);
        let expr = compiler
            .compile(&TypeNode::literal_enum(["paid", "open", "void"]), true)
            .unwrap();
        assert_eq!(expr.validator, r#"z.enum(["paid", "open", "void"])"#);
        assert_eq!(expr.type_decl, r#""paid" | "open" | "void""#);

        let mixed = compiler
            .compile(&TypeNode::literal_enum([json!(1), json!("a")]), true)
            .unwrap();
        assert_eq!(mixed.validator, r#"z.union([z.literal(1), z.literal("a")])"#);
    }

    #[test]
    fn anonymous_object_is_inlined() {
        let graph = TypeGraph::new();
        let mut compiler = ForwardCompiler::new(&graph);
        let node = TypeNode::Object(
            ObjectType::anonymous()
                .field(FieldSpec::new("id", TypeNode::string()))
                .field(FieldSpec::new("note", TypeNode::string()).optional())
                .field(FieldSpec::new("page-count", TypeNode::integer()).with_default(1)),
        );
        let expr = compiler.compile(&node, true).unwrap();
        assert_eq!(
            expr.validator,
            r#"z.object({ id: z.string(), note: z.string().optional(), "page-count": z.number().int().default(1) })"#
        );
        assert_eq!(
            expr.type_decl,
            r#"{ id: string; note?: string; "page-count"?: number }"#
        );
    }

    #[test]
    fn self_referential_type_terminates() {
        let mut graph = TypeGraph::new();
        let tree = graph.insert(
            TypeName::new("Tree"),
            ObjectType::anonymous()
                .field(FieldSpec::new("value", TypeNode::integer()))
                .field(FieldSpec::new(
                    "children",
                    TypeNode::array(TypeNode::named(TypeName::new("Tree"))),
                )),
        );
        let output = compile_root(&graph, tree);
        assert_eq!(output.artifacts.len(), 1);
        let tree = output.artifact("Tree").unwrap();
        assert_eq!(
            tree.validator,
            "z.object({ value: z.number().int(), children: z.array(z.lazy(() => TreeSchema)) })"
        );
        assert_eq!(tree.type_decl, "{ value: number; children: Array<Tree> }");
        assert_eq!(output.roots[0], CompiledExpr::new("z.lazy(() => TreeSchema)", "Tree"));
    }

    #[test]
    fn discovery_order_is_emission_order() {
        let mut graph = TypeGraph::new();
        graph.insert(
            TypeName::new("LineItem"),
            ObjectType::anonymous().field(FieldSpec::new("sku", TypeNode::string())),
        );
        graph.insert(
            TypeName::new("Customer"),
            ObjectType::anonymous().field(FieldSpec::new("email", TypeNode::primitive(PrimitiveKind::Email))),
        );
        let invoice = graph.insert(
            TypeName::new("Invoice"),
            ObjectType::anonymous()
                .field(FieldSpec::new("customer", TypeNode::named(TypeName::new("Customer"))))
                .field(FieldSpec::new(
                    "items",
                    TypeNode::array(TypeNode::named(TypeName::new("LineItem"))),
                )),
        );
        let output = compile_root(&graph, invoice);
        let names: Vec<&str> = output.artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Invoice", "Customer", "LineItem"]);
    }

    #[test]
    fn discovered_failures_are_skipped() {
        let mut graph = TypeGraph::new();
        graph.insert(
            TypeName::new("Money"),
            ObjectType::anonymous().field(FieldSpec::new(
                "amount",
                TypeNode::primitive(PrimitiveKind::parse("decimal")),
            )),
        );
        let invoice = graph.insert(
            TypeName::new("Invoice"),
            ObjectType::anonymous()
                .field(FieldSpec::new("id", TypeNode::string()))
                .field(FieldSpec::new("total", TypeNode::named(TypeName::new("Money")))),
        );

        let output = compile_root(&graph, invoice.clone());
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].name, "Money");
        assert_eq!(output.skipped[0].kind, "UnsupportedType");
        assert_eq!(output.skipped[0].validator_name, "MoneySchema");
        assert!(output.artifacts[0].validator.contains("z.lazy(() => MoneySchema)"));
        assert!(output
            .render()
            .contains("// skipped Money (MoneySchema is not declared): "));

        let strict = ForwardCompiler::with_options(&graph, CompileOptions::new().strict(true))
            .run(&[invoice]);
        assert!(matches!(strict, Err(BridgeError::UnsupportedType { .. })));
    }

    #[test]
    fn required_failures_abort() {
        let mut graph = TypeGraph::new();
        let money = graph.insert(
            TypeName::new("Money"),
            ObjectType::anonymous().field(FieldSpec::new(
                "amount",
                TypeNode::primitive(PrimitiveKind::parse("decimal")),
            )),
        );
        let result = ForwardCompiler::new(&graph).run(&[money]);
        assert!(matches!(result, Err(BridgeError::UnsupportedType { kind }) if kind == "decimal"));
    }

    #[test]
    fn missing_named_type_is_unresolved() {
        let graph = TypeGraph::new();
        let result = ForwardCompiler::new(&graph).run(&[TypeNode::named(TypeName::new("Ghost"))]);
        assert!(matches!(result, Err(BridgeError::UnresolvedReference { path }) if path == "Ghost"));
    }

    #[test]
    fn colliding_names_are_qualified() {
        let mut graph = TypeGraph::new();
        let billing_item = TypeName::qualified(["billing"], "Item");
        let shipping_item = TypeName::qualified(["shipping"], "Item");
        graph.insert(billing_item.clone(), ObjectType::anonymous());
        graph.insert(shipping_item.clone(), ObjectType::anonymous());
        let order = graph.insert(
            TypeName::new("Order"),
            ObjectType::anonymous()
                .field(FieldSpec::new("billed", TypeNode::named(billing_item)))
                .field(FieldSpec::new("shipped", TypeNode::named(shipping_item))),
        );
        let output = compile_root(&graph, order);
        let order = output.artifact("Order").unwrap();
        assert_eq!(order.type_decl, "{ billed: Item; shipped: ShippingItem }");
        assert!(output.artifact("ShippingItem").is_some());
    }

    #[test]
    fn bases_compose_before_own_fields() {
        let mut graph = TypeGraph::new();
        let base = graph.insert(
            TypeName::new("Document"),
            ObjectType::anonymous().field(FieldSpec::new("id", TypeNode::string())),
        );
        let receipt = graph.insert(
            TypeName::new("Receipt"),
            ObjectType::anonymous()
                .base(base)
                .field(FieldSpec::new("total", TypeNode::float())),
        );
        let output = compile_root(&graph, receipt);
        let receipt = output.artifact("Receipt").unwrap();
        assert_eq!(
            receipt.validator,
            "z.lazy(() => DocumentSchema).and(z.object({ total: z.number() }))"
        );
        assert_eq!(receipt.type_decl, "Document & { total: number }");
        assert!(output.artifact("Document").is_some());
    }

    #[test]
    fn conflicting_bases_are_rejected() {
        let mut graph = TypeGraph::new();
        let a = graph.insert(
            TypeName::new("A"),
            ObjectType::anonymous().field(FieldSpec::new("id", TypeNode::string())),
        );
        let b = graph.insert(
            TypeName::new("B"),
            ObjectType::anonymous().field(FieldSpec::new("id", TypeNode::integer())),
        );
        let c = graph.insert(TypeName::new("C"), ObjectType::anonymous().base(a).base(b));
        let err = ForwardCompiler::new(&graph).run(&[c]).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::FieldConflict { type_name, field } if type_name == "C" && field == "id"
        ));
    }

    #[test]
    fn field_restated_by_anonymous_base_appears_once() {
        let mut graph = TypeGraph::new();
        let tagged = graph.insert(
            TypeName::new("Tagged"),
            ObjectType::anonymous()
                .base(TypeNode::Object(
                    ObjectType::anonymous()
                        .field(FieldSpec::new("id", TypeNode::string()))
                        .field(FieldSpec::new("tag", TypeNode::string())),
                ))
                .field(FieldSpec::new("id", TypeNode::string()).describe("Primary key")),
        );
        let output = compile_root(&graph, tagged);
        let tagged = output.artifact("Tagged").unwrap();
        assert_eq!(
            tagged.validator,
            r#"z.object({ id: z.string().describe("Primary key"), tag: z.string() })"#
        );
        assert_eq!(tagged.type_decl, "{ id: string; tag: string }");
    }

    #[test]
    fn anonymous_base_disagreeing_with_own_field_is_rejected() {
        let mut graph = TypeGraph::new();
        let tagged = graph.insert(
            TypeName::new("Tagged"),
            ObjectType::anonymous()
                .base(TypeNode::Object(
                    ObjectType::anonymous().field(FieldSpec::new("id", TypeNode::integer())),
                ))
                .field(FieldSpec::new("id", TypeNode::string())),
        );
        let err = ForwardCompiler::new(&graph).run(&[tagged]).unwrap_err();
        assert!(matches!(err, BridgeError::FieldConflict { field, .. } if field == "id"));
    }

    #[test]
    fn rendered_module_declares_every_artifact() {
        let mut graph = TypeGraph::new();
        let page = graph.insert(
            TypeName::new("Page"),
            ObjectType::anonymous()
                .describe("One page of a parsed document")
                .field(FieldSpec::new("number", TypeNode::integer()).describe("1-based")),
        );
        let output = compile_root(&graph, page);
        let module = output.render();
        assert!(module.starts_with("// This file is @generated"));
        assert!(module.contains("/** One page of a parsed document */"));
        assert!(module.contains("export type Page = { number: number };"));
        assert!(module.contains(
            r#"export const PageSchema: z.ZodType<Page> = z.object({ number: z.number().int().describe("1-based") });"#
        ));
    }
}
