//! Schema Bridge
//!
//! Bidirectional compiler between native object-model type graphs and
//! portable JSON-Schema-like documents.
//!
//! - **Forward**: a [`TypeGraph`] compiles to paired artifacts per named
//!   type, a runtime validator expression and a static type declaration
//!   that always agree ([`ForwardCompiler`]), or to a portable document
//!   ([`PortableEmitter`]).
//! - **Backward**: a portable document is expanded ([`expand_document`])
//!   and built into native model declarations ([`build_schema`]).
//!
//! # Example
//!
//! ```
//! use schema_bridge::{build_schema, BuildOptions, FieldType};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "title": "Receipt",
//!     "type": "object",
//!     "properties": {
//!         "merchant": { "$ref": "#/$defs/Merchant", "description": "Who was paid" },
//!         "memo": { "anyOf": [{ "type": "string" }, { "type": "null" }] }
//!     },
//!     "$defs": {
//!         "Merchant": {
//!             "type": "object",
//!             "description": "A merchant",
//!             "properties": { "name": { "type": "string" } }
//!         }
//!     }
//! });
//!
//! let model = build_schema(&schema, &BuildOptions::default()).unwrap();
//! let merchant = model.field("merchant").unwrap();
//!
//! // The referencing site's description wins over the target's.
//! assert_eq!(merchant.description(), Some("Who was paid"));
//! assert!(matches!(model.field("memo").unwrap().ty, FieldType::Nullable { .. }));
//! ```
//!
//! # Failure policy
//!
//! | Error | Raised by |
//! |-------|-----------|
//! | `UnsupportedType` | unknown primitive, tuple in a native model |
//! | `UnresolvedReference` | `$ref` or named type with no target |
//! | `UnsupportedRecursion` | cycle without an object boundary |
//! | `UnsupportedUnionShape` | backward union other than `T \| null` |
//! | `UnsupportedArrayElement` | backward array of non-objects |
//! | `NameCollision` | two types that cannot be told apart |
//! | `FieldConflict` | base types disagreeing on a field |
//!
//! In a forward run, errors in explicitly requested types abort; errors in
//! transitively discovered types are logged and skipped unless
//! [`CompileOptions::strict`] is set.

mod annotations;
mod backward;
mod error;
mod expand;
mod forward;
mod linter;
mod loader;
mod naming;
mod portable;
mod queue;
mod types;
mod validator;

pub use annotations::{is_annotation_key, merge_schema, AnnotationBag, ANNOTATION_KEYS};
pub use backward::{build_schema, BackwardCompiler, BuildOptions, FieldDecl, FieldType, ModelDecl};
pub use error::{BridgeError, LoadError, SchemaError, ValidateError};
pub use expand::{collect_definitions, expand, expand_document, is_object_schema, RECURSIVE_REF_KEY};
pub use forward::{CompileOptions, CompiledExpr, ForwardCompiler, ForwardOutput, NamedArtifact};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{load_schema, load_schema_str, load_type_graph, load_type_graph_str, navigate_fragment};
pub use naming::NameRegistry;
pub use portable::{PortableEmitter, SCHEMA_DIALECT};
pub use queue::{ConversionQueue, Necessity, QueueEntry, SkippedType};
pub use types::{json_type_name, FieldSpec, ObjectType, PrimitiveKind, TypeGraph, TypeName, TypeNode};
pub use validator::{validate_against_type, validate_payload};
