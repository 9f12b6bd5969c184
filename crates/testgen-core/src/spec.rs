// crates/testgen-core/src/spec.rs
// ============================================================================
// Module: Specification IR
// Description: Specification, Operation, Parameter, and TypeDecl — the
//              dialect-neutral shapes every parser emits.
// Purpose: Hold the parsed, invariant-checked representation of the input
//          API or source file.
// Dependencies: crate::schema, crate::error, serde
// ============================================================================

//! ## Overview
//! A [`Specification`] is immutable once a parser returns it (spec.md §3,
//! "Lifecycle"). Declaration order in `operations` and `types` is
//! significant: it is the order every downstream artifact reproduces.

use serde::Deserialize;
use serde::Serialize;

use crate::error::InvariantError;
use crate::schema::Schema;

/// The top-level parsed specification.
///
/// # Invariants
/// - `operations` preserves source declaration order (spec.md §3).
/// - Every operation id is unique within the specification
///   ([`Specification::validate`] enforces this).
/// - Every [`Schema::Ref`] in `operations`/`types` resolves to an index
///   within `types` ([`Specification::validate`] enforces this).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Human-readable title of the source specification.
    pub title: String,
    /// Source version string, carried through unmodified.
    pub version: String,
    /// Operations in source declaration order.
    pub operations: Vec<Operation>,
    /// Named type declarations, in source declaration order; referenced by
    /// [`Schema::Ref`] indices.
    pub types: Vec<TypeDecl>,
}

impl Specification {
    /// Validates the specification's structural invariants (spec.md §3).
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut seen = std::collections::HashSet::new();
        for op in &self.operations {
            if !seen.insert(op.id.as_str()) {
                return Err(InvariantError::DuplicateOperationId(op.id.clone()));
            }
            for param in op.path_params.iter().chain(&op.query_params).chain(&op.headers) {
                validate_schema_refs(&param.schema, self.types.len())?;
            }
            if let Some(body) = &op.body {
                validate_schema_refs(&body.schema, self.types.len())?;
            }
            for response in op.successes.iter().chain(&op.errors) {
                validate_schema_refs(&response.schema, self.types.len())?;
            }
        }
        for decl in &self.types {
            validate_type_decl(decl)?;
        }
        validate_dedup_by_location(&self.operations)?;
        Ok(())
    }
}

/// Recursively checks that every [`Schema::Ref`] index is in bounds.
fn validate_schema_refs(schema: &Schema, type_count: usize) -> Result<(), InvariantError> {
    match schema {
        Schema::Ref { to } => {
            if *to >= type_count {
                return Err(InvariantError::UnresolvedReference(*to));
            }
            Ok(())
        }
        Schema::Array { items, .. } => validate_schema_refs(items, type_count),
        Schema::Object { properties, .. } => {
            for nested in properties.values() {
                validate_schema_refs(nested, type_count)?;
            }
            Ok(())
        }
        Schema::Union { variants } => {
            for variant in variants {
                validate_schema_refs(variant, type_count)?;
            }
            Ok(())
        }
        Schema::String { .. } | Schema::Integer { .. } | Schema::Number { .. } | Schema::Boolean | Schema::Null | Schema::Enum { .. } | Schema::Any => Ok(()),
    }
}

/// Validates that an `Object` or `Enum` type declaration satisfies its
/// internal invariants (spec.md §3 invariants 3 and 4).
fn validate_type_decl(decl: &TypeDecl) -> Result<(), InvariantError> {
    match &decl.kind {
        TypeDeclKind::Object(Schema::Object { properties, required, .. }) => {
            for key in required {
                if !properties.contains_key(key) {
                    return Err(InvariantError::RequiredNotInProperties { type_name: decl.name.clone(), field: key.clone() });
                }
            }
            Ok(())
        }
        TypeDeclKind::Enum(Schema::Enum { values, base_type, .. }) => {
            for value in values {
                let acceptable = match base_type {
                    crate::schema::EnumBaseType::String => value.is_string(),
                    crate::schema::EnumBaseType::Integer => value.is_i64() || value.is_u64(),
                };
                if !acceptable {
                    return Err(InvariantError::EnumValueTypeMismatch { type_name: decl.name.clone() });
                }
            }
            Ok(())
        }
        TypeDeclKind::Object(_) | TypeDeclKind::Enum(_) | TypeDeclKind::Alias(_) => Ok(()),
    }
}

/// Validates that parameter lists are deduplicated by `(location, name)`
/// (spec.md §3 invariant 5).
fn validate_dedup_by_location(operations: &[Operation]) -> Result<(), InvariantError> {
    for op in operations {
        let mut seen = std::collections::HashSet::new();
        for (location, params) in [
            (ParamLocation::Path, &op.path_params),
            (ParamLocation::Query, &op.query_params),
            (ParamLocation::Header, &op.headers),
        ] {
            for param in params {
                if !seen.insert((location, param.name.as_str())) {
                    return Err(InvariantError::DuplicateParameter { operation_id: op.id.clone(), name: param.name.clone() });
                }
            }
        }
    }
    Ok(())
}

/// A named type declaration referenced by [`Schema::Ref`] indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Declared name (used for renderer imports, e.g. `import Status`).
    pub name: String,
    /// The declaration's shape.
    pub kind: TypeDeclKind,
}

/// The shape a [`TypeDecl`] takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form")]
pub enum TypeDeclKind {
    /// An enum-like declaration; always wraps a [`Schema::Enum`].
    Enum(Schema),
    /// An object-model declaration; always wraps a [`Schema::Object`].
    Object(Schema),
    /// A type alias; wraps whatever schema the alias resolves to.
    Alias(Schema),
}

impl TypeDeclKind {
    /// Returns the schema this declaration wraps, regardless of form.
    #[must_use]
    pub fn inner(&self) -> &Schema {
        match self {
            Self::Enum(schema) | Self::Object(schema) | Self::Alias(schema) => schema,
        }
    }
}

/// A single callable operation: an HTTP endpoint or a function.
///
/// # Invariants
/// - `id` is unique within the owning [`Specification`].
/// - `path_params`, `query_params`, and `headers` are each deduplicated by
///   `(location, name)` (spec.md §3 invariant 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Stable identifier, unique within the specification.
    pub id: String,
    /// HTTP or function classification.
    pub kind: OperationKind,
    /// Path parameters, in declaration order.
    pub path_params: Vec<Parameter>,
    /// Query parameters, in declaration order.
    pub query_params: Vec<Parameter>,
    /// Header parameters, in declaration order.
    pub headers: Vec<Parameter>,
    /// The request/argument body, if any. For functions this wraps a single
    /// synthetic object schema bundling every parameter (spec.md §4.1.2).
    pub body: Option<Parameter>,
    /// Declared success responses (2xx for HTTP; the single return schema
    /// for functions).
    pub successes: Vec<Response>,
    /// Declared error responses (non-2xx for HTTP; empty for functions).
    pub errors: Vec<Response>,
    /// Free-text description.
    pub description: String,
    /// Opaque metadata carried through from the source dialect.
    pub metadata: indexmap::IndexMap<String, serde_json::Value>,
}

/// HTTP- or function-specific operation classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OperationKind {
    /// An HTTP endpoint.
    Http {
        /// HTTP method.
        method: HttpMethod,
        /// URI template with `{name}` placeholders.
        path: String,
    },
    /// A directly callable function.
    Function {
        /// Whether the function is declared `async`.
        is_async: bool,
        /// Best-effort module/namespace hint for import generation.
        module_hint: Option<String>,
    },
}

/// HTTP methods the HTTP-contract dialect recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Whether a request of this method carries a body (spec.md §4.8,
    /// "only `POST|PUT|PATCH` requests attach a body").
    #[must_use]
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

/// Where a [`Parameter`] is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    /// Bound to a `{name}` placeholder in the URI template.
    Path,
    /// Bound to a URL query string entry.
    Query,
    /// Bound to an HTTP header.
    Header,
}

/// A named, typed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Whether the parameter must be supplied.
    pub required: bool,
    /// The parameter's schema.
    pub schema: Schema,
}

/// A declared response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code (100–599). Functions use a single synthetic
    /// `200` success entry and never populate `errors`.
    pub status: u16,
    /// Response body schema. [`Schema::Any`] when the source declares no
    /// schema for this response (spec.md §4.1.1 edge case).
    pub schema: Schema,
}
