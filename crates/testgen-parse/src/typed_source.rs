// crates/testgen-parse/src/typed_source.rs
// ============================================================================
// Module: Typed-Source Parser
// Description: Parses a syntax-tree surface of a statically-typed source
//              file (spec.md §4.1.3) into the shared IR.
// Purpose: Let a statically-typed language's interfaces and functions feed
//          the pipeline via a JSON AST surface, the same way the
//          dynamic-source parser consumes a duck-typed language's AST.
// Dependencies: testgen-core, serde_json, indexmap
// ============================================================================

//! ## Overview
//! Two passes: `types` first (interfaces and named string-literal unions),
//! then `functions`. A `Promise<T>`-shaped return type is unwrapped and
//! marks the operation `is_async`. Generic type applications resolve to
//! their caller-supplied structural expansion when one is present
//! (`"resolved"`); absent that, the declared bound is used directly — this
//! parser does not implement a generic-substitution engine, matching
//! spec.md §4.1.3's "otherwise the bound becomes the schema".

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde_json::Value;
use testgen_core::ArrayConstraints;
use testgen_core::EnumBaseType;
use testgen_core::NumericConstraints;
use testgen_core::ObjectConstraints;
use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::Parameter;
use testgen_core::Response;
use testgen_core::Schema;
use testgen_core::Specification;
use testgen_core::TypeDeclKind;

use crate::error::ParseError;
use crate::error::ParseErrorKind;
use crate::type_arena::TypeArena;

/// Parses a typed-source syntax tree into a [`Specification`] plus any
/// non-fatal diagnostics (unresolved generics falling back to their bound).
///
/// # Errors
///
/// Returns [`ParseError`] when the document does not conform to the
/// typed-source JSON surface or a `ref` type names an undeclared type.
pub fn parse(text: &str) -> Result<(Specification, Vec<String>), ParseError> {
    let root: Value = serde_json::from_str(text).map_err(|err| ParseError::new("/", ParseErrorKind::Syntax, err.to_string()))?;
    let mut diagnostics = Vec::new();

    let type_decls = root.get("types").and_then(Value::as_array).cloned().unwrap_or_default();
    let mut arena = TypeArena::new();
    for (index, decl) in type_decls.iter().enumerate() {
        let name = decl.get("name").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(format!("/types/{index}"), ParseErrorKind::Syntax, "type declaration missing 'name'")
        })?;
        arena.reserve(name);
    }
    for (index, decl) in type_decls.iter().enumerate() {
        let path = format!("/types/{index}");
        let name = decl.get("name").and_then(Value::as_str).unwrap_or_default();
        let kind = decl.get("kind").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&path, ParseErrorKind::Syntax, "type declaration missing 'kind'")
        })?;
        match kind {
            "interface" => {
                let props = decl.get("properties").and_then(Value::as_array).cloned().unwrap_or_default();
                let schema = build_object_from_properties(&props, &path, &mut arena, &mut diagnostics)?;
                arena.define(name, TypeDeclKind::Object(schema));
            }
            "literal_union" => {
                let values = decl.get("values").and_then(Value::as_array).cloned().ok_or_else(|| {
                    ParseError::new(&path, ParseErrorKind::Syntax, "literal_union missing 'values'")
                })?;
                let base_type = if values.iter().all(Value::is_string) { EnumBaseType::String } else { EnumBaseType::Integer };
                arena.define(name, TypeDeclKind::Enum(Schema::Enum { values, base_type, named_type_ref: None }));
            }
            other => {
                return Err(ParseError::new(&path, ParseErrorKind::UnsupportedFeature, format!("unsupported type declaration kind '{other}'")));
            }
        }
    }

    let function_decls = root.get("functions").and_then(Value::as_array).cloned().unwrap_or_default();
    let mut operations = Vec::with_capacity(function_decls.len());
    for (index, func) in function_decls.iter().enumerate() {
        let path = format!("/functions/{index}");
        let name = func.get("name").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&path, ParseErrorKind::Syntax, "function declaration missing 'name'")
        })?;
        let declared_async = func.get("is_async").and_then(Value::as_bool).unwrap_or(false);
        let module_hint = func.get("module_hint").and_then(Value::as_str).map(ToString::to_string);

        let params = func.get("params").and_then(Value::as_array).cloned().unwrap_or_default();
        let body_schema = build_object_from_params(&params, &path, &mut arena, &mut diagnostics)?;

        let returns_value = func.get("returns").cloned().unwrap_or(Value::Null);
        let (returns_schema, unwrapped_promise) = map_return_type(&returns_value, &format!("{path}/returns"), &arena, &mut diagnostics)?;

        operations.push(Operation {
            id: name.to_string(),
            kind: OperationKind::Function { is_async: declared_async || unwrapped_promise, module_hint },
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: Some(Parameter { name: "body".to_string(), required: true, schema: body_schema }),
            successes: vec![Response { status: 200, schema: returns_schema }],
            errors: Vec::new(),
            description: func.get("description").and_then(Value::as_str).unwrap_or_default().to_string(),
            metadata: IndexMap::new(),
        });
    }

    let spec = Specification { title: root.get("module").and_then(Value::as_str).unwrap_or("module").to_string(), version: "0.0.0".to_string(), operations, types: arena.into_decls() };
    spec.validate().map_err(|err| ParseError::new("/", ParseErrorKind::InvariantViolation, err.to_string()))?;
    Ok((spec, diagnostics))
}

fn build_object_from_properties(
    props: &[Value],
    path: &str,
    arena: &mut TypeArena,
    diagnostics: &mut Vec<String>,
) -> Result<Schema, ParseError> {
    let mut properties = IndexMap::new();
    let mut required = IndexSet::new();
    for (index, prop) in props.iter().enumerate() {
        let prop_path = format!("{path}/properties/{index}");
        let name = prop.get("name").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&prop_path, ParseErrorKind::Syntax, "property missing 'name'")
        })?;
        let type_value = prop.get("type").cloned().unwrap_or(Value::Null);
        let mapped = map_type(&type_value, &prop_path, arena, diagnostics)?;
        let optional = prop.get("optional").and_then(Value::as_bool).unwrap_or(false);
        let schema = if optional { with_nullable(mapped) } else { mapped };
        if !optional {
            required.insert(name.to_string());
        }
        properties.insert(name.to_string(), schema);
    }
    Ok(Schema::Object { properties, required, additional_allowed: false, constraints: ObjectConstraints::default() })
}

fn build_object_from_params(
    params: &[Value],
    path: &str,
    arena: &mut TypeArena,
    diagnostics: &mut Vec<String>,
) -> Result<Schema, ParseError> {
    let mut properties = IndexMap::new();
    let mut required = IndexSet::new();
    for (index, param) in params.iter().enumerate() {
        let param_path = format!("{path}/params/{index}");
        let name = param.get("name").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&param_path, ParseErrorKind::Syntax, "parameter missing 'name'")
        })?;
        let type_value = param.get("type").cloned().unwrap_or(Value::Null);
        let mapped = map_type(&type_value, &param_path, arena, diagnostics)?;
        let optional = param.get("optional").and_then(Value::as_bool).unwrap_or(false);
        let schema = if optional { with_nullable(mapped) } else { mapped };
        if !optional {
            required.insert(name.to_string());
        }
        properties.insert(name.to_string(), schema);
    }
    Ok(Schema::Object { properties, required, additional_allowed: false, constraints: ObjectConstraints::default() })
}

/// Maps a return-type node, unwrapping a `Promise<T>`-shaped wrapper and
/// reporting whether one was present.
fn map_return_type(value: &Value, path: &str, arena: &TypeArena, diagnostics: &mut Vec<String>) -> Result<(Schema, bool), ParseError> {
    if value.is_null() {
        return Ok((Schema::Any, false));
    }
    let obj = value.as_object().ok_or_else(|| ParseError::new(path, ParseErrorKind::Syntax, "type node must be an object"))?;
    if obj.get("kind").and_then(Value::as_str) == Some("promise") {
        let inner_value = obj.get("inner").cloned().unwrap_or(Value::Null);
        let inner = map_type(&inner_value, &format!("{path}/inner"), arena, diagnostics)?;
        return Ok((inner, true));
    }
    Ok((map_type(value, path, arena, diagnostics)?, false))
}

/// Maps one type node per spec.md §4.1.3.
fn map_type(value: &Value, path: &str, arena: &TypeArena, diagnostics: &mut Vec<String>) -> Result<Schema, ParseError> {
    if value.is_null() {
        return Ok(Schema::Any);
    }
    let obj = value.as_object().ok_or_else(|| ParseError::new(path, ParseErrorKind::Syntax, "type node must be an object"))?;
    let kind = obj.get("kind").and_then(Value::as_str).unwrap_or("");

    match kind {
        "string" => Ok(Schema::plain_string()),
        "number" => Ok(Schema::Number { constraints: NumericConstraints::default() }),
        "boolean" => Ok(Schema::Boolean),
        "null" => Ok(Schema::Null),
        "any" => Ok(Schema::Any),
        "array" => {
            let items_value = obj.get("items").cloned().unwrap_or(Value::Null);
            let items = map_type(&items_value, &format!("{path}/items"), arena, diagnostics)?;
            Ok(Schema::Array { items: Box::new(items), constraints: ArrayConstraints::default() })
        }
        "union" => {
            let options = obj.get("options").and_then(Value::as_array).cloned().unwrap_or_default();
            let variants = options
                .iter()
                .enumerate()
                .map(|(i, option)| map_type(option, &format!("{path}/options/{i}"), arena, diagnostics))
                .collect::<Result<_, _>>()?;
            Ok(Schema::Union { variants })
        }
        "literal_union" => {
            let values = obj.get("values").and_then(Value::as_array).cloned().unwrap_or_default();
            let base_type = if values.iter().all(Value::is_string) { EnumBaseType::String } else { EnumBaseType::Integer };
            Ok(Schema::Enum { values, base_type, named_type_ref: None })
        }
        "promise" => {
            let inner_value = obj.get("inner").cloned().unwrap_or(Value::Null);
            map_type(&inner_value, &format!("{path}/inner"), arena, diagnostics)
        }
        "ref" => {
            let name = obj.get("name").and_then(Value::as_str).ok_or_else(|| {
                ParseError::new(path, ParseErrorKind::Syntax, "ref type missing 'name'")
            })?;
            let to = arena.handle(name, path)?;
            Ok(Schema::Ref { to })
        }
        "generic" => {
            if let Some(resolved) = obj.get("resolved") {
                return map_type(resolved, &format!("{path}/resolved"), arena, diagnostics);
            }
            let bound = obj.get("bound").cloned().unwrap_or(Value::Null);
            diagnostics.push(format!("{path}: generic application has no structural resolution, using declared bound"));
            map_type(&bound, &format!("{path}/bound"), arena, diagnostics)
        }
        other => {
            diagnostics.push(format!("{path}: unrecognized type '{other}', treated as Any"));
            Ok(Schema::Any)
        }
    }
}

/// Sets `nullable: true` on a primitive schema for an optional (`?`)
/// property; non-primitive variants fall back to a `Union` with `Null`.
fn with_nullable(schema: Schema) -> Schema {
    match schema {
        Schema::String { mut constraints } => {
            constraints.nullable = true;
            Schema::String { constraints }
        }
        Schema::Integer { mut constraints } => {
            constraints.nullable = true;
            Schema::Integer { constraints }
        }
        Schema::Number { mut constraints } => {
            constraints.nullable = true;
            Schema::Number { constraints }
        }
        other => Schema::Union { variants: vec![other, Schema::Null] },
    }
}
