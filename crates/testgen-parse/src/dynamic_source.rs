// crates/testgen-parse/src/dynamic_source.rs
// ============================================================================
// Module: Dynamic-Source Parser
// Description: Parses a syntax-tree surface of a dynamically-typed source
//              file (spec.md §4.1.2) into the shared IR.
// Purpose: Let a duck-typed language's function and model declarations feed
//          the pipeline without a dedicated compiler front end — the caller
//          is expected to have already turned source text into this JSON
//          surface using the source language's own AST.
// Dependencies: testgen-core, serde_json, indexmap
// ============================================================================

//! ## Overview
//! Two passes, exactly as spec.md §4.1.2 prescribes: `types` are registered
//! and resolved first so `functions` can reference them by name, then every
//! function's parameters are bundled into a synthetic body object schema.
//! Type-annotation mapping is exhaustive (spec.md §4.1.2's table); anything
//! outside that table degrades to [`testgen_core::Schema::Any`] with a
//! diagnostic rather than a hard parse failure, since an unrecognized
//! annotation in a dynamically-typed source is routine, not malformed input.

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde_json::Value;
use testgen_core::ArrayConstraints;
use testgen_core::EnumBaseType;
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

/// Parses a dynamic-source syntax tree into a [`Specification`] plus any
/// non-fatal annotation diagnostics.
///
/// # Errors
///
/// Returns [`ParseError`] when the document does not conform to the
/// dynamic-source JSON surface, a `ref` annotation names an undeclared
/// type, or a type alias forms a cycle.
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
            "enum" => {
                let values = decl.get("values").and_then(Value::as_array).cloned().ok_or_else(|| {
                    ParseError::new(&path, ParseErrorKind::Syntax, "enum type missing 'values'")
                })?;
                let base_type = if values.iter().all(Value::is_string) { EnumBaseType::String } else { EnumBaseType::Integer };
                arena.define(name, TypeDeclKind::Enum(Schema::Enum { values, base_type, named_type_ref: None }));
            }
            "model" => {
                let fields = decl.get("fields").and_then(Value::as_array).cloned().unwrap_or_default();
                let schema = build_object_from_fields(&fields, &path, &mut arena, &mut diagnostics, false)?;
                arena.define(name, TypeDeclKind::Object(schema));
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
        let is_async = func.get("is_async").and_then(Value::as_bool).unwrap_or(false);
        let module_hint = func.get("module_hint").and_then(Value::as_str).map(ToString::to_string);
        let params = func.get("params").and_then(Value::as_array).cloned().unwrap_or_default();
        let body_schema = build_object_from_fields(&params, &path, &mut arena, &mut diagnostics, true)?;

        let returns_value = func.get("returns").cloned().unwrap_or(Value::Null);
        let returns_schema = map_annotation(&returns_value, &format!("{path}/returns"), &arena, &mut diagnostics)?;

        operations.push(Operation {
            id: name.to_string(),
            kind: OperationKind::Function { is_async, module_hint },
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

/// Bundles a field/parameter list (`{name, annotation, has_default}`) into a
/// synthetic `Object` schema. `reject_additional` mirrors a real call site
/// rejecting unknown keyword arguments; model fields are structurally open
/// the way tagged-dict models are, matching §4.1.2's "data-class-like
/// structures, tagged-dict models".
fn build_object_from_fields(
    fields: &[Value],
    path: &str,
    arena: &mut TypeArena,
    diagnostics: &mut Vec<String>,
    reject_additional: bool,
) -> Result<Schema, ParseError> {
    let mut properties = IndexMap::new();
    let mut required = IndexSet::new();
    for (index, field) in fields.iter().enumerate() {
        let field_path = format!("{path}/{index}");
        let name = field.get("name").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&field_path, ParseErrorKind::Syntax, "field missing 'name'")
        })?;
        let annotation = field.get("annotation").cloned().unwrap_or(Value::Null);
        let schema = map_annotation(&annotation, &field_path, arena, diagnostics)?;
        let has_default = field.get("has_default").and_then(Value::as_bool).unwrap_or(false);
        if !has_default {
            required.insert(name.to_string());
        }
        properties.insert(name.to_string(), schema);
    }
    Ok(Schema::Object {
        properties,
        required,
        additional_allowed: !reject_additional,
        constraints: ObjectConstraints::default(),
    })
}

/// Maps one annotation node per spec.md §4.1.2's exhaustive table.
fn map_annotation(value: &Value, path: &str, arena: &TypeArena, diagnostics: &mut Vec<String>) -> Result<Schema, ParseError> {
    if value.is_null() {
        return Ok(Schema::Any);
    }
    let obj = value.as_object().ok_or_else(|| ParseError::new(path, ParseErrorKind::Syntax, "annotation must be an object"))?;
    let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");

    match kind {
        "str" => Ok(Schema::plain_string()),
        "int" => Ok(Schema::plain_integer()),
        "float" => Ok(Schema::Number { constraints: testgen_core::NumericConstraints::default() }),
        "bool" => Ok(Schema::Boolean),
        "none" => Ok(Schema::Null),
        "list" => {
            let items_value = obj.get("items").cloned().unwrap_or(Value::Null);
            let items = map_annotation(&items_value, &format!("{path}/items"), arena, diagnostics)?;
            Ok(Schema::Array { items: Box::new(items), constraints: ArrayConstraints::default() })
        }
        "dict" => {
            let value_value = obj.get("value").cloned().unwrap_or(Value::Null);
            let value_schema = map_annotation(&value_value, &format!("{path}/value"), arena, diagnostics)?;
            Ok(Schema::Object {
                properties: IndexMap::new(),
                required: IndexSet::new(),
                additional_allowed: true,
                constraints: ObjectConstraints { additional_properties_schema: Some(Box::new(value_schema)), ..ObjectConstraints::default() },
            })
        }
        "optional" => {
            let inner_value = obj.get("inner").cloned().unwrap_or(Value::Null);
            let inner = map_annotation(&inner_value, &format!("{path}/inner"), arena, diagnostics)?;
            Ok(with_nullable(inner))
        }
        "union" => {
            let options = obj.get("options").and_then(Value::as_array).cloned().unwrap_or_default();
            let variants = options
                .iter()
                .enumerate()
                .map(|(i, option)| map_annotation(option, &format!("{path}/options/{i}"), arena, diagnostics))
                .collect::<Result<_, _>>()?;
            Ok(Schema::Union { variants })
        }
        "literal" => {
            let values = obj.get("values").and_then(Value::as_array).cloned().unwrap_or_default();
            let base_type = if values.iter().all(Value::is_string) { EnumBaseType::String } else { EnumBaseType::Integer };
            Ok(Schema::Enum { values, base_type, named_type_ref: None })
        }
        "ref" => {
            let name = obj.get("name").and_then(Value::as_str).ok_or_else(|| {
                ParseError::new(path, ParseErrorKind::Syntax, "ref annotation missing 'name'")
            })?;
            let to = arena.handle(name, path)?;
            Ok(Schema::Ref { to })
        }
        other => {
            diagnostics.push(format!("{path}: unrecognized annotation '{other}', treated as Any"));
            Ok(Schema::Any)
        }
    }
}

/// Sets `nullable: true` on a primitive schema; non-primitive variants have
/// no such flag (spec.md §3) so `Optional[T]` wrapping one is preserved
/// structurally as-is (a nullable object/array/enum is represented by a
/// `Union` with `Null` upstream of this parser if the dialect needs it).
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

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_C: &str = r#"{
        "types": [
            {"kind": "enum", "name": "Status", "values": ["Active", "Inactive", "Pending"]}
        ],
        "functions": [
            {
                "name": "create_user",
                "is_async": false,
                "params": [
                    {"name": "name", "annotation": {"type": "str"}, "has_default": false},
                    {"name": "status", "annotation": {"type": "ref", "name": "Status"}, "has_default": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn enum_parameter_resolves_to_a_ref() {
        let (spec, diagnostics) = parse(SCENARIO_C).expect("parse");
        assert!(diagnostics.is_empty());
        let Some(body) = &spec.operations[0].body else { panic!("expected body") };
        let Schema::Object { properties, required, .. } = &body.schema else { panic!("expected object") };
        assert!(required.contains("name"));
        assert!(!required.contains("status"));
        assert!(matches!(properties.get("status"), Some(Schema::Ref { .. })));
    }

    #[test]
    fn unknown_annotation_becomes_any_with_diagnostic() {
        let doc = r#"{"functions": [{"name": "f", "params": [{"name": "x", "annotation": {"type": "frobnicator"}, "has_default": false}]}]}"#;
        let (spec, diagnostics) = parse(doc).expect("parse");
        let Some(body) = &spec.operations[0].body else { panic!("expected body") };
        let Schema::Object { properties, .. } = &body.schema else { panic!("expected object") };
        assert_eq!(properties.get("x"), Some(&Schema::Any));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn optional_wraps_primitive_as_nullable() {
        let doc = r#"{"functions": [{"name": "f", "params": [{"name": "x", "annotation": {"type": "optional", "inner": {"type": "int"}}, "has_default": true}]}]}"#;
        let (spec, _) = parse(doc).expect("parse");
        let Some(body) = &spec.operations[0].body else { panic!("expected body") };
        let Schema::Object { properties, .. } = &body.schema else { panic!("expected object") };
        assert!(properties.get("x").is_some_and(Schema::is_nullable));
    }

    #[test]
    fn unknown_ref_is_unresolved_reference_error() {
        let doc = r#"{"functions": [{"name": "f", "params": [{"name": "x", "annotation": {"type": "ref", "name": "Missing"}, "has_default": false}]}]}"#;
        let result = parse(doc);
        assert!(matches!(result, Err(ParseError { kind: ParseErrorKind::UnresolvedReference, .. })));
    }
}
