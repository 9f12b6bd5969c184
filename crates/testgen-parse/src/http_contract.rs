// crates/testgen-parse/src/http_contract.rs
// ============================================================================
// Module: HTTP-Contract Parser
// Description: Parses a minimal OpenAPI-shaped JSON document into the shared
//              IR (spec.md §4.1.1).
// Purpose: Let HTTP-described APIs feed the same downstream pipeline as
//          source-derived specs.
// Dependencies: testgen-core, serde_json, indexmap
// ============================================================================

//! ## Overview
//! Accepts a structured contract document: `info`, `paths`, and
//! `components.schemas`, each shaped the way OpenAPI 3.x shapes them. Only
//! the subset of OpenAPI this pipeline's IR can express is supported;
//! anything else (cookie parameters, callbacks, links, `discriminator`) is
//! rejected with [`ParseErrorKind::UnsupportedFeature`] rather than silently
//! dropped.

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde_json::Value;
use testgen_core::ArrayConstraints;
use testgen_core::EnumBaseType;
use testgen_core::HttpMethod;
use testgen_core::NumericConstraints;
use testgen_core::ObjectConstraints;
use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::Parameter;
use testgen_core::Response;
use testgen_core::Schema;
use testgen_core::Specification;
use testgen_core::StringConstraints;
use testgen_core::StringFormat;
use testgen_core::TypeDeclKind;

use crate::error::ParseError;
use crate::error::ParseErrorKind;
use crate::type_arena::TypeArena;

const RECOGNIZED_METHODS: &[(&str, HttpMethod)] = &[
    ("get", HttpMethod::Get),
    ("post", HttpMethod::Post),
    ("put", HttpMethod::Put),
    ("patch", HttpMethod::Patch),
    ("delete", HttpMethod::Delete),
];

/// Parses an HTTP-contract document into a [`Specification`].
///
/// # Errors
///
/// Returns [`ParseError`] when the document is not valid JSON, omits a
/// required field, references an undeclared component schema, or uses a
/// construct this dialect does not support (e.g. `discriminator`, cookie
/// parameters, HTTP methods outside [`HttpMethod`]).
pub fn parse(text: &str) -> Result<Specification, ParseError> {
    let root: Value = serde_json::from_str(text)
        .map_err(|err| ParseError::new("/", ParseErrorKind::Syntax, err.to_string()))?;

    let title = root.get("info").and_then(|info| info.get("title")).and_then(Value::as_str).unwrap_or("untitled").to_string();
    let version = root.get("info").and_then(|info| info.get("version")).and_then(Value::as_str).unwrap_or("0.0.0").to_string();

    let components = root.get("components").and_then(|c| c.get("schemas")).cloned().unwrap_or(Value::Object(serde_json::Map::new()));
    let components_obj = components.as_object().ok_or_else(|| {
        ParseError::new("/components/schemas", ParseErrorKind::Syntax, "components.schemas must be an object")
    })?;

    let mut arena = TypeArena::new();
    for name in components_obj.keys() {
        arena.reserve(name);
    }
    for (name, schema_value) in components_obj {
        let path = format!("/components/schemas/{name}");
        let schema = map_schema(schema_value, &path, &components, &mut arena)?;
        let kind = if schema_value.get("enum").is_some() {
            TypeDeclKind::Enum(schema)
        } else if schema_value.get("type").and_then(Value::as_str) == Some("object") {
            TypeDeclKind::Object(schema)
        } else {
            TypeDeclKind::Alias(schema)
        };
        arena.define(name, kind);
    }

    let paths = root.get("paths").and_then(Value::as_object).ok_or_else(|| {
        ParseError::new("/paths", ParseErrorKind::Syntax, "document must declare a 'paths' object")
    })?;

    let mut operations = Vec::new();
    for (path_template, path_item) in paths {
        let path_item_obj = path_item.as_object().ok_or_else(|| {
            ParseError::new(format!("/paths/{path_template}"), ParseErrorKind::Syntax, "path item must be an object")
        })?;
        let shared_params = path_item_obj.get("parameters").and_then(Value::as_array).cloned().unwrap_or_default();

        for (method_name, method_value) in path_item_obj {
            if method_name == "parameters" {
                continue;
            }
            let pointer = format!("/paths/{path_template}/{method_name}");
            let Some(&(_, method)) = RECOGNIZED_METHODS.iter().find(|(name, _)| name == method_name) else {
                return Err(ParseError::new(pointer, ParseErrorKind::UnsupportedFeature, format!("unsupported HTTP method '{method_name}'")));
            };
            let op_obj = method_value.as_object().ok_or_else(|| {
                ParseError::new(&pointer, ParseErrorKind::Syntax, "operation must be an object")
            })?;

            let operation_id = op_obj
                .get("operationId")
                .and_then(Value::as_str)
                .map(ToString::to_string)
                .unwrap_or_else(|| synthesize_operation_id(method_name, path_template));

            let mut own_params = op_obj.get("parameters").and_then(Value::as_array).cloned().unwrap_or_default();
            let mut merged_params = shared_params.clone();
            merged_params.append(&mut own_params);

            let (path_params, query_params, headers) = collect_parameters(&merged_params, &pointer, &components, &mut arena)?;

            let body = parse_request_body(op_obj, &pointer, &components, &mut arena)?;
            let (successes, errors) = parse_responses(op_obj, &pointer, &components, &mut arena)?;

            let description = op_obj
                .get("description")
                .or_else(|| op_obj.get("summary"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            operations.push(Operation {
                id: operation_id,
                kind: OperationKind::Http { method, path: path_template.clone() },
                path_params,
                query_params,
                headers,
                body,
                successes,
                errors,
                description,
                metadata: IndexMap::new(),
            });
        }
    }

    let spec = Specification { title, version, operations, types: arena.into_decls() };
    spec.validate().map_err(|err| ParseError::new("/", ParseErrorKind::InvariantViolation, err.to_string()))?;
    Ok(spec)
}

/// Synthesizes an operation id from method and path when `operationId` is
/// absent (spec.md §4.1.1 edge case).
fn synthesize_operation_id(method: &str, path: &str) -> String {
    let mut id = format!("{}_", method.to_ascii_lowercase());
    for ch in path.chars() {
        id.push(if ch.is_ascii_alphanumeric() { ch } else { '_' });
    }
    id
}

fn collect_parameters(
    params: &[Value],
    pointer: &str,
    components: &Value,
    arena: &mut TypeArena,
) -> Result<(Vec<Parameter>, Vec<Parameter>, Vec<Parameter>), ParseError> {
    let mut path_params: IndexMap<String, Parameter> = IndexMap::new();
    let mut query_params: IndexMap<String, Parameter> = IndexMap::new();
    let mut headers: IndexMap<String, Parameter> = IndexMap::new();

    for (index, param_value) in params.iter().enumerate() {
        let param_pointer = format!("{pointer}/parameters/{index}");
        let obj = param_value.as_object().ok_or_else(|| {
            ParseError::new(&param_pointer, ParseErrorKind::Syntax, "parameter must be an object")
        })?;
        let name = obj.get("name").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&param_pointer, ParseErrorKind::Syntax, "parameter missing 'name'")
        })?;
        let location = obj.get("in").and_then(Value::as_str).ok_or_else(|| {
            ParseError::new(&param_pointer, ParseErrorKind::Syntax, "parameter missing 'in'")
        })?;
        let schema_value = obj.get("schema").cloned().unwrap_or(Value::Null);
        let schema = map_schema(&schema_value, &param_pointer, components, arena)?;
        let declared_required = obj.get("required").and_then(Value::as_bool).unwrap_or(false);

        let target = match location {
            "path" => &mut path_params,
            "query" => &mut query_params,
            "header" => &mut headers,
            other => {
                return Err(ParseError::new(&param_pointer, ParseErrorKind::UnsupportedFeature, format!("unsupported parameter location '{other}'")));
            }
        };
        let required = declared_required || location == "path";
        target.insert(name.to_string(), Parameter { name: name.to_string(), required, schema });
    }

    Ok((path_params.into_values().collect(), query_params.into_values().collect(), headers.into_values().collect()))
}

fn parse_request_body(
    op_obj: &serde_json::Map<String, Value>,
    pointer: &str,
    components: &Value,
    arena: &mut TypeArena,
) -> Result<Option<Parameter>, ParseError> {
    let Some(body_value) = op_obj.get("requestBody") else {
        return Ok(None);
    };
    let body_pointer = format!("{pointer}/requestBody");
    let body_obj = body_value.as_object().ok_or_else(|| {
        ParseError::new(&body_pointer, ParseErrorKind::Syntax, "requestBody must be an object")
    })?;
    let schema_value = body_obj
        .get("content")
        .and_then(|c| c.get("application/json"))
        .and_then(|m| m.get("schema"))
        .cloned()
        .unwrap_or(Value::Null);
    let schema = map_schema(&schema_value, &body_pointer, components, arena)?;
    let required = body_obj.get("required").and_then(Value::as_bool).unwrap_or(true);
    Ok(Some(Parameter { name: "body".to_string(), required, schema }))
}

fn parse_responses(
    op_obj: &serde_json::Map<String, Value>,
    pointer: &str,
    components: &Value,
    arena: &mut TypeArena,
) -> Result<(Vec<Response>, Vec<Response>), ParseError> {
    let mut successes = Vec::new();
    let mut errors = Vec::new();
    let Some(responses) = op_obj.get("responses").and_then(Value::as_object) else {
        return Ok((successes, errors));
    };
    for (code, response_value) in responses {
        let Ok(status) = code.parse::<u16>() else {
            continue;
        };
        let response_pointer = format!("{pointer}/responses/{code}");
        let schema_value = response_value
            .get("content")
            .and_then(|c| c.get("application/json"))
            .and_then(|m| m.get("schema"))
            .cloned();
        let schema = match schema_value {
            Some(value) => map_schema(&value, &response_pointer, components, arena)?,
            None => Schema::Any,
        };
        if status >= 400 {
            errors.push(Response { status, schema });
        } else {
            successes.push(Response { status, schema });
        }
    }
    Ok((successes, errors))
}

/// Maps a single JSON schema node to [`Schema`], resolving `$ref`, `allOf`,
/// `oneOf`/`anyOf` along the way.
fn map_schema(value: &Value, path: &str, components: &Value, arena: &mut TypeArena) -> Result<Schema, ParseError> {
    if value.is_null() {
        return Ok(Schema::Any);
    }
    let obj = value.as_object().ok_or_else(|| ParseError::new(path, ParseErrorKind::Syntax, "schema node must be an object"))?;

    if obj.contains_key("discriminator") {
        return Err(ParseError::new(path, ParseErrorKind::UnsupportedFeature, "discriminated schemas are not supported"));
    }

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        let name = reference.strip_prefix("#/components/schemas/").ok_or_else(|| {
            ParseError::new(path, ParseErrorKind::UnresolvedReference, format!("unsupported reference target '{reference}'"))
        })?;
        let to = arena.handle(name, path)?;
        return Ok(Schema::Ref { to });
    }

    if let Some(members) = obj.get("allOf").and_then(Value::as_array) {
        let mapped: Vec<Schema> = members
            .iter()
            .enumerate()
            .map(|(i, member)| map_schema(member, &format!("{path}/allOf/{i}"), components, arena))
            .collect::<Result<_, _>>()?;
        return merge_intersection(mapped, path);
    }

    if let Some(members) = obj.get("oneOf").or_else(|| obj.get("anyOf")).and_then(Value::as_array) {
        let variants: Vec<Schema> = members
            .iter()
            .enumerate()
            .map(|(i, member)| map_schema(member, &format!("{path}/oneOf/{i}"), components, arena))
            .collect::<Result<_, _>>()?;
        return Ok(Schema::Union { variants });
    }

    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        let declared_type = obj.get("type").and_then(Value::as_str);
        let base_type = match declared_type {
            Some("integer") => EnumBaseType::Integer,
            _ => {
                if values.iter().all(Value::is_string) {
                    EnumBaseType::String
                } else {
                    EnumBaseType::Integer
                }
            }
        };
        return Ok(Schema::Enum { values: values.clone(), base_type, named_type_ref: None });
    }

    let nullable = obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    let declared_type = obj.get("type").and_then(Value::as_str);

    match declared_type {
        Some("string") => Ok(Schema::String { constraints: string_constraints(obj, nullable) }),
        Some("integer") => Ok(Schema::Integer { constraints: numeric_constraints(obj, nullable) }),
        Some("number") => Ok(Schema::Number { constraints: numeric_constraints(obj, nullable) }),
        Some("boolean") => Ok(Schema::Boolean),
        Some("null") => Ok(Schema::Null),
        Some("array") => {
            let items_value = obj.get("items").cloned().unwrap_or(Value::Null);
            let items = map_schema(&items_value, &format!("{path}/items"), components, arena)?;
            Ok(Schema::Array {
                items: Box::new(items),
                constraints: ArrayConstraints {
                    min_items: obj.get("minItems").and_then(Value::as_u64).map(|v| v as usize),
                    max_items: obj.get("maxItems").and_then(Value::as_u64).map(|v| v as usize),
                    unique_items: obj.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false),
                },
            })
        }
        Some("object") => map_object_schema(obj, path, components, arena),
        _ if obj.contains_key("properties") => map_object_schema(obj, path, components, arena),
        _ => Ok(Schema::Any),
    }
}

fn map_object_schema(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    components: &Value,
    arena: &mut TypeArena,
) -> Result<Schema, ParseError> {
    let mut properties = IndexMap::new();
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (name, prop_value) in props {
            let prop_schema = map_schema(prop_value, &format!("{path}/properties/{name}"), components, arena)?;
            properties.insert(name.clone(), prop_schema);
        }
    }
    let required: IndexSet<String> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
        .unwrap_or_default();
    let (additional_allowed, additional_properties_schema) = match obj.get("additionalProperties") {
        Some(Value::Bool(flag)) => (*flag, None),
        Some(schema_value) => {
            let mapped = map_schema(schema_value, &format!("{path}/additionalProperties"), components, arena)?;
            (true, Some(Box::new(mapped)))
        }
        None => (true, None),
    };
    let mut dependent_required = IndexMap::new();
    if let Some(deps) = obj.get("dependentRequired").and_then(Value::as_object) {
        for (key, value) in deps {
            let names = value.as_array().map(|arr| arr.iter().filter_map(Value::as_str).map(ToString::to_string).collect()).unwrap_or_default();
            dependent_required.insert(key.clone(), names);
        }
    }
    Ok(Schema::Object {
        properties,
        required,
        additional_allowed,
        constraints: ObjectConstraints {
            min_props: obj.get("minProperties").and_then(Value::as_u64).map(|v| v as usize),
            max_props: obj.get("maxProperties").and_then(Value::as_u64).map(|v| v as usize),
            dependent_required,
            additional_properties_schema,
        },
    })
}

fn string_constraints(obj: &serde_json::Map<String, Value>, nullable: bool) -> StringConstraints {
    let format = obj.get("format").and_then(Value::as_str).map(|f| match f {
        "email" => StringFormat::Email,
        "uuid" => StringFormat::Uuid,
        "date" => StringFormat::Date,
        "date-time" => StringFormat::DateTime,
        "ipv4" => StringFormat::Ipv4,
        "ipv6" => StringFormat::Ipv6,
        "uri" => StringFormat::Uri,
        _ => StringFormat::Other,
    });
    StringConstraints {
        min_len: obj.get("minLength").and_then(Value::as_u64).map(|v| v as usize),
        max_len: obj.get("maxLength").and_then(Value::as_u64).map(|v| v as usize),
        pattern: obj.get("pattern").and_then(Value::as_str).map(ToString::to_string),
        format,
        nullable,
    }
}

fn numeric_constraints(obj: &serde_json::Map<String, Value>, nullable: bool) -> NumericConstraints {
    let minimum = obj.get("minimum").and_then(Value::as_f64);
    let maximum = obj.get("maximum").and_then(Value::as_f64);

    let (min, exclusive_min) = match obj.get("exclusiveMinimum") {
        Some(Value::Bool(true)) => (minimum, true),
        Some(Value::Bool(false)) | None => (minimum, false),
        Some(other) => (other.as_f64().or(minimum), true),
    };
    let (max, exclusive_max) = match obj.get("exclusiveMaximum") {
        Some(Value::Bool(true)) => (maximum, true),
        Some(Value::Bool(false)) | None => (maximum, false),
        Some(other) => (other.as_f64().or(maximum), true),
    };

    NumericConstraints { min, max, exclusive_min, exclusive_max, multiple_of: obj.get("multipleOf").and_then(Value::as_f64), nullable }
}

/// Merges `allOf` members into a single `Object` (spec.md §4.1.1): required
/// sets union, properties right-biased merge, numeric-ish bounds tightened
/// so the stricter side wins.
fn merge_intersection(schemas: Vec<Schema>, path: &str) -> Result<Schema, ParseError> {
    let mut properties = IndexMap::new();
    let mut required = IndexSet::new();
    let mut additional_allowed = true;
    let mut min_props: Option<usize> = None;
    let mut max_props: Option<usize> = None;
    let mut dependent_required = IndexMap::new();
    let mut additional_properties_schema = None;

    for schema in schemas {
        match schema {
            Schema::Object { properties: props, required: req, additional_allowed: allowed, constraints } => {
                for (key, value) in props {
                    properties.insert(key, value);
                }
                required.extend(req);
                additional_allowed = additional_allowed && allowed;
                min_props = tighten_min(min_props, constraints.min_props);
                max_props = tighten_max(max_props, constraints.max_props);
                for (key, value) in constraints.dependent_required {
                    dependent_required.insert(key, value);
                }
                additional_properties_schema = additional_properties_schema.or(constraints.additional_properties_schema);
            }
            other => {
                return Err(ParseError::new(path, ParseErrorKind::UnsupportedFeature, format!("allOf member is not an object schema: {other:?}")));
            }
        }
    }

    Ok(Schema::Object {
        properties,
        required,
        additional_allowed,
        constraints: ObjectConstraints { min_props, max_props, dependent_required, additional_properties_schema },
    })
}

fn tighten_min(current: Option<usize>, incoming: Option<usize>) -> Option<usize> {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn tighten_max(current: Option<usize>, incoming: Option<usize>) -> Option<usize> {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_DOC: &str = r#"{
        "info": {"title": "Users", "version": "1.0"},
        "paths": {
            "/users": {
                "post": {
                    "operationId": "create_user",
                    "requestBody": {"content": {"application/json": {"schema": {
                        "type": "object",
                        "properties": {
                            "email": {"type": "string", "format": "email", "maxLength": 255},
                            "age": {"type": "integer", "minimum": 0, "maximum": 150}
                        },
                        "required": ["email", "age"]
                    }}}},
                    "responses": {
                        "201": {"content": {"application/json": {"schema": {"type": "object", "properties": {}}}}},
                        "400": {}
                    }
                }
            }
        }
    }"#;

    #[test]
    fn parses_scenario_a_shaped_operation() {
        let spec = parse(MINIMAL_DOC).expect("parse");
        assert_eq!(spec.operations.len(), 1);
        let op = &spec.operations[0];
        assert_eq!(op.id, "create_user");
        let Some(body) = &op.body else { panic!("expected body") };
        let Schema::Object { required, .. } = &body.schema else { panic!("expected object schema") };
        assert!(required.contains("email"));
        assert!(required.contains("age"));
        assert_eq!(op.successes.len(), 1);
        assert_eq!(op.errors.len(), 1);
    }

    #[test]
    fn missing_operation_id_is_synthesized() {
        let doc = r#"{"paths": {"/users/{id}": {"get": {"responses": {"200": {}}}}}}"#;
        let spec = parse(doc).expect("parse");
        assert_eq!(spec.operations[0].id, "get__users__id_");
    }

    #[test]
    fn response_without_schema_is_any() {
        let spec = parse(MINIMAL_DOC).expect("parse");
        let error_response = &spec.operations[0].errors[0];
        assert_eq!(error_response.schema, Schema::Any);
    }

    #[test]
    fn array_without_items_defaults_to_any() {
        let doc = r#"{"paths": {"/x": {"get": {"responses": {"200": {"content": {"application/json": {"schema": {"type": "array"}}}}}}}}}"#;
        let spec = parse(doc).expect("parse");
        let Schema::Array { items, .. } = &spec.operations[0].successes[0].schema else { panic!("expected array") };
        assert_eq!(**items, Schema::Any);
    }

    #[test]
    fn legacy_boolean_exclusive_minimum_is_normalized() {
        let doc = r#"{"paths": {"/x": {"get": {"parameters": [{"name": "n", "in": "query", "schema": {
            "type": "integer", "minimum": 5, "exclusiveMinimum": true
        }}], "responses": {"200": {}}}}}}"#;
        let spec = parse(doc).expect("parse");
        let Schema::Integer { constraints } = &spec.operations[0].query_params[0].schema else { panic!("expected integer") };
        assert!(constraints.exclusive_min);
        assert_eq!(constraints.min, Some(5.0));
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let doc = r#"{"paths": {"/x": {"trace": {"responses": {"200": {}}}}}}"#;
        let result = parse(doc);
        assert!(matches!(result, Err(ParseError { kind: ParseErrorKind::UnsupportedFeature, .. })));
    }

    #[test]
    fn unresolved_component_reference_is_rejected() {
        let doc = r#"{"paths": {"/x": {"get": {"responses": {"200": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Missing"}}}}}}}}}"#;
        let result = parse(doc);
        assert!(matches!(result, Err(ParseError { kind: ParseErrorKind::UnresolvedReference, .. })));
    }
}
