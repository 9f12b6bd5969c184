// crates/testgen-payload/src/mutate.rs
// ============================================================================
// Module: Mutator
// Description: Applies exactly one mutation per intent to a golden record
//              (spec.md §4.4).
// Purpose: Turn (intent, golden record) pairs into the concrete negative and
//          happy-path payloads the renderer emits test cases for.
// Dependencies: testgen-core, testgen-intent, testgen-payload::golden, indexmap, serde_json
// ============================================================================

//! ## Overview
//! [`mutate`] implements the pure `intent_id -> transformation` table of
//! spec.md §4.4 over one [`GoldenRecord`]. Every branch mutates a *clone* of
//! the golden record's relevant slot and leaves every other slot untouched,
//! which is what spec.md §8 property 4 ("mutation minimality") requires:
//! the returned [`Payload`] differs from the golden record only at or
//! beneath the intent's target path, plus the two documented sentinel-key
//! exceptions.

use indexmap::IndexMap;
use serde_json::Value;
use testgen_core::IntentId;
use testgen_core::NumericConstraints;
use testgen_core::Operation;
use testgen_core::Schema;
use testgen_core::StringFormat;
use testgen_core::TypeDecl;
use testgen_intent::FieldPath;
use testgen_intent::Intent;
use testgen_intent::Target;

use crate::golden::GoldenRecord;
use crate::golden::golden_value;
use crate::golden::placeholder_token;
use crate::payload::Payload;

/// Filler characters used to build strings of an exact target length
/// (spec.md §4.4, "a fixed filler charset").
const FILLER_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Replacement value for a field mutated to the wrong JSON type.
const SENTINEL_INVALID_TYPE: &str = "__INVALID_TYPE__";
/// Replacement value for a field mutated outside its enum's membership.
const SENTINEL_INVALID_ENUM: &str = "__INVALID_ENUM_VALUE__";
/// Replacement value for a union field matching none of its variants.
const SENTINEL_UNION_NO_MATCH: &str = "__UNION_NO_MATCH__";
/// Key added alongside a required body field to produce `UNEXPECTED_ARGUMENT`.
const SENTINEL_UNEXPECTED_KWARG: &str = "__unexpected_kwarg__";
/// Key added inside a closed object to produce `ADDITIONAL_PROPERTY_NOT_ALLOWED`.
const SENTINEL_EXTRA_PROPERTY: &str = "__extra_property__";
/// `SQL_INJECTION` payload.
const PAYLOAD_SQL_INJECTION: &str = "' OR '1'='1";
/// `XSS_INJECTION` payload.
const PAYLOAD_XSS_INJECTION: &str = "<script>alert(1)</script>";
/// `COMMAND_INJECTION` payload.
const PAYLOAD_COMMAND_INJECTION: &str = "; rm -rf /";
/// `PATH_TRAVERSAL` payload.
const PAYLOAD_PATH_TRAVERSAL: &str = "../../../../etc/passwd";
/// `HEADER_INJECTION` payload: a CRLF-smuggled second header.
const PAYLOAD_HEADER_INJECTION: &str = "value\r\nX-Injected: true";
/// `PATTERN_MISMATCH` payload: guaranteed not to satisfy any reasonable regex.
const PAYLOAD_PATTERN_MISMATCH: &str = "!!!NOT_MATCHING_PATTERN!!!";

/// Applies `intent`'s mutation to `golden`, producing the operation's
/// payload for that intent.
///
/// # Panics
///
/// Never panics: an intent whose target path cannot be resolved against
/// `op`'s schema (which should not happen for an intent this crate's own
/// `testgen-intent::generate` produced) degrades to an unmodified golden
/// record rather than panicking, matching this codebase's no-panic posture
/// for malformed-but-not-memory-unsafe input.
#[must_use]
pub fn mutate(op: &Operation, golden: &GoldenRecord, intent: &Intent, types: &[TypeDecl]) -> Payload {
    let mut body = golden.body.clone();
    let mut path_params = golden.path_params.clone();
    let mut query_params = golden.query_params.clone();
    let mut headers = golden.headers.clone();

    let target_field = match &intent.target {
        Target::WholeBody => None,
        Target::BodyField(path) => {
            apply_body_mutation(op, &mut body, path, intent.id, types);
            Some(path.display())
        }
        Target::PathParam(name) => {
            apply_param_mutation(op, &mut path_params, name, intent.id, types, ParamKind::Path);
            Some(name.clone())
        }
        Target::QueryParam(name) => {
            apply_param_mutation(op, &mut query_params, name, intent.id, types, ParamKind::Query);
            Some(name.clone())
        }
        Target::Header(name) => {
            apply_param_mutation(op, &mut headers, name, intent.id, types, ParamKind::Header);
            Some(name.clone())
        }
    };

    Payload {
        operation_id: op.id.clone(),
        intent_id: intent.id,
        target_field,
        body,
        path_params,
        query_params,
        headers,
        expected_outcome: intent.expected_outcome,
        description: intent.description.clone(),
    }
}

/// Which parameter list a [`Target`] names, so `apply_param_mutation` can
/// share one body across path/query/header intents.
#[derive(Clone, Copy)]
enum ParamKind {
    /// A URI path parameter.
    Path,
    /// A URL query parameter.
    Query,
    /// An HTTP header.
    Header,
}

/// Mutates the single parameter named `name` in `params` per `intent_id`.
fn apply_param_mutation(op: &Operation, params: &mut IndexMap<String, Value>, name: &str, intent_id: IntentId, types: &[TypeDecl], kind: ParamKind) {
    let list = match kind {
        ParamKind::Path => &op.path_params,
        ParamKind::Query => &op.query_params,
        ParamKind::Header => &op.headers,
    };
    let Some(param) = list.iter().find(|p| p.name == name) else { return };
    let schema = param.schema.resolve(types).collapse_single_variant_union();

    match intent_id {
        IntentId::HeaderMissing => {
            params.shift_remove(name);
        }
        IntentId::ResourceNotFound => {
            params.insert(name.to_string(), absent_resource_value(schema));
        }
        IntentId::FormatInvalidPathParam | IntentId::FormatInvalid => {
            params.insert(name.to_string(), format_invalid_value(schema));
        }
        IntentId::HeaderEnumMismatch | IntentId::EnumMismatch => {
            params.insert(name.to_string(), Value::String(SENTINEL_INVALID_ENUM.to_string()));
        }
        IntentId::HeaderInjection => {
            params.insert(name.to_string(), Value::String(PAYLOAD_HEADER_INJECTION.to_string()));
        }
        _ => {
            if let Some(slot) = params.get_mut(name) {
                *slot = leaf_mutation(schema, slot, intent_id, name);
            }
        }
    }
}

/// Mutates the body field at `path` per `intent_id`, or a structural
/// sibling/self edit for the intents that are not leaf-value replacements.
fn apply_body_mutation(op: &Operation, body: &mut Option<Value>, path: &FieldPath, intent_id: IntentId, types: &[TypeDecl]) {
    let Some(body_schema) = op.body.as_ref().map(|p| &p.schema) else { return };
    let Some(body_value) = body.as_mut() else { return };

    match intent_id {
        IntentId::RequiredFieldMissing | IntentId::RequiredArgMissing => {
            if let Some(parent) = navigate_to_parent_mut(body_value, path) {
                if let (Value::Object(map), Some(last)) = (parent, path.0.last()) {
                    map.remove(last);
                }
            }
        }
        IntentId::UnexpectedArgument => {
            if let Some(parent) = navigate_to_parent_mut(body_value, path) {
                if let Value::Object(map) = parent {
                    map.insert(SENTINEL_UNEXPECTED_KWARG.to_string(), Value::Bool(true));
                }
            }
        }
        IntentId::AdditionalPropertyNotAllowed => {
            if let Some(target) = navigate_mut(body_value, path) {
                if let Value::Object(map) = target {
                    map.insert(SENTINEL_EXTRA_PROPERTY.to_string(), Value::Bool(true));
                }
            }
        }
        _ => {
            let Some(schema) = schema_at_path(body_schema, path, types) else { return };
            if let Some(target) = navigate_mut(body_value, path) {
                *target = body_field_mutation(schema, target, intent_id, path);
            }
        }
    }
}

/// Applies the leaf-value transformations shared by body fields, path
/// params, query params, and headers (every table row except the
/// structural ones handled by their own callers).
fn body_field_mutation(schema: &Schema, current: &Value, intent_id: IntentId, path: &FieldPath) -> Value {
    let field_name = path.0.last().map_or_else(|| "value".to_string(), Clone::clone);
    match intent_id {
        IntentId::UnionNoMatch => Value::String(SENTINEL_UNION_NO_MATCH.to_string()),
        IntentId::ArrayNotUnique => duplicate_first_item(current),
        IntentId::ArrayItemTypeViolation => invalidate_first_item(current),
        IntentId::BoundaryMinItemsMinusOne | IntentId::ArrayTooShort => resize_array(schema, current, -1),
        IntentId::BoundaryMaxItemsPlusOne | IntentId::ArrayTooLong => resize_array(schema, current, 1),
        IntentId::ObjectValueTypeViolation => Value::String(SENTINEL_INVALID_TYPE.to_string()),
        _ => leaf_mutation(schema, current, intent_id, &field_name),
    }
}

/// Applies the primitive-leaf transformations (type/null/boundary/format/
/// pattern/enum/injection rows) common to body fields and parameters.
fn leaf_mutation(schema: &Schema, current: &Value, intent_id: IntentId, field_name: &str) -> Value {
    match intent_id {
        IntentId::TypeViolation => Value::String(SENTINEL_INVALID_TYPE.to_string()),
        IntentId::NullNotAllowed => Value::Null,
        IntentId::EnumMismatch => Value::String(SENTINEL_INVALID_ENUM.to_string()),
        IntentId::EmptyString => Value::String(String::new()),
        IntentId::WhitespaceOnly => Value::String("   ".to_string()),
        IntentId::SqlInjection => Value::String(PAYLOAD_SQL_INJECTION.to_string()),
        IntentId::XssInjection => Value::String(PAYLOAD_XSS_INJECTION.to_string()),
        IntentId::CommandInjection => Value::String(PAYLOAD_COMMAND_INJECTION.to_string()),
        IntentId::PathTraversal => Value::String(PAYLOAD_PATH_TRAVERSAL.to_string()),
        IntentId::PatternMismatch => Value::String(PAYLOAD_PATTERN_MISMATCH.to_string()),
        IntentId::FormatInvalid | IntentId::FormatInvalidPathParam => format_invalid_value(schema),
        IntentId::BoundaryMinMinusOne | IntentId::NumberTooSmall => numeric_boundary(schema, -1.0),
        IntentId::BoundaryMaxPlusOne | IntentId::NumberTooLarge => numeric_boundary(schema, 1.0),
        IntentId::BoundaryMinLengthMinusOne | IntentId::StringTooShort => string_of_length(schema, -1),
        IntentId::BoundaryMaxLengthPlusOne | IntentId::StringTooLong => string_of_length(schema, 1),
        IntentId::NotMultipleOf => not_multiple_of(schema),
        _ => current.clone(),
    }
}

/// Descends `path` inside `value`, returning the value at its end.
fn navigate_mut<'a>(value: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in &path.0 {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Descends all but the last segment of `path`, returning the object that
/// directly owns the targeted key.
fn navigate_to_parent_mut<'a>(value: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    if path.0.is_empty() {
        return None;
    }
    let mut current = value;
    for segment in &path.0[..path.0.len() - 1] {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}

/// Resolves the schema at a dotted body path, following `Ref`s and
/// single-variant unions at every level (mirrors `testgen-intent`'s
/// traversal so the two crates agree on where a property "lives").
fn schema_at_path<'a>(root: &'a Schema, path: &FieldPath, types: &'a [TypeDecl]) -> Option<&'a Schema> {
    let mut current = root.resolve(types).collapse_single_variant_union();
    for segment in &path.0 {
        let Schema::Object { properties, .. } = current else { return None };
        current = properties.get(segment)?.resolve(types).collapse_single_variant_union();
    }
    Some(current)
}

/// Computes the value one step past `schema`'s min (`direction < 0`) or max
/// (`direction > 0`) bound, honoring exclusive bounds.
fn numeric_boundary(schema: &Schema, direction: f64) -> Value {
    let Schema::Integer { constraints } | Schema::Number { constraints } = schema else {
        return Value::String(SENTINEL_INVALID_TYPE.to_string());
    };
    let is_integer = matches!(schema, Schema::Integer { .. });
    let bound = if direction < 0.0 {
        if constraints.exclusive_min { constraints.min } else { constraints.min.map(|m| m - 1.0) }
    } else if constraints.exclusive_max {
        constraints.max
    } else {
        constraints.max.map(|m| m + 1.0)
    };
    let value = bound.unwrap_or(if direction < 0.0 { -1.0 } else { 1.0 });
    numeric_json(value, is_integer)
}

/// Renders a computed numeric boundary as the JSON shape its schema expects.
fn numeric_json(value: f64, is_integer: bool) -> Value {
    if is_integer {
        #[expect(clippy::cast_possible_truncation, reason = "mutation offsets stay within i64 range for realistic schemas")]
        Value::from(value.round() as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::from(value.round() as i64), Value::Number)
    }
}

/// Computes a value that violates `schema`'s `multiple_of` constraint.
fn not_multiple_of(schema: &Schema) -> Value {
    let Schema::Integer { constraints } | Schema::Number { constraints } = schema else {
        return Value::String(SENTINEL_INVALID_TYPE.to_string());
    };
    let is_integer = matches!(schema, Schema::Integer { .. });
    let Some(multiple_of) = constraints.multiple_of else {
        return Value::from(1);
    };
    let value = if multiple_of.fract() == 0.0 {
        multiple_of / 2.0 + 3.0 // a small prime offset, per spec.md §4.4
    } else {
        multiple_of * 1.5 // shifted half a step off the grid
    };
    numeric_json(value, is_integer)
}

/// Builds a filler string one character short of `min_len` (`direction <
/// 0`) or one past `max_len` (`direction > 0`).
fn string_of_length(schema: &Schema, direction: i64) -> Value {
    let Schema::String { constraints } = schema else {
        return Value::String(SENTINEL_INVALID_TYPE.to_string());
    };
    let bound = if direction < 0 { constraints.min_len } else { constraints.max_len };
    #[expect(clippy::cast_possible_wrap, reason = "constraint bounds are small lengths, never near i64::MAX")]
    let target_len = bound.map_or(0, |b| b as i64) + direction;
    let len = usize::try_from(target_len.max(0)).unwrap_or(0);
    Value::String(filler_string(len))
}

/// Repeats [`FILLER_CHARSET`] out to exactly `len` characters.
fn filler_string(len: usize) -> String {
    (0..len).map(|i| FILLER_CHARSET[i % FILLER_CHARSET.len()] as char).collect()
}

/// Picks a concrete value that violates `schema`'s declared string format.
fn format_invalid_value(schema: &Schema) -> Value {
    let Schema::String { constraints } = schema else {
        return Value::String("not-a-valid-format".to_string());
    };
    let text = match constraints.format {
        Some(StringFormat::Email) => "not-an-email-address",
        Some(StringFormat::Uuid) => "not-a-valid-uuid",
        Some(StringFormat::Date) => "not-a-date",
        Some(StringFormat::DateTime) => "not-a-date-time",
        Some(StringFormat::Ipv4) => "999.999.999.999",
        Some(StringFormat::Ipv6) => "not-an-ipv6-address",
        Some(StringFormat::Uri) => "not a uri: :// broken",
        Some(StringFormat::Other) | None => "not-a-valid-format",
    };
    Value::String(text.to_string())
}

/// A fixed, syntactically valid but absent id, per the format the path
/// parameter declares (spec.md §4.4, `RESOURCE_NOT_FOUND`).
fn absent_resource_value(schema: &Schema) -> Value {
    match schema {
        Schema::String { constraints: testgen_core::StringConstraints { format: Some(StringFormat::Uuid), .. } } => {
            Value::String("00000000-0000-0000-0000-000000000000".to_string())
        }
        Schema::String { .. } => Value::String("nonexistent-00000000".to_string()),
        Schema::Integer { .. } => Value::from(999_999_999_i64),
        _ => Value::String("nonexistent-00000000".to_string()),
    }
}

/// Overwrites (or appends) the second element with a copy of the first,
/// violating `uniqueItems` (`ARRAY_NOT_UNIQUE`).
fn duplicate_first_item(current: &Value) -> Value {
    let Value::Array(items) = current else { return current.clone() };
    let Some(first) = items.first().cloned() else { return current.clone() };
    let mut next = items.clone();
    if next.len() < 2 {
        next.push(first);
    } else {
        next[1] = first;
    }
    Value::Array(next)
}

/// Replaces the first element with a type-invalid sentinel
/// (`ARRAY_ITEM_TYPE_VIOLATION`).
fn invalidate_first_item(current: &Value) -> Value {
    let Value::Array(items) = current else { return current.clone() };
    let mut next = items.clone();
    if let Some(first) = next.first_mut() {
        *first = Value::String(SENTINEL_INVALID_TYPE.to_string());
    }
    Value::Array(next)
}

/// Resizes the array one element short of `minItems` (`direction < 0`) or
/// one past `maxItems` (`direction > 0`), filling new slots by repeating
/// the existing first element (or a golden element when the array is
/// empty).
fn resize_array(schema: &Schema, current: &Value, direction: i64) -> Value {
    let Schema::Array { items, constraints } = schema else { return current.clone() };
    let bound = if direction < 0 { constraints.min_items } else { constraints.max_items };
    #[expect(clippy::cast_possible_wrap, reason = "array length bounds are small counts, never near i64::MAX")]
    let target_len = bound.map_or(0, |b| b as i64) + direction;
    let len = usize::try_from(target_len.max(0)).unwrap_or(0);
    let Value::Array(current_items) = current else {
        let element = golden_value(items, &[], "item");
        return Value::Array(std::iter::repeat_n(element, len).collect());
    };
    let mut next = current_items.clone();
    let filler = current_items.first().cloned().unwrap_or_else(|| Value::String(placeholder_token("item")));
    while next.len() < len {
        next.push(filler.clone());
    }
    next.truncate(len);
    Value::Array(next)
}
