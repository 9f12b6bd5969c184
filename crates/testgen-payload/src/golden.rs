// crates/testgen-payload/src/golden.rs
// ============================================================================
// Module: Golden-Record Builder
// Description: Builds the canonical valid payload for an operation
//              (spec.md §4.3).
// Purpose: Give the mutator one deterministic, schema-satisfying base value
//          to apply exactly one mutation to per intent.
// Dependencies: testgen-core, indexmap, serde_json
// ============================================================================

//! ## Overview
//! [`build`] constructs a [`GoldenRecord`] for one [`Operation`]: a body
//! value (when the operation declares one), plus golden values for every
//! path, query, and header parameter. Every leaf is the smallest/simplest
//! value satisfying its schema's constraints (spec.md §4.3); string leaves
//! are emitted as `__PLACEHOLDER_STRING_<field-name>__` sentinels rather
//! than a real string, since the LLM enhancer (spec.md §4.9) or a negative
//! mutation is responsible for filling in a concrete value later.
//!
//! Construction is a pure function of `(schema, types)`: identical inputs
//! produce byte-identical output (spec.md §4.3, "The builder is
//! deterministic").

use indexmap::IndexMap;
use serde_json::Value;
use testgen_core::EnumBaseType;
use testgen_core::Operation;
use testgen_core::Schema;
use testgen_core::TypeDecl;

/// The canonical valid request/argument envelope for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldenRecord {
    /// The operation's body value, or `None` when it declares no body.
    pub body: Option<Value>,
    /// Golden values for path parameters, insertion-ordered.
    pub path_params: IndexMap<String, Value>,
    /// Golden values for query parameters, insertion-ordered.
    pub query_params: IndexMap<String, Value>,
    /// Golden values for headers, insertion-ordered.
    pub headers: IndexMap<String, Value>,
}

/// Builds the golden record for `op` against the owning specification's
/// `types` arena (needed to resolve `Schema::Ref`).
#[must_use]
pub fn build(op: &Operation, types: &[TypeDecl]) -> GoldenRecord {
    GoldenRecord {
        body: op.body.as_ref().map(|param| golden_value(&param.schema, types, &param.name)),
        path_params: op.path_params.iter().map(|p| (p.name.clone(), golden_value(&p.schema, types, &p.name))).collect(),
        query_params: op.query_params.iter().map(|p| (p.name.clone(), golden_value(&p.schema, types, &p.name))).collect(),
        headers: op.headers.iter().map(|p| (p.name.clone(), golden_value(&p.schema, types, &p.name))).collect(),
    }
}

/// Builds a golden value for one schema (spec.md §4.3). `field_name` names
/// the slot this value fills, used only for the string placeholder token.
#[must_use]
pub fn golden_value(schema: &Schema, types: &[TypeDecl], field_name: &str) -> Value {
    match schema.resolve(types).collapse_single_variant_union() {
        Schema::String { .. } => Value::String(placeholder_token(field_name)),
        Schema::Integer { constraints } => Value::from(golden_integer(constraints)),
        Schema::Number { constraints } => {
            serde_json::Number::from_f64(golden_number(constraints)).map_or(Value::from(1), Value::Number)
        }
        Schema::Boolean => Value::Bool(true),
        Schema::Null | Schema::Any => Value::Null,
        Schema::Array { items, constraints } => {
            let len = constraints.min_items.unwrap_or(1).max(1);
            let element = golden_value(items, types, field_name);
            Value::Array(std::iter::repeat_n(element, len).collect())
        }
        Schema::Object { properties, required, constraints, .. } => {
            Value::Object(golden_object(properties, required, constraints, types))
        }
        Schema::Enum { values, .. } => values.first().cloned().unwrap_or(Value::Null),
        Schema::Union { variants } => variants.first().map_or(Value::Null, |variant| golden_value(variant, types, field_name)),
        Schema::Ref { .. } => Value::Null, // unreachable: resolve() above already followed refs.
    }
}

/// Returns `__PLACEHOLDER_STRING_<field-name>__` (spec.md §4.3).
#[must_use]
pub fn placeholder_token(field_name: &str) -> String {
    format!("__PLACEHOLDER_STRING_{field_name}__")
}

fn golden_integer(constraints: &testgen_core::NumericConstraints) -> i64 {
    let base = constraints.min.map_or(1.0, |min| if constraints.exclusive_min { min + 1.0 } else { min });
    let mut value = base;
    if let Some(max) = constraints.max {
        let ceiling = if constraints.exclusive_max { max - 1.0 } else { max };
        if value > ceiling {
            value = ceiling;
        }
    }
    if let Some(multiple_of) = constraints.multiple_of {
        if multiple_of > 0.0 {
            value = (value / multiple_of).ceil() * multiple_of;
        }
    }
    #[expect(clippy::cast_possible_truncation, reason = "golden values are small, caller-bounded magnitudes")]
    {
        value.round() as i64
    }
}

fn golden_number(constraints: &testgen_core::NumericConstraints) -> f64 {
    let base = constraints.min.map_or(1.0, |min| if constraints.exclusive_min { min + 1.0 } else { min });
    let mut value = base;
    if let Some(max) = constraints.max {
        let ceiling = if constraints.exclusive_max { max - 1.0 } else { max };
        if value > ceiling {
            value = ceiling;
        }
    }
    value
}

/// Builds an object's golden properties: every required property, plus any
/// optional property a dependent-required rule pulls in (spec.md §4.3).
fn golden_object(
    properties: &IndexMap<String, Schema>,
    required: &indexmap::IndexSet<String>,
    constraints: &testgen_core::ObjectConstraints,
    types: &[TypeDecl],
) -> serde_json::Map<String, Value> {
    let mut included: indexmap::IndexSet<String> = required.iter().cloned().collect();
    loop {
        let mut grew = false;
        for key in included.clone() {
            if let Some(deps) = constraints.dependent_required.get(&key) {
                for dep in deps {
                    if properties.contains_key(dep) && included.insert(dep.clone()) {
                        grew = true;
                    }
                }
            }
        }
        if !grew {
            break;
        }
    }
    let mut map = serde_json::Map::new();
    for (name, prop_schema) in properties {
        if included.contains(name) {
            map.insert(name.clone(), golden_value(prop_schema, types, name));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;
    use testgen_core::ArrayConstraints;
    use testgen_core::NumericConstraints;
    use testgen_core::ObjectConstraints;
    use testgen_core::StringFormat;

    use super::*;

    fn scenario_a_body() -> Schema {
        let mut properties = IndexMap::new();
        properties.insert(
            "email".to_string(),
            Schema::String { constraints: testgen_core::StringConstraints { max_len: Some(255), format: Some(StringFormat::Email), ..Default::default() } },
        );
        properties.insert("age".to_string(), Schema::Integer { constraints: NumericConstraints { min: Some(0.0), max: Some(150.0), ..Default::default() } });
        let mut required = IndexSet::new();
        required.insert("email".to_string());
        required.insert("age".to_string());
        Schema::Object { properties, required, additional_allowed: true, constraints: ObjectConstraints::default() }
    }

    #[test]
    fn scenario_a_golden_record_matches_worked_transcript() {
        let value = golden_value(&scenario_a_body(), &[], "body");
        assert_eq!(value, serde_json::json!({"email": "__PLACEHOLDER_STRING_email__", "age": 0}));
    }

    #[test]
    fn array_repeats_element_to_min_items() {
        let schema = Schema::Array { items: Box::new(Schema::plain_integer()), constraints: ArrayConstraints { min_items: Some(3), ..Default::default() } };
        let value = golden_value(&schema, &[], "tags");
        assert_eq!(value, serde_json::json!([1, 1, 1]));
    }

    #[test]
    fn dependent_required_pulls_in_optional_property() {
        let mut properties = IndexMap::new();
        properties.insert("a".to_string(), Schema::plain_string());
        properties.insert("b".to_string(), Schema::plain_string());
        let required: IndexSet<String> = ["a".to_string()].into_iter().collect();
        let mut dependent_required = IndexMap::new();
        dependent_required.insert("a".to_string(), vec!["b".to_string()]);
        let schema = Schema::Object {
            properties,
            required,
            additional_allowed: true,
            constraints: ObjectConstraints { dependent_required, ..Default::default() },
        };
        let Value::Object(map) = golden_value(&schema, &[], "body") else { panic!("expected object") };
        assert!(map.contains_key("b"));
    }

    #[test]
    fn same_schema_yields_byte_identical_golden_record_across_runs() {
        let a = golden_value(&scenario_a_body(), &[], "body");
        let b = golden_value(&scenario_a_body(), &[], "body");
        assert_eq!(a, b);
    }

    #[test]
    fn exclusive_minimum_bumps_past_the_bound() {
        let schema = Schema::Integer { constraints: NumericConstraints { min: Some(5.0), exclusive_min: true, ..Default::default() } };
        assert_eq!(golden_value(&schema, &[], "n"), serde_json::json!(6));
    }
}
