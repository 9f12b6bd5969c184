// crates/testgen-llm/src/validate.rs
// ============================================================================
// Module: Enhancement Validator
// Description: Structure-preserving acceptance check for a candidate
//              enhanced payload (spec.md §4.9, §8 property 5).
// Purpose: Reject any LLM candidate that does not preserve the original
//          payload's key set, leaf types, and enum membership, or that
//          still carries a placeholder sentinel.
// Dependencies: testgen-core, serde_json
// ============================================================================

//! ## Overview
//! [`validate`] walks `original` and `candidate` together against the
//! schema that produced `original`, the same way [`testgen_payload::golden`]
//! walked the schema to build it. A candidate is accepted only when all
//! four rules in spec.md §4.9 hold simultaneously:
//! - same key set at every nesting level,
//! - same primitive type for every leaf,
//! - every enum leaf's value stays within its declared enum,
//! - no `__PLACEHOLDER_*__`-shaped token survives anywhere in the candidate.

use serde_json::Value;
use testgen_core::Schema;
use testgen_core::TypeDecl;

/// Prefix every placeholder sentinel this codebase emits starts with
/// (spec.md §9, "Placeholder sentinels").
const PLACEHOLDER_PREFIX: &str = "__PLACEHOLDER_";

/// Validates `candidate` against `original` and `schema` per spec.md §4.9.
///
/// `schema` should be the same schema [`testgen_payload::golden::build`]
/// used to produce `original` (the operation's body schema, or a parameter
/// schema for non-body enhancement). Returns `false` on any violation;
/// callers fall back to `original` rather than propagate a reason, matching
/// the "best-effort enrichment" posture (spec.md §4.9).
#[must_use]
pub fn validate(original: &Value, candidate: &Value, schema: &Schema, types: &[TypeDecl]) -> bool {
    if contains_placeholder(candidate) {
        return false;
    }
    structurally_equivalent(original, candidate, schema, types)
}

/// Returns true if any string leaf in `value` contains a placeholder
/// sentinel token.
fn contains_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(PLACEHOLDER_PREFIX),
        Value::Array(items) => items.iter().any(contains_placeholder),
        Value::Object(map) => map.values().any(contains_placeholder),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively checks key-set, leaf-type, and enum-membership equivalence
/// between `original` and `candidate` under `schema`.
fn structurally_equivalent(original: &Value, candidate: &Value, schema: &Schema, types: &[TypeDecl]) -> bool {
    let schema = schema.resolve(types).collapse_single_variant_union();
    match schema {
        Schema::Object { properties, .. } => {
            let (Value::Object(orig_map), Value::Object(cand_map)) = (original, candidate) else {
                return same_leaf_shape(original, candidate);
            };
            if orig_map.len() != cand_map.len() {
                return false;
            }
            for (key, orig_value) in orig_map {
                let Some(cand_value) = cand_map.get(key) else { return false };
                let field_schema = properties.get(key);
                match field_schema {
                    Some(field_schema) => {
                        if !structurally_equivalent(orig_value, cand_value, field_schema, types) {
                            return false;
                        }
                    }
                    None => {
                        if !same_leaf_shape(orig_value, cand_value) {
                            return false;
                        }
                    }
                }
            }
            true
        }
        Schema::Array { items, .. } => {
            let (Value::Array(orig_items), Value::Array(cand_items)) = (original, candidate) else {
                return same_leaf_shape(original, candidate);
            };
            if orig_items.len() != cand_items.len() {
                return false;
            }
            orig_items.iter().zip(cand_items.iter()).all(|(o, c)| structurally_equivalent(o, c, items, types))
        }
        Schema::Enum { values, .. } => values.contains(candidate),
        Schema::Union { variants } => variants.iter().any(|variant| structurally_equivalent(original, candidate, variant, types)),
        Schema::String { .. } | Schema::Integer { .. } | Schema::Number { .. } | Schema::Boolean | Schema::Null | Schema::Any | Schema::Ref { .. } => {
            same_leaf_shape(original, candidate)
        }
    }
}

/// Returns true when two JSON leaves share the same primitive type (spec.md
/// §4.9: "Same primitive type for every leaf"). Values are not compared for
/// equality — the candidate is expected to differ from the placeholder.
fn same_leaf_shape(original: &Value, candidate: &Value) -> bool {
    matches!(
        (original, candidate),
        (Value::String(_), Value::String(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Null, Value::Null)
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}
