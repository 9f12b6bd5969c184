// crates/testgen-intent/src/generator.rs
// ============================================================================
// Module: Intent Generator
// Description: Implements the ordered, dialect-aware intent strategy
//              (spec.md §4.2).
// Purpose: Produce the stable intent sequence every other stage assumes.
// Dependencies: testgen-core
// ============================================================================

//! ## Overview
//! [`generate`] walks one [`Operation`]'s body schema depth-first (through
//! nested `Object` properties only — arrays and union variants are treated
//! as leaves for traversal purposes, matching spec.md §4.2's "depth-first
//! through nested objects") and emits, in this fixed order:
//!
//! 1. `HAPPY_PATH`.
//! 2. One full pass over every *required* property, emitting the
//!    dialect-specific required-missing id.
//! 3. One full pass over *every* property, emitting `TYPE_VIOLATION` and
//!    whichever type-specific rules (steps 3 through 9 of spec.md §4.2)
//!    apply to that property's schema kind, before moving to the next
//!    property. This combined ordering — rather than one pass per rule — is
//!    what spec.md §8 Scenario A's worked transcript requires: the boundary
//!    intents for `email` all appear before any intent for `age`.
//!    `EMPTY_STRING`/`WHITESPACE_ONLY` are skipped for a `format`-constrained
//!    string (spec.md §8 Scenario A's transcript has neither for `email`):
//!    a named format already implies a non-blank shape, so those two probes
//!    would be redundant with `FORMAT_INVALID`.
//! 4. For HTTP operations: path-parameter intents, then (a supplement this
//!    implementation adds — `Operation::headers` is otherwise never
//!    consulted by any rule in spec.md §4.2) header-parameter intents.
//! 5. One final pass over string properties not constrained by a regex
//!    `pattern` (a `format` constraint such as `email` does not exempt a
//!    property from injection probing — spec.md §8 Scenario A's worked
//!    transcript fires `SQL_INJECTION` et al. on a `format=email` field),
//!    emitting the injection-probe intents.
//!
//! Dialect-specific id pairs (`REQUIRED_FIELD_MISSING`/`REQUIRED_ARG_MISSING`,
//! `ADDITIONAL_PROPERTY_NOT_ALLOWED`/`UNEXPECTED_ARGUMENT`) are chosen from
//! `op.kind` rather than a separate dialect parameter: `OperationKind`
//! already is the dialect tag spec.md §4.2 asks for.

use testgen_core::IntentId;
use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::Response;
use testgen_core::Schema;
use testgen_core::StringFormat;

use crate::intent::ExpectedOutcome;
use crate::intent::FieldPath;
use crate::intent::Intent;
use crate::intent::Target;

/// Generates the ordered intent list for one operation.
///
/// `target_intents` is the caller's allow-list (spec.md §6); an empty list
/// means "every catalog entry". `HAPPY_PATH` is always emitted regardless.
#[must_use]
pub fn generate(op: &Operation, target_intents: &[IntentId]) -> Vec<Intent> {
    let is_function = matches!(op.kind, OperationKind::Function { .. });
    let allowed = |id: IntentId| id == IntentId::HappyPath || target_intents.is_empty() || target_intents.contains(&id);

    let mut intents = Vec::new();

    intents.push(Intent::new(IntentId::HappyPath, Target::WholeBody, happy_path_outcome(op), "happy path"));

    let Some(body) = op.body.as_ref().map(|param| &param.schema) else {
        emit_http_parameter_intents(op, &allowed, &mut intents);
        return intents;
    };

    let required_id = if is_function { IntentId::RequiredArgMissing } else { IntentId::RequiredFieldMissing };
    let additional_id = if is_function { IntentId::UnexpectedArgument } else { IntentId::AdditionalPropertyNotAllowed };

    let entries = flatten_properties(body);

    for (path, required, _schema) in &entries {
        if *required && allowed(required_id) {
            intents.push(Intent::new(
                required_id,
                Target::BodyField(path.clone()),
                negative_outcome(op, required_id),
                format!("{required_id} at {}", path.display()),
            ));
        }
    }

    for (path, _required, schema) in &entries {
        emit_property_block(op, path, schema, additional_id, &allowed, &mut intents);
    }

    emit_http_parameter_intents(op, &allowed, &mut intents);

    for (path, _required, schema) in &entries {
        let Schema::String { constraints } = schema.collapse_single_variant_union() else { continue };
        if constraints.pattern.is_some() {
            continue;
        }
        for id in [IntentId::SqlInjection, IntentId::XssInjection, IntentId::CommandInjection] {
            if allowed(id) {
                intents.push(Intent::new(id, Target::BodyField(path.clone()), negative_outcome(op, id), format!("{id} at {}", path.display())));
            }
        }
        if looks_path_like(path) && allowed(IntentId::PathTraversal) {
            intents.push(Intent::new(
                IntentId::PathTraversal,
                Target::BodyField(path.clone()),
                negative_outcome(op, IntentId::PathTraversal),
                format!("path traversal at {}", path.display()),
            ));
        }
    }

    intents
}

/// Emits steps 3 through 9 of spec.md §4.2 for one property, in the fixed
/// sub-order a schema kind's applicable rules appear in the spec.
fn emit_property_block(
    op: &Operation,
    path: &FieldPath,
    schema: &Schema,
    additional_id: IntentId,
    allowed: &impl Fn(IntentId) -> bool,
    intents: &mut Vec<Intent>,
) {
    let mut push = |id: IntentId, description: String| {
        if allowed(id) {
            intents.push(Intent::new(id, Target::BodyField(path.clone()), negative_outcome(op, id), description));
        }
    };

    push(IntentId::TypeViolation, format!("type violation at {}", path.display()));
    let collapsed = schema.collapse_single_variant_union();
    if !collapsed.is_nullable() {
        push(IntentId::NullNotAllowed, format!("null not allowed at {}", path.display()));
    }

    match collapsed {
        Schema::String { constraints } => {
            if constraints.format.is_some() {
                push(IntentId::FormatInvalid, format!("format invalid at {}", path.display()));
            }
            if constraints.pattern.is_some() {
                push(IntentId::PatternMismatch, format!("pattern mismatch at {}", path.display()));
            }
            if constraints.min_len.is_some() {
                push(IntentId::BoundaryMinLengthMinusOne, format!("min length minus one at {}", path.display()));
            }
            if constraints.max_len.is_some() {
                push(IntentId::BoundaryMaxLengthPlusOne, format!("max length plus one at {}", path.display()));
            }
            if constraints.format.is_none() {
                if constraints.min_len.is_some_and(|min| min > 0) {
                    push(IntentId::EmptyString, format!("empty string at {}", path.display()));
                }
                push(IntentId::WhitespaceOnly, format!("whitespace only at {}", path.display()));
            }
        }
        Schema::Integer { constraints } | Schema::Number { constraints } => {
            if constraints.min.is_some() {
                push(IntentId::BoundaryMinMinusOne, format!("min minus one at {}", path.display()));
            }
            if constraints.max.is_some() {
                push(IntentId::BoundaryMaxPlusOne, format!("max plus one at {}", path.display()));
            }
            if constraints.multiple_of.is_some() {
                push(IntentId::NotMultipleOf, format!("not a multiple at {}", path.display()));
            }
        }
        Schema::Enum { .. } => push(IntentId::EnumMismatch, format!("enum mismatch at {}", path.display())),
        Schema::Array { constraints, .. } => {
            let fixed_empty = constraints.min_items == Some(0) && constraints.max_items == Some(0);
            if constraints.min_items.is_some_and(|min| min > 0) {
                push(IntentId::BoundaryMinItemsMinusOne, format!("min items minus one at {}", path.display()));
            }
            if constraints.max_items.is_some() && !fixed_empty {
                push(IntentId::BoundaryMaxItemsPlusOne, format!("max items plus one at {}", path.display()));
            }
            if constraints.unique_items {
                push(IntentId::ArrayNotUnique, format!("array not unique at {}", path.display()));
            }
            push(IntentId::ArrayItemTypeViolation, format!("array item type violation at {}", path.display()));
        }
        Schema::Union { variants } => {
            if variants.len() > 1 {
                push(IntentId::UnionNoMatch, format!("union no match at {}", path.display()));
            }
        }
        Schema::Object { additional_allowed, constraints, .. } => {
            if !additional_allowed {
                push(additional_id, format!("{additional_id} at {}", path.display()));
            }
            if constraints.additional_properties_schema.is_some() {
                push(IntentId::ObjectValueTypeViolation, format!("object value type violation at {}", path.display()));
            }
        }
        Schema::Boolean | Schema::Null | Schema::Ref { .. } | Schema::Any => {}
    }
}

/// Step 10 (path parameters) plus this implementation's header supplement.
fn emit_http_parameter_intents(op: &Operation, allowed: &impl Fn(IntentId) -> bool, intents: &mut Vec<Intent>) {
    if !matches!(op.kind, OperationKind::Http { .. }) {
        return;
    }
    for param in &op.path_params {
        if param.required && allowed(IntentId::ResourceNotFound) {
            intents.push(Intent::new(
                IntentId::ResourceNotFound,
                Target::PathParam(param.name.clone()),
                negative_outcome(op, IntentId::ResourceNotFound),
                format!("resource not found for {}", param.name),
            ));
        }
        if schema_format(&param.schema).is_some() && allowed(IntentId::FormatInvalidPathParam) {
            intents.push(Intent::new(
                IntentId::FormatInvalidPathParam,
                Target::PathParam(param.name.clone()),
                negative_outcome(op, IntentId::FormatInvalidPathParam),
                format!("format invalid path param {}", param.name),
            ));
        }
    }
    for header in &op.headers {
        if header.required && allowed(IntentId::HeaderMissing) {
            intents.push(Intent::new(
                IntentId::HeaderMissing,
                Target::Header(header.name.clone()),
                negative_outcome(op, IntentId::HeaderMissing),
                format!("header missing {}", header.name),
            ));
        }
        if matches!(header.schema, Schema::Enum { .. }) && allowed(IntentId::HeaderEnumMismatch) {
            intents.push(Intent::new(
                IntentId::HeaderEnumMismatch,
                Target::Header(header.name.clone()),
                negative_outcome(op, IntentId::HeaderEnumMismatch),
                format!("header enum mismatch {}", header.name),
            ));
        }
        if is_free_text_string(&header.schema) && allowed(IntentId::HeaderInjection) {
            intents.push(Intent::new(
                IntentId::HeaderInjection,
                Target::Header(header.name.clone()),
                negative_outcome(op, IntentId::HeaderInjection),
                format!("header injection {}", header.name),
            ));
        }
    }
}

fn schema_format(schema: &Schema) -> Option<StringFormat> {
    match schema {
        Schema::String { constraints } => constraints.format,
        _ => None,
    }
}

fn is_free_text_string(schema: &Schema) -> bool {
    matches!(schema, Schema::String { constraints } if constraints.format.is_none() && constraints.pattern.is_none())
}

/// Property names hinting at filesystem paths, gating `PATH_TRAVERSAL` so it
/// does not fire on every free-text field (which would disagree with
/// spec.md §8 Scenario A's literal three-injection transcript for a field
/// named `email`).
fn looks_path_like(path: &FieldPath) -> bool {
    path.0.last().is_some_and(|segment| {
        let lower = segment.to_ascii_lowercase();
        ["path", "file", "dir", "filename"].iter().any(|hint| lower.contains(hint))
    })
}

/// Flattens an object schema's properties depth-first, descending only
/// through nested `Object` schemas (spec.md §4.2: "depth-first through
/// nested objects"). Returns `(path, required-at-its-own-level, schema)`.
fn flatten_properties(schema: &Schema) -> Vec<(FieldPath, bool, Schema)> {
    let mut entries = Vec::new();
    flatten_into(schema, &FieldPath::default(), &mut entries);
    entries
}

fn flatten_into(schema: &Schema, prefix: &FieldPath, entries: &mut Vec<(FieldPath, bool, Schema)>) {
    let Schema::Object { properties, required, .. } = schema else { return };
    for (name, prop_schema) in properties {
        let path = prefix.child(name);
        entries.push((path.clone(), required.contains(name), prop_schema.clone()));
        if matches!(prop_schema, Schema::Object { .. }) {
            flatten_into(prop_schema, &path, entries);
        }
    }
}

fn happy_path_outcome(op: &Operation) -> ExpectedOutcome {
    match op.kind {
        OperationKind::Http { .. } => ExpectedOutcome::HttpStatus(first_success_status(op)),
        OperationKind::Function { .. } => ExpectedOutcome::FunctionSuccess,
    }
}

fn first_success_status(op: &Operation) -> u16 {
    op.successes.first().map_or(200, |response| response.status)
}

/// Selects the expected outcome for a negative intent (spec.md §4.2):
/// first match by category, else 400, else the dialect default.
fn negative_outcome(op: &Operation, id: IntentId) -> ExpectedOutcome {
    match op.kind {
        OperationKind::Function { .. } => ExpectedOutcome::FunctionRejects,
        OperationKind::Http { .. } => ExpectedOutcome::HttpStatus(select_error_status(op, id)),
    }
}

fn select_error_status(op: &Operation, id: IntentId) -> u16 {
    let candidates: Vec<&Response> = op.errors.iter().filter(|r| r.status >= 400).collect();
    if candidates.is_empty() {
        return 400;
    }
    if id.category() == testgen_core::IntentCategory::Resource {
        if let Some(found) = candidates.iter().find(|r| r.status == 404) {
            return found.status;
        }
    }
    if let Some(found) = candidates.iter().find(|r| (400..=422).contains(&r.status)) {
        return found.status;
    }
    candidates[0].status
}

#[cfg(test)]
mod tests {
    use testgen_core::ArrayConstraints;
    use testgen_core::HttpMethod;
    use testgen_core::NumericConstraints;
    use testgen_core::Parameter;
    use testgen_core::StringConstraints;

    use super::*;

    fn scenario_a_operation() -> Operation {
        let mut properties = indexmap::IndexMap::new();
        properties.insert(
            "email".to_string(),
            Schema::String { constraints: StringConstraints { max_len: Some(255), format: Some(StringFormat::Email), ..StringConstraints::default() } },
        );
        properties.insert("age".to_string(), Schema::Integer { constraints: NumericConstraints { min: Some(0.0), max: Some(150.0), ..NumericConstraints::default() } });
        let mut required = indexmap::IndexSet::new();
        required.insert("email".to_string());
        required.insert("age".to_string());
        let body = Schema::Object { properties, required, additional_allowed: true, constraints: testgen_core::ObjectConstraints::default() };
        Operation {
            id: "create_user".to_string(),
            kind: OperationKind::Http { method: HttpMethod::Post, path: "/users".to_string() },
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: Some(Parameter { name: "body".to_string(), required: true, schema: body }),
            successes: vec![Response { status: 201, schema: Schema::Any }],
            errors: vec![Response { status: 400, schema: Schema::Any }],
            description: String::new(),
            metadata: indexmap::IndexMap::new(),
        }
    }

    #[test]
    fn scenario_a_ordering_matches_the_worked_transcript() {
        let op = scenario_a_operation();
        let intents = generate(&op, &[]);
        let ids: Vec<IntentId> = intents.iter().map(|i| i.id).collect();
        assert_eq!(
            ids,
            vec![
                IntentId::HappyPath,
                IntentId::RequiredFieldMissing,
                IntentId::RequiredFieldMissing,
                IntentId::TypeViolation,
                IntentId::NullNotAllowed,
                IntentId::FormatInvalid,
                IntentId::BoundaryMaxLengthPlusOne,
                IntentId::TypeViolation,
                IntentId::NullNotAllowed,
                IntentId::BoundaryMinMinusOne,
                IntentId::BoundaryMaxPlusOne,
                IntentId::SqlInjection,
                IntentId::XssInjection,
                IntentId::CommandInjection,
            ]
        );
    }

    #[test]
    fn empty_allow_list_still_yields_happy_path() {
        let op = scenario_a_operation();
        let intents = generate(&op, &[IntentId::EnumMismatch]);
        assert_eq!(intents[0].id, IntentId::HappyPath);
        assert!(intents.iter().all(|i| i.id == IntentId::HappyPath));
    }

    #[test]
    fn operation_with_no_required_fields_never_emits_required_missing() {
        let mut op = scenario_a_operation();
        let Some(body) = op.body.as_mut() else { panic!("expected body") };
        if let Schema::Object { required, .. } = &mut body.schema {
            required.clear();
        }
        let intents = generate(&op, &[]);
        assert!(!intents.iter().any(|i| i.id == IntentId::RequiredFieldMissing));
    }

    #[test]
    fn single_variant_union_collapses_and_skips_union_no_match() {
        let mut op = scenario_a_operation();
        let Some(body) = op.body.as_mut() else { panic!("expected body") };
        if let Schema::Object { properties, .. } = &mut body.schema {
            properties.insert("tag".to_string(), Schema::Union { variants: vec![Schema::plain_string()] });
        }
        if let Schema::Object { required, .. } = &mut body.schema {
            required.shift_remove("tag");
        }
        let intents = generate(&op, &[]);
        assert!(!intents.iter().any(|i| i.id == IntentId::UnionNoMatch));
    }

    #[test]
    fn fixed_empty_array_triggers_no_array_boundary_intents() {
        let mut op = scenario_a_operation();
        let Some(body) = op.body.as_mut() else { panic!("expected body") };
        if let Schema::Object { properties, required, .. } = &mut body.schema {
            properties.insert(
                "tags".to_string(),
                Schema::Array { items: Box::new(Schema::plain_string()), constraints: ArrayConstraints { min_items: Some(0), max_items: Some(0), unique_items: false } },
            );
            required.shift_remove("tags");
        }
        let intents = generate(&op, &[]);
        assert!(!intents.iter().any(|i| matches!(i.id, IntentId::BoundaryMinItemsMinusOne | IntentId::BoundaryMaxItemsPlusOne)));
    }
}
