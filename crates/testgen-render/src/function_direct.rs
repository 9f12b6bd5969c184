// crates/testgen-render/src/function_direct.rs
// ============================================================================
// Module: function-direct Renderer
// Description: Renders one function operation as a `pytest` test file that
//              calls the function directly (spec.md §4.8).
// Purpose: Implement the `function-direct` target framework.
// Dependencies: testgen-core, testgen-payload
// ============================================================================

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde_json::Value;
use testgen_core::IntentId;
use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::Schema;
use testgen_core::TypeDecl;
use testgen_payload::Payload;

use crate::common;

/// Renders `op` (a function operation already matched by the caller) as a
/// direct-call `pytest` test file.
#[must_use]
pub fn render(op: &Operation, payloads: &[Payload], types: &[TypeDecl]) -> String {
    let OperationKind::Function { is_async, module_hint } = &op.kind else {
        return String::new();
    };
    let module = module_hint.as_deref().unwrap_or("implementation");
    let enums = enum_fields(op, types);

    let mut out = String::new();
    let _ = write!(out, "{}", common::GENERATED_HEADER);
    out.push_str("import pytest\n");
    let mut imports = vec![op.id.clone()];
    imports.extend(enums.values().cloned());
    imports.sort();
    imports.dedup();
    let _ = writeln!(out, "from {module} import {}", imports.join(", "));
    if *is_async {
        out.push_str("\npytestmark = pytest.mark.asyncio\n");
    }

    let _ = write!(out, "\nCASES = [\n");
    for payload in payloads {
        render_case(&mut out, payload, &enums);
    }
    out.push_str("]\n");

    let fn_name = common::test_function_name(&op.id);
    let _ = writeln!(out, "\n\n@pytest.mark.parametrize(\"case\", CASES, ids=[c[\"intent_id\"] for c in CASES])");
    let def_kw = if *is_async { "async def" } else { "def" };
    let _ = writeln!(out, "{def_kw} {fn_name}(case):");
    let call = if *is_async { format!("await {}(**case[\"kwargs\"])", op.id) } else { format!("{}(**case[\"kwargs\"])", op.id) };
    out.push_str("    if case[\"expects_rejection\"]:\n");
    let _ = writeln!(out, "        with pytest.raises(Exception):\n            {call}");
    out.push_str("    else:\n");
    let _ = writeln!(out, "        {call}");

    out
}

/// Appends one payload's `CASES` list entry, converting enum-valued
/// happy-path fields to `EnumName.MEMBER` call-time expressions (spec.md
/// §4.8) and leaving every other payload's values as raw literals.
fn render_case(out: &mut String, payload: &Payload, enums: &IndexMap<String, String>) {
    let is_happy = payload.intent_id == IntentId::HappyPath;
    let kwargs = render_kwargs(payload.body.as_ref(), is_happy, enums);
    let _ = writeln!(
        out,
        "    {{\"intent_id\": {}, \"description\": {}, \"kwargs\": {kwargs}, \"expects_rejection\": {}}},",
        common::python_literal(&Value::String(payload.intent_id.as_str().to_string())),
        common::python_literal(&Value::String(payload.description.clone())),
        if common::expects_rejection(payload) { "True" } else { "False" },
    );
}

/// Renders a function call's keyword-argument dict, substituting
/// `EnumName.MEMBER` for any top-level field named in `enums` when
/// `is_happy`.
fn render_kwargs(body: Option<&Value>, is_happy: bool, enums: &IndexMap<String, String>) -> String {
    let Some(Value::Object(map)) = body else { return "{}".to_string() };
    let parts: Vec<String> = map
        .iter()
        .map(|(key, value)| {
            let rendered_value = match (is_happy, enums.get(key), value) {
                (true, Some(type_name), Value::String(member)) => format!("{type_name}.{}", common::sanitize_ident(member).to_ascii_uppercase()),
                _ => common::python_literal(value),
            };
            format!("{}: {rendered_value}", python_key_literal(key))
        })
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// Renders a dict key as a quoted Python string literal.
fn python_key_literal(key: &str) -> String {
    common::python_literal(&Value::String(key.to_string()))
}

/// Finds every top-level body field whose schema is a named enum,
/// returning `field name -> enum type name`.
fn enum_fields(op: &Operation, types: &[TypeDecl]) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    let Some(body) = &op.body else { return map };
    let Schema::Object { properties, .. } = body.schema.collapse_single_variant_union() else { return map };
    for (name, schema) in properties {
        if let Schema::Enum { named_type_ref: Some(type_index), .. } = schema.resolve(types).collapse_single_variant_union()
            && let Some(decl) = types.get(*type_index)
        {
            map.insert(name.clone(), decl.name.clone());
        }
    }
    map
}
