// crates/testgen-render/src/common.rs
// ============================================================================
// Module: Rendering Helpers
// Description: Shared Python-literal conversion, identifier sanitization,
//              and fixture-source rendering used by all three target
//              renderers.
// Purpose: Keep the per-framework renderers focused on request-call shape
//          and delegate everything dialect-neutral here.
// Dependencies: testgen-core, testgen-fixture, testgen-payload, serde_json
// ============================================================================

use std::fmt::Write as _;

use serde_json::Value;
use testgen_core::HttpMethod;
use testgen_fixture::FixtureProgram;
use testgen_fixture::Instruction;
use testgen_intent::ExpectedOutcome;
use testgen_payload::Payload;

/// Marker prefixed to every rendered file (spec.md §4.8, "opens with a
/// fixed comment marker identifying it as generated and forbidding
/// hand-edits").
pub const GENERATED_HEADER: &str = "# This file is @generated by testgen-render. DO NOT EDIT.\n";

/// Sentinel prefix a `BindPlaceholder` instruction's `placeholder` carries
/// (spec.md §4.7/§4.8: `USE_CREATED_RESOURCE_<resource>`).
pub const PLACEHOLDER_PREFIX: &str = "USE_CREATED_RESOURCE_";

/// Renders a JSON value as Python literal source text.
#[must_use]
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => python_str_literal(s),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", python_str_literal(k), python_literal(v))).collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

/// Renders a Rust string as a single-quoted Python string literal.
fn python_str_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

/// Lowercases and replaces every non-alphanumeric, non-underscore byte with
/// `_`, prefixing with `_` if the result would start with a digit.
#[must_use]
pub fn sanitize_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// The rendered test function's name for an operation.
#[must_use]
pub fn test_function_name(operation_id: &str) -> String {
    format!("test_{}", sanitize_ident(operation_id))
}

/// The HTTP status an HTTP-dialect payload expects. Returns `0` for a
/// function-dialect payload, which never carries `ExpectedOutcome::HttpStatus`
/// and is never passed to an HTTP renderer in practice.
#[must_use]
pub fn expected_status(payload: &Payload) -> u16 {
    match payload.expected_outcome {
        ExpectedOutcome::HttpStatus(status) => status,
        ExpectedOutcome::FunctionSuccess | ExpectedOutcome::FunctionRejects => 0,
    }
}

/// Whether a function-dialect payload expects the call to raise.
#[must_use]
pub fn expects_rejection(payload: &Payload) -> bool {
    matches!(payload.expected_outcome, ExpectedOutcome::FunctionRejects)
}

/// The `ids=` label for a payload's parametrized case, used as-is since
/// `IntentId::as_str` is already a valid pytest id token.
#[must_use]
pub fn case_id(payload: &Payload) -> &'static str {
    payload.intent_id.as_str()
}

/// Converts a dotted field path (`"address.email"`) into Python subscript
/// syntax (`["address"]["email"]`).
#[must_use]
pub fn python_subscript_path(dotted: &str) -> String {
    dotted.split('.').map(|segment| format!("[{}]", python_str_literal(segment))).collect()
}

/// One `USE_CREATED_RESOURCE_<resource>` placeholder resolved to a fixture.
#[derive(Debug, Clone)]
pub struct FixtureUsage {
    /// The Python fixture function name a test must request as an
    /// argument to resolve this placeholder.
    pub fixture_name: String,
    /// The sentinel token appearing in a payload's path parameters.
    pub placeholder: String,
    /// The Consumer's path parameter this binding resolves.
    pub path_param: String,
}

/// Rendered fixture source plus the placeholder usages a test body needs
/// to know about.
#[derive(Debug, Clone)]
pub struct CompiledFixtures {
    /// Python source defining one `pytest` fixture per `CreateResource`
    /// step, ready to append after the module's imports.
    pub source: String,
    /// Placeholder-to-fixture bindings, in program order.
    pub usages: Vec<FixtureUsage>,
}

/// Renders a `FixtureProgram`'s setup/teardown instructions as `pytest`
/// fixture functions (spec.md §4.7: each resource's uniqueness suffixing
/// happens here, at what is effectively fixture-execution time, never
/// baked into the literal body).
#[must_use]
pub fn render_fixtures(fixture: &FixtureProgram, is_async: bool) -> CompiledFixtures {
    let mut source = String::new();
    let mut uses_unique_suffix = false;

    for instruction in &fixture.setup {
        let Instruction::CreateResource { producer_method, producer_path, body, unique_fields, capture_as, .. } = instruction else { continue };
        let response_field = response_field_for(fixture, capture_as);
        let fixture_name = sanitize_ident(capture_as);
        let (delete_method_call, delete_present) = delete_call_for(fixture, capture_as, is_async);
        if !unique_fields.is_empty() {
            uses_unique_suffix = true;
        }

        let _ = write!(source, "\n\n{}\n", fixture_decorator(is_async));
        let def_kw = if is_async { "async def" } else { "def" };
        let _ = writeln!(source, "{def_kw} {fixture_name}():");
        let _ = writeln!(source, "    body = {}", python_literal(body));
        for field in unique_fields {
            let _ = writeln!(source, "    body{} = _apply_unique_suffix(body{})", python_subscript_path(field), python_subscript_path(field));
        }
        let method_fn = http_method_fn(*producer_method);
        let body_kwarg = if producer_method.carries_body() { ", json=body" } else { "" };
        if is_async {
            let _ = writeln!(source, "    async with httpx.AsyncClient(base_url=BASE_URL) as client:");
            let _ = writeln!(source, "        response = await client.{method_fn}({}{body_kwarg})", python_str_literal(producer_path));
            let _ = writeln!(source, "        resource_id = response.json()[{}]", python_str_literal(response_field));
            let _ = writeln!(source, "    yield resource_id");
            if delete_present {
                let _ = writeln!(source, "    async with httpx.AsyncClient(base_url=BASE_URL) as client:");
                let _ = writeln!(source, "        try:");
                let _ = writeln!(source, "            {delete_method_call}");
                let _ = writeln!(source, "        except httpx.HTTPError:");
                let _ = writeln!(source, "            pass");
            }
        } else {
            let _ = writeln!(source, "    response = requests.{method_fn}(f\"{{BASE_URL}}{}\"{body_kwarg})", producer_path);
            let _ = writeln!(source, "    resource_id = response.json()[{}]", python_str_literal(response_field));
            let _ = writeln!(source, "    yield resource_id");
            if delete_present {
                let _ = writeln!(source, "    try:");
                let _ = writeln!(source, "        {delete_method_call}");
                let _ = writeln!(source, "    except requests.RequestException:");
                let _ = writeln!(source, "        pass");
            }
        }
    }

    let usages = fixture
        .setup
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::BindPlaceholder { placeholder, capture_as, path_param } => {
                Some(FixtureUsage { fixture_name: sanitize_ident(capture_as), placeholder: placeholder.clone(), path_param: path_param.clone() })
            }
            _ => None,
        })
        .collect();

    if uses_unique_suffix {
        source = format!("{}{source}", unique_suffix_helper());
    }

    CompiledFixtures { source, usages }
}

/// The response field a `CreateResource` step's id is captured from.
fn response_field_for<'a>(fixture: &'a FixtureProgram, capture_as: &str) -> &'a str {
    fixture
        .setup
        .iter()
        .find_map(|instruction| match instruction {
            Instruction::CaptureIdFrom { capture_as: c, response_field } if c == capture_as => Some(response_field.as_str()),
            _ => None,
        })
        .unwrap_or("id")
}

/// Builds the delete call line for a fixture's teardown, if the program
/// compiled one for `capture_as`.
fn delete_call_for(fixture: &FixtureProgram, capture_as: &str, is_async: bool) -> (String, bool) {
    let producer_path = fixture.teardown.iter().find_map(|instruction| match instruction {
        Instruction::DeleteResource { producer_path, capture_as: c, .. } if c == capture_as => Some(producer_path.as_str()),
        _ => None,
    });
    let Some(producer_path) = producer_path else { return (String::new(), false) };
    let call = if is_async {
        format!("await client.delete(f\"{producer_path}/{{resource_id}}\")")
    } else {
        format!("requests.delete(f\"{{BASE_URL}}{producer_path}/{{resource_id}}\")")
    };
    (call, true)
}

/// The `pytest`/`pytest_asyncio` fixture decorator for the target dialect.
fn fixture_decorator(is_async: bool) -> &'static str {
    if is_async { "@pytest_asyncio.fixture" } else { "@pytest.fixture" }
}

/// Maps an `HttpMethod` to the lowercase `requests`/`httpx` client method.
#[must_use]
pub fn http_method_fn(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "get",
        HttpMethod::Post => "post",
        HttpMethod::Put => "put",
        HttpMethod::Patch => "patch",
        HttpMethod::Delete => "delete",
    }
}

/// A module-level helper applying a short random suffix to an identity-shaped
/// string field at fixture-execution time (spec.md §4.7, §9: uniqueness
/// lives here, never in the compiled program or the rendered literal).
fn unique_suffix_helper() -> String {
    "\n\ndef _apply_unique_suffix(value):\n    suffix = uuid.uuid4().hex[:8]\n    if \"@\" in value:\n        local, _, domain = value.partition(\"@\")\n        return f\"{local}+{suffix}@{domain}\"\n    return f\"{value}_{suffix}\"\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_literal_renders_nested_object_with_null_and_bool() {
        let value = serde_json::json!({"a": null, "b": true, "c": [1, "x"]});
        let rendered = python_literal(&value);
        assert!(rendered.contains("None"));
        assert!(rendered.contains("True"));
        assert!(rendered.contains("'x'"));
    }

    #[test]
    fn sanitize_ident_lowercases_and_replaces_punctuation() {
        assert_eq!(sanitize_ident("Create-User.v2"), "create_user_v2");
    }

    #[test]
    fn sanitize_ident_prefixes_leading_digit() {
        assert_eq!(sanitize_ident("2fa"), "_2fa");
    }

    #[test]
    fn subscript_path_converts_dotted_field_to_python_indexing() {
        assert_eq!(python_subscript_path("address.email"), "['address']['email']");
    }
}
