// crates/testgen-render/src/http_async.rs
// ============================================================================
// Module: http-async Renderer
// Description: Renders one HTTP operation as an async `pytest-asyncio` +
//              `httpx` test file (spec.md §4.8).
// Purpose: Implement the `http-async` target framework.
// Dependencies: testgen-core, testgen-fixture, testgen-payload
// ============================================================================

use std::fmt::Write as _;

use testgen_core::HttpMethod;
use testgen_fixture::FixtureProgram;
use testgen_payload::Payload;

use crate::common;

/// Renders `op` (an HTTP operation already matched by the caller) as a
/// `pytest-asyncio`/`httpx` test file.
#[must_use]
pub fn render(operation_id: &str, method: HttpMethod, path: &str, payloads: &[Payload], fixture: Option<&FixtureProgram>, base_url: &str) -> String {
    let compiled = fixture.map(|f| common::render_fixtures(f, true));
    let mut out = String::new();

    let _ = write!(out, "{}", common::GENERATED_HEADER);
    out.push_str("import pytest\n");
    out.push_str("import pytest_asyncio\n");
    out.push_str("import httpx\n");
    if compiled.as_ref().is_some_and(|c| c.source.contains("_apply_unique_suffix")) {
        out.push_str("import uuid\n");
    }
    let _ = writeln!(out, "\nBASE_URL = {}", common::python_literal(&serde_json::Value::String(base_url.to_string())));
    let _ = writeln!(out, "PATH_TEMPLATE = {}", common::python_literal(&serde_json::Value::String(path.to_string())));
    out.push_str("\npytestmark = pytest.mark.asyncio\n");

    if let Some(compiled) = &compiled {
        out.push_str(&compiled.source);
    }

    let _ = write!(out, "\n\nCASES = [\n");
    for payload in payloads {
        render_case(&mut out, payload);
    }
    out.push_str("]\n");

    let fn_name = common::test_function_name(operation_id);
    let fixture_args: Vec<&str> = compiled.as_ref().map(|c| c.usages.iter().map(|u| u.fixture_name.as_str()).collect()).unwrap_or_default();
    let mut params = vec!["case".to_string()];
    params.extend(fixture_args.iter().map(|s| (*s).to_string()));

    let _ = writeln!(out, "\n\n@pytest.mark.parametrize(\"case\", CASES, ids=[c[\"intent_id\"] for c in CASES])");
    let _ = writeln!(out, "async def {fn_name}({}):", params.join(", "));
    out.push_str("    path_params = dict(case[\"path_params\"])\n");
    if let Some(compiled) = &compiled {
        for usage in &compiled.usages {
            let _ = writeln!(
                out,
                "    if path_params.get({}) == {}:",
                common::python_literal(&serde_json::Value::String(usage.path_param.clone())),
                common::python_literal(&serde_json::Value::String(usage.placeholder.clone()))
            );
            let _ = writeln!(out, "        path_params[{}] = {}", common::python_literal(&serde_json::Value::String(usage.path_param.clone())), usage.fixture_name);
        }
    }
    out.push_str("    path = PATH_TEMPLATE.format(**path_params)\n");
    let method_fn = common::http_method_fn(method);
    let body_kwarg = if method.carries_body() { ", json=case[\"body\"]" } else { "" };
    out.push_str("    async with httpx.AsyncClient(base_url=BASE_URL) as client:\n");
    let _ = writeln!(out, "        response = await client.{method_fn}(path, params=case[\"query_params\"], headers=case[\"headers\"]{body_kwarg})");
    out.push_str("    assert response.status_code == case[\"expected_status\"]\n");

    out
}

/// Appends one payload's `CASES` list entry.
fn render_case(out: &mut String, payload: &Payload) {
    let body_literal = payload.body.as_ref().map_or_else(|| "None".to_string(), common::python_literal);
    let path_params = serde_json::Value::Object(payload.path_params.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    let query_params = serde_json::Value::Object(payload.query_params.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    let headers = serde_json::Value::Object(payload.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    let status = common::expected_status(payload);
    let _ = writeln!(
        out,
        "    {{\"intent_id\": {}, \"description\": {}, \"path_params\": {}, \"query_params\": {}, \"headers\": {}, \"body\": {}, \"expected_status\": {}}},",
        common::python_literal(&serde_json::Value::String(payload.intent_id.as_str().to_string())),
        common::python_literal(&serde_json::Value::String(payload.description.clone())),
        common::python_literal(&path_params),
        common::python_literal(&query_params),
        common::python_literal(&headers),
        body_literal,
        status,
    );
}

#[cfg(test)]
mod tests {
    use testgen_core::IntentId;
    use testgen_intent::ExpectedOutcome;

    use super::*;

    fn happy_payload() -> Payload {
        Payload {
            operation_id: "get_user".to_string(),
            intent_id: IntentId::HappyPath,
            target_field: None,
            body: None,
            path_params: {
                let mut map = indexmap::IndexMap::new();
                map.insert("id".to_string(), serde_json::json!("abc-123"));
                map
            },
            query_params: indexmap::IndexMap::new(),
            headers: indexmap::IndexMap::new(),
            expected_outcome: ExpectedOutcome::HttpStatus(200),
            description: "happy path".to_string(),
        }
    }

    #[test]
    fn rendered_file_marks_every_test_as_asyncio() {
        let rendered = render("get_user", HttpMethod::Get, "/users/{id}", &[happy_payload()], None, "https://api.example.com");
        assert!(rendered.contains("pytestmark = pytest.mark.asyncio"));
        assert!(rendered.contains("async def test_get_user"));
    }
}
