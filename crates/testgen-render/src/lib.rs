// crates/testgen-render/src/lib.rs
// ============================================================================
// Module: Template Renderer
// Description: Turns (Operation, Payload[], FixtureProgram?, TargetFramework)
//              into one generated test file's source text (spec.md §4.8).
// Purpose: The pipeline's final pure stage before artifacts are persisted.
// Dependencies: testgen-core, testgen-fixture, testgen-payload, testgen-intent
// ============================================================================

//! ## Overview
//! [`render`] dispatches to one of three target-framework renderers by
//! `(target_framework, operation kind)`:
//! - [`http_sync`] — synchronous `pytest` + `requests`.
//! - [`http_async`] — `pytest-asyncio` + `httpx`.
//! - [`function_direct`] — direct function calls with `pytest.raises` for
//!   negative cases.
//!
//! `fixture` is only ever `Some` for an HTTP Consumer operation (spec.md
//! §4.5); every other operation renders with `None`. `types` resolves the
//! named-enum markers [`testgen_core::Schema::Enum`] preserves so
//! `function_direct` can convert happy-path enum values to `EnumName.MEMBER`
//! at call time (spec.md §4.8) — the enum table is consulted, never
//! mutated, so rendering stays a pure function of its inputs.

pub mod common;
pub mod function_direct;
pub mod http_async;
pub mod http_sync;

use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::TargetFramework;
use testgen_core::TypeDecl;
use testgen_fixture::FixtureProgram;
use testgen_payload::Payload;
use thiserror::Error;

/// Errors the renderer raises for a single operation (spec.md §4.8, §7:
/// "Render errors are per-operation; their scope is that operation alone").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The operation's kind cannot be rendered for the requested target
    /// framework (e.g. a `Function` operation asked to render as
    /// `http-sync`).
    #[error("operation '{operation_id}' is not compatible with target framework {target:?}")]
    DialectMismatch {
        /// The operation's id.
        operation_id: String,
        /// The target framework that was requested.
        target: TargetFramework,
    },
    /// No payloads were supplied; every operation must have at least a
    /// `HAPPY_PATH` payload to render.
    #[error("operation '{operation_id}' has no payloads to render")]
    NoPayloads {
        /// The operation's id.
        operation_id: String,
    },
}

/// Renders one operation's generated test file.
///
/// `base_url` is substituted literally into HTTP-target renders (spec.md
/// §6) and ignored for `function-direct`.
///
/// # Errors
///
/// Returns [`RenderError`] if `op`'s kind is incompatible with `target`, or
/// if `payloads` is empty.
pub fn render(op: &Operation, payloads: &[Payload], types: &[TypeDecl], fixture: Option<&FixtureProgram>, target: TargetFramework, base_url: Option<&str>) -> Result<String, RenderError> {
    if payloads.is_empty() {
        return Err(RenderError::NoPayloads { operation_id: op.id.clone() });
    }
    match (target, &op.kind) {
        (TargetFramework::HttpSync, OperationKind::Http { method, path }) => Ok(http_sync::render(&op.id, *method, path, payloads, fixture, base_url.unwrap_or(""))),
        (TargetFramework::HttpAsync, OperationKind::Http { method, path }) => Ok(http_async::render(&op.id, *method, path, payloads, fixture, base_url.unwrap_or(""))),
        (TargetFramework::FunctionDirect, OperationKind::Function { .. }) => Ok(function_direct::render(op, payloads, types)),
        _ => Err(RenderError::DialectMismatch { operation_id: op.id.clone(), target }),
    }
}

#[cfg(test)]
mod tests {
    use testgen_core::IntentId;
    use testgen_core::Parameter;
    use testgen_core::Response;
    use testgen_core::Schema;
    use testgen_intent::ExpectedOutcome;

    use super::*;

    fn http_op() -> Operation {
        Operation {
            id: "get_user".to_string(),
            kind: OperationKind::Http { method: testgen_core::HttpMethod::Get, path: "/users/{id}".to_string() },
            path_params: vec![Parameter { name: "id".to_string(), required: true, schema: Schema::plain_string() }],
            query_params: Vec::new(),
            headers: Vec::new(),
            body: None,
            successes: vec![Response { status: 200, schema: Schema::Any }],
            errors: vec![Response { status: 404, schema: Schema::Any }],
            description: String::new(),
            metadata: indexmap::IndexMap::new(),
        }
    }

    fn happy_payload() -> Payload {
        Payload {
            operation_id: "get_user".to_string(),
            intent_id: IntentId::HappyPath,
            target_field: None,
            body: None,
            path_params: {
                let mut map = indexmap::IndexMap::new();
                map.insert("id".to_string(), serde_json::json!("abc"));
                map
            },
            query_params: indexmap::IndexMap::new(),
            headers: indexmap::IndexMap::new(),
            expected_outcome: ExpectedOutcome::HttpStatus(200),
            description: "happy path".to_string(),
        }
    }

    #[test]
    fn dialect_mismatch_is_rejected_before_dispatch() {
        let op = http_op();
        let result = render(&op, &[happy_payload()], &[], None, TargetFramework::FunctionDirect, None);
        assert_eq!(result, Err(RenderError::DialectMismatch { operation_id: "get_user".to_string(), target: TargetFramework::FunctionDirect }));
    }

    #[test]
    fn empty_payloads_are_rejected_before_dispatch() {
        let op = http_op();
        let result = render(&op, &[], &[], None, TargetFramework::HttpSync, None);
        assert_eq!(result, Err(RenderError::NoPayloads { operation_id: "get_user".to_string() }));
    }

    #[test]
    fn matching_dialect_renders_successfully() {
        let op = http_op();
        let rendered = render(&op, &[happy_payload()], &[], None, TargetFramework::HttpSync, Some("https://api.example.com")).expect("render ok");
        assert!(rendered.contains("def test_get_user"));
    }
}
