#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, clippy::panic_in_result_fn, clippy::unwrap_in_result, reason = "Test-only assertions are permitted.")]
// tests/determinism.rs
// ============================================================================
// Test: Parsing Determinism
// Description: Parsing the same source text twice yields IR values
//              comparing equal (spec.md §8, round-trip/idempotence laws).
// ============================================================================

use testgen_core::SourceDialect;

const HTTP_DOC: &str = r#"{
    "info": {"title": "Users", "version": "1.0"},
    "paths": {
        "/users": {
            "post": {
                "operationId": "create_user",
                "requestBody": {"content": {"application/json": {"schema": {
                    "type": "object",
                    "properties": {"email": {"type": "string", "format": "email"}},
                    "required": ["email"]
                }}}},
                "responses": {"201": {}, "400": {}}
            }
        }
    }
}"#;

const DYNAMIC_DOC: &str = r#"{
    "types": [{"kind": "enum", "name": "Status", "values": ["Active", "Inactive"]}],
    "functions": [{
        "name": "create_user",
        "params": [
            {"name": "name", "annotation": {"type": "str"}, "has_default": false},
            {"name": "status", "annotation": {"type": "ref", "name": "Status"}, "has_default": true}
        ]
    }]
}"#;

const TYPED_DOC: &str = r#"{
    "types": [{"kind": "interface", "name": "User", "properties": [
        {"name": "email", "type": {"kind": "string"}, "optional": false}
    ]}],
    "functions": [{
        "name": "createUser",
        "is_async": true,
        "params": [{"name": "input", "type": {"kind": "ref", "name": "User"}, "optional": false}],
        "returns": {"kind": "promise", "inner": {"kind": "ref", "name": "User"}}
    }]
}"#;

#[test]
fn http_contract_parsing_is_deterministic() {
    let first = testgen_parse::parse(SourceDialect::HttpContract, HTTP_DOC).expect("parse");
    let second = testgen_parse::parse(SourceDialect::HttpContract, HTTP_DOC).expect("parse");
    assert_eq!(first.specification, second.specification);
}

#[test]
fn dynamic_source_parsing_is_deterministic() {
    let first = testgen_parse::parse(SourceDialect::DynamicSource, DYNAMIC_DOC).expect("parse");
    let second = testgen_parse::parse(SourceDialect::DynamicSource, DYNAMIC_DOC).expect("parse");
    assert_eq!(first.specification, second.specification);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn typed_source_parsing_is_deterministic() {
    let first = testgen_parse::parse(SourceDialect::TypedSource, TYPED_DOC).expect("parse");
    let second = testgen_parse::parse(SourceDialect::TypedSource, TYPED_DOC).expect("parse");
    assert_eq!(first.specification, second.specification);
}
