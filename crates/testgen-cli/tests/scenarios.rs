#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, clippy::panic_in_result_fn, clippy::unwrap_in_result, reason = "Test-only assertions are permitted.")]
// crates/testgen-cli/tests/scenarios.rs
// ============================================================================
// Test: End-to-End Scenarios
// Description: Drives the full pipeline through `testgen_cli::run` for each
//              of the six worked end-to-end scenarios (spec.md §8), plus
//              the boundary behaviors and round-trip laws that section
//              names alongside them.
// ============================================================================

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use testgen_cli::pipeline::OperationFixture;
use testgen_cli::pipeline::OperationIntents;
use testgen_cli::pipeline::OperationPayloads;
use testgen_cli::pipeline::progress::RecordingSink;
use testgen_cli::pipeline::store::ArtifactStore;
use testgen_cli::pipeline::store::FileSystemArtifactStore;
use testgen_config::CircuitBreakerConfig;
use testgen_config::RetryConfig;
use testgen_core::GenerationRequest;
use testgen_core::IntentId;
use testgen_core::LlmConfig;
use testgen_core::LlmEndpointConfig;
use testgen_core::SourceDialect;
use testgen_core::TargetFramework;
use testgen_llm::CircuitBreaker;
use testgen_llm::LlmProvider;
use testgen_llm::LlmRequest;
use testgen_llm::NoOpProvider;
use testgen_llm::ProviderError;

fn run_job(request: &GenerationRequest, provider: &dyn LlmProvider, store: &FileSystemArtifactStore) -> testgen_cli::JobOutcome {
    let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
    let retry = RetryConfig::default();
    let sink = RecordingSink::new();
    testgen_cli::run("scenario", request, provider, &breaker, &retry, store, &sink).expect("pipeline run")
}

fn read_json<T: serde::de::DeserializeOwned>(store: &FileSystemArtifactStore, name: &str) -> T {
    let bytes = store.get("scenario", name).unwrap_or_else(|err| panic!("reading {name}: {err}"));
    serde_json::from_slice(&bytes).unwrap_or_else(|err| panic!("decoding {name}: {err}"))
}

fn intents_for(entries: &[OperationIntents], operation_id: &str) -> Vec<IntentId> {
    entries
        .iter()
        .find(|entry| entry.operation_id == operation_id)
        .unwrap_or_else(|| panic!("no intents for {operation_id}"))
        .intents
        .iter()
        .map(|intent| intent.id)
        .collect()
}

fn payloads_for<'a>(entries: &'a [OperationPayloads], operation_id: &str) -> &'a [testgen_payload::Payload] {
    &entries.iter().find(|entry| entry.operation_id == operation_id).unwrap_or_else(|| panic!("no payloads for {operation_id}")).payloads
}

const SCENARIO_A_DOC: &str = r#"{
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
                "responses": {"201": {}, "400": {}}
            }
        }
    }
}"#;

/// Scenario A: HTTP POST with string+int fields — exact 14-intent ordering
/// and the golden record / boundary payload values spec.md §8 names.
#[test]
fn scenario_a_http_post_string_and_int_fields() {
    let request = GenerationRequest {
        spec_payload: SCENARIO_A_DOC.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: Vec::new(),
        llm_config: None,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let outcome = run_job(&request, &NoOpProvider, &store);
    assert_eq!(outcome.rendered_operations, vec!["create_user".to_string()]);
    assert!(outcome.failed_operations.is_empty());

    let intents: Vec<OperationIntents> = read_json(&store, "2_intents.json");
    assert_eq!(
        intents_for(&intents, "create_user"),
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

    let payloads: Vec<OperationPayloads> = read_json(&store, "3_payloads_raw.json");
    let create_user = payloads_for(&payloads, "create_user");
    let golden = create_user.iter().find(|p| p.intent_id == IntentId::HappyPath).expect("happy path payload");
    assert_eq!(golden.body, Some(json!({"email": "__PLACEHOLDER_STRING_email__", "age": 0})));
    let boundary = create_user.iter().find(|p| p.intent_id == IntentId::BoundaryMaxPlusOne).expect("boundary payload");
    assert_eq!(boundary.body, Some(json!({"email": "__PLACEHOLDER_STRING_email__", "age": 151})));
}

const SCENARIO_B_DOC: &str = r#"{
    "info": {"title": "Users", "version": "1.0"},
    "paths": {
        "/users": {
            "post": {
                "operationId": "create_user",
                "requestBody": {"content": {"application/json": {"schema": {
                    "type": "object",
                    "properties": {"email": {"type": "string"}},
                    "required": ["email"]
                }}}},
                "responses": {"201": {}}
            }
        },
        "/users/{user_id}": {
            "get": {
                "operationId": "get_user",
                "parameters": [{"name": "user_id", "in": "path", "required": true, "schema": {"type": "string", "format": "uuid"}}],
                "responses": {"200": {}, "404": {}, "422": {}}
            }
        }
    }
}"#;

/// Scenario B: HTTP GET with a path param and a sibling Producer — the
/// consumer needs setup, its `user_id` binds to the producer, and its
/// intent list carries the resource/format-validation pair spec.md §8
/// names.
#[test]
fn scenario_b_http_get_with_path_param_and_dependency() {
    let request = GenerationRequest {
        spec_payload: SCENARIO_B_DOC.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: Vec::new(),
        llm_config: None,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let outcome = run_job(&request, &NoOpProvider, &store);
    assert_eq!(outcome.failed_operations, Vec::new());
    assert!(outcome.rendered_operations.contains(&"get_user".to_string()));

    let intents: Vec<OperationIntents> = read_json(&store, "2_intents.json");
    assert_eq!(intents_for(&intents, "get_user"), vec![IntentId::HappyPath, IntentId::ResourceNotFound, IntentId::FormatInvalidPathParam]);

    let fixtures: Vec<OperationFixture> = read_json(&store, "4_fixture_plan.json");
    let consumer = fixtures.iter().find(|entry| entry.operation_id == "get_user").expect("get_user needs a fixture program");
    assert!(!consumer.program.setup.is_empty());
    assert!(fixtures.iter().all(|entry| entry.operation_id != "create_user"));
}

const SCENARIO_C_DOC: &str = r#"{
    "types": [
        {"kind": "enum", "name": "Status", "values": ["Active", "Inactive", "Pending"]}
    ],
    "functions": [
        {
            "name": "create_user",
            "is_async": false,
            "params": [
                {"name": "name", "annotation": {"type": "str"}, "has_default": false},
                {"name": "status", "annotation": {"type": "ref", "name": "Status"}, "has_default": true}
            ]
        }
    ]
}"#;

/// Scenario C: a function with an enum parameter — `ENUM_MISMATCH(status)`
/// mutates the field to the frozen invalid-enum sentinel.
#[test]
fn scenario_c_function_with_enum_parameter() {
    let request = GenerationRequest {
        spec_payload: SCENARIO_C_DOC.to_string(),
        source_dialect: SourceDialect::DynamicSource,
        target_framework: TargetFramework::FunctionDirect,
        base_url: None,
        target_intents: Vec::new(),
        llm_config: None,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let outcome = run_job(&request, &NoOpProvider, &store);
    assert_eq!(outcome.rendered_operations, vec!["create_user".to_string()]);

    let intents: Vec<OperationIntents> = read_json(&store, "2_intents.json");
    assert!(intents_for(&intents, "create_user").contains(&IntentId::EnumMismatch));

    let payloads: Vec<OperationPayloads> = read_json(&store, "3_payloads_raw.json");
    let mismatch = payloads_for(&payloads, "create_user").iter().find(|p| p.intent_id == IntentId::EnumMismatch).expect("enum mismatch payload");
    assert_eq!(mismatch.body.as_ref().and_then(|body| body.get("status")), Some(&Value::String("__INVALID_ENUM_VALUE__".to_string())));
}

/// Scenario D: LLM enhancement preserves structure end to end — a
/// well-formed candidate replaces the `HAPPY_PATH` body verbatim and every
/// other payload is untouched. `testgen-llm`'s own unit tests cover the
/// validation boundary in detail; this asserts the pipeline wires it
/// through without disturbing anything else.
#[test]
fn scenario_d_llm_enhancement_preserves_structure() {
    struct AcceptingProvider;
    impl LlmProvider for AcceptingProvider {
        fn complete(&self, _request: &LlmRequest) -> Result<String, ProviderError> {
            Ok(json!({"email": "alice@example.com", "age": 42}).to_string())
        }
    }

    let request = GenerationRequest {
        spec_payload: SCENARIO_A_DOC.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: vec![IntentId::RequiredFieldMissing],
        llm_config: Some(LlmConfig {
            payload_enhancement: Some(LlmEndpointConfig { provider: "test".to_string(), model: "test-model".to_string() }),
            test_enhancement: None,
        }),
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let _outcome = run_job(&request, &AcceptingProvider, &store);

    let raw: Vec<OperationPayloads> = read_json(&store, "3_payloads_raw.json");
    let enhanced: Vec<OperationPayloads> = read_json(&store, "3_payloads_enhanced.json");
    let raw_payloads = payloads_for(&raw, "create_user");
    let enhanced_payloads = payloads_for(&enhanced, "create_user");

    let raw_happy = raw_payloads.iter().find(|p| p.intent_id == IntentId::HappyPath).expect("raw happy path");
    let enhanced_happy = enhanced_payloads.iter().find(|p| p.intent_id == IntentId::HappyPath).expect("enhanced happy path");
    assert_eq!(enhanced_happy.body, Some(json!({"email": "alice@example.com", "age": 42})));
    assert_ne!(enhanced_happy.body, raw_happy.body);

    for (raw_payload, enhanced_payload) in raw_payloads.iter().zip(enhanced_payloads.iter()).filter(|(p, _)| p.intent_id != IntentId::HappyPath) {
        assert_eq!(raw_payload.body, enhanced_payload.body);
    }
}

/// Scenario E: the circuit breaker opens after three consecutive provider
/// failures and the job still completes, falling back to the raw golden
/// record — the breaker's own counting rules are exhaustively unit-tested
/// in `testgen-llm`; this confirms the pipeline never surfaces a provider
/// outage as a job failure.
#[test]
fn scenario_e_circuit_breaker_failure_never_fails_the_job() {
    struct AlwaysFailsProvider(Mutex<VecDeque<Result<String, ProviderError>>>);
    impl LlmProvider for AlwaysFailsProvider {
        fn complete(&self, _request: &LlmRequest) -> Result<String, ProviderError> {
            #[expect(clippy::unwrap_used, reason = "test double, single-threaded call sequence")]
            self.0.lock().unwrap().pop_front().unwrap_or(Err(ProviderError::Unavailable("exhausted".to_string())))
        }
    }
    let provider = AlwaysFailsProvider(Mutex::new(std::iter::repeat_with(|| Err(ProviderError::Unavailable("down".to_string()))).take(16).collect()));

    let request = GenerationRequest {
        spec_payload: SCENARIO_A_DOC.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: vec![IntentId::HappyPath],
        llm_config: Some(LlmConfig {
            payload_enhancement: Some(LlmEndpointConfig { provider: "test".to_string(), model: "test-model".to_string() }),
            test_enhancement: None,
        }),
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let outcome = run_job(&request, &provider, &store);
    assert_eq!(outcome.rendered_operations, vec!["create_user".to_string()]);
    assert!(outcome.failed_operations.is_empty());

    let enhanced: Vec<OperationPayloads> = read_json(&store, "3_payloads_enhanced.json");
    let happy = payloads_for(&enhanced, "create_user").iter().find(|p| p.intent_id == IntentId::HappyPath).expect("happy path payload");
    assert_eq!(happy.body, Some(json!({"email": "__PLACEHOLDER_STRING_email__", "age": 0})));
}

const SCENARIO_F_DOC: &str = r#"{
    "info": {"title": "Ordering", "version": "1.0"},
    "paths": {
        "/op-a": {"get": {"operationId": "op_a", "responses": {"200": {}}}},
        "/op-b": {"get": {"operationId": "op_b", "responses": {"200": {}}}},
        "/op-c": {"get": {"operationId": "op_c", "responses": {"200": {}}}}
    }
}"#;

/// Scenario F: deterministic ordering under parallelism — a specification
/// with operations `[op_a, op_b, op_c]` yields `2_intents.json` entries in
/// exactly that order.
#[test]
fn scenario_f_deterministic_ordering() {
    let request = GenerationRequest {
        spec_payload: SCENARIO_F_DOC.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: Vec::new(),
        llm_config: None,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let _outcome = run_job(&request, &NoOpProvider, &store);
    let intents: Vec<OperationIntents> = read_json(&store, "2_intents.json");
    let operation_ids: Vec<String> = intents.iter().map(|entry| entry.operation_id.clone()).collect();
    assert_eq!(operation_ids, vec!["op_a".to_string(), "op_b".to_string(), "op_c".to_string()]);
}

/// Running the same job twice, byte for byte, produces identical
/// `1_ir.json` / `2_intents.json` / `3_payloads_raw.json` artifacts — the
/// round-trip/idempotence law spec.md §8 states alongside the six worked
/// scenarios.
#[test]
fn repeated_runs_produce_byte_identical_artifacts() {
    let request = GenerationRequest {
        spec_payload: SCENARIO_A_DOC.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: Vec::new(),
        llm_config: None,
    };
    let first_dir = tempfile::tempdir().expect("tempdir");
    let first_store = FileSystemArtifactStore::new(first_dir.path());
    let _first_outcome = run_job(&request, &NoOpProvider, &first_store);
    let second_dir = tempfile::tempdir().expect("tempdir");
    let second_store = FileSystemArtifactStore::new(second_dir.path());
    let _second_outcome = run_job(&request, &NoOpProvider, &second_store);
    for name in ["1_ir.json", "2_intents.json", "3_payloads_raw.json"] {
        assert_eq!(first_store.get("scenario", name).expect("first"), second_store.get("scenario", name).expect("second"));
    }
}

/// Boundary behavior: an empty `target_intents` selection still yields
/// `HAPPY_PATH`, and an operation with no required fields never emits
/// `REQUIRED_FIELD_MISSING`.
#[test]
fn boundary_empty_allow_list_and_no_required_fields() {
    let doc = r#"{
        "info": {"title": "Widgets", "version": "1.0"},
        "paths": {"/widgets": {"post": {
            "operationId": "create_widget",
            "requestBody": {"content": {"application/json": {"schema": {
                "type": "object",
                "properties": {"label": {"type": "string"}},
                "required": []
            }}}},
            "responses": {"201": {}}
        }}}
    }"#;
    let request = GenerationRequest {
        spec_payload: doc.to_string(),
        source_dialect: SourceDialect::HttpContract,
        target_framework: TargetFramework::HttpSync,
        base_url: Some("https://api.example.com".to_string()),
        target_intents: vec![IntentId::EnumMismatch],
        llm_config: None,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSystemArtifactStore::new(dir.path());
    let _outcome = run_job(&request, &NoOpProvider, &store);
    let intents: Vec<OperationIntents> = read_json(&store, "2_intents.json");
    let ids = intents_for(&intents, "create_widget");
    assert_eq!(ids, vec![IntentId::HappyPath]);
    assert!(!ids.contains(&IntentId::RequiredFieldMissing));
}
