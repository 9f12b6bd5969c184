// crates/testgen-llm/src/enhancer.rs
// ============================================================================
// Module: Payload Enhancer
// Description: Drives one HAPPY_PATH payload through a provider call with
//              retry/backoff and the circuit breaker, falling back to the
//              original payload on any failure (spec.md §4.9).
// Purpose: The crate's single entry point the pipeline driver calls once
//          per operation's payload list.
// Dependencies: testgen-core, testgen-payload, testgen-config, serde_json
// ============================================================================

//! ## Overview
//! [`enhance_payloads`] is the only function `testgen-cli`'s pipeline driver
//! calls. It walks `payloads` in order, enhancing every `HAPPY_PATH` entry
//! that has a body and leaving every other payload untouched — negative
//! payloads are never sent to a provider (spec.md §4.9: "Operates only on
//! `HAPPY_PATH` payloads"). Enhancement never changes `intent_id`,
//! `expected_outcome`, or any field but `body`, so a caller diffing
//! `3_payloads_raw.json` against `3_payloads_enhanced.json` sees only
//! value-level changes (spec.md §9, "LLM policy isolation").

use std::thread;
use std::time::Duration;

use serde_json::Value;
use testgen_config::RetryConfig;
use testgen_core::IntentId;
use testgen_core::Operation;
use testgen_core::TypeDecl;
use testgen_payload::Payload;

use crate::circuit_breaker::CircuitBreaker;
use crate::provider::LlmProvider;
use crate::provider::LlmRequest;
use crate::validate::validate;

/// What happened when the enhancer considered one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhancementOutcome {
    /// Not a `HAPPY_PATH` payload, or the operation has no body: the
    /// enhancer never attempted a call.
    NotApplicable,
    /// The provider returned a candidate that passed validation.
    Enhanced,
    /// The circuit breaker was open; no call was attempted.
    BreakerOpen,
    /// Every retry attempt failed at the provider/transport level.
    ProviderFailed,
    /// The provider responded, but the candidate failed structural
    /// validation (spec.md §6: `LLMPolicyViolation`, "logged, not fatal").
    ValidationRejected,
}

/// One payload's enhancement result, for the pipeline driver's progress log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancementRecord {
    /// The owning operation's id.
    pub operation_id: String,
    /// What happened.
    pub outcome: EnhancementOutcome,
}

/// Enhances every applicable `HAPPY_PATH` payload in `payloads`, returning
/// the (possibly unchanged) payload list in the same order plus one
/// [`EnhancementRecord`] per payload considered.
///
/// `op` and `types` resolve the body schema `validate` checks the
/// provider's candidate against. `endpoint` names the provider/model pair a
/// concrete [`LlmProvider`] implementation is free to ignore or honor.
#[must_use]
pub fn enhance_payloads(
    op: &Operation,
    types: &[TypeDecl],
    payloads: &[Payload],
    endpoint: &testgen_core::LlmEndpointConfig,
    provider: &dyn LlmProvider,
    breaker: &CircuitBreaker,
    retry: &RetryConfig,
) -> (Vec<Payload>, Vec<EnhancementRecord>) {
    let mut enhanced = Vec::with_capacity(payloads.len());
    let mut records = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let (result, outcome) = enhance_one(op, types, payload, endpoint, provider, breaker, retry);
        records.push(EnhancementRecord { operation_id: op.id.clone(), outcome });
        enhanced.push(result);
    }
    (enhanced, records)
}

/// Enhances a single payload; see [`enhance_payloads`].
fn enhance_one(
    op: &Operation,
    types: &[TypeDecl],
    payload: &Payload,
    endpoint: &testgen_core::LlmEndpointConfig,
    provider: &dyn LlmProvider,
    breaker: &CircuitBreaker,
    retry: &RetryConfig,
) -> (Payload, EnhancementOutcome) {
    if payload.intent_id != IntentId::HappyPath {
        return (payload.clone(), EnhancementOutcome::NotApplicable);
    }
    let (Some(body_schema), Some(original)) = (op.body.as_ref().map(|p| &p.schema), payload.body.as_ref()) else {
        return (payload.clone(), EnhancementOutcome::NotApplicable);
    };

    let prompt = render_prompt(body_schema, original);
    let mut attempt = 1;
    loop {
        if !breaker.allow_call() {
            return (payload.clone(), EnhancementOutcome::BreakerOpen);
        }
        let request = LlmRequest { provider: endpoint.provider.clone(), model: endpoint.model.clone(), prompt: prompt.clone() };
        match provider.complete(&request) {
            Ok(text) => {
                return match serde_json::from_str::<Value>(&text) {
                    Ok(candidate) if validate(original, &candidate, body_schema, types) => {
                        breaker.record_success();
                        let mut accepted = payload.clone();
                        accepted.body = Some(candidate);
                        (accepted, EnhancementOutcome::Enhanced)
                    }
                    // Validation rejection never touches the breaker.
                    _ => (payload.clone(), EnhancementOutcome::ValidationRejected),
                };
            }
            Err(_) => {
                breaker.record_failure();
                if attempt >= retry.max_attempts {
                    return (payload.clone(), EnhancementOutcome::ProviderFailed);
                }
                let backoff = retry.backoff_base_ms.saturating_mul(1_u64 << (attempt - 1));
                thread::sleep(Duration::from_millis(backoff));
                attempt += 1;
            }
        }
    }
}

/// Renders the schema + placeholder-payload prompt sent to the provider.
/// Text-in/text-out per spec.md §1; the exact prose is not normative, only
/// that it carries both the schema shape and the current payload.
fn render_prompt(schema: &testgen_core::Schema, payload: &Value) -> String {
    let schema_json = serde_json::to_string(schema).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Fill in realistic values for every placeholder field in this payload. \
         Preserve every key and every value's JSON type exactly. \
         Schema: {schema_json}\nPayload: {payload}"
    )
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use indexmap::IndexSet;
    use serde_json::json;
    use testgen_config::CircuitBreakerConfig;
    use testgen_core::HttpMethod;
    use testgen_core::NumericConstraints;
    use testgen_core::ObjectConstraints;
    use testgen_core::OperationKind;
    use testgen_core::Parameter;
    use testgen_core::Response;
    use testgen_core::Schema;
    use testgen_core::StringConstraints;
    use testgen_intent::ExpectedOutcome;

    use super::*;
    use crate::provider::ProviderError;

    fn scenario_d_operation() -> Operation {
        let mut properties = IndexMap::new();
        properties.insert("email".to_string(), Schema::String { constraints: StringConstraints::default() });
        properties.insert("age".to_string(), Schema::Integer { constraints: NumericConstraints::default() });
        let required: IndexSet<String> = ["email".to_string(), "age".to_string()].into_iter().collect();
        Operation {
            id: "create_user".to_string(),
            kind: OperationKind::Http { method: HttpMethod::Post, path: "/users".to_string() },
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: Some(Parameter {
                name: "body".to_string(),
                required: true,
                schema: Schema::Object { properties, required, additional_allowed: true, constraints: ObjectConstraints::default() },
            }),
            successes: vec![Response { status: 201, schema: Schema::Any }],
            errors: Vec::new(),
            description: String::new(),
            metadata: IndexMap::new(),
        }
    }

    fn happy_payload() -> Payload {
        Payload {
            operation_id: "create_user".to_string(),
            intent_id: IntentId::HappyPath,
            target_field: None,
            body: Some(json!({"email": "__PLACEHOLDER_STRING_email__", "age": 0})),
            path_params: IndexMap::new(),
            query_params: IndexMap::new(),
            headers: IndexMap::new(),
            expected_outcome: ExpectedOutcome::HttpStatus(201),
            description: "happy path".to_string(),
        }
    }

    fn endpoint() -> testgen_core::LlmEndpointConfig {
        testgen_core::LlmEndpointConfig { provider: "test".to_string(), model: "test-model".to_string() }
    }

    fn retry_no_delay() -> RetryConfig {
        RetryConfig { backoff_base_ms: 1, max_attempts: 2 }
    }

    struct ScriptedProvider(std::sync::Mutex<std::collections::VecDeque<Result<String, ProviderError>>>);

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
            Self(std::sync::Mutex::new(responses.into()))
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn complete(&self, _request: &LlmRequest) -> Result<String, ProviderError> {
            #[expect(clippy::unwrap_used, reason = "test double, single-threaded call sequence")]
            self.0.lock().unwrap().pop_front().unwrap_or(Err(ProviderError::Unavailable("exhausted".to_string())))
        }
    }

    #[test]
    fn scenario_d_accepted_candidate_replaces_body_verbatim() {
        let op = scenario_d_operation();
        let provider = ScriptedProvider::new(vec![Ok(json!({"email": "alice@example.com", "age": 28}).to_string())]);
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let (result, outcome) = enhance_one(&op, &[], &happy_payload(), &endpoint(), &provider, &breaker, &retry_no_delay());
        assert_eq!(outcome, EnhancementOutcome::Enhanced);
        assert_eq!(result.body, Some(json!({"email": "alice@example.com", "age": 28})));
    }

    #[test]
    fn scenario_d_missing_key_falls_back_to_original_placeholder_payload() {
        let op = scenario_d_operation();
        let provider = ScriptedProvider::new(vec![Ok(json!({"email": "alice@example.com"}).to_string())]);
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let (result, outcome) = enhance_one(&op, &[], &happy_payload(), &endpoint(), &provider, &breaker, &retry_no_delay());
        assert_eq!(outcome, EnhancementOutcome::ValidationRejected);
        assert_eq!(result.body, happy_payload().body);
    }

    #[test]
    fn non_happy_path_payloads_are_never_sent_to_the_provider() {
        let op = scenario_d_operation();
        let provider = ScriptedProvider::new(vec![]);
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let mut negative = happy_payload();
        negative.intent_id = IntentId::RequiredFieldMissing;
        let (result, outcome) = enhance_one(&op, &[], &negative, &endpoint(), &provider, &breaker, &retry_no_delay());
        assert_eq!(outcome, EnhancementOutcome::NotApplicable);
        assert_eq!(result.body, negative.body);
    }

    #[test]
    fn provider_failure_retries_then_falls_back() {
        let op = scenario_d_operation();
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Timeout), Err(ProviderError::Timeout)]);
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
        let (result, outcome) = enhance_one(&op, &[], &happy_payload(), &endpoint(), &provider, &breaker, &retry_no_delay());
        assert_eq!(outcome, EnhancementOutcome::ProviderFailed);
        assert_eq!(result.body, happy_payload().body);
    }

    #[test]
    fn open_breaker_short_circuits_without_calling_provider() {
        let op = scenario_d_operation();
        let provider = ScriptedProvider::new(vec![]);
        let breaker = CircuitBreaker::new(CircuitBreakerConfig { failure_threshold: 1, cooldown_ms: 60_000 });
        breaker.record_failure();
        let (result, outcome) = enhance_one(&op, &[], &happy_payload(), &endpoint(), &provider, &breaker, &retry_no_delay());
        assert_eq!(outcome, EnhancementOutcome::BreakerOpen);
        assert_eq!(result.body, happy_payload().body);
    }
}
