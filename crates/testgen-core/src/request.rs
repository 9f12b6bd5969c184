// crates/testgen-core/src/request.rs
// ============================================================================
// Module: Generation Request Contract
// Description: The abstract request shape a transport-agnostic caller sends
//              to start a generation job, plus the dialect/framework enums.
// Purpose: Give every stage and the pipeline driver one shared request type
//          (spec.md §6, "Generation request").
// Dependencies: crate::intent_id, serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::intent_id::IntentId;

/// A generation job request (spec.md §6). Transport-agnostic: HTTP, a CLI
/// flag set, or an in-process call all construct the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Source specification text, base64-encoded on the wire; callers in
    /// this crate's Rust API pass already-decoded text.
    pub spec_payload: String,
    /// Which parser should read `spec_payload`.
    pub source_dialect: SourceDialect,
    /// Which renderer should produce output text.
    pub target_framework: TargetFramework,
    /// Base URL substituted literally into HTTP-target renders.
    pub base_url: Option<String>,
    /// Allow-list of intent ids to emit. `HAPPY_PATH` is always emitted
    /// regardless of this list (spec.md §4.2, "Filtering").
    pub target_intents: Vec<IntentId>,
    /// Optional LLM enhancement configuration.
    pub llm_config: Option<LlmConfig>,
}

/// The three accepted source dialects (spec.md §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceDialect {
    /// A structured HTTP API contract document.
    HttpContract,
    /// A dynamically-typed function source file.
    DynamicSource,
    /// A statically-typed function source file.
    TypedSource,
}

/// The three target rendering frameworks (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetFramework {
    /// Synchronous-style HTTP test cases.
    HttpSync,
    /// Async-style HTTP test cases.
    HttpAsync,
    /// Direct function-call test cases.
    FunctionDirect,
}

/// LLM enhancement configuration (spec.md §6, §4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Configuration for the payload-enhancement stage.
    pub payload_enhancement: Option<LlmEndpointConfig>,
    /// Configuration for a future test-enhancement stage (reserved; payload
    /// enhancement is the only enhancement stage this engine implements
    /// today, per spec.md §4.9's scope).
    pub test_enhancement: Option<LlmEndpointConfig>,
}

/// A single provider/model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmEndpointConfig {
    /// Provider identifier (opaque to this crate; resolved by `testgen-llm`
    /// callers).
    pub provider: String,
    /// Model identifier.
    pub model: String,
}
