// crates/testgen-llm/src/provider.rs
// ============================================================================
// Module: LLM Provider Boundary
// Description: The abstract text-in/text-out capability the enhancer calls
//              through (spec.md §1, §4.9).
// Purpose: Keep the circuit breaker and retry/backoff logic provider-
//          agnostic; credential management and concrete network transports
//          are out of scope (spec.md §1).
// Dependencies: none
// ============================================================================

use thiserror::Error;

/// One enhancement request sent to a provider: a rendered prompt describing
/// the schema and the placeholder payload to enrich.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRequest {
    /// The provider/model selection the caller configured.
    pub provider: String,
    /// The model identifier the caller configured.
    pub model: String,
    /// The rendered prompt text (schema description plus the
    /// placeholder-bearing payload, serialized as JSON).
    pub prompt: String,
}

/// Errors a provider call can raise. These are absorbed locally by the
/// enhancer (spec.md §7: "Provider errors... absorbed locally") and never
/// propagate past [`crate::enhancer::enhance_payloads`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No provider is configured; callers get this from [`NoOpProvider`].
    #[error("no llm provider configured")]
    NotConfigured,
    /// The call exceeded its per-call timeout.
    #[error("llm provider call timed out")]
    Timeout,
    /// The provider rejected the request or failed transport-side.
    #[error("llm provider unavailable: {0}")]
    Unavailable(String),
}

/// The abstract capability an LLM provider exposes: text in, text out
/// (spec.md §1). Concrete network providers (and their credential handling)
/// are out of scope; this trait is the seam a caller's own provider
/// adapter implements.
pub trait LlmProvider: Send + Sync {
    /// Sends `request` and returns the provider's raw text completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the provider is unreachable, times
    /// out, or otherwise cannot produce a completion. Implementations must
    /// not panic on malformed input; the enhancer treats any `Err` as a
    /// transient failure subject to retry and the circuit breaker.
    fn complete(&self, request: &LlmRequest) -> Result<String, ProviderError>;
}

/// A provider that always reports [`ProviderError::NotConfigured`]. This is
/// the default when a [`testgen_core::LlmConfig`]'s endpoint is absent,
/// keeping "LLM disabled" a real, independently testable code path rather
/// than an `Option<Box<dyn LlmProvider>>` special case threaded through
/// every call site.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProvider;

impl LlmProvider for NoOpProvider {
    fn complete(&self, _request: &LlmRequest) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}
