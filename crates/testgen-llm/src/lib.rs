// crates/testgen-llm/src/lib.rs
// ============================================================================
// Module: LLM Enhancer Library
// Description: Optional payload enrichment behind a circuit breaker
//              (spec.md §4.9).
// Purpose: Let the pipeline driver enrich HAPPY_PATH payloads' placeholder
//          strings through an abstract provider boundary, with the provider
//          never on the critical path for correctness.
// Dependencies: testgen-core, testgen-payload, testgen-config, serde_json
// ============================================================================

//! ## Overview
//! This crate is a decoration stage (spec.md §9, "LLM policy isolation"):
//! [`enhance_payloads`] always returns a full payload list, falling back to
//! the unmodified input for any payload whose enhancement attempt failed or
//! was never applicable. Three collaborating pieces make that safe:
//! - [`provider::LlmProvider`] — the abstract text-in/text-out boundary; no
//!   concrete network provider ships, since credential management is out of
//!   scope (spec.md §1), but [`provider::NoOpProvider`] gives "disabled" a
//!   real code path.
//! - [`circuit_breaker::CircuitBreaker`] — opens after a run of consecutive
//!   provider failures and half-opens after a cooldown (spec.md §4.9).
//! - [`validate::validate`] — the structural acceptance gate a candidate
//!   must pass before it replaces a payload's placeholder body (spec.md
//!   §8 property 5).
//!
//! ## Index
//! - [`provider::LlmProvider`], [`provider::LlmRequest`], [`provider::ProviderError`]
//! - [`circuit_breaker::CircuitBreaker`], [`circuit_breaker::BreakerState`]
//! - [`enhancer::enhance_payloads`], [`enhancer::EnhancementOutcome`]

pub mod circuit_breaker;
pub mod enhancer;
pub mod provider;
pub mod validate;

pub use circuit_breaker::BreakerState;
pub use circuit_breaker::CircuitBreaker;
pub use enhancer::EnhancementOutcome;
pub use enhancer::EnhancementRecord;
pub use enhancer::enhance_payloads;
pub use provider::LlmProvider;
pub use provider::LlmRequest;
pub use provider::NoOpProvider;
pub use provider::ProviderError;
pub use validate::validate;
