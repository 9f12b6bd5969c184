// crates/testgen-config/src/circuit_breaker.rs
// ============================================================================
// Module: Circuit Breaker Configuration
// Description: Tunables for the LLM enhancer's circuit breaker.
// Purpose: Keep the breaker's failure threshold and cooldown configurable
//          without the breaker itself depending on a config-parsing crate.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;

/// Circuit breaker tunables (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures required to open the breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Cooldown, in milliseconds, before an open breaker half-opens.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: default_failure_threshold(), cooldown_ms: default_cooldown_ms() }
    }
}

impl CircuitBreakerConfig {
    /// Validates the threshold and cooldown are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `failure_threshold` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid("circuit_breaker.failure_threshold must be at least 1".to_string()));
        }
        Ok(())
    }
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_cooldown_ms() -> u64 {
    30_000
}
