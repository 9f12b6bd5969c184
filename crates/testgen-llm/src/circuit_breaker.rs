// crates/testgen-llm/src/circuit_breaker.rs
// ============================================================================
// Module: Circuit Breaker
// Description: Consecutive-failure-counting breaker guarding LLM provider
//              calls (spec.md §4.9).
// Purpose: Stop issuing provider calls after a run of consecutive failures,
//          and recover automatically once a cooldown elapses.
// Dependencies: testgen-config, std::sync, std::time
// ============================================================================

//! ## Overview
//! [`CircuitBreaker`] is a classic three-state breaker (closed, open,
//! half-open) keyed by nothing but its own internal counters: one breaker
//! instance corresponds to one provider, per spec.md §4.9 ("A circuit
//! breaker tracks consecutive failures per provider"). State lives behind a
//! `Mutex` because the design notes (spec.md §5, "Shared resources") call
//! out the breaker as one of the few objects shared across a job's
//! parallel per-operation work and across jobs.

use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use testgen_config::CircuitBreakerConfig;

/// The breaker's externally observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls are permitted; failures are being counted.
    Closed,
    /// Calls are rejected without reaching the provider.
    Open,
    /// Cooldown elapsed; exactly one trial call is permitted to decide
    /// whether to close or re-open.
    HalfOpen,
}

/// Tracks consecutive provider-call failures and gates calls accordingly
/// (spec.md §4.9).
///
/// # Invariants
/// - Opens after `config.failure_threshold` consecutive failures.
/// - Stays open for at least `config.cooldown_ms` before allowing a trial
///   half-open call.
/// - A successful call closes the breaker and resets the failure count.
pub struct CircuitBreaker {
    /// Tunable threshold and cooldown.
    config: CircuitBreakerConfig,
    /// Mutable breaker state, locked for the duration of each call.
    inner: Mutex<Inner>,
}

/// Mutable breaker state guarded by [`CircuitBreaker::inner`]'s mutex.
struct Inner {
    /// Consecutive failures observed since the last success or re-open.
    consecutive_failures: u32,
    /// The breaker's current raw state.
    state: RawState,
}

/// Internal state representation, distinct from [`BreakerState`] so `Open`
/// can carry the instant it opened without exposing that detail publicly.
#[derive(Clone, Copy)]
enum RawState {
    /// Calls are permitted.
    Closed,
    /// Calls are rejected until `opened_at + cooldown` elapses.
    Open {
        /// When the breaker opened.
        opened_at: Instant,
    },
    /// Cooldown elapsed; the next call is a trial.
    HalfOpen,
}

impl CircuitBreaker {
    /// Builds a breaker in the closed state.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config, inner: Mutex::new(Inner { consecutive_failures: 0, state: RawState::Closed }) }
    }

    /// Returns whether a call may proceed right now, advancing an expired
    /// `Open` state to `HalfOpen` as a side effect (spec.md §4.9: "The
    /// breaker half-opens after a cooldown").
    #[must_use]
    pub fn allow_call(&self) -> bool {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            RawState::Closed | RawState::HalfOpen => true,
            RawState::Open { opened_at } => {
                if opened_at.elapsed() >= Duration::from_millis(self.config.cooldown_ms) {
                    inner.state = RawState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records a successful call: closes the breaker and resets the
    /// consecutive-failure count.
    pub fn record_success(&self) {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        let mut inner = self.inner.lock().unwrap();
        inner.consecutive_failures = 0;
        inner.state = RawState::Closed;
    }

    /// Records a failed call, opening the breaker once
    /// `config.failure_threshold` consecutive failures accrue. A failure
    /// observed while half-open re-opens immediately, regardless of the
    /// threshold, since the trial call already used its one chance.
    pub fn record_failure(&self) {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        let mut inner = self.inner.lock().unwrap();
        if matches!(inner.state, RawState::HalfOpen) {
            inner.state = RawState::Open { opened_at: Instant::now() };
            inner.consecutive_failures = self.config.failure_threshold;
            return;
        }
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        if inner.consecutive_failures >= self.config.failure_threshold {
            inner.state = RawState::Open { opened_at: Instant::now() };
        }
    }

    /// Returns the breaker's current externally observable state.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a panicking holder; this crate never panics while holding the lock")]
        let inner = self.inner.lock().unwrap();
        match inner.state {
            RawState::Closed => BreakerState::Closed,
            RawState::Open { .. } => BreakerState::Open,
            RawState::HalfOpen => BreakerState::HalfOpen,
        }
    }
}
