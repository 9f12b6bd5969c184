// crates/testgen-config/src/lib.rs
// ============================================================================
// Module: Test Generation Configuration Library
// Description: Strict, fail-closed configuration loading for the generation
//              pipeline.
// Purpose: Resolve a `PipelineConfig` from a TOML file (or defaults) with
//          hard size limits and explicit validation errors, mirroring the
//          posture every untrusted-input entry point in this codebase takes.
// Dependencies: testgen-core, serde, toml, thiserror
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a strict size limit.
//! Missing or invalid configuration fails closed: [`PipelineConfig::load`]
//! never silently falls back to defaults for a file that fails to parse or
//! validate, only for a file that is entirely absent and no path was
//! explicitly requested.
//!
//! Security posture: configuration is untrusted input (it is frequently
//! checked into a repository alongside specs of unknown provenance); this
//! crate never executes or interprets config values beyond the fields it
//! declares.

pub mod circuit_breaker;
pub mod config;

pub use circuit_breaker::CircuitBreakerConfig;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::MAX_CONFIG_FILE_SIZE;
pub use config::PipelineConfig;
pub use config::RenderConfig;
pub use config::RetryConfig;
