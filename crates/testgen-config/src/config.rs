// crates/testgen-config/src/config.rs
// ============================================================================
// Module: Pipeline Configuration
// Description: On-disk/env configuration loading and validation.
// Purpose: Provide the defaults and overrides for dialect, target framework,
//          intent allow-list, and LLM settings that back a GenerationRequest
//          when the caller is the CLI rather than an in-process API user.
// Dependencies: testgen-core, serde, toml
// ============================================================================

//! ## Overview
//! [`PipelineConfig`] is loaded from a TOML file with strict size and path
//! limits. Missing or invalid configuration fails closed.
//! Security posture: config inputs are untrusted; this crate never executes
//! or interprets config values as anything but the declared fields.

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use testgen_core::IntentId;
use testgen_core::SourceDialect;
use testgen_core::TargetFramework;
use thiserror::Error;

use crate::circuit_breaker::CircuitBreakerConfig;

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "testgen.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TESTGEN_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO failure while reading the config file.
    #[error("io error: {0}")]
    Io(String),
    /// TOML parsing failure.
    #[error("parse error: {0}")]
    Parse(String),
    /// Configuration failed a validation rule.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level pipeline configuration.
///
/// # Invariants
/// - [`PipelineConfig::load`] never returns a config that fails
///   [`PipelineConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Default source dialect when a caller does not specify one.
    #[serde(default = "default_dialect")]
    pub default_dialect: SourceDialect,
    /// Default target framework when a caller does not specify one.
    #[serde(default = "default_framework")]
    pub default_framework: TargetFramework,
    /// Allow-list of intent ids to emit. Empty means "every catalog entry".
    #[serde(default)]
    pub target_intents: Vec<IntentId>,
    /// Rendering options.
    #[serde(default)]
    pub render: RenderConfig,
    /// LLM retry/backoff and circuit-breaker configuration.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry/backoff configuration for LLM provider calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Directory artifacts are persisted under.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_dialect: default_dialect(),
            default_framework: default_framework(),
            target_intents: Vec::new(),
            render: RenderConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

/// Rendering-specific options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Whether rendered files carry the "generated, do not edit" header
    /// (spec.md §4.8). Always `true` in practice; exposed for test
    /// fixtures that need to compare bodies without the header.
    #[serde(default = "default_true")]
    pub emit_header: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { emit_header: true }
    }
}

/// Exponential backoff configuration for LLM provider calls (spec.md §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Backoff base duration in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Maximum number of attempts (including the first) before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { backoff_base_ms: default_backoff_base_ms(), max_attempts: default_max_attempts() }
    }
}

impl RetryConfig {
    /// Validates backoff and attempt bounds are sane.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()));
        }
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::Invalid("retry.backoff_base_ms must be positive".to_string()));
        }
        Ok(())
    }
}

const fn default_dialect() -> SourceDialect {
    SourceDialect::HttpContract
}

const fn default_framework() -> TargetFramework {
    TargetFramework::HttpSync
}

const fn default_true() -> bool {
    true
}

const fn default_backoff_base_ms() -> u64 {
    2_000
}

const fn default_max_attempts() -> u32 {
    3
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("testgen-artifacts")
}

impl PipelineConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path`, else [`CONFIG_ENV_VAR`], else `testgen.toml` in
    /// the current directory, else built-in defaults if nothing is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present config file fails to read,
    /// parse, or validate. Absence of any config source is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path) else {
            return Ok(Self::default());
        };
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when configuration is inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()?;
        self.circuit_breaker.validate()?;
        if self.artifact_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("artifact_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Resolves the config file path to load, if any: an explicit path, then
/// [`CONFIG_ENV_VAR`], then `testgen.toml` in the current directory if it
/// exists. Returns `None` when nothing resolves, signaling "use defaults".
fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(from_env) = env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(from_env));
    }
    let default_path = PathBuf::from(DEFAULT_CONFIG_NAME);
    if default_path.exists() { Some(default_path) } else { None }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config = PipelineConfig::load(Some(Path::new("/nonexistent/testgen.toml")));
        assert!(matches!(config, Err(ConfigError::Io(_))));
    }

    #[test]
    fn absent_path_yields_defaults_when_no_config_file_or_env_var_is_set() {
        if env::var_os(CONFIG_ENV_VAR).is_some() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let previous = env::current_dir().expect("cwd");
        env::set_current_dir(dir.path()).expect("chdir");
        let config = PipelineConfig::load(None);
        env::set_current_dir(previous).expect("restore cwd");
        assert_eq!(config.expect("default config"), PipelineConfig::default());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let oversized = vec![b'a'; MAX_CONFIG_FILE_SIZE + 1];
        file.write_all(&oversized).expect("write");
        let result = PipelineConfig::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let config = PipelineConfig { retry: RetryConfig { backoff_base_ms: 100, max_attempts: 0 }, ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
