// crates/testgen-cli/src/main.rs
// ============================================================================
// Module: Generation CLI
// Description: CLI entrypoint for the test-generation pipeline.
// Purpose: Render a specification's test suite to disk, or verify existing
//          output has not drifted from a fresh render.
// Dependencies: clap, testgen-cli, testgen-config
// ============================================================================

//! ## Overview
//! Two subcommands: `generate` renders a specification's test suite and
//! pipeline artifacts to `--out`; `check` re-renders into a scratch
//! directory and fails if the result differs from what is already on disk.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use testgen_cli::pipeline::progress::LogSink;
use testgen_cli::pipeline::store::ArtifactStore;
use testgen_cli::pipeline::store::FileSystemArtifactStore;
use testgen_cli::pipeline::store::StoreError;
use testgen_cli::PipelineError;
use testgen_config::ConfigError;
use testgen_config::PipelineConfig;
use testgen_core::GenerationRequest;
use testgen_core::SourceDialect;
use testgen_core::TargetFramework;
use testgen_llm::CircuitBreaker;
use testgen_llm::NoOpProvider;
use thiserror::Error;

/// CLI arguments for the generation pipeline.
#[derive(Debug, Parser)]
#[command(name = "testgen", about = "Generate a deterministic test suite from an API or source specification.")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a test suite and pipeline artifacts.
    Generate {
        /// Flags shared between `generate` and `check`.
        #[command(flatten)]
        args: GenerateArgs,
    },
    /// Verify a previous `generate` run's output has not drifted.
    Check {
        /// Flags shared between `generate` and `check`.
        #[command(flatten)]
        args: GenerateArgs,
    },
}

/// Flags common to both subcommands.
#[derive(Debug, Clone, clap::Args)]
struct GenerateArgs {
    /// Path to the source specification file.
    #[arg(long, value_name = "FILE")]
    spec: PathBuf,
    /// Which parser reads the specification.
    #[arg(long, value_enum, default_value_t = DialectArg::HttpContract)]
    dialect: DialectArg,
    /// Which renderer produces the output test files.
    #[arg(long, value_enum, default_value_t = FrameworkArg::HttpSync)]
    target: FrameworkArg,
    /// Base URL substituted into HTTP-target renders.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Job identifier the artifacts are grouped under. Defaults to the
    /// specification file's stem, keeping a given spec's output path stable
    /// across runs.
    #[arg(long, value_name = "ID")]
    job_id: Option<String>,
    /// Directory artifacts are persisted under.
    #[arg(long, value_name = "DIR", default_value = "testgen-artifacts")]
    out: PathBuf,
    /// Path to a `testgen.toml` configuration file; falls back to
    /// [`testgen_config::PipelineConfig`]'s own resolution rules when
    /// absent.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// `clap`-facing mirror of [`SourceDialect`] (`testgen-core` does not
/// depend on `clap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    /// An HTTP contract document.
    HttpContract,
    /// A dynamically-typed function source file.
    DynamicSource,
    /// A statically-typed function source file.
    TypedSource,
}

impl From<DialectArg> for SourceDialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::HttpContract => Self::HttpContract,
            DialectArg::DynamicSource => Self::DynamicSource,
            DialectArg::TypedSource => Self::TypedSource,
        }
    }
}

impl std::fmt::Display for DialectArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::HttpContract => "http-contract",
            Self::DynamicSource => "dynamic-source",
            Self::TypedSource => "typed-source",
        };
        f.write_str(text)
    }
}

/// `clap`-facing mirror of [`TargetFramework`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FrameworkArg {
    /// Synchronous-style HTTP test cases.
    HttpSync,
    /// Async-style HTTP test cases.
    HttpAsync,
    /// Direct function-call test cases.
    FunctionDirect,
}

impl From<FrameworkArg> for TargetFramework {
    fn from(value: FrameworkArg) -> Self {
        match value {
            FrameworkArg::HttpSync => Self::HttpSync,
            FrameworkArg::HttpAsync => Self::HttpAsync,
            FrameworkArg::FunctionDirect => Self::FunctionDirect,
        }
    }
}

impl std::fmt::Display for FrameworkArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::HttpSync => "http-sync",
            Self::HttpAsync => "http-async",
            Self::FunctionDirect => "function-direct",
        };
        f.write_str(text)
    }
}

/// Errors the CLI surfaces to its caller.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The specification file could not be read.
    #[error("io error: {0}")]
    Io(String),
    /// A pipeline stage failed.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    /// `check` found on-disk output that does not match a fresh render.
    #[error("drift detected: {0}")]
    Drift(String),
}

/// CLI entrypoint.
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

/// Dispatches the CLI command.
fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate { args } => generate(&args),
        Command::Check { args } => check(&args),
    }
}

/// Loads configuration, builds a [`GenerationRequest`] from `args`, and
/// resolves the job id.
fn prepare(args: &GenerateArgs) -> Result<(PipelineConfig, GenerationRequest, String), CliError> {
    let config = PipelineConfig::load(args.config.as_deref())?;
    let spec_payload = fs::read_to_string(&args.spec).map_err(|err| CliError::Io(err.to_string()))?;
    let job_id = args.job_id.clone().unwrap_or_else(|| {
        args.spec.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_else(|| "job".to_string())
    });
    let request = GenerationRequest {
        spec_payload,
        source_dialect: args.dialect.into(),
        target_framework: args.target.into(),
        base_url: args.base_url.clone(),
        target_intents: config.target_intents.clone(),
        llm_config: None,
    };
    Ok((config, request, job_id))
}

/// Runs a job against a given artifact store, returning the outcome.
fn run_job(request: &GenerationRequest, job_id: &str, store: &dyn ArtifactStore) -> Result<testgen_cli::JobOutcome, CliError> {
    let provider = NoOpProvider;
    let breaker = CircuitBreaker::new(testgen_config::CircuitBreakerConfig::default());
    let retry = testgen_config::RetryConfig::default();
    let sink = LogSink::new(std::io::stderr());
    testgen_cli::run(job_id, request, &provider, &breaker, &retry, store, &sink).map_err(CliError::from)
}

/// Renders a specification's test suite and artifacts to `args.out`.
fn generate(args: &GenerateArgs) -> Result<(), CliError> {
    let (_config, request, job_id) = prepare(args)?;
    let store = FileSystemArtifactStore::new(&args.out);
    let outcome = run_job(&request, &job_id, &store)?;
    report_outcome(&job_id, &outcome);
    Ok(())
}

/// Re-renders a specification into a scratch directory and verifies it
/// matches the artifacts already persisted under `args.out`.
fn check(args: &GenerateArgs) -> Result<(), CliError> {
    let (_config, request, job_id) = prepare(args)?;
    let scratch = tempfile::tempdir().map_err(|err| CliError::Io(err.to_string()))?;
    let fresh_store = FileSystemArtifactStore::new(scratch.path());
    let outcome = run_job(&request, &job_id, &fresh_store)?;

    let existing_store = FileSystemArtifactStore::new(&args.out);
    for operation_id in &outcome.rendered_operations {
        let artifact_name = format!("tests/{operation_id}.py");
        let fresh = fresh_store.get(&job_id, &artifact_name).map_err(|err| CliError::Io(err.to_string()))?;
        match existing_store.get(&job_id, &artifact_name) {
            Ok(existing) if existing == fresh => {}
            Ok(_) => return Err(CliError::Drift(format!("{artifact_name} differs from a fresh render"))),
            Err(StoreError::NotFound(_)) => return Err(CliError::Drift(format!("{artifact_name} is missing; run `testgen generate` first"))),
            Err(err) => return Err(CliError::Io(err.to_string())),
        }
    }
    report_outcome(&job_id, &outcome);
    Ok(())
}

/// Writes a one-line human-readable summary of a completed job to stdout.
fn report_outcome(job_id: &str, outcome: &testgen_cli::JobOutcome) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "job {job_id}: rendered {} operation(s), {} failed", outcome.rendered_operations.len(), outcome.failed_operations.len());
    for failure in &outcome.failed_operations {
        let _ = writeln!(stdout, "  {}: {}", failure.operation_id, failure.error);
    }
}

/// Reports a CLI error to stderr.
fn report_error(err: &CliError) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{err}");
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_arg_round_trips_through_its_display_form() {
        assert_eq!(DialectArg::HttpContract.to_string(), "http-contract");
        assert_eq!(SourceDialect::from(DialectArg::TypedSource), SourceDialect::TypedSource);
    }

    #[test]
    fn framework_arg_round_trips_through_its_display_form() {
        assert_eq!(FrameworkArg::FunctionDirect.to_string(), "function-direct");
        assert_eq!(TargetFramework::from(FrameworkArg::HttpAsync), TargetFramework::HttpAsync);
    }

    #[test]
    fn cli_parses_generate_with_defaults() {
        let cli = Cli::parse_from(["testgen", "generate", "--spec", "spec.json"]);
        let Command::Generate { args } = cli.command else { panic!("expected generate") };
        assert_eq!(args.dialect, DialectArg::HttpContract);
        assert_eq!(args.target, FrameworkArg::HttpSync);
    }
}
