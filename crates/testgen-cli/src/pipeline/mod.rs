// crates/testgen-cli/src/pipeline/mod.rs
// ============================================================================
// Module: Pipeline Driver
// Description: Sequences the six generation stages, persists artifacts at
//              each boundary, and emits progress events (spec.md §4.10, §6).
// Purpose: The single place that wires testgen-parse, testgen-intent,
//          testgen-payload, testgen-llm, testgen-fixture, and testgen-render
//          together into one deterministic run.
// Dependencies: every testgen-* crate, serde, serde_json
// ============================================================================

//! ## Overview
//! [`run`] sequences six stages in the fixed order spec.md §4.10 and §6
//! describe, persisting one artifact per boundary through an
//! [`store::ArtifactStore`] and reporting each transition through a
//! [`progress::ProgressSink`]:
//!
//! 1. Parse source text into a [`testgen_core::Specification`] — `1_ir.json`.
//! 2. Generate intents per operation — `2_intents.json`.
//! 3. Build raw payloads per operation — `3_payloads_raw.json`.
//! 4. Enhance payloads through an LLM provider, if configured —
//!    `3_payloads_enhanced.json` (absent when LLM enhancement is disabled).
//! 5. Build the HTTP-dialect fixture plan — `4_fixture_plan.json` (absent
//!    for non-HTTP dialects).
//! 6. Render one test file per operation — `tests/<operation-id>.py`.
//!
//! No stage consults a later stage's output (spec.md §2). A store write
//! failure aborts the job immediately (spec.md §7: "Store errors: abort the
//! pipeline at the first failed write"); a render failure is scoped to the
//! one operation and the job still completes with partial success.

pub mod progress;
pub mod store;

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use testgen_config::RetryConfig;
use testgen_core::GenerationRequest;
use testgen_core::IntentId;
use testgen_core::Operation;
use testgen_core::Specification;
use testgen_fixture::FixtureProgram;
use testgen_intent::Intent;
use testgen_llm::CircuitBreaker;
use testgen_llm::LlmProvider;
use testgen_payload::Payload;
use testgen_render::RenderError;
use thiserror::Error;

use self::progress::ProgressEvent;
use self::progress::ProgressSink;
use self::progress::ProgressStatus;
use self::store::ArtifactStore;
use self::store::StoreError;

/// Total number of pipeline stages (spec.md §6: `stage_id ∈ 1..6`).
const STAGE_COUNT: u8 = 6;

/// The classified failure a stage raised, with enough detail for the
/// outward-facing error surface spec.md §6 names.
#[derive(Debug, Error)]
pub enum PipelineErrorKind {
    /// Stage 1: the source text did not parse under the requested dialect,
    /// or failed an internal invariant (spec.md §7 folds both into the
    /// parser's own error type).
    #[error("parse error: {0}")]
    Parse(#[from] testgen_parse::ParseError),
    /// The caller's `target_intents` selection could not be honored.
    #[error("invalid intent selection: {0}")]
    InvalidIntentSelection(String),
    /// An artifact failed to persist.
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// A stage failure, tagged with the job and stage it occurred in (spec.md
/// §7: "All errors include the `job_id`, the `stage_id`, and a
/// human-readable detail string").
#[derive(Debug, Error)]
#[error("job {job_id} stage {stage_id}: {kind}")]
pub struct PipelineError {
    /// The job that failed.
    pub job_id: String,
    /// Which of the six stages raised the failure.
    pub stage_id: u8,
    /// The classified failure.
    pub kind: PipelineErrorKind,
}

/// One operation's intent list, the shape persisted in `2_intents.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationIntents {
    /// The owning operation's id.
    pub operation_id: String,
    /// Intents generated for that operation, in generator order.
    pub intents: Vec<Intent>,
}

/// One operation's payload list, the shape persisted in
/// `3_payloads_raw.json`/`3_payloads_enhanced.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPayloads {
    /// The owning operation's id.
    pub operation_id: String,
    /// Payloads built for that operation, in intent order.
    pub payloads: Vec<Payload>,
}

/// One operation's compiled fixture program, the shape persisted in
/// `4_fixture_plan.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationFixture {
    /// The Consumer operation's id.
    pub operation_id: String,
    /// Its compiled setup/teardown program.
    pub program: FixtureProgram,
}

/// A render failure scoped to one operation (spec.md §7: "Render errors are
/// per-operation; their scope is that operation alone").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRenderFailure {
    /// The operation whose render failed.
    pub operation_id: String,
    /// Why it failed.
    pub error: RenderError,
}

/// The result of a completed job: which operations rendered, and which
/// failed without aborting the rest (spec.md §7 "partial success").
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// The job's id.
    pub job_id: String,
    /// Operation ids that rendered successfully, in specification order.
    pub rendered_operations: Vec<String>,
    /// Operations whose render step failed, in specification order.
    pub failed_operations: Vec<OperationRenderFailure>,
    /// Non-fatal diagnostics collected while parsing (spec.md §4.1).
    pub diagnostics: Vec<String>,
}

/// Runs one generation job end to end.
///
/// # Errors
///
/// Returns [`PipelineError`] when parsing fails, the intent selection is
/// invalid, or an artifact write fails. Per-operation render failures do not
/// abort the job; they are reported in the returned [`JobOutcome`].
#[expect(clippy::too_many_arguments, reason = "the driver's collaborators (provider, breaker, retry, store, sink) are each a distinct seam spec.md §5 calls out as independently shared/substitutable")]
pub fn run(
    job_id: &str,
    request: &GenerationRequest,
    provider: &dyn LlmProvider,
    breaker: &CircuitBreaker,
    retry: &RetryConfig,
    store: &dyn ArtifactStore,
    sink: &dyn ProgressSink,
) -> Result<JobOutcome, PipelineError> {
    validate_intent_selection(job_id, &request.target_intents)?;

    let specification = run_parse_stage(job_id, request, store, sink)?;
    let intents = run_intent_stage(job_id, &specification, &request.target_intents, store, sink)?;
    let raw_payloads = run_payload_stage(job_id, &specification, &intents, store, sink)?;
    let enhanced_payloads = run_enhancement_stage(job_id, request, &specification, &raw_payloads, provider, breaker, retry, store, sink)?;
    let fixtures = run_fixture_stage(job_id, request, &specification, store, sink)?;
    run_render_stage(job_id, &specification, enhanced_payloads.as_ref().unwrap_or(&raw_payloads), &fixtures, request, store, sink)
}

/// Rejects a `target_intents` selection that names the same catalog entry
/// more than once; an empty or fully-deduplicated list is always valid
/// (spec.md §6: callers select from the frozen catalog).
fn validate_intent_selection(job_id: &str, target_intents: &[IntentId]) -> Result<(), PipelineError> {
    let mut seen = std::collections::HashSet::new();
    for id in target_intents {
        if !seen.insert(*id) {
            return Err(PipelineError {
                job_id: job_id.to_string(),
                stage_id: 1,
                kind: PipelineErrorKind::InvalidIntentSelection(format!("duplicate intent id in selection: {id}")),
            });
        }
    }
    Ok(())
}

/// Emits a `running`/`completed` (or `failed`) pair for one stage around
/// `body`, returning its result unchanged.
fn with_progress<T>(job_id: &str, stage_id: u8, sink: &dyn ProgressSink, body: impl FnOnce() -> Result<T, PipelineError>) -> Result<T, PipelineError> {
    let _ = sink.emit(&ProgressEvent { job_id: job_id.to_string(), stage_id, status: ProgressStatus::Running, progress_percent: percent_for(stage_id - 1) });
    match body() {
        Ok(value) => {
            let _ = sink.emit(&ProgressEvent { job_id: job_id.to_string(), stage_id, status: ProgressStatus::Completed, progress_percent: percent_for(stage_id) });
            Ok(value)
        }
        Err(err) => {
            let _ = sink.emit(&ProgressEvent { job_id: job_id.to_string(), stage_id, status: ProgressStatus::Failed, progress_percent: percent_for(stage_id - 1) });
            Err(err)
        }
    }
}

/// Coarse whole-job completion percentage after `stages_done` of
/// [`STAGE_COUNT`] stages have completed.
fn percent_for(stages_done: u8) -> u8 {
    let done = u32::from(stages_done).min(u32::from(STAGE_COUNT));
    let scaled = done * 100 / u32::from(STAGE_COUNT);
    u8::try_from(scaled).unwrap_or(100)
}

/// Stage 1: parse source text into a [`Specification`] and persist
/// `1_ir.json`.
fn run_parse_stage(job_id: &str, request: &GenerationRequest, store: &dyn ArtifactStore, sink: &dyn ProgressSink) -> Result<Specification, PipelineError> {
    with_progress(job_id, 1, sink, || {
        let outcome = testgen_parse::parse(request.source_dialect, &request.spec_payload).map_err(|err| wrap(job_id, 1, err.into()))?;
        persist_json(job_id, 1, store, "1_ir.json", &outcome.specification)?;
        Ok(outcome.specification)
    })
}

/// Stage 2: generate intents for every operation and persist
/// `2_intents.json`.
fn run_intent_stage(job_id: &str, specification: &Specification, target_intents: &[IntentId], store: &dyn ArtifactStore, sink: &dyn ProgressSink) -> Result<Vec<OperationIntents>, PipelineError> {
    with_progress(job_id, 2, sink, || {
        let entries: Vec<OperationIntents> = specification
            .operations
            .iter()
            .map(|op| OperationIntents { operation_id: op.id.clone(), intents: testgen_intent::generate(op, target_intents) })
            .collect();
        persist_json(job_id, 2, store, "2_intents.json", &entries)?;
        Ok(entries)
    })
}

/// Stage 3: build raw payloads for every operation and persist
/// `3_payloads_raw.json`.
fn run_payload_stage(job_id: &str, specification: &Specification, intents: &[OperationIntents], store: &dyn ArtifactStore, sink: &dyn ProgressSink) -> Result<Vec<OperationPayloads>, PipelineError> {
    with_progress(job_id, 3, sink, || {
        let by_operation: HashMap<&str, &Operation> = specification.operations.iter().map(|op| (op.id.as_str(), op)).collect();
        let mut entries = Vec::with_capacity(intents.len());
        for operation_intents in intents {
            let Some(op) = by_operation.get(operation_intents.operation_id.as_str()) else { continue };
            let payloads = testgen_payload::build_payloads(op, &operation_intents.intents, &specification.types);
            entries.push(OperationPayloads { operation_id: operation_intents.operation_id.clone(), payloads });
        }
        persist_json(job_id, 3, store, "3_payloads_raw.json", &entries)?;
        Ok(entries)
    })
}

/// Stage 4: enhance payloads through the configured LLM provider, if any,
/// and persist `3_payloads_enhanced.json`. Returns `None` when no
/// `payload_enhancement` endpoint is configured, signaling the caller to
/// fall back to the raw payloads unmodified.
#[expect(clippy::too_many_arguments, reason = "mirrors run's collaborator seams")]
fn run_enhancement_stage(
    job_id: &str,
    request: &GenerationRequest,
    specification: &Specification,
    raw_payloads: &[OperationPayloads],
    provider: &dyn LlmProvider,
    breaker: &CircuitBreaker,
    retry: &RetryConfig,
    store: &dyn ArtifactStore,
    sink: &dyn ProgressSink,
) -> Result<Option<Vec<OperationPayloads>>, PipelineError> {
    with_progress(job_id, 4, sink, || {
        let Some(endpoint) = request.llm_config.as_ref().and_then(|config| config.payload_enhancement.as_ref()) else { return Ok(None) };
        let by_operation: HashMap<&str, &Operation> = specification.operations.iter().map(|op| (op.id.as_str(), op)).collect();
        let mut entries = Vec::with_capacity(raw_payloads.len());
        for operation_payloads in raw_payloads {
            let Some(op) = by_operation.get(operation_payloads.operation_id.as_str()) else { continue };
            let (enhanced, _records) = testgen_llm::enhance_payloads(op, &specification.types, &operation_payloads.payloads, endpoint, provider, breaker, retry);
            entries.push(OperationPayloads { operation_id: operation_payloads.operation_id.clone(), payloads: enhanced });
        }
        persist_json(job_id, 4, store, "3_payloads_enhanced.json", &entries)?;
        Ok(Some(entries))
    })
}

/// Stage 5: build the HTTP-dialect fixture plan and persist
/// `4_fixture_plan.json`. Non-HTTP dialects produce no operations a
/// Consumer/Producer relationship could hold between, so the plan (and the
/// file) is empty.
fn run_fixture_stage(job_id: &str, request: &GenerationRequest, specification: &Specification, store: &dyn ArtifactStore, sink: &dyn ProgressSink) -> Result<HashMap<String, FixtureProgram>, PipelineError> {
    with_progress(job_id, 5, sink, || {
        if !matches!(request.source_dialect, testgen_core::SourceDialect::HttpContract) {
            return Ok(HashMap::new());
        }
        let plans = testgen_fixture::build_fixture_plan(&specification.operations, &specification.types);
        let entries: Vec<OperationFixture> = plans
            .iter()
            .filter_map(|(index, program)| specification.operations.get(*index).map(|op| OperationFixture { operation_id: op.id.clone(), program: program.clone() }))
            .collect();
        persist_json(job_id, 5, store, "4_fixture_plan.json", &entries)?;
        Ok(entries.into_iter().map(|entry| (entry.operation_id, entry.program)).collect())
    })
}

/// Stage 6: render one test file per operation, persisting each under
/// `tests/<operation-id>.py`. A render failure is scoped to its operation
/// and does not abort the remaining operations (spec.md §7).
fn run_render_stage(
    job_id: &str,
    specification: &Specification,
    payloads: &[OperationPayloads],
    fixtures: &HashMap<String, FixtureProgram>,
    request: &GenerationRequest,
    store: &dyn ArtifactStore,
    sink: &dyn ProgressSink,
) -> Result<JobOutcome, PipelineError> {
    with_progress(job_id, 6, sink, || {
        let by_operation: HashMap<&str, &Vec<Payload>> = payloads.iter().map(|entry| (entry.operation_id.as_str(), &entry.payloads)).collect();
        let mut rendered_operations = Vec::new();
        let mut failed_operations = Vec::new();
        for op in &specification.operations {
            let Some(op_payloads) = by_operation.get(op.id.as_str()) else { continue };
            let fixture = fixtures.get(&op.id);
            match testgen_render::render(op, op_payloads, &specification.types, fixture, request.target_framework, request.base_url.as_deref()) {
                Ok(text) => {
                    persist_bytes(job_id, 6, store, &format!("tests/{}.py", op.id), text.as_bytes())?;
                    rendered_operations.push(op.id.clone());
                }
                Err(error) => failed_operations.push(OperationRenderFailure { operation_id: op.id.clone(), error }),
            }
        }
        Ok(JobOutcome { job_id: job_id.to_string(), rendered_operations, failed_operations, diagnostics: Vec::new() })
    })
}

/// Serializes `value` as pretty JSON and persists it, wrapping any store
/// failure with `job_id`/`stage_id` context.
fn persist_json<T: Serialize>(job_id: &str, stage_id: u8, store: &dyn ArtifactStore, artifact_name: &str, value: &T) -> Result<(), PipelineError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|err| PipelineError { job_id: job_id.to_string(), stage_id, kind: PipelineErrorKind::Store(StoreError::Io(err.to_string())) })?;
    persist_bytes(job_id, stage_id, store, artifact_name, &bytes)
}

/// Persists raw bytes, wrapping any store failure with `job_id`/`stage_id`
/// context.
fn persist_bytes(job_id: &str, stage_id: u8, store: &dyn ArtifactStore, artifact_name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
    store.put(job_id, artifact_name, bytes).map_err(|err| wrap(job_id, stage_id, PipelineErrorKind::Store(err)))
}

/// Builds a [`PipelineError`] from its three parts.
fn wrap(job_id: &str, stage_id: u8, kind: PipelineErrorKind) -> PipelineError {
    PipelineError { job_id: job_id.to_string(), stage_id, kind }
}

#[cfg(test)]
mod tests {
    use testgen_core::SourceDialect;
    use testgen_core::TargetFramework;
    use testgen_llm::CircuitBreaker;
    use testgen_llm::NoOpProvider;

    use super::progress::RecordingSink;
    use super::store::FileSystemArtifactStore;
    use super::*;

    fn http_contract_request() -> GenerationRequest {
        let doc = r#"{"paths": {"/users/{id}": {"get": {"parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}], "responses": {"200": {}, "404": {}}}}}}"#;
        GenerationRequest {
            spec_payload: doc.to_string(),
            source_dialect: SourceDialect::HttpContract,
            target_framework: TargetFramework::HttpSync,
            base_url: Some("https://api.example.com".to_string()),
            target_intents: Vec::new(),
            llm_config: None,
        }
    }

    #[test]
    fn end_to_end_run_renders_the_http_operation_and_emits_six_stage_completions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSystemArtifactStore::new(dir.path());
        let sink = RecordingSink::new();
        let provider = NoOpProvider;
        let breaker = CircuitBreaker::new(testgen_config::CircuitBreakerConfig::default());
        let retry = RetryConfig::default();

        let outcome = run("job-1", &http_contract_request(), &provider, &breaker, &retry, &store, &sink).expect("run");

        assert_eq!(outcome.rendered_operations.len(), 1);
        assert!(outcome.failed_operations.is_empty());
        let completed = sink.events().into_iter().filter(|e| e.status == ProgressStatus::Completed).count();
        assert_eq!(completed, 6);
        assert!(store.get("job-1", "1_ir.json").is_ok());
        assert!(store.get("job-1", "2_intents.json").is_ok());
        assert!(store.get("job-1", "3_payloads_raw.json").is_ok());
        assert!(store.get("job-1", "3_payloads_enhanced.json").is_err());
        assert!(store.get("job-1", "4_fixture_plan.json").is_ok());
    }

    #[test]
    fn parse_failure_emits_a_failed_event_and_writes_no_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSystemArtifactStore::new(dir.path());
        let sink = RecordingSink::new();
        let provider = NoOpProvider;
        let breaker = CircuitBreaker::new(testgen_config::CircuitBreakerConfig::default());
        let retry = RetryConfig::default();
        let mut request = http_contract_request();
        request.spec_payload = "not json".to_string();

        let result = run("job-2", &request, &provider, &breaker, &retry, &store, &sink);

        assert!(result.is_err());
        assert!(store.get("job-2", "1_ir.json").is_err());
        let failed = sink.events().into_iter().filter(|e| e.status == ProgressStatus::Failed).count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn duplicate_target_intent_is_rejected_before_any_stage_runs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSystemArtifactStore::new(dir.path());
        let sink = RecordingSink::new();
        let provider = NoOpProvider;
        let breaker = CircuitBreaker::new(testgen_config::CircuitBreakerConfig::default());
        let retry = RetryConfig::default();
        let mut request = http_contract_request();
        request.target_intents = vec![IntentId::HappyPath, IntentId::HappyPath];

        let result = run("job-3", &request, &provider, &breaker, &retry, &store, &sink);

        assert!(matches!(result, Err(PipelineError { kind: PipelineErrorKind::InvalidIntentSelection(_), .. })));
        assert!(sink.events().is_empty());
    }
}
