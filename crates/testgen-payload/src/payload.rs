// crates/testgen-payload/src/payload.rs
// ============================================================================
// Module: Payload
// Description: The mutator's output shape (spec.md §4.4).
// Purpose: Bundle one intent's concrete request/argument values with the
//          bookkeeping the renderer needs (which operation, which intent,
//          where it was rooted, what outcome to assert).
// Dependencies: testgen-core, indexmap, serde_json
// ============================================================================

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use testgen_core::IntentId;
use testgen_intent::ExpectedOutcome;

/// One concrete test case for an operation: a golden record with exactly one
/// intent's mutation applied (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// The owning operation's id.
    pub operation_id: String,
    /// Which intent this payload exercises.
    pub intent_id: IntentId,
    /// Dotted display path of the mutated field, or the parameter name for
    /// path/query/header-rooted intents. `None` for `HAPPY_PATH`.
    pub target_field: Option<String>,
    /// The (possibly mutated) body value, or `None` when the operation
    /// declares no body.
    pub body: Option<Value>,
    /// Path parameter values, insertion-ordered.
    pub path_params: IndexMap<String, Value>,
    /// Query parameter values, insertion-ordered.
    pub query_params: IndexMap<String, Value>,
    /// Header values, insertion-ordered.
    pub headers: IndexMap<String, Value>,
    /// The outcome a conforming implementation under test must produce.
    pub expected_outcome: ExpectedOutcome,
    /// Short human-readable label carried through from the originating
    /// intent, for rendered test names and progress logs.
    pub description: String,
}
