// crates/testgen-fixture/src/compile.rs
// ============================================================================
// Module: Fixture Compiler
// Description: Turns a SetupPlan into an abstract FixtureProgram of
//              instructions (spec.md §4.7).
// Purpose: Give the renderer a target-framework-neutral instruction stream
//          it can emit as setup/teardown code, independent of how the
//          executing framework issues HTTP calls.
// Dependencies: testgen-core, serde_json, crate::plan
// ============================================================================

//! ## Overview
//! [`compile`] lowers one operation's [`SetupPlan`] into a [`FixtureProgram`]:
//! a flat instruction list the renderer walks to emit setup code, paired
//! with the matching teardown instructions in reverse order. Payload
//! uniqueness (spec.md §4.7, "append a short random suffix at
//! fixture-execution time") is compiled in as [`Instruction::ApplyUniqueSuffix`]
//! markers naming which fields need a runtime-generated suffix — the
//! suffix itself is never computed here, since the compiler's output must
//! stay deterministic even though the fixture's *execution* is not.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::plan::SetupPlan;

/// Field-name substrings that mark a string field as identity-shaped and
/// therefore needing a uniqueness suffix at fixture-execution time
/// (spec.md §4.7: "email, username, code, name").
const IDENTITY_FIELD_MARKERS: &[&str] = &["email", "username", "code", "name"];

/// One instruction in a compiled fixture program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Instruction {
    /// Calls the named Producer operation with `body`, whose identity-shaped
    /// string fields (named in `unique_fields`, dotted paths) must be
    /// suffixed with fresh random data at execution time.
    CreateResource {
        /// Index of the Producer operation to call.
        producer_index: usize,
        /// The Producer's HTTP method.
        producer_method: testgen_core::HttpMethod,
        /// The Producer's URI template.
        producer_path: String,
        /// The request body to send, before uniqueness suffixing.
        body: Value,
        /// Dotted paths of fields `ApplyUniqueSuffix` must rewrite in `body`
        /// immediately before the call is issued.
        unique_fields: Vec<String>,
        /// Name the created resource is tracked under for later steps.
        capture_as: String,
    },
    /// Extracts the created resource's id from the Producer's response.
    CaptureIdFrom {
        /// Name the captured id is stored under, matching a prior
        /// `CreateResource::capture_as`.
        capture_as: String,
        /// Response field the id is read from (`"id"` unless the
        /// Producer's schema says otherwise; `testgen-fixture` always
        /// compiles this as `"id"` per spec.md §4.5's "id-bearing
        /// response" assumption).
        response_field: String,
    },
    /// Binds a captured id to a `USE_CREATED_RESOURCE_<resource>`
    /// placeholder so the renderer can substitute it into the Consumer's
    /// path parameter at execution time.
    BindPlaceholder {
        /// The sentinel token appearing in a payload's path parameters.
        placeholder: String,
        /// Name the id was captured under.
        capture_as: String,
        /// The Consumer's path parameter this binding resolves.
        path_param: String,
    },
    /// Deletes a resource created during setup.
    DeleteResource {
        /// Index of the Producer operation whose created resource to
        /// delete (its path plus the captured id gives the canonical URL).
        producer_index: usize,
        /// The Producer's URI template; the captured id is appended to
        /// build the canonical delete URL.
        producer_path: String,
        /// Name the id to delete was captured under.
        capture_as: String,
    },
    /// Marks that a failed `DeleteResource` must be logged but must not
    /// fail the test (spec.md §4.6, "teardown failures are non-fatal").
    HandleDeleteFailure {
        /// Name of the resource whose teardown may fail.
        capture_as: String,
    },
}

/// A compiled setup/teardown program for one Consumer operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureProgram {
    /// Setup instructions, in execution order.
    pub setup: Vec<Instruction>,
    /// Teardown instructions, in execution order (reverse of setup).
    pub teardown: Vec<Instruction>,
}

/// Compiles `plan` into a [`FixtureProgram`] (spec.md §4.7).
#[must_use]
pub fn compile(plan: &SetupPlan) -> FixtureProgram {
    let mut setup = Vec::new();
    for step in &plan.steps {
        let unique_fields = identity_field_paths(step.golden.body.as_ref());
        setup.push(Instruction::CreateResource {
            producer_index: step.producer_index,
            producer_method: step.producer_method,
            producer_path: step.producer_path.clone(),
            body: step.golden.body.clone().unwrap_or(Value::Null),
            unique_fields,
            capture_as: step.binding_name.clone(),
        });
        setup.push(Instruction::CaptureIdFrom { capture_as: step.binding_name.clone(), response_field: "id".to_string() });
    }
    for (step, (placeholder, binding_name)) in plan.steps.iter().zip(&plan.placeholder_bindings) {
        setup.push(Instruction::BindPlaceholder { placeholder: placeholder.clone(), capture_as: binding_name.clone(), path_param: step.path_param.clone() });
    }

    let teardown = plan
        .teardown_steps
        .iter()
        .flat_map(|step| {
            [
                Instruction::DeleteResource { producer_index: step.producer_index, producer_path: step.producer_path.clone(), capture_as: step.binding_name.clone() },
                Instruction::HandleDeleteFailure { capture_as: step.binding_name.clone() },
            ]
        })
        .collect();

    FixtureProgram { setup, teardown }
}

/// Finds the dotted paths of every identity-shaped string field in a
/// (possibly nested) golden-record body.
fn identity_field_paths(body: Option<&Value>) -> Vec<String> {
    let mut paths = Vec::new();
    if let Some(Value::Object(map)) = body {
        collect_identity_field_paths(map, &[], &mut paths);
    }
    paths
}

/// Recursively collects identity-shaped field paths under `prefix`.
fn collect_identity_field_paths(map: &serde_json::Map<String, Value>, prefix: &[String], paths: &mut Vec<String>) {
    for (key, value) in map {
        let mut path = prefix.to_vec();
        path.push(key.clone());
        match value {
            Value::String(_) if is_identity_field_name(key) => paths.push(path.join(".")),
            Value::Object(nested) => collect_identity_field_paths(nested, &path, paths),
            _ => {}
        }
    }
}

/// Whether a field name marks an identity-shaped string (spec.md §4.7).
fn is_identity_field_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IDENTITY_FIELD_MARKERS.iter().any(|marker| lower.contains(marker))
}
