// crates/testgen-fixture/src/plan.rs
// ============================================================================
// Module: Setup Planner
// Description: Builds a topologically ordered SetupPlan from dependency
//              analysis (spec.md §4.6).
// Purpose: Turn a Consumer's resource bindings into a concrete, ordered list
//          of Producer calls to run before the Consumer's own test, plus
//          their reverse teardown.
// Dependencies: testgen-core, testgen-payload, crate::analyze
// ============================================================================

//! ## Overview
//! [`plan`] builds one [`SetupPlan`] per Consumer operation. Steps are
//! ordered outer-resource-first, matching [`analyze::ResourceBinding`]
//! order; teardown is the exact reverse so an inner resource is deleted
//! before the outer resource it depends on (spec.md §4.6).

use testgen_core::HttpMethod;
use testgen_core::Operation;
use testgen_core::OperationKind;
use testgen_core::TypeDecl;
use testgen_payload::GoldenRecord;
use testgen_payload::golden;

use crate::analyze::Dependency;
use crate::analyze::Role;

/// One Producer call a Consumer's test must run first.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupStep {
    /// Index of the Producer operation to call.
    pub producer_index: usize,
    /// The Producer's HTTP method, carried alongside the index so a
    /// renderer working from one operation at a time never needs the full
    /// operation list to emit the setup call.
    pub producer_method: HttpMethod,
    /// The Producer's URI template.
    pub producer_path: String,
    /// The Producer's golden-record request body.
    pub golden: GoldenRecord,
    /// Name the returned id is bound under, e.g. `created_user`.
    pub binding_name: String,
    /// The Consumer's path parameter this id resolves.
    pub path_param: String,
}

/// One teardown call, the reverse of a [`SetupStep`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownStep {
    /// Index of the Producer operation whose created resource is deleted.
    pub producer_index: usize,
    /// The Producer's URI template, used to build the delete URL with the
    /// captured id appended.
    pub producer_path: String,
    /// The binding name the id to delete was captured under.
    pub binding_name: String,
}

/// The ordered setup/teardown plan for one Consumer operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupPlan {
    /// Producer calls, outer resource first.
    pub steps: Vec<SetupStep>,
    /// Teardown calls, inner resource first (the exact reverse of `steps`).
    pub teardown_steps: Vec<TeardownStep>,
    /// Placeholder tokens a rendered test substitutes at execution time:
    /// `("USE_CREATED_RESOURCE_<resource>", binding_name)`.
    pub placeholder_bindings: Vec<(String, String)>,
}

/// Builds a [`SetupPlan`] for every Consumer in `dependencies`, keyed by
/// operation index. Operations with no dependency (Producers and
/// Independents) are absent from the result.
#[must_use]
pub fn plan(dependencies: &[Dependency], operations: &[Operation], types: &[TypeDecl]) -> Vec<(usize, SetupPlan)> {
    dependencies
        .iter()
        .filter_map(|dep| {
            let Role::Consumer { bindings } = &dep.role else { return None };
            let mut steps = Vec::new();
            let mut placeholder_bindings = Vec::new();
            for (binding, producer_index) in bindings.iter().zip(&dep.producers) {
                let Some(producer_index) = producer_index else { continue };
                let producer = &operations[*producer_index];
                let OperationKind::Http { method, path } = &producer.kind else { continue };
                let binding_name = format!("created_{}", binding.resource);
                steps.push(SetupStep {
                    producer_index: *producer_index,
                    producer_method: *method,
                    producer_path: path.clone(),
                    golden: golden::build(producer, types),
                    binding_name: binding_name.clone(),
                    path_param: binding.path_param.clone(),
                });
                placeholder_bindings.push((format!("USE_CREATED_RESOURCE_{}", binding.resource), binding_name));
            }
            let teardown_steps = steps
                .iter()
                .rev()
                .map(|step| TeardownStep { producer_index: step.producer_index, producer_path: step.producer_path.clone(), binding_name: step.binding_name.clone() })
                .collect();
            Some((dep.operation_index, SetupPlan { steps, teardown_steps, placeholder_bindings }))
        })
        .collect()
}
