// crates/testgen-fixture/src/lib.rs
// ============================================================================
// Module: Fixture Library
// Description: Dependency analyzer, setup planner, and fixture compiler
//              (spec.md §4.5-§4.7).
// Purpose: Give the HTTP-dialect renderer everything it needs to emit
//          setup/teardown code for operations whose path parameters name a
//          resource created by another operation in the same specification.
// Dependencies: testgen-core, testgen-payload
// ============================================================================

//! ## Overview
//! This crate is HTTP-dialect only: function-sourced specifications never
//! reach it (spec.md §4.5 classifies by `(method, path-template)`, which
//! functions don't have). [`build_fixture_plan`] is the single entry point:
//! it runs [`analyze::analyze`], [`plan::plan`], and [`compile::compile`]
//! in sequence and returns one [`compile::FixtureProgram`] per operation
//! index that needed one.
//!
//! ## Index
//! - [`analyze::Dependency`], [`analyze::Role`]
//! - [`plan::SetupPlan`]
//! - [`compile::FixtureProgram`], [`compile::Instruction`]

pub mod analyze;
pub mod compile;
pub mod plan;

use testgen_core::Operation;
use testgen_core::TypeDecl;

pub use compile::FixtureProgram;
pub use compile::Instruction;
pub use plan::SetupPlan;

/// Runs dependency analysis, setup planning, and fixture compilation for
/// every HTTP operation in `operations`, keyed by operation index. Only
/// operations classified as a [`analyze::Role::Consumer`] with at least
/// one resolved Producer binding are present in the result.
#[must_use]
pub fn build_fixture_plan(operations: &[Operation], types: &[TypeDecl]) -> Vec<(usize, FixtureProgram)> {
    let dependencies = analyze::analyze(operations);
    plan::plan(&dependencies, operations, types).into_iter().map(|(index, setup_plan)| (index, compile::compile(&setup_plan))).collect()
}
