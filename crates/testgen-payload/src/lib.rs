// crates/testgen-payload/src/lib.rs
// ============================================================================
// Module: Payload Library
// Description: Golden-record builder and mutator (spec.md §4.3, §4.4).
// Purpose: Turn one operation's intents into concrete request/argument
//          payloads: a canonical valid golden record, and one mutation per
//          intent rooted at its target path.
// Dependencies: testgen-core, testgen-intent
// ============================================================================

//! ## Overview
//! This crate sits between [`testgen_intent`] and the fixture/render stages.
//! [`golden::build`] produces the one canonical valid value for an
//! operation; [`build_payloads`] applies every intent's mutation to it,
//! producing the operation's full test-case list in intent order.
//!
//! Both stages are pure functions of `(Operation, types)` (golden record) or
//! `(Operation, GoldenRecord, Intent, types)` (mutation): identical inputs
//! produce byte-identical output, which is what makes the whole pipeline's
//! content-addressed hash reproducible (spec.md §8 property 7).
//!
//! ## Index
//! - [`golden::GoldenRecord`], [`golden::build`]
//! - [`payload::Payload`]
//! - [`build_payloads`]

pub mod builder;
pub mod golden;
pub mod mutate;
pub mod payload;

pub use builder::build_payloads;
pub use golden::GoldenRecord;
pub use payload::Payload;
