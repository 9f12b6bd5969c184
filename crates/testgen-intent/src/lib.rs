// crates/testgen-intent/src/lib.rs
// ============================================================================
// Module: Intent Generation Library
// Description: Produces the ordered, dialect-aware intent list for one
//              operation (spec.md §4.2).
// Purpose: Sit between the parser and the payload builder: consumes a
//          validated Operation, emits Intents the payload builder and
//          mutator turn into concrete request/argument payloads.
// Dependencies: testgen-core
// ============================================================================

//! ## Overview
//! Intent generation has no state beyond one `Operation` and its allow-list;
//! see [`generator::generate`] for the exact ordering contract.

pub mod generator;
pub mod intent;

pub use generator::generate;
pub use intent::ExpectedOutcome;
pub use intent::FieldPath;
pub use intent::Intent;
pub use intent::Target;
