// crates/testgen-parse/src/lib.rs
// ============================================================================
// Module: Dialect Parsers
// Description: The three source dialects and their dispatch entry point.
// Purpose: Turn source text in any accepted dialect into a validated,
//          dialect-neutral Specification (spec.md §4.1).
// Dependencies: testgen-core
// ============================================================================

//! ## Overview
//! [`parse`] dispatches on [`SourceDialect`] to one of three independent
//! parsers (spec.md §9, "dialect strategy dispatch" — a tag-selected
//! strategy rather than parser subclassing). Every parser fails with the
//! shared [`ParseError`] so callers never need to match on which dialect
//! produced a failure.
//!
//! ## Index
//! - [`http_contract`] — minimal OpenAPI-shaped contract documents.
//! - [`dynamic_source`] — a duck-typed language's function/model AST.
//! - [`typed_source`] — a statically-typed language's interface/function AST.
//! - [`ParseOutcome`] — the uniform return shape across all three dialects.

pub mod dynamic_source;
pub mod error;
pub mod http_contract;
pub mod type_arena;
pub mod typed_source;

pub use error::ParseError;
pub use error::ParseErrorKind;

use testgen_core::SourceDialect;
use testgen_core::Specification;

/// The result of parsing source text: the resolved IR plus any non-fatal
/// diagnostics the parser chose to report rather than fail on (e.g. an
/// unrecognized annotation degrading to `Any`).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// The parsed, invariant-checked specification.
    pub specification: Specification,
    /// Non-fatal diagnostics collected during parsing, in emission order.
    pub diagnostics: Vec<String>,
}

/// Parses `text` under the given dialect, dispatching to the matching
/// parser.
///
/// # Errors
///
/// Returns [`ParseError`] under the same conditions the selected dialect's
/// own `parse` function does.
pub fn parse(dialect: SourceDialect, text: &str) -> Result<ParseOutcome, ParseError> {
    match dialect {
        SourceDialect::HttpContract => {
            let specification = http_contract::parse(text)?;
            Ok(ParseOutcome { specification, diagnostics: Vec::new() })
        }
        SourceDialect::DynamicSource => {
            let (specification, diagnostics) = dynamic_source::parse(text)?;
            Ok(ParseOutcome { specification, diagnostics })
        }
        SourceDialect::TypedSource => {
            let (specification, diagnostics) = typed_source::parse(text)?;
            Ok(ParseOutcome { specification, diagnostics })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_routes_to_the_matching_dialect() {
        let doc = r#"{"paths": {"/x": {"get": {"responses": {"200": {}}}}}}"#;
        let outcome = parse(SourceDialect::HttpContract, doc).expect("parse");
        assert_eq!(outcome.specification.operations.len(), 1);
        assert!(outcome.diagnostics.is_empty());
    }
}
