// crates/testgen-parse/src/error.rs
// ============================================================================
// Module: Parse Errors
// Description: The single error type shared by all three dialect parsers.
// Purpose: Let callers branch on `kind` without caring which parser produced
//          the failure.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// A parse failure, tagged with the JSON-pointer-style path of the input
/// element that triggered it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{path}: {kind}: {detail}")]
pub struct ParseError {
    /// Location of the offending element, e.g. `/paths/~1users/post`.
    pub path: String,
    /// Coarse classification of the failure.
    pub kind: ParseErrorKind,
    /// Human-readable detail.
    pub detail: String,
}

impl ParseError {
    /// Builds a [`ParseError`] from its three parts.
    #[must_use]
    pub fn new(path: impl Into<String>, kind: ParseErrorKind, detail: impl Into<String>) -> Self {
        Self { path: path.into(), kind, detail: detail.into() }
    }
}

/// Coarse classification of a parse failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The input did not conform to the dialect's expected shape.
    #[error("syntax")]
    Syntax,
    /// A `$ref`/type-name reference could not be resolved.
    #[error("unresolved reference")]
    UnresolvedReference,
    /// The input used a construct this parser does not support.
    #[error("unsupported feature")]
    UnsupportedFeature,
    /// The parser produced an IR that fails a core invariant.
    #[error("invariant violation")]
    InvariantViolation,
}
