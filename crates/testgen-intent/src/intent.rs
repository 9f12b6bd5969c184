// crates/testgen-intent/src/intent.rs
// ============================================================================
// Module: Intent Types
// Description: Intent, Target, and ExpectedOutcome — the generator's output
//              shape (spec.md §4.2).
// Purpose: Give every downstream stage (payload builder, mutator, renderer)
//          one record per test scenario that already names where it targets
//          and what it expects, independent of how it was derived.
// Dependencies: testgen-core
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use testgen_core::IntentCategory;
use testgen_core::IntentId;

/// One generated test scenario for an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// The catalog identifier (spec.md §6).
    pub id: IntentId,
    /// The id's frozen category, used for error-status selection.
    pub category: IntentCategory,
    /// Where in the operation's inputs this intent is rooted.
    pub target: Target,
    /// What outcome a conforming implementation under test must produce.
    pub expected_outcome: ExpectedOutcome,
    /// A short human-readable label, e.g. for progress logs and test names.
    pub description: String,
}

impl Intent {
    /// Builds an [`Intent`], deriving `category` from `id`.
    #[must_use]
    pub fn new(id: IntentId, target: Target, expected_outcome: ExpectedOutcome, description: impl Into<String>) -> Self {
        Self { id, category: id.category(), target, expected_outcome, description: description.into() }
    }
}

/// A dotted path into a nested object, e.g. `["address", "street"]`.
/// Empty for an intent rooted at the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    /// Builds a path by appending one segment.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Renders the path as a dotted string for display/logging, or `"<body>"`
    /// for the empty (whole-record) path.
    #[must_use]
    pub fn display(&self) -> String {
        if self.0.is_empty() { "<body>".to_string() } else { self.0.join(".") }
    }
}

/// Where an [`Intent`] is rooted: the mutator's `target_path` (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Rooted at the whole body (used only by `HAPPY_PATH`).
    WholeBody,
    /// Rooted at a field inside the body, possibly nested.
    BodyField(FieldPath),
    /// Rooted at a URI path parameter.
    PathParam(String),
    /// Rooted at a URL query parameter.
    QueryParam(String),
    /// Rooted at an HTTP header.
    Header(String),
}

/// The outcome a conforming system under test must produce for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedOutcome {
    /// An HTTP response with this status code.
    HttpStatus(u16),
    /// A function call returns normally (any value).
    FunctionSuccess,
    /// A function call raises/throws (spec.md §4.8 exception-expectation
    /// idiom).
    FunctionRejects,
}
