// crates/testgen-core/src/error.rs
// ============================================================================
// Module: Invariant Errors
// Description: Errors raised when a Specification fails its structural
//              invariants.
// Purpose: Give the pipeline driver a distinct, named error kind for "a
//          parser produced an IR that violates its own contract" (spec.md
//          §7, "Internal invariant violations").
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors raised by [`crate::Specification::validate`].
///
/// # Invariants
/// - These are bugs in a parser, not user input errors; the pipeline driver
///   surfaces them under a distinct error kind from [`ParseError`]-class
///   failures (spec.md §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantError {
    /// Two operations declared the same id.
    #[error("duplicate operation id: {0}")]
    DuplicateOperationId(String),
    /// A `Schema::Ref` pointed outside the types arena.
    #[error("unresolved type reference: index {0}")]
    UnresolvedReference(usize),
    /// An object's `required` set named a key absent from `properties`.
    #[error("type `{type_name}` requires undeclared property `{field}`")]
    RequiredNotInProperties {
        /// Name of the offending type declaration.
        type_name: String,
        /// The undeclared property name.
        field: String,
    },
    /// An enum declared a value incompatible with its `base_type`.
    #[error("type `{type_name}` has an enum value incompatible with its base type")]
    EnumValueTypeMismatch {
        /// Name of the offending type declaration.
        type_name: String,
    },
    /// Two parameters in the same operation shared a `(location, name)` pair.
    #[error("operation `{operation_id}` declares parameter `{name}` more than once in the same location")]
    DuplicateParameter {
        /// Id of the offending operation.
        operation_id: String,
        /// The duplicated parameter name.
        name: String,
    },
}
