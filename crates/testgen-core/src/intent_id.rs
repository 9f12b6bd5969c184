// crates/testgen-core/src/intent_id.rs
// ============================================================================
// Module: Intent Catalog
// Description: The frozen set of test-intent identifiers the pipeline can
//              emit, plus their structural category.
// Purpose: Give every stage (intent generation, mutation, rendering,
//          configuration) one shared vocabulary for "what scenario is this".
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`IntentId`] is frozen: consumers of the generation API select from this
//! exact set (see the external interface in the design document). Adding a
//! variant is a contract change, not an internal refactor.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A single test-intent identifier.
///
/// # Invariants
/// - Serialized as the exact `SCREAMING_SNAKE_CASE` token shown in each
///   variant's doc comment; external callers (`target_intents` selection)
///   depend on this shape being stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntentId {
    /// `HAPPY_PATH`
    HappyPath,
    /// `REQUIRED_FIELD_MISSING`
    RequiredFieldMissing,
    /// `REQUIRED_ARG_MISSING`
    RequiredArgMissing,
    /// `NULL_NOT_ALLOWED`
    NullNotAllowed,
    /// `TYPE_VIOLATION`
    TypeViolation,
    /// `UNEXPECTED_ARGUMENT`
    UnexpectedArgument,
    /// `UNION_NO_MATCH`
    UnionNoMatch,
    /// `RESOURCE_NOT_FOUND`
    ResourceNotFound,
    /// `FORMAT_INVALID_PATH_PARAM`
    FormatInvalidPathParam,
    /// `HEADER_MISSING`
    HeaderMissing,
    /// `HEADER_ENUM_MISMATCH`
    HeaderEnumMismatch,
    /// `ENUM_MISMATCH`
    EnumMismatch,
    /// `STRING_TOO_SHORT`
    StringTooShort,
    /// `STRING_TOO_LONG`
    StringTooLong,
    /// `PATTERN_MISMATCH`
    PatternMismatch,
    /// `FORMAT_INVALID`
    FormatInvalid,
    /// `NUMBER_TOO_SMALL`
    NumberTooSmall,
    /// `NUMBER_TOO_LARGE`
    NumberTooLarge,
    /// `NOT_MULTIPLE_OF`
    NotMultipleOf,
    /// `BOUNDARY_MIN_MINUS_ONE`
    BoundaryMinMinusOne,
    /// `BOUNDARY_MAX_PLUS_ONE`
    BoundaryMaxPlusOne,
    /// `BOUNDARY_MIN_LENGTH_MINUS_ONE`
    BoundaryMinLengthMinusOne,
    /// `BOUNDARY_MAX_LENGTH_PLUS_ONE`
    BoundaryMaxLengthPlusOne,
    /// `BOUNDARY_MIN_ITEMS_MINUS_ONE`
    BoundaryMinItemsMinusOne,
    /// `BOUNDARY_MAX_ITEMS_PLUS_ONE`
    BoundaryMaxItemsPlusOne,
    /// `ARRAY_TOO_SHORT`
    ArrayTooShort,
    /// `ARRAY_TOO_LONG`
    ArrayTooLong,
    /// `ARRAY_NOT_UNIQUE`
    ArrayNotUnique,
    /// `ARRAY_ITEM_TYPE_VIOLATION`
    ArrayItemTypeViolation,
    /// `ADDITIONAL_PROPERTY_NOT_ALLOWED`
    AdditionalPropertyNotAllowed,
    /// `OBJECT_VALUE_TYPE_VIOLATION`
    ObjectValueTypeViolation,
    /// `EMPTY_STRING`
    EmptyString,
    /// `WHITESPACE_ONLY`
    WhitespaceOnly,
    /// `SQL_INJECTION`
    SqlInjection,
    /// `XSS_INJECTION`
    XssInjection,
    /// `COMMAND_INJECTION`
    CommandInjection,
    /// `HEADER_INJECTION`
    HeaderInjection,
    /// `PATH_TRAVERSAL`
    PathTraversal,
}

impl IntentId {
    /// All catalog entries, in the order they are declared above. Not the
    /// per-operation emission order (see `testgen-intent`), just the full
    /// vocabulary.
    pub const ALL: &'static [IntentId] = &[
        Self::HappyPath,
        Self::RequiredFieldMissing,
        Self::RequiredArgMissing,
        Self::NullNotAllowed,
        Self::TypeViolation,
        Self::UnexpectedArgument,
        Self::UnionNoMatch,
        Self::ResourceNotFound,
        Self::FormatInvalidPathParam,
        Self::HeaderMissing,
        Self::HeaderEnumMismatch,
        Self::EnumMismatch,
        Self::StringTooShort,
        Self::StringTooLong,
        Self::PatternMismatch,
        Self::FormatInvalid,
        Self::NumberTooSmall,
        Self::NumberTooLarge,
        Self::NotMultipleOf,
        Self::BoundaryMinMinusOne,
        Self::BoundaryMaxPlusOne,
        Self::BoundaryMinLengthMinusOne,
        Self::BoundaryMaxLengthPlusOne,
        Self::BoundaryMinItemsMinusOne,
        Self::BoundaryMaxItemsPlusOne,
        Self::ArrayTooShort,
        Self::ArrayTooLong,
        Self::ArrayNotUnique,
        Self::ArrayItemTypeViolation,
        Self::AdditionalPropertyNotAllowed,
        Self::ObjectValueTypeViolation,
        Self::EmptyString,
        Self::WhitespaceOnly,
        Self::SqlInjection,
        Self::XssInjection,
        Self::CommandInjection,
        Self::HeaderInjection,
        Self::PathTraversal,
    ];

    /// The stable `SCREAMING_SNAKE_CASE` token used in wire payloads and
    /// rendered test names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HappyPath => "HAPPY_PATH",
            Self::RequiredFieldMissing => "REQUIRED_FIELD_MISSING",
            Self::RequiredArgMissing => "REQUIRED_ARG_MISSING",
            Self::NullNotAllowed => "NULL_NOT_ALLOWED",
            Self::TypeViolation => "TYPE_VIOLATION",
            Self::UnexpectedArgument => "UNEXPECTED_ARGUMENT",
            Self::UnionNoMatch => "UNION_NO_MATCH",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::FormatInvalidPathParam => "FORMAT_INVALID_PATH_PARAM",
            Self::HeaderMissing => "HEADER_MISSING",
            Self::HeaderEnumMismatch => "HEADER_ENUM_MISMATCH",
            Self::EnumMismatch => "ENUM_MISMATCH",
            Self::StringTooShort => "STRING_TOO_SHORT",
            Self::StringTooLong => "STRING_TOO_LONG",
            Self::PatternMismatch => "PATTERN_MISMATCH",
            Self::FormatInvalid => "FORMAT_INVALID",
            Self::NumberTooSmall => "NUMBER_TOO_SMALL",
            Self::NumberTooLarge => "NUMBER_TOO_LARGE",
            Self::NotMultipleOf => "NOT_MULTIPLE_OF",
            Self::BoundaryMinMinusOne => "BOUNDARY_MIN_MINUS_ONE",
            Self::BoundaryMaxPlusOne => "BOUNDARY_MAX_PLUS_ONE",
            Self::BoundaryMinLengthMinusOne => "BOUNDARY_MIN_LENGTH_MINUS_ONE",
            Self::BoundaryMaxLengthPlusOne => "BOUNDARY_MAX_LENGTH_PLUS_ONE",
            Self::BoundaryMinItemsMinusOne => "BOUNDARY_MIN_ITEMS_MINUS_ONE",
            Self::BoundaryMaxItemsPlusOne => "BOUNDARY_MAX_ITEMS_PLUS_ONE",
            Self::ArrayTooShort => "ARRAY_TOO_SHORT",
            Self::ArrayTooLong => "ARRAY_TOO_LONG",
            Self::ArrayNotUnique => "ARRAY_NOT_UNIQUE",
            Self::ArrayItemTypeViolation => "ARRAY_ITEM_TYPE_VIOLATION",
            Self::AdditionalPropertyNotAllowed => "ADDITIONAL_PROPERTY_NOT_ALLOWED",
            Self::ObjectValueTypeViolation => "OBJECT_VALUE_TYPE_VIOLATION",
            Self::EmptyString => "EMPTY_STRING",
            Self::WhitespaceOnly => "WHITESPACE_ONLY",
            Self::SqlInjection => "SQL_INJECTION",
            Self::XssInjection => "XSS_INJECTION",
            Self::CommandInjection => "COMMAND_INJECTION",
            Self::HeaderInjection => "HEADER_INJECTION",
            Self::PathTraversal => "PATH_TRAVERSAL",
        }
    }

    /// Structural category used to decide expected-outcome status codes
    /// (spec.md §4.2, "Expected outcome").
    #[must_use]
    pub const fn category(self) -> IntentCategory {
        match self {
            Self::HappyPath => IntentCategory::Happy,
            Self::ResourceNotFound => IntentCategory::Resource,
            Self::RequiredFieldMissing
            | Self::RequiredArgMissing
            | Self::NullNotAllowed
            | Self::TypeViolation
            | Self::UnexpectedArgument
            | Self::UnionNoMatch
            | Self::FormatInvalidPathParam
            | Self::HeaderMissing
            | Self::HeaderEnumMismatch
            | Self::EnumMismatch
            | Self::StringTooShort
            | Self::StringTooLong
            | Self::PatternMismatch
            | Self::FormatInvalid
            | Self::NumberTooSmall
            | Self::NumberTooLarge
            | Self::NotMultipleOf
            | Self::BoundaryMinMinusOne
            | Self::BoundaryMaxPlusOne
            | Self::BoundaryMinLengthMinusOne
            | Self::BoundaryMaxLengthPlusOne
            | Self::BoundaryMinItemsMinusOne
            | Self::BoundaryMaxItemsPlusOne
            | Self::ArrayTooShort
            | Self::ArrayTooLong
            | Self::ArrayNotUnique
            | Self::ArrayItemTypeViolation
            | Self::AdditionalPropertyNotAllowed
            | Self::ObjectValueTypeViolation
            | Self::EmptyString
            | Self::WhitespaceOnly => IntentCategory::Validation,
            Self::SqlInjection | Self::XssInjection | Self::CommandInjection | Self::HeaderInjection | Self::PathTraversal => {
                IntentCategory::Security
            }
        }
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural category an intent belongs to, used to pick a deterministic
/// expected HTTP status (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentCategory {
    /// The always-emitted baseline scenario.
    Happy,
    /// A payload-shape or constraint violation.
    Validation,
    /// A path parameter referring to a resource that does not exist.
    Resource,
    /// A free-text field probed with an injection payload.
    Security,
}

#[cfg(test)]
mod tests {
    use super::IntentId;

    #[test]
    fn every_catalog_entry_has_a_stable_token() {
        for id in IntentId::ALL {
            assert!(id.as_str().chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn happy_path_is_first_in_catalog_order() {
        assert_eq!(IntentId::ALL[0], IntentId::HappyPath);
    }
}
