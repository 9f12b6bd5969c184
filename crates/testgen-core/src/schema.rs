// crates/testgen-core/src/schema.rs
// ============================================================================
// Module: Schema Model
// Description: The Schema sum type and its per-variant constraint records.
// Purpose: Give every stage a single, total representation of "what shape
//          of value is allowed here" independent of source dialect.
// Dependencies: indexmap, serde
// ============================================================================

//! ## Overview
//! [`Schema`] models the polymorphic, duck-typed schema values every source
//! dialect produces as a tagged sum type. Constraints live in independent
//! per-variant records (spec.md §3): a `Schema::Integer` always carries
//! [`NumericConstraints`] even if every field is `None`, so traversals over
//! schema variants are total pattern matches rather than dynamic field
//! lookups.
//!
//! `Ref` variants carry an index into the owning [`crate::Specification`]'s
//! `types` arena (spec.md §9, "named type references without cycles"): the
//! parser is responsible for resolving references before they reach
//! downstream stages, but the marker is preserved so the renderer can emit
//! `import Status` for named enums and object models.

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// A schema value: the sum type every dialect's types collapse into.
///
/// # Invariants
/// - Constraint fields on a variant that does not logically use them (e.g. a
///   `pattern` on an `Array`) simply do not exist on that variant; there is
///   no "ignored field" state to reason about.
/// - `Ref` always resolves to a declared [`crate::TypeDecl`] in the owning
///   specification (parser-enforced, spec.md §3 invariant 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Schema {
    /// A string value.
    String {
        /// Constraints on the string's shape.
        constraints: StringConstraints,
    },
    /// An integer value.
    Integer {
        /// Constraints on the integer's range.
        constraints: NumericConstraints,
    },
    /// A floating-point number value.
    Number {
        /// Constraints on the number's range.
        constraints: NumericConstraints,
    },
    /// A boolean value.
    Boolean,
    /// The null value.
    Null,
    /// An array of homogeneous items.
    Array {
        /// Schema shared by every element.
        items: Box<Schema>,
        /// Constraints on array length and uniqueness.
        constraints: ArrayConstraints,
    },
    /// An object with declared properties.
    Object {
        /// Declared properties, insertion-ordered (significant: drives
        /// deterministic golden-record and required-field emission order).
        properties: IndexMap<String, Schema>,
        /// Subset of `properties` keys that must be present.
        required: IndexSet<String>,
        /// Whether properties outside `properties` are tolerated.
        additional_allowed: bool,
        /// Constraints on property count and cross-field dependencies.
        constraints: ObjectConstraints,
    },
    /// An enumerated set of literal values.
    Enum {
        /// Declared values, in source order; `values[0]` is the golden-record
        /// default (spec.md §4.3).
        values: Vec<Value>,
        /// The primitive type every value in `values` is acceptable under
        /// (spec.md §3 invariant 4).
        base_type: EnumBaseType,
        /// The named type this enum was declared as, if any (preserved so
        /// the renderer can emit an import for it).
        named_type_ref: Option<usize>,
    },
    /// A discriminated union of alternative schemas.
    Union {
        /// Candidate schemas; `variants[0]` is the golden-record default.
        variants: Vec<Schema>,
    },
    /// A reference to a named type declaration.
    ///
    /// Downstream stages generally see schemas fully inlined except where a
    /// parser preserves a marker for named enums/objects (spec.md §3); this
    /// variant is that marker.
    Ref {
        /// Index into the owning specification's `types` arena.
        to: usize,
    },
    /// An unconstrained value of any shape.
    Any,
}

impl Schema {
    /// Returns the `nullable` flag common to every constrainable variant, or
    /// `false` for variants that carry no such flag (`Boolean`, `Null`,
    /// `Object`, `Enum`, `Union`, `Ref`, `Any`).
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::String { constraints } => constraints.nullable,
            Self::Integer { constraints } | Self::Number { constraints } => constraints.nullable,
            _ => false,
        }
    }

    /// Convenience constructor for an unconstrained string.
    #[must_use]
    pub fn plain_string() -> Self {
        Self::String { constraints: StringConstraints::default() }
    }

    /// Convenience constructor for an unconstrained integer.
    #[must_use]
    pub fn plain_integer() -> Self {
        Self::Integer { constraints: NumericConstraints::default() }
    }

    /// Unwraps a `Union` with exactly one variant down to that variant,
    /// recursively (spec.md §8 boundary behavior: "a union with one variant
    /// collapses to that variant"). Schemas with zero or multiple variants
    /// are returned unchanged.
    #[must_use]
    pub fn collapse_single_variant_union(&self) -> &Schema {
        let mut current = self;
        while let Self::Union { variants } = current {
            if variants.len() == 1 {
                current = &variants[0];
            } else {
                break;
            }
        }
        current
    }

    /// Follows a `Ref` to the [`crate::TypeDecl`] it names and returns the
    /// wrapped schema, recursively (a `TypeDecl::Alias` may itself wrap
    /// another `Ref`). Non-`Ref` schemas are returned unchanged.
    ///
    /// `types` is the owning [`crate::Specification`]'s `types` arena;
    /// callers hold a valid specification so every index is in bounds
    /// (spec.md §3 invariant 1).
    #[must_use]
    pub fn resolve<'a>(&'a self, types: &'a [crate::spec::TypeDecl]) -> &'a Schema {
        let mut current = self;
        while let Self::Ref { to } = current {
            let Some(decl) = types.get(*to) else { break };
            current = decl.kind.inner();
        }
        current
    }
}

/// The primitive type every value of a declared [`Schema::Enum`] must be
/// acceptable under (spec.md §3 invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumBaseType {
    /// Every value is a JSON string.
    String,
    /// Every value is a JSON integer.
    Integer,
}

/// Constraints on a [`Schema::String`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringConstraints {
    /// Minimum length, inclusive.
    pub min_len: Option<usize>,
    /// Maximum length, inclusive.
    pub max_len: Option<usize>,
    /// Regex the value must match.
    pub pattern: Option<String>,
    /// Named format the value must satisfy.
    pub format: Option<StringFormat>,
    /// Whether `null` is an acceptable value in addition to a string.
    pub nullable: bool,
}

/// Named string formats recognized by the mutator and intent generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    /// RFC 5322 email address.
    Email,
    /// RFC 4122 UUID.
    Uuid,
    /// ISO 8601 calendar date.
    Date,
    /// ISO 8601 date-time.
    DateTime,
    /// IPv4 dotted-quad address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
    /// RFC 3986 URI.
    Uri,
    /// A named format the generator does not special-case.
    Other,
}

/// Constraints on a [`Schema::Integer`] or [`Schema::Number`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericConstraints {
    /// Inclusive minimum, unless `exclusive_min` is set.
    pub min: Option<f64>,
    /// Inclusive maximum, unless `exclusive_max` is set.
    pub max: Option<f64>,
    /// Whether `min` is an exclusive bound.
    pub exclusive_min: bool,
    /// Whether `max` is an exclusive bound.
    pub exclusive_max: bool,
    /// The value must be an integer multiple of this number.
    pub multiple_of: Option<f64>,
    /// Whether `null` is an acceptable value in addition to a number.
    pub nullable: bool,
}

/// Constraints on a [`Schema::Array`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayConstraints {
    /// Minimum element count, inclusive.
    pub min_items: Option<usize>,
    /// Maximum element count, inclusive.
    pub max_items: Option<usize>,
    /// Whether elements must be pairwise distinct.
    pub unique_items: bool,
}

/// Constraints on a [`Schema::Object`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectConstraints {
    /// Minimum property count, inclusive.
    pub min_props: Option<usize>,
    /// Maximum property count, inclusive.
    pub max_props: Option<usize>,
    /// Dependent-required rules: presence of the key implies presence of
    /// every named dependency.
    pub dependent_required: IndexMap<String, Vec<String>>,
    /// Schema every property outside `properties` must satisfy, when
    /// `additional_allowed` is `true` and the source declared one: an
    /// HTTP `additionalProperties` schema, or a dynamic-source `Dict[K, V]`
    /// value type (the key type is assumed string-like and is not modeled
    /// separately, matching every source dialect's JSON object keys).
    pub additional_properties_schema: Option<Box<Schema>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_schema_round_trips_through_json() {
        let schema = Schema::Array {
            items: Box::new(Schema::plain_string()),
            constraints: ArrayConstraints { min_items: Some(1), max_items: Some(3), unique_items: true },
        };
        let json = serde_json::to_value(&schema).expect("serialize");
        let back: Schema = serde_json::from_value(json).expect("deserialize");
        assert_eq!(schema, back);
    }

    #[test]
    fn non_numeric_variants_are_never_nullable() {
        assert!(!Schema::Boolean.is_nullable());
        assert!(!Schema::Any.is_nullable());
    }
}
