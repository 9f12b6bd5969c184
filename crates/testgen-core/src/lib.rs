// crates/testgen-core/src/lib.rs
// ============================================================================
// Module: Test Generation Core Library
// Description: Canonical IR, schema model, and generation-request contract.
// Purpose: Provide the dialect-neutral intermediate representation every
//          pipeline stage (parse, intent, payload, fixture, render, llm)
//          consumes and produces.
// Dependencies: serde, serde_json, serde_jcs, sha2, indexmap
// ============================================================================

//! ## Overview
//! This crate owns the Intermediate Representation (IR) that the three
//! dialect parsers emit and every downstream stage consumes: [`Specification`],
//! [`Operation`], [`Parameter`], [`Schema`] and its constraint vocabulary, and
//! [`TypeDecl`]. It also owns the [`GenerationRequest`] contract and the
//! frozen [`IntentId`] catalog, since both are shared by every stage rather
//! than owned by any single one.
//!
//! Specifications are immutable after parsing: every later artifact is a pure
//! function of upstream artifacts plus configuration. This crate never
//! executes a pipeline stage; it only defines the values stages exchange.
//!
//! ## Index
//! - IR: [`Specification`], [`TypeDecl`], [`TypeDeclKind`]
//! - Operations: [`Operation`], [`OperationKind`], [`Parameter`], [`ParamLocation`], [`Response`]
//! - Schema: [`Schema`], [`StringConstraints`], [`NumericConstraints`], [`ArrayConstraints`], [`ObjectConstraints`]
//! - Contract: [`GenerationRequest`], [`SourceDialect`], [`TargetFramework`], [`IntentId`]
//! - Determinism: [`hashing::canonical_json_bytes`], [`hashing::hash_canonical_json`]

pub mod error;
pub mod hashing;
pub mod intent_id;
pub mod request;
pub mod schema;
pub mod spec;

pub use error::InvariantError;
pub use intent_id::IntentCategory;
pub use intent_id::IntentId;
pub use request::GenerationRequest;
pub use request::LlmConfig;
pub use request::LlmEndpointConfig;
pub use request::SourceDialect;
pub use request::TargetFramework;
pub use schema::ArrayConstraints;
pub use schema::NumericConstraints;
pub use schema::ObjectConstraints;
pub use schema::Schema;
pub use schema::StringConstraints;
pub use schema::StringFormat;
pub use spec::HttpMethod;
pub use spec::Operation;
pub use spec::OperationKind;
pub use spec::ParamLocation;
pub use spec::Parameter;
pub use spec::Response;
pub use spec::Specification;
pub use spec::TypeDecl;
pub use spec::TypeDeclKind;
