//! # kimbar-schema — Structural Validation
//!
//! Loads one JSON Schema per content kind from a schema directory and
//! validates documents against it.
//!
//! ## Naming Convention
//!
//! A kind named `room` is validated against `room.schema.json`. Schemas
//! are optional per kind: [`SchemaValidator::has_schema`] lets callers
//! report a kind with no schema instead of silently passing it.
//!
//! ## Crate Policy
//!
//! - No network access. Every `$ref` resolves against the loaded schema
//!   set; unknown references resolve to the permissive schema `{}`.
//! - Invalid documents are rejected with structured violations carrying
//!   the instance path, the schema path and a message.

pub mod validate;

pub use validate::{SchemaValidationError, SchemaValidator, ValidationViolations, Violation};
