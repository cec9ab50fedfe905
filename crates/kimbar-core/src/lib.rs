//! # kimbar-core — Foundational Types for the Content Pipeline
//!
//! Every other crate in the workspace depends on `kimbar-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One id derivation.** [`ContentKind`] and [`canonical_slug`] are the
//!    only way a source path becomes a registry id. The scanner, the
//!    builder and the validators never format ids by hand.
//!
//! 2. **`CanonicalBytes` newtype.** The registry content digest is always
//!    computed over JCS-canonical bytes, so two builds of the same source
//!    tree hash identically regardless of map insertion order.
//!
//! 3. **Table-driven entity rules.** Entity property requirements live in
//!    [`EntitySchemaTable`], not in per-type structs. Source content is
//!    authored by people and external tools, so the bag stays open and
//!    the table decides what is required.
//!
//! 4. **Defaulted configuration.** [`PipelineConfig`] deserializes from a
//!    partial `kimbar.yaml`; every field has a default.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kimbar-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod config;
pub mod digest;
pub mod entity_schema;
pub mod error;
pub mod format;
pub mod id;

pub use canonical::CanonicalBytes;
pub use config::{strip_url_prefix, FlashcardPolicy, PipelineConfig, SkipPrefix, Viewport};
pub use digest::{sha256_digest, ContentDigest};
pub use entity_schema::{EntitySchemaTable, EntityTypeSchema, PLAYER_SPAWN};
pub use error::{CanonicalizationError, ConfigError};
pub use format::{detect_format, SourceFormat};
pub use id::{canonical_slug, ContentKind};
