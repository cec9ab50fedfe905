//! # kimbar-registry — Discovery and Registry Assembly
//!
//! The build half of the pipeline:
//!
//! ```text
//! content root ──► Scanner ──► Discovery ──► RegistryBuilder ──► Registry
//!                                  ▲
//!                     StaticConfig ┘ (outfits, tags, entity schema)
//! ```
//!
//! ## Determinism
//!
//! [`Discovery`] is sorted by canonical id once, on construction. Every
//! registry array inherits that order and [`RegistryBuilder`] re-checks
//! it before returning. The registry's `contentDigest` is computed over
//! JCS-canonical bytes with `buildId` blanked, so two builds of the same
//! tree agree on it regardless of the build id.
//!
//! ## Failure Policy
//!
//! Scanning and building fail fast: an unreadable or malformed source,
//! a duplicate id, or a referenced asset missing from disk aborts the
//! run. A corrupt registry is worse than none.

pub mod builder;
pub mod error;
pub mod registry;
pub mod scan;
pub mod static_config;

pub use builder::{BuildSettings, RegistryBuilder};
pub use error::{BuildError, MissingFileError, ScanError};
pub use registry::{
    CharacterEntry, FlashcardPackEntry, InkEntry, OrderingIssue, OrderingIssueKind, Registry,
    RoomEntry, SpriteEntry, TilesetEntry, REGISTRY_SCHEMA,
};
pub use scan::{assign_ids, Discovered, Discovery, Scanner};
pub use static_config::{Outfit, StaticConfig, TagSet};
