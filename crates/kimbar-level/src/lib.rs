//! # kimbar-level — Canonical Levels
//!
//! - [`level`]: the canonical [`Level`] shape every consumer reads.
//! - [`normalize`]: projects editor exports (or canonical documents) onto it.
//! - [`validate`]: table-driven entity rules, returning a [`LevelReport`].
//! - [`loader`]: the runtime cache that fetches, normalizes and validates
//!   levels by id.
//!
//! The rendering side never reads raw level files; it asks a
//! [`LevelLoader`] for a canonical level and substitutes its own fallback
//! when the load is rejected.

pub mod error;
pub mod level;
pub mod loader;
pub mod normalize;
pub mod validate;

pub use error::{FetchError, LoadError, NormalizeError};
pub use level::{Entity, Layer, Layers, Level, Point, Shape, TilesetRef};
pub use loader::{FsFetcher, LevelFetcher, LevelLoader, LoaderOptions, PreloadReport};
pub use normalize::{normalize, NormalizeOptions, LEGACY_PROPERTY_NAMES, MAX_LAYER_CELLS};
pub use validate::{LevelCode, LevelFinding, LevelReport, LevelValidator};
