//! # Error Types
//!
//! The loader surfaces the first failure it meets, so [`LoadError`]
//! wraps each stage's error with the level id it was loading.

use thiserror::Error;

use crate::validate::LevelReport;

/// A level document cannot be projected onto the canonical shape.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The document root is not a JSON object.
    #[error("level document is not a JSON object")]
    NotAnObject,

    /// An entity carries none of the supported coordinate forms.
    #[error("entity #{index} ({entity_type}) has no position")]
    MissingPosition {
        /// Entity type.
        entity_type: String,
        /// Position in document order.
        index: usize,
    },

    /// A grid layer declares more cells than the normalizer allocates.
    #[error("layer `{layer}` is {cols}x{rows} cells, above the limit of {limit}")]
    LayerTooLarge {
        /// Layer identifier.
        layer: String,
        /// Declared columns.
        cols: usize,
        /// Declared rows.
        rows: usize,
        /// Cell limit.
        limit: usize,
    },

    /// A canonical document does not match the level shape.
    #[error("malformed canonical level: {0}")]
    Canonical(#[from] serde_json::Error),
}

/// Fetching level bytes failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Nothing exists at the url.
    #[error("not found: {url}")]
    NotFound {
        /// Requested url.
        url: String,
    },

    /// The url is not served by this fetcher.
    #[error("url {url} is outside {prefix}")]
    OutsidePrefix {
        /// Requested url.
        url: String,
        /// Prefix this fetcher serves.
        prefix: String,
    },

    /// Transport failure.
    #[error("io error fetching {url}: {source}")]
    Io {
        /// Requested url.
        url: String,
        /// Underlying failure.
        source: std::io::Error,
    },
}

/// Loading a level by id failed.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The registry has no room with this id.
    #[error("unknown level `{id}`")]
    UnknownLevel {
        /// Requested id.
        id: String,
    },

    /// The level bytes could not be fetched.
    #[error("fetching level `{id}`: {source}")]
    Fetch {
        /// Requested id.
        id: String,
        /// Fetch failure.
        source: FetchError,
    },

    /// The bytes are not JSON.
    #[error("parsing level `{id}`: {reason}")]
    Parse {
        /// Requested id.
        id: String,
        /// Parser message.
        reason: String,
    },

    /// The document could not be normalized.
    #[error("normalizing level `{id}`: {source}")]
    Normalize {
        /// Requested id.
        id: String,
        /// Normalizer failure.
        source: NormalizeError,
    },

    /// The level has hard validation errors.
    #[error("level `{id}` failed validation: {}", .report.error_lines().join("; "))]
    Invalid {
        /// Requested id.
        id: String,
        /// Full validation report.
        report: LevelReport,
    },
}
