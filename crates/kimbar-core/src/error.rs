//! # Error Types
//!
//! Errors shared by every pipeline crate. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use std::path::PathBuf;

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Registry numbers (tile sizes, frame sizes, counts) are integers.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error loading pipeline or static content configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML/JSON for its shape.
    #[error("invalid config {path}: {reason}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A value is present but out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}
