//! # Error Types
//!
//! Scan and build errors. Both are hard: the CLI aborts on either.

use std::path::PathBuf;

use kimbar_core::{CanonicalizationError, ConfigError, ContentKind};
use thiserror::Error;

/// A spec references an asset that does not exist on disk.
///
/// The runtime loader has no fallback for a missing image, so this is
/// build-breaking rather than a warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{referenced_by} references missing asset {asset} (field `{field}`)")]
pub struct MissingFileError {
    /// Source file holding the reference.
    pub referenced_by: PathBuf,
    /// Field that carried the reference.
    pub field: String,
    /// Resolved on-disk path that was not found.
    pub asset: PathBuf,
}

/// Errors raised while discovering content.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The content root does not exist or is not a directory.
    #[error("content root {path} is not a directory")]
    NoContentRoot {
        /// Configured content root.
        path: PathBuf,
    },

    /// Two sources of one kind normalize to the same canonical id even
    /// after parent-category suffixing.
    #[error("duplicate {kind} id `{id}`: {first} and {second}")]
    DuplicateId {
        /// Kind of both sources.
        kind: ContentKind,
        /// The colliding canonical id.
        id: String,
        /// First conflicting source (sorted order).
        first: PathBuf,
        /// Second conflicting source.
        second: PathBuf,
    },

    /// A file name normalizes to an empty slug.
    #[error("cannot derive an id from {path}")]
    EmptyId {
        /// Offending source path.
        path: PathBuf,
    },

    /// A source file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// A source file is not valid JSON.
    #[error("malformed JSON in {path}: {reason}")]
    Parse {
        /// Source path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A referenced asset is missing.
    #[error(transparent)]
    MissingFile(#[from] MissingFileError),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Static configuration under `config/` failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while assembling the registry.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A source lacks a field the registry entry is derived from.
    #[error("invalid {kind} source {path} ({id}): {reason}")]
    InvalidSource {
        /// Kind of the source.
        kind: ContentKind,
        /// Canonical id assigned by the scanner.
        id: String,
        /// Source path.
        path: PathBuf,
        /// What is wrong.
        reason: String,
    },

    /// A registry array is not strictly ascending by id.
    #[error("registry array `{array}` is not sorted at id `{id}`")]
    Unsorted {
        /// Registry field name.
        array: String,
        /// First id out of order.
        id: String,
    },

    /// The content digest could not be computed.
    #[error("content digest: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
