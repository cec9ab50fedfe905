//! # Pipeline Configuration
//!
//! `kimbar.yaml` at the project root. Every field has a default, so an
//! empty file (or no file at all) yields a working configuration:
//!
//! ```yaml
//! content_root: content
//! schema_dir: schemas
//! output: public/content/registry.json
//! url_prefix: /content
//! tile_size: 32
//! scale: 2
//! default_viewport: { width: 640, height: 360 }
//! flashcards:
//!   size_threshold_bytes: 1048576
//!   sample_size: 25
//!   skip_prefixes:
//!     - prefix: "draft_"
//!       reason: "draft cards are excluded until reviewed"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "kimbar.yaml";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root directory of authored content.
    pub content_root: PathBuf,
    /// Directory holding `<kind>.schema.json` files.
    pub schema_dir: PathBuf,
    /// Where `kimbar build` writes the registry document.
    pub output: PathBuf,
    /// Url prefix under which the content root is served at runtime.
    pub url_prefix: String,
    /// Tile edge length in pixels, published in the registry.
    pub tile_size: u32,
    /// Integer render scale, published in the registry.
    pub scale: u32,
    /// Size substituted when a level's own size cannot be inferred.
    pub default_viewport: Viewport,
    /// Question-deck validation policy.
    pub flashcards: FlashcardPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("content"),
            schema_dir: PathBuf::from("schemas"),
            output: PathBuf::from("public/content/registry.json"),
            url_prefix: "/content".to_string(),
            tile_size: 32,
            scale: 2,
            default_viewport: Viewport::default(),
            flashcards: FlashcardPolicy::default(),
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
        }
    }
}

/// Flashcard validation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlashcardPolicy {
    /// Files larger than this get envelope + sample schema validation only.
    pub size_threshold_bytes: u64,
    /// Number of leading records schema-validated for oversized files.
    pub sample_size: usize,
    /// Record id prefixes excluded from validation.
    pub skip_prefixes: Vec<SkipPrefix>,
}

impl Default for FlashcardPolicy {
    fn default() -> Self {
        Self {
            size_threshold_bytes: 1024 * 1024,
            sample_size: 25,
            skip_prefixes: Vec::new(),
        }
    }
}

impl FlashcardPolicy {
    /// The first skip rule whose prefix matches `record_id`.
    pub fn skip_rule_for(&self, record_id: &str) -> Option<&SkipPrefix> {
        self.skip_prefixes
            .iter()
            .find(|rule| !rule.prefix.is_empty() && record_id.starts_with(&rule.prefix))
    }
}

/// A record id prefix excluded from validation, with the reason reported
/// alongside every skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipPrefix {
    /// Id prefix.
    pub prefix: String,
    /// Reason string echoed in the policy-skip report.
    pub reason: String,
}

impl PipelineConfig {
    /// Load a configuration file and resolve its relative paths against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read,
    /// `ConfigError::Parse` if it is not valid YAML for this shape, and
    /// `ConfigError::InvalidValue` for zero sizes.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_yaml_str(&content, base).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    /// Parse configuration from YAML text, resolving relative paths
    /// against `base`.
    pub fn from_yaml_str(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: PipelineConfig = if content.trim().is_empty() {
            PipelineConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                path: PathBuf::from(CONFIG_FILE_NAME),
                reason: e.to_string(),
            })?
        };
        config.validate()?;
        config.resolve_paths(base);
        Ok(config)
    }

    /// Default configuration rooted at `base`.
    pub fn rooted_at(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    /// On-disk path of a url served from the content root, or `None` if
    /// the url is not under `url_prefix`.
    pub fn content_path(&self, url: &str) -> Option<PathBuf> {
        strip_url_prefix(&self.url_prefix, url).map(|rel| self.content_root.join(rel))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tile_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.scale == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scale".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.default_viewport.width == 0 || self.default_viewport.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_viewport".to_string(),
                reason: "width and height must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.content_root, &mut self.schema_dir, &mut self.output] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// The content-root-relative part of `url`, if it lies under `prefix`.
/// Urls escaping the root through `..` are rejected.
pub fn strip_url_prefix<'a>(prefix: &str, url: &'a str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    url.strip_prefix(prefix)
        .filter(|rest| prefix.is_empty() || rest.starts_with('/'))
        .map(|rest| rest.trim_start_matches('/'))
        .filter(|rest| !rest.split('/').any(|part| part == ".."))
}
