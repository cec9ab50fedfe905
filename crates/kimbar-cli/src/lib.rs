//! # kimbar-cli — The `kimbar` Command
//!
//! ## Subcommands
//!
//! - `kimbar build` — Scan the content root and write the registry.
//! - `kimbar validate` — Validate content against a registry.
//! - `kimbar level` — Normalize and validate a single level file.
//! - `kimbar load` — Preload levels through the runtime loader.
//!
//! ```bash
//! kimbar build
//! kimbar build --check
//! kimbar validate --registry public/content/registry.json
//! kimbar level content/levels/court.json --emit
//! kimbar load room.court room.lobby
//! ```
//!
//! Every handler returns the process exit code: 0 on success, 1 when the
//! content fails a check. Operational failures surface as errors.

pub mod build;
pub mod level;
pub mod load;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kimbar_core::config::CONFIG_FILE_NAME;
use kimbar_core::PipelineConfig;
use kimbar_registry::{BuildSettings, Registry, RegistryBuilder, Scanner, StaticConfig};

/// A project root and its configuration.
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory holding `kimbar.yaml` (or the working directory).
    pub root: PathBuf,
    /// Loaded configuration, paths resolved.
    pub config: PipelineConfig,
}

impl Project {
    /// Open the project at `root`. An explicit `config_path` wins over
    /// `<root>/kimbar.yaml`; with neither, defaults rooted at `root`.
    pub fn open(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                let path = resolve_path(path, root);
                PipelineConfig::load(&path)
                    .with_context(|| format!("failed to load config: {}", path.display()))?
            }
            None => {
                let path = root.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    PipelineConfig::load(&path)
                        .with_context(|| format!("failed to load config: {}", path.display()))?
                } else {
                    tracing::debug!(root = %root.display(), "no {CONFIG_FILE_NAME}; using defaults");
                    PipelineConfig::rooted_at(root)
                }
            }
        };
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    /// A user-supplied path, relative to the project root when it exists
    /// there.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_path(path, &self.root)
    }

    /// Scan the content root and build a registry in memory.
    pub fn build_registry(&self, build_id: &str) -> Result<Registry> {
        let content_root = &self.config.content_root;
        let discovery = Scanner::new(content_root)
            .scan()
            .with_context(|| format!("content scan failed: {}", content_root.display()))?;
        let statics = StaticConfig::load(content_root).context("failed to load static content config")?;
        let registry = RegistryBuilder::new(statics, BuildSettings::from_config(&self.config))
            .build(&discovery, build_id)
            .context("registry build failed")?;
        Ok(registry)
    }
}

/// Read a registry document from disk.
pub fn read_registry(path: &Path) -> Result<Registry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read registry: {}", path.display()))?;
    Registry::from_json_str(&text).with_context(|| format!("failed to parse registry: {}", path.display()))
}

/// Walk up from `start` to the first directory holding `kimbar.yaml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}

/// Resolve a path that may be relative to the project root.
///
/// Absolute paths are returned as-is. A relative path that exists under
/// `root` resolves there; otherwise it stays relative to the working
/// directory.
pub fn resolve_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let rooted = root.join(path);
    if rooted.exists() {
        rooted
    } else {
        path.to_path_buf()
    }
}
