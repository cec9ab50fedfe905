//! # Level Loader
//!
//! Caller-owned cache of canonical levels keyed by room id.
//!
//! ```text
//! load(id) ─► cache hit? ──yes──► Arc<Level>
//!                 │ no
//!                 ▼
//!     registry url ─► fetch ─► parse ─► normalize ─► validate ─► cache
//! ```
//!
//! The fetch is the only await point. The cache lock is never held
//! across it, so two concurrent first loads of one id both fetch and the
//! later insert wins. Levels with hard validation errors are returned as
//! [`LoadError::Invalid`] and never cached; warnings do not block.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use kimbar_core::{strip_url_prefix, PipelineConfig, Viewport};
use kimbar_registry::Registry;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{FetchError, LoadError};
use crate::level::Level;
use crate::normalize::{normalize, NormalizeOptions};
use crate::validate::LevelValidator;

/// Source of level bytes.
#[async_trait]
pub trait LevelFetcher: Send + Sync {
    /// Fetch the document at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[async_trait]
impl<T: LevelFetcher + ?Sized> LevelFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url).await
    }
}

/// Serves urls under a prefix from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
    url_prefix: String,
}

impl FsFetcher {
    /// Map `<url_prefix>/<path>` onto `<root>/<path>`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Fetcher for the configured content root and url prefix.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.content_root.clone(), config.url_prefix.clone())
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        let rel = strip_url_prefix(&self.url_prefix, url).ok_or_else(|| FetchError::OutsidePrefix {
            url: url.to_string(),
            prefix: self.url_prefix.clone(),
        })?;
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl LevelFetcher for FsFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(url)?;
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound {
                    url: url.to_string(),
                }
            } else {
                FetchError::Io {
                    url: url.to_string(),
                    source,
                }
            }
        })
    }
}

/// Loader defaults not carried by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoaderOptions {
    /// Size substituted when a level's own cannot be determined.
    pub default_viewport: Viewport,
}

impl LoaderOptions {
    /// Options taken from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            default_viewport: config.default_viewport,
        }
    }
}

/// Outcome of a preload batch.
#[derive(Debug, Default)]
pub struct PreloadReport {
    /// Ids now cached.
    pub loaded: Vec<String>,
    /// Ids that failed, with the cause.
    pub failed: Vec<(String, LoadError)>,
}

impl PreloadReport {
    /// Whether every member loaded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches, normalizes, validates and caches levels.
pub struct LevelLoader<F> {
    urls: BTreeMap<String, String>,
    fetcher: F,
    normalize: NormalizeOptions,
    validator: LevelValidator,
    cache: Mutex<HashMap<String, Arc<Level>>>,
}

impl<F: LevelFetcher> LevelLoader<F> {
    /// Loader over the rooms of `registry`. The registry is read once;
    /// the loader keeps no reference to it.
    pub fn new(registry: &Registry, fetcher: F, options: LoaderOptions) -> Self {
        Self {
            urls: registry
                .rooms
                .iter()
                .map(|room| (room.id.clone(), room.level_url.clone()))
                .collect(),
            fetcher,
            normalize: NormalizeOptions {
                tile_size: registry.tile_size,
                default_viewport: options.default_viewport,
            },
            validator: LevelValidator::new(registry.entity_schema.clone()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Level ids the registry knows, sorted.
    pub fn level_ids(&self) -> impl Iterator<Item = &str> {
        self.urls.keys().map(String::as_str)
    }

    /// Load a level, from cache when possible.
    ///
    /// # Errors
    ///
    /// The first failure met: `UnknownLevel`, `Fetch`, `Parse`,
    /// `Normalize`, or `Invalid` (hard validation errors).
    pub async fn load(&self, id: &str) -> Result<Arc<Level>, LoadError> {
        let cached = self.cache.lock().get(id).cloned();
        if let Some(level) = cached {
            tracing::trace!(level = %id, "level cache hit");
            return Ok(level);
        }

        let url = self.urls.get(id).ok_or_else(|| LoadError::UnknownLevel { id: id.to_string() })?;
        tracing::debug!(level = %id, url = %url, "fetching level");
        let bytes = self.fetcher.fetch(url).await.map_err(|source| LoadError::Fetch {
            id: id.to_string(),
            source,
        })?;

        let doc: Value = serde_json::from_slice(&bytes).map_err(|e| LoadError::Parse {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        let level = normalize(&doc, id, &self.normalize).map_err(|source| LoadError::Normalize {
            id: id.to_string(),
            source,
        })?;

        let report = self.validator.validate(&level);
        if !report.valid {
            return Err(LoadError::Invalid {
                id: id.to_string(),
                report,
            });
        }
        for warning in &report.warnings {
            tracing::warn!(level = %id, code = %warning.code, "{}", warning.message);
        }

        let level = Arc::new(level);
        self.cache.lock().insert(id.to_string(), Arc::clone(&level));
        Ok(level)
    }

    /// Drop one cached level. Returns whether it was cached.
    pub fn evict(&self, id: &str) -> bool {
        self.cache.lock().remove(id).is_some()
    }

    /// Drop every cached level.
    pub fn evict_all(&self) {
        self.cache.lock().clear();
    }

    /// Whether `id` is cached.
    pub fn is_cached(&self, id: &str) -> bool {
        self.cache.lock().contains_key(id)
    }

    /// Cached ids, sorted.
    pub fn cached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.cache.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Load every id concurrently. One member's failure is logged and
    /// does not stop the rest.
    pub async fn preload<I, S>(&self, ids: I) -> PreloadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        let results = join_all(ids.iter().map(|id| self.load(id))).await;

        let mut report = PreloadReport::default();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(_) => report.loaded.push(id),
                Err(e) => {
                    tracing::warn!(level = %id, error = %e, "preload member failed");
                    report.failed.push((id, e));
                }
            }
        }
        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "preload settled"
        );
        report
    }
}
