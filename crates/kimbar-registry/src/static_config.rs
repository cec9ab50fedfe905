//! # Static Content Configuration
//!
//! Tables that are authored by hand rather than discovered, read from
//! `<content_root>/config/`:
//!
//! - `outfits.json`: outfit id → `{id, name, sprite, buffs}`
//! - `tags.json`: `{subjects: [...], topicTags: [...]}`
//! - `entity_schema.json` (optional): replaces the built-in entity table
//!
//! An absent file yields an empty table (or the built-in entity table).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use kimbar_core::{ConfigError, EntitySchemaTable};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Directory under the content root holding static tables.
pub const CONFIG_DIR: &str = "config";

/// Outfit table file name.
pub const OUTFITS_FILE: &str = "outfits.json";

/// A wearable outfit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    /// Declared id; expected to equal the map key.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sprite id worn by the player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
    /// Buff identifiers granted while worn.
    #[serde(default)]
    pub buffs: Vec<String>,
}

/// Tag vocabulary referenced by encounter triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSet {
    /// Broad subjects.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Fine-grained topic tags.
    #[serde(default)]
    pub topic_tags: Vec<String>,
}

impl TagSet {
    /// Sorted, de-duplicated union of subjects and topic tags.
    pub fn flatten(&self) -> Vec<String> {
        self.subjects
            .iter()
            .chain(&self.topic_tags)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether `tag` is a subject or a topic tag.
    pub fn contains(&self, tag: &str) -> bool {
        self.subjects.iter().chain(&self.topic_tags).any(|t| t == tag)
    }
}

/// Static tables merged into the registry by the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticConfig {
    /// Outfit table keyed by id.
    pub outfits: BTreeMap<String, Outfit>,
    /// Tag vocabulary.
    pub tags: TagSet,
    /// Entity-type property rules.
    pub entity_schema: EntitySchemaTable,
}

impl StaticConfig {
    /// Load the static tables under `<content_root>/config/`.
    ///
    /// # Errors
    ///
    /// `ConfigError::Read` if a present file cannot be read and
    /// `ConfigError::Parse` if it is not valid JSON for its shape.
    pub fn load(content_root: &Path) -> Result<Self, ConfigError> {
        let dir = content_root.join(CONFIG_DIR);
        let outfits = load_optional(&Self::outfits_path(content_root))?.unwrap_or_default();
        let tags = load_optional(&dir.join("tags.json"))?.unwrap_or_default();
        let entity_schema = load_optional(&dir.join("entity_schema.json"))?.unwrap_or_default();
        let config = Self {
            outfits,
            tags,
            entity_schema,
        };
        tracing::debug!(
            outfits = config.outfits.len(),
            subjects = config.tags.subjects.len(),
            topic_tags = config.tags.topic_tags.len(),
            entity_types = config.entity_schema.len(),
            "loaded static content config"
        );
        Ok(config)
    }

    /// Where the outfit table lives under `content_root`.
    pub fn outfits_path(content_root: &Path) -> PathBuf {
        content_root.join(CONFIG_DIR).join(OUTFITS_FILE)
    }
}

fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "static config file absent; using default");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StaticConfig::load(dir.path()).unwrap();
        assert!(config.outfits.is_empty());
        assert!(config.tags.subjects.is_empty());
        assert_eq!(config.entity_schema, EntitySchemaTable::default());
    }

    #[test]
    fn loads_outfits_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&cfg).unwrap();
        std::fs::write(
            cfg.join("outfits.json"),
            r#"{"robe": {"id": "robe", "name": "Judicial Robe", "sprite": "sprite.robe", "buffs": ["gravitas"]}}"#,
        )
        .unwrap();
        std::fs::write(
            cfg.join("tags.json"),
            r#"{"subjects": ["law", "civics"], "topicTags": ["torts", "law"]}"#,
        )
        .unwrap();

        let config = StaticConfig::load(dir.path()).unwrap();
        assert_eq!(config.outfits["robe"].name, "Judicial Robe");
        assert_eq!(config.tags.flatten(), vec!["civics", "law", "torts"]);
        assert!(config.tags.contains("torts"));
        assert!(!config.tags.contains("history"));
    }

    #[test]
    fn malformed_table_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&cfg).unwrap();
        std::fs::write(cfg.join("tags.json"), "[1, 2").unwrap();
        let err = StaticConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn entity_schema_override_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&cfg).unwrap();
        std::fs::write(
            cfg.join("entity_schema.json"),
            r#"{"Lamp": {"required": ["lit"]}}"#,
        )
        .unwrap();
        let config = StaticConfig::load(dir.path()).unwrap();
        assert_eq!(config.entity_schema.len(), 1);
        assert_eq!(config.entity_schema.get("Lamp").unwrap().required, vec!["lit"]);
    }
}
