//! # Registry Builder
//!
//! Merges a [`Discovery`] with [`StaticConfig`] into a [`Registry`].
//! Pure aggregation: no IO, no clock, no randomness. The build id is the
//! only run-varying input and is supplied by the caller.

use std::collections::BTreeMap;

use kimbar_core::{ContentKind, PipelineConfig};
use serde_json::Value;

use crate::error::BuildError;
use crate::registry::{
    CharacterEntry, FlashcardPackEntry, InkEntry, Registry, RoomEntry, SpriteEntry,
    TilesetEntry, REGISTRY_SCHEMA,
};
use crate::scan::{Discovered, Discovery};
use crate::static_config::StaticConfig;

/// Default sprite sheet layout kind.
const DEFAULT_SPRITE_KIND: &str = "character";

/// Scalar settings published in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Integer render scale.
    pub scale: u32,
    /// Url prefix prepended to content-root-relative paths.
    pub url_prefix: String,
}

impl BuildSettings {
    /// Settings taken from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            tile_size: config.tile_size,
            scale: config.scale,
            url_prefix: config.url_prefix.clone(),
        }
    }

    /// Url under which a content-root-relative path is served.
    pub fn url_for(&self, rel_path: &str) -> String {
        let rel = rel_path.trim_start_matches('/');
        let prefix = self.url_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            format!("/{rel}")
        } else {
            format!("{prefix}/{rel}")
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Assembles registries.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    statics: StaticConfig,
    settings: BuildSettings,
}

impl RegistryBuilder {
    /// Builder over static tables and settings.
    pub fn new(statics: StaticConfig, settings: BuildSettings) -> Self {
        Self { statics, settings }
    }

    /// Build the registry for `discovery`, stamped with `build_id`.
    ///
    /// # Errors
    ///
    /// `BuildError::InvalidSource` when a source lacks a field its entry
    /// is derived from, `BuildError::Unsorted` if an array is out of
    /// order, and `BuildError::Canonicalization` if the digest cannot be
    /// computed.
    pub fn build(&self, discovery: &Discovery, build_id: &str) -> Result<Registry, BuildError> {
        let mut registry = Registry {
            schema: REGISTRY_SCHEMA.to_string(),
            build_id: String::new(),
            content_digest: String::new(),
            tile_size: self.settings.tile_size,
            scale: self.settings.scale,
            entity_schema: self.statics.entity_schema.clone(),
            outfits: self.statics.outfits.clone(),
            tags: self.statics.tags.clone(),
            flat_tags: self.statics.tags.flatten(),
            sprites: BTreeMap::new(),
            characters: Vec::new(),
            rooms: Vec::new(),
            flashcard_packs: Vec::new(),
            ink: Vec::new(),
            tilesets: Vec::new(),
        };

        for item in discovery.items() {
            match item.kind {
                ContentKind::Character => registry.characters.push(self.character(item)),
                ContentKind::Room => registry.rooms.push(self.room(item)?),
                ContentKind::FlashcardPack => registry.flashcard_packs.push(self.deck(item)?),
                ContentKind::Ink => registry.ink.push(InkEntry {
                    id: item.id.clone(),
                    url: self.settings.url_for(&item.rel_path),
                }),
                ContentKind::Sprite => {
                    registry.sprites.insert(item.id.clone(), self.sprite(item)?);
                }
                ContentKind::Tileset => registry.tilesets.push(TilesetEntry {
                    id: item.id.clone(),
                    url: self.settings.url_for(&item.rel_path),
                    tile_size: self.settings.tile_size,
                }),
            }
        }

        if let Some(issue) = registry.ordering_issues().into_iter().next() {
            return Err(BuildError::Unsorted {
                array: issue.array.to_string(),
                id: issue.id,
            });
        }

        registry.content_digest = registry.compute_content_digest()?;
        registry.build_id = build_id.to_string();

        tracing::info!(
            build_id = %registry.build_id,
            digest = %registry.content_digest,
            characters = registry.characters.len(),
            rooms = registry.rooms.len(),
            flashcard_packs = registry.flashcard_packs.len(),
            ink = registry.ink.len(),
            sprites = registry.sprites.len(),
            tilesets = registry.tilesets.len(),
            "registry built"
        );
        Ok(registry)
    }

    fn character(&self, item: &Discovered) -> CharacterEntry {
        CharacterEntry {
            id: item.id.clone(),
            name: item
                .str_field("name")
                .map_or_else(|| item.slug().to_string(), str::to_string),
            url: self.settings.url_for(&item.rel_path),
            sprite: item.str_field("sprite").map(str::to_string),
        }
    }

    fn room(&self, item: &Discovered) -> Result<RoomEntry, BuildError> {
        let level = item
            .str_field("level")
            .ok_or_else(|| invalid(item, "missing string field `level`"))?;
        Ok(RoomEntry {
            id: item.id.clone(),
            display_name: item
                .str_field("displayName")
                .map_or_else(|| title_case(item.slug()), str::to_string),
            level_url: self.settings.url_for(level),
        })
    }

    fn deck(&self, item: &Discovered) -> Result<FlashcardPackEntry, BuildError> {
        let payload = item.payload.as_ref();
        let (records, schema_version) = match payload {
            Some(Value::Array(records)) => (records, 1),
            Some(Value::Object(envelope)) => {
                let records = envelope
                    .get("cards")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid(item, "envelope has no `cards` array"))?;
                let version = envelope
                    .get("schemaVersion")
                    .and_then(Value::as_u64)
                    .unwrap_or(1);
                (records, version)
            }
            _ => return Err(invalid(item, "expected a record array or a `cards` envelope")),
        };
        Ok(FlashcardPackEntry {
            id: item.id.clone(),
            url: self.settings.url_for(&item.rel_path),
            count: records.len() as u64,
            schema_version,
        })
    }

    fn sprite(&self, item: &Discovered) -> Result<SpriteEntry, BuildError> {
        let image = item
            .str_field("image")
            .ok_or_else(|| invalid(item, "missing string field `image`"))?;
        let dimension = |field: &str| {
            item.payload
                .as_ref()
                .and_then(|p| p.get(field))
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| invalid(item, &format!("`{field}` must be a positive integer")))
        };
        Ok(SpriteEntry {
            url: self.settings.url_for(image),
            frame_width: dimension("frameWidth")?,
            frame_height: dimension("frameHeight")?,
            kind: item
                .str_field("kind")
                .unwrap_or(DEFAULT_SPRITE_KIND)
                .to_string(),
            portrait_url: item.str_field("portrait").map(|p| self.settings.url_for(p)),
        })
    }
}

fn invalid(item: &Discovered, reason: &str) -> BuildError {
    BuildError::InvalidSource {
        kind: item.kind,
        id: item.id.clone(),
        path: item.source.clone(),
        reason: reason.to_string(),
    }
}

/// `court_room` → `Court Room`.
fn title_case(slug: &str) -> String {
    slug.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
