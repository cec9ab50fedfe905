//! # Registry Document
//!
//! The single artifact the runtime reads to discover content. Serialized
//! as camelCase JSON:
//!
//! ```json
//! {
//!   "schema": "kimbar.registry.v1",
//!   "buildId": "2026-10-18T09:00:00Z",
//!   "contentDigest": "…",
//!   "tileSize": 32,
//!   "scale": 2,
//!   "entitySchema": { "Door": { "required": ["targetLevel"], "optional": [] } },
//!   "outfits": { "robe": { "id": "robe", "name": "Robe", "buffs": [] } },
//!   "tags": { "subjects": [], "topicTags": [] },
//!   "flatTags": [],
//!   "sprites": {},
//!   "characters": [],
//!   "rooms": [ { "id": "room.lobby", "displayName": "Lobby", "levelUrl": "/content/levels/lobby.json" } ],
//!   "flashcardPacks": [],
//!   "ink": [],
//!   "tilesets": []
//! }
//! ```

use std::collections::BTreeMap;

use kimbar_core::{sha256_digest, CanonicalBytes, CanonicalizationError, EntitySchemaTable};
use serde::{Deserialize, Serialize};

use crate::static_config::{Outfit, TagSet};

/// Value of the `schema` field.
pub const REGISTRY_SCHEMA: &str = "kimbar.registry.v1";

/// Sprite sheet descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteEntry {
    /// Url of the sheet image.
    pub url: String,
    /// Frame width in pixels.
    pub frame_width: u32,
    /// Frame height in pixels.
    pub frame_height: u32,
    /// Sheet layout kind (e.g. `character`, `prop`).
    pub kind: String,
    /// Url of the portrait image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_url: Option<String>,
}

/// Character entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterEntry {
    /// Canonical id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Url of the character spec.
    pub url: String,
    /// Sprite id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
}

/// Room entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntry {
    /// Canonical id; also the level id used by the loader.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Url of the level document.
    pub level_url: String,
}

/// Question deck entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardPackEntry {
    /// Canonical id.
    pub id: String,
    /// Url of the deck file.
    pub url: String,
    /// Number of records in the deck file at build time.
    pub count: u64,
    /// Envelope schema version.
    pub schema_version: u64,
}

/// Compiled narrative script entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkEntry {
    /// Canonical id.
    pub id: String,
    /// Url of the compiled script.
    pub url: String,
}

/// Tileset image entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetEntry {
    /// Canonical id.
    pub id: String,
    /// Url of the image.
    pub url: String,
    /// Tile edge length in pixels.
    pub tile_size: u32,
}

/// The registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    /// Always [`REGISTRY_SCHEMA`].
    pub schema: String,
    /// Externally supplied build stamp.
    pub build_id: String,
    /// Hex SHA-256 of the canonical registry with `buildId` and
    /// `contentDigest` blanked.
    pub content_digest: String,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Integer render scale.
    pub scale: u32,
    /// Entity-type property rules.
    pub entity_schema: EntitySchemaTable,
    /// Outfits keyed by id.
    pub outfits: BTreeMap<String, Outfit>,
    /// Structured tag vocabulary.
    pub tags: TagSet,
    /// Flat tag list for consumers predating the structured tag set.
    pub flat_tags: Vec<String>,
    /// Sprites keyed by id.
    pub sprites: BTreeMap<String, SpriteEntry>,
    /// Characters, sorted by id.
    pub characters: Vec<CharacterEntry>,
    /// Rooms, sorted by id.
    pub rooms: Vec<RoomEntry>,
    /// Question decks, sorted by id.
    pub flashcard_packs: Vec<FlashcardPackEntry>,
    /// Narrative scripts, sorted by id.
    pub ink: Vec<InkEntry>,
    /// Tileset images, sorted by id.
    #[serde(default)]
    pub tilesets: Vec<TilesetEntry>,
}

/// What is wrong with an id array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingIssueKind {
    /// An id is smaller than its predecessor.
    Unsorted,
    /// An id equals its predecessor.
    Duplicate,
}

/// An ordering defect in one registry array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingIssue {
    /// Registry field name.
    pub array: &'static str,
    /// Offending id.
    pub id: String,
    /// Defect kind.
    pub kind: OrderingIssueKind,
}

impl Registry {
    /// Compute the content digest: SHA-256 over the JCS bytes of this
    /// registry with `buildId` and `contentDigest` blanked.
    pub fn compute_content_digest(&self) -> Result<String, CanonicalizationError> {
        let mut blank = self.clone();
        blank.build_id.clear();
        blank.content_digest.clear();
        let canonical = CanonicalBytes::new(&blank)?;
        Ok(sha256_digest(&canonical).to_hex())
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Parse a registry document.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Look up a room by id.
    pub fn room(&self, id: &str) -> Option<&RoomEntry> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// Look up a character by id.
    pub fn character(&self, id: &str) -> Option<&CharacterEntry> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Ids of every array, by registry field name.
    pub fn id_arrays(&self) -> [(&'static str, Vec<&str>); 5] {
        fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<&str> {
            items.iter().map(id).collect()
        }
        [
            ("characters", ids(&self.characters, |c| &c.id)),
            ("rooms", ids(&self.rooms, |r| &r.id)),
            ("flashcardPacks", ids(&self.flashcard_packs, |p| &p.id)),
            ("ink", ids(&self.ink, |i| &i.id)),
            ("tilesets", ids(&self.tilesets, |t| &t.id)),
        ]
    }

    /// Every array position whose id is not strictly greater than its
    /// predecessor's.
    pub fn ordering_issues(&self) -> Vec<OrderingIssue> {
        let mut issues = Vec::new();
        for (array, ids) in self.id_arrays() {
            for pair in ids.windows(2) {
                let kind = match pair[0].cmp(pair[1]) {
                    std::cmp::Ordering::Less => continue,
                    std::cmp::Ordering::Equal => OrderingIssueKind::Duplicate,
                    std::cmp::Ordering::Greater => OrderingIssueKind::Unsorted,
                };
                issues.push(OrderingIssue {
                    array,
                    id: pair[1].to_string(),
                    kind,
                });
            }
        }
        issues
    }
}
