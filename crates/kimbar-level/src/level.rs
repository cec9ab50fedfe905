//! # Canonical Level
//!
//! ```json
//! {
//!   "id": "room.lobby",
//!   "width": 640, "height": 480, "tileSize": 32,
//!   "layers": { "floor": [[1, 1], [1, 2]], "collision": [{"x": 0, "y": 0, "width": 32, "height": 32}] },
//!   "entities": [ { "type": "Door", "x": 96, "y": 64, "width": 32, "height": 32, "properties": { "targetLevel": "room.hall" } } ],
//!   "tilesets": [ { "key": "Floors", "firstGid": 1 } ],
//!   "playerSpawn": { "x": 48, "y": 64 }
//! }
//! ```
//!
//! Coordinates and sizes are pixels. Tile grids are row-major; `0` is an
//! empty cell.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: i64,
    /// Vertical position.
    pub y: i64,
}

/// An axis-aligned collision rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Layer contents: a tile-index grid or a list of collision shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Layer {
    /// Row-major tile indices.
    Grid(Vec<Vec<i64>>),
    /// Collision rectangles.
    Shapes(Vec<Shape>),
}

/// The five named layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layers {
    /// Ground tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<Layer>,
    /// Wall tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walls: Option<Layer>,
    /// Decorative edge tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<Layer>,
    /// Tiles drawn above entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlays: Option<Layer>,
    /// Collision grid or shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<Layer>,
}

impl Layers {
    /// Mutable slot for a layer name, matched case-insensitively.
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Option<Layer>> {
        match name.to_ascii_lowercase().as_str() {
            "floor" => Some(&mut self.floor),
            "walls" => Some(&mut self.walls),
            "trim" => Some(&mut self.trim),
            "overlays" => Some(&mut self.overlays),
            "collision" => Some(&mut self.collision),
            _ => None,
        }
    }
}

/// A placed entity with an open property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type, e.g. `Door`.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Horizontal position in pixels.
    pub x: i64,
    /// Vertical position in pixels.
    pub y: i64,
    /// Width in pixels.
    #[serde(default)]
    pub width: u32,
    /// Height in pixels.
    #[serde(default)]
    pub height: u32,
    /// Properties, keyed by canonical name.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Entity {
    /// A property that is present and not `null`.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    /// A string property.
    pub fn str_property(&self, name: &str) -> Option<&str> {
        self.property(name)?.as_str()
    }
}

/// A tileset and the global id of its first tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetRef {
    /// Tileset identifier.
    pub key: String,
    /// Global tile id of the tileset's tile 0.
    pub first_gid: u32,
}

/// A canonical level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Level id (the room id it was loaded for).
    #[serde(default)]
    pub id: String,
    /// Width in pixels.
    #[serde(default)]
    pub width: u32,
    /// Height in pixels.
    #[serde(default)]
    pub height: u32,
    /// Tile edge length in pixels.
    #[serde(default)]
    pub tile_size: u32,
    /// Named layers.
    #[serde(default)]
    pub layers: Layers,
    /// Entities in authoring order.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Tilesets in gid order.
    #[serde(default)]
    pub tilesets: Vec<TilesetRef>,
    /// Where the player appears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_spawn: Option<Point>,
    /// Set when width/height are the default viewport, not the level's own.
    #[serde(default, skip_serializing_if = "is_false")]
    pub size_fallback: bool,
    /// PlayerSpawn entities discarded after the first.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub dropped_spawns: u32,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}
