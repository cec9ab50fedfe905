//! # Level Normalizer
//!
//! Projects a level document onto the canonical [`Level`] shape.
//! [`detect_format`] is the only dispatch point: editor exports are
//! rebuilt from their layer instances; anything else is deserialized as
//! a canonical level and left as it is.
//!
//! ## Editor Exports
//!
//! - Entity position, first available wins: `__worldX`/`__worldY`;
//!   `px` shifted from the editor's bottom-centre anchor (`x + grid/2`,
//!   `y + grid`); `__grid` cell × grid size.
//! - Properties come from `fieldInstances` (`__identifier` → `__value`),
//!   then legacy names are renamed per [`LEGACY_PROPERTY_NAMES`].
//! - The first `PlayerSpawn` becomes `playerSpawn`; later ones are
//!   dropped and counted.
//! - Tilesets get consecutive global id ranges starting at 1.
//! - A level with no `pxWid`/`pxHei` and no sized layer falls back to the
//!   caller's default viewport and is marked `sizeFallback`.

use std::collections::{BTreeMap, HashMap};

use kimbar_core::{detect_format, PipelineConfig, SourceFormat, Viewport, PLAYER_SPAWN};
use serde::Deserialize;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::level::{Entity, Layer, Layers, Level, Point, Shape, TilesetRef};

/// Legacy property name → canonical name.
pub const LEGACY_PROPERTY_NAMES: &[(&str, &str)] = &[
    ("inkKnot", "storyKnot"),
    ("ink_knot", "storyKnot"),
    ("knot", "storyKnot"),
    ("deck", "deckTag"),
    ("target", "targetLevel"),
    ("targetRoom", "targetLevel"),
    ("outfit", "outfitId"),
    ("reward", "rewardId"),
    ("prop", "propId"),
];

/// Upper bound on `__cWid × __cHei` for a grid layer.
pub const MAX_LAYER_CELLS: usize = 1 << 20;

/// Caller-supplied defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Tile size used when the document declares none.
    pub tile_size: u32,
    /// Size substituted when the level's own cannot be determined.
    pub default_viewport: Viewport,
}

impl NormalizeOptions {
    /// Options taken from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            tile_size: config.tile_size,
            default_viewport: config.default_viewport,
        }
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Normalize a level document into a canonical [`Level`] with id `id`.
///
/// # Errors
///
/// `NormalizeError::NotAnObject` for a non-object root,
/// `NormalizeError::MissingPosition` for an entity with no coordinates,
/// and `NormalizeError::Canonical` for a malformed canonical document.
pub fn normalize(doc: &Value, id: &str, options: &NormalizeOptions) -> Result<Level, NormalizeError> {
    if !doc.is_object() {
        return Err(NormalizeError::NotAnObject);
    }
    match detect_format(doc) {
        SourceFormat::Canonical => canonical(doc, id, options),
        SourceFormat::EditorNative => editor_native(doc, id, options),
    }
}

/// Rename legacy property names in place. A canonical name that is
/// already present (and not `null`) wins over its legacy alias.
pub fn apply_renames(properties: &mut BTreeMap<String, Value>) {
    for (legacy, canonical) in LEGACY_PROPERTY_NAMES {
        let Some(value) = properties.remove(*legacy) else {
            continue;
        };
        let keep_existing = properties.get(*canonical).is_some_and(|v| !v.is_null());
        if !keep_existing {
            properties.insert(canonical.to_string(), value);
        }
    }
}

fn canonical(doc: &Value, id: &str, options: &NormalizeOptions) -> Result<Level, NormalizeError> {
    let mut level = Level::deserialize(doc)?;
    if !level.id.is_empty() && level.id != id {
        tracing::warn!(level = %id, declared = %level.id, "level declares another id; using the requested one");
    }
    level.id = id.to_string();
    if level.tile_size == 0 {
        level.tile_size = options.tile_size;
    }
    if level.width == 0 || level.height == 0 {
        apply_fallback(&mut level, options);
    }
    Ok(level)
}

fn apply_fallback(level: &mut Level, options: &NormalizeOptions) {
    tracing::warn!(
        level = %level.id,
        width = options.default_viewport.width,
        height = options.default_viewport.height,
        "level size unknown; using default viewport"
    );
    level.width = options.default_viewport.width;
    level.height = options.default_viewport.height;
    level.size_fallback = true;
}

// ---------------------------------------------------------------------------
// Editor exports
// ---------------------------------------------------------------------------

fn editor_native(doc: &Value, id: &str, options: &NormalizeOptions) -> Result<Level, NormalizeError> {
    // Project exports carry the level in `levels[0]`.
    let level_doc = if doc.get("layerInstances").is_some() {
        doc
    } else {
        if array(doc.get("levels")).len() > 1 {
            tracing::debug!(level = %id, "project export holds several levels; using the first");
        }
        doc.pointer("/levels/0").unwrap_or(doc)
    };
    let layer_instances = array(level_doc.get("layerInstances"));

    let tile_size = uint(doc.get("defaultGridSize"))
        .or_else(|| layer_instances.iter().find_map(|l| uint(l.get("__gridSize"))))
        .unwrap_or(options.tile_size);

    let (tilesets, gid_by_uid) = tileset_ranges(doc.pointer("/defs/tilesets"), tile_size);

    let mut level = Level {
        id: id.to_string(),
        width: 0,
        height: 0,
        tile_size,
        layers: Layers::default(),
        entities: Vec::new(),
        tilesets,
        player_spawn: None,
        size_fallback: false,
        dropped_spawns: 0,
    };

    match (uint(level_doc.get("pxWid")), uint(level_doc.get("pxHei"))) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            level.width = w;
            level.height = h;
        }
        _ => match layer_instances.iter().find_map(layer_pixel_size) {
            Some((w, h)) => {
                level.width = w;
                level.height = h;
            }
            None => apply_fallback(&mut level, options),
        },
    }

    let mut entity_index = 0usize;
    for layer in layer_instances {
        let identifier = layer.get("__identifier").and_then(Value::as_str).unwrap_or_default();
        let layer_type = layer.get("__type").and_then(Value::as_str).unwrap_or_default();
        let grid = uint(layer.get("__gridSize")).unwrap_or(tile_size);

        if layer_type == "Entities" {
            let instances = array(layer.get("entityInstances"));
            if identifier.eq_ignore_ascii_case("collision") {
                let shapes = instances.iter().filter_map(|inst| collision_shape(inst, grid)).collect();
                place_layer(&mut level.layers, identifier, Layer::Shapes(shapes), id);
                continue;
            }
            for instance in instances {
                collect_entity(&mut level, instance, grid, entity_index)?;
                entity_index += 1;
            }
            continue;
        }

        let contents = match layer_type {
            "IntGrid" => {
                let auto_tiles = array(layer.get("autoLayerTiles"));
                if identifier.eq_ignore_ascii_case("collision") || auto_tiles.is_empty() {
                    int_grid(layer)?
                } else {
                    tile_grid(layer, auto_tiles, grid, first_gid_for(layer, &gid_by_uid))?
                }
            }
            "Tiles" | "AutoLayer" => {
                let tiles = match array(layer.get("gridTiles")) {
                    [] => array(layer.get("autoLayerTiles")),
                    tiles => tiles,
                };
                tile_grid(layer, tiles, grid, first_gid_for(layer, &gid_by_uid))?
            }
            other => {
                tracing::debug!(level = %id, layer = %identifier, layer_type = %other, "skipping layer");
                continue;
            }
        };
        place_layer(&mut level.layers, identifier, Layer::Grid(contents), id);
    }

    tracing::debug!(
        level = %id,
        entities = level.entities.len(),
        tilesets = level.tilesets.len(),
        "normalized editor level"
    );
    Ok(level)
}

fn collect_entity(
    level: &mut Level,
    instance: &Value,
    grid: u32,
    index: usize,
) -> Result<(), NormalizeError> {
    let entity_type = instance
        .get("__identifier")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let position = resolve_position(instance, grid).ok_or_else(|| NormalizeError::MissingPosition {
        entity_type: entity_type.clone(),
        index,
    })?;

    if entity_type == PLAYER_SPAWN {
        if level.player_spawn.is_none() {
            level.player_spawn = Some(position);
        } else {
            level.dropped_spawns += 1;
            tracing::warn!(
                level = %level.id,
                x = position.x,
                y = position.y,
                "dropping extra PlayerSpawn; the first in document order is kept"
            );
        }
        return Ok(());
    }

    level.entities.push(Entity {
        entity_type,
        x: position.x,
        y: position.y,
        width: uint(instance.get("width")).unwrap_or(grid),
        height: uint(instance.get("height")).unwrap_or(grid),
        properties: resolve_properties(instance),
    });
    Ok(())
}

/// World pixels, else anchor-adjusted `px`, else grid cell.
fn resolve_position(instance: &Value, grid: u32) -> Option<Point> {
    let grid = i64::from(grid);
    if let (Some(x), Some(y)) = (
        instance.get("__worldX").and_then(Value::as_i64),
        instance.get("__worldY").and_then(Value::as_i64),
    ) {
        return Some(Point { x, y });
    }
    if let Some((x, y)) = int_pair(instance.get("px")) {
        return Some(Point {
            x: x + grid / 2,
            y: y + grid,
        });
    }
    int_pair(instance.get("__grid")).map(|(cx, cy)| Point {
        x: cx * grid,
        y: cy * grid,
    })
}

fn resolve_properties(instance: &Value) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();
    for field in array(instance.get("fieldInstances")) {
        if let Some(name) = field.get("__identifier").and_then(Value::as_str) {
            let value = field.get("__value").cloned().unwrap_or(Value::Null);
            properties.insert(name.to_string(), value);
        }
    }
    apply_renames(&mut properties);
    properties
}

fn collision_shape(instance: &Value, grid: u32) -> Option<Shape> {
    let (x, y) = int_pair(instance.get("px"))
        .or_else(|| int_pair(instance.get("__grid")).map(|(cx, cy)| (cx * i64::from(grid), cy * i64::from(grid))))?;
    Some(Shape {
        x,
        y,
        width: uint(instance.get("width")).unwrap_or(grid),
        height: uint(instance.get("height")).unwrap_or(grid),
    })
}

fn place_layer(layers: &mut Layers, identifier: &str, contents: Layer, level_id: &str) {
    match layers.slot_mut(identifier) {
        Some(slot) if slot.is_none() => *slot = Some(contents),
        Some(_) => {
            tracing::debug!(level = %level_id, layer = %identifier, "duplicate layer; keeping the first");
        }
        None => {
            tracing::debug!(level = %level_id, layer = %identifier, "layer has no canonical slot");
        }
    }
}

/// `(tilesets, uid → firstGid)`; tile counts accumulate from 1.
fn tileset_ranges(defs: Option<&Value>, default_grid: u32) -> (Vec<TilesetRef>, HashMap<u64, u32>) {
    let mut refs = Vec::new();
    let mut by_uid = HashMap::new();
    let mut next_gid: u32 = 1;
    for def in array(defs) {
        let uid = def.get("uid").and_then(Value::as_u64);
        let key = def
            .get("identifier")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| uid.map(|u| format!("tileset_{u}")))
            .unwrap_or_default();
        let grid = uint(def.get("tileGridSize")).filter(|g| *g > 0).unwrap_or(default_grid).max(1);
        let columns = uint(def.get("pxWid")).unwrap_or(0) / grid;
        let rows = uint(def.get("pxHei")).unwrap_or(0) / grid;

        refs.push(TilesetRef {
            key,
            first_gid: next_gid,
        });
        if let Some(uid) = uid {
            by_uid.insert(uid, next_gid);
        }
        next_gid = next_gid.saturating_add(columns.saturating_mul(rows));
    }
    (refs, by_uid)
}

fn first_gid_for(layer: &Value, gid_by_uid: &HashMap<u64, u32>) -> i64 {
    layer
        .get("__tilesetDefUid")
        .and_then(Value::as_u64)
        .and_then(|uid| gid_by_uid.get(&uid))
        .map_or(1, |gid| i64::from(*gid))
}

fn layer_dimensions(layer: &Value) -> (usize, usize) {
    let cells = |key: &str| layer.get(key).and_then(Value::as_u64).unwrap_or(0) as usize;
    (cells("__cWid"), cells("__cHei"))
}

fn layer_pixel_size(layer: &Value) -> Option<(u32, u32)> {
    let (cols, rows) = layer_dimensions(layer);
    let grid = uint(layer.get("__gridSize"))?;
    if cols == 0 || rows == 0 {
        return None;
    }
    Some((
        u32::try_from(cols).ok()?.checked_mul(grid)?,
        u32::try_from(rows).ok()?.checked_mul(grid)?,
    ))
}

/// Layer dimensions for allocating a grid, bounded by [`MAX_LAYER_CELLS`].
fn grid_dimensions(layer: &Value) -> Result<(usize, usize), NormalizeError> {
    let (cols, rows) = layer_dimensions(layer);
    match cols.checked_mul(rows) {
        Some(cells) if cells <= MAX_LAYER_CELLS => Ok((cols, rows)),
        _ => Err(NormalizeError::LayerTooLarge {
            layer: layer
                .get("__identifier")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            cols,
            rows,
            limit: MAX_LAYER_CELLS,
        }),
    }
}

fn int_grid(layer: &Value) -> Result<Vec<Vec<i64>>, NormalizeError> {
    let (cols, rows) = grid_dimensions(layer)?;
    let csv: Vec<i64> = array(layer.get("intGridCsv"))
        .iter()
        .map(|v| v.as_i64().unwrap_or(0))
        .collect();
    Ok((0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| csv.get(r * cols + c).copied().unwrap_or(0))
                .collect()
        })
        .collect())
}

fn tile_grid(layer: &Value, tiles: &[Value], grid: u32, first_gid: i64) -> Result<Vec<Vec<i64>>, NormalizeError> {
    let (cols, rows) = grid_dimensions(layer)?;
    let mut cells = vec![vec![0i64; cols]; rows];
    let grid = i64::from(grid.max(1));
    for tile in tiles {
        let (Some((px, py)), Some(t)) = (int_pair(tile.get("px")), tile.get("t").and_then(Value::as_i64))
        else {
            continue;
        };
        let (col, row) = (px / grid, py / grid);
        if col < 0 || row < 0 {
            continue;
        }
        if let Some(cell) = cells.get_mut(row as usize).and_then(|r| r.get_mut(col as usize)) {
            *cell = first_gid + t;
        }
    }
    Ok(cells)
}

fn array(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
}

fn uint(value: Option<&Value>) -> Option<u32> {
    value.and_then(Value::as_u64).and_then(|v| u32::try_from(v).ok())
}

fn int_pair(value: Option<&Value>) -> Option<(i64, i64)> {
    match array(value) {
        [x, y, ..] => Some((x.as_i64()?, y.as_i64()?)),
        _ => None,
    }
}
