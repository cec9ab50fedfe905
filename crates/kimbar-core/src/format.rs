//! # Level Source Format Detection
//!
//! A level document is editor-native if and only if it exposes a
//! `layerInstances` collection, either at the top level (a single level
//! export) or in its first `levels[]` entry (a project export). Anything
//! else is treated as an already canonical level.

use serde_json::Value;

/// Shape of a level source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Export of the external level editor.
    EditorNative,
    /// Canonical level shape, passed through unchanged.
    Canonical,
}

/// Classify a level document.
pub fn detect_format(doc: &Value) -> SourceFormat {
    let top = doc.get("layerInstances").is_some();
    let nested = doc
        .get("levels")
        .and_then(Value::as_array)
        .and_then(|levels| levels.first())
        .is_some_and(|first| first.get("layerInstances").is_some());
    if top || nested {
        SourceFormat::EditorNative
    } else {
        SourceFormat::Canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_layer_instances_is_editor_native() {
        let doc = json!({"identifier": "Lobby", "layerInstances": []});
        assert_eq!(detect_format(&doc), SourceFormat::EditorNative);
    }

    #[test]
    fn project_export_is_editor_native() {
        let doc = json!({"defs": {}, "levels": [{"layerInstances": null}]});
        assert_eq!(detect_format(&doc), SourceFormat::EditorNative);
    }

    #[test]
    fn canonical_level_passes_through() {
        let doc = json!({"id": "room.lobby", "width": 320, "height": 240, "layers": {}});
        assert_eq!(detect_format(&doc), SourceFormat::Canonical);
    }

    #[test]
    fn empty_levels_array_is_canonical() {
        assert_eq!(detect_format(&json!({"levels": []})), SourceFormat::Canonical);
    }
}
