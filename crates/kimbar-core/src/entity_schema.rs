//! # Entity-Type Schema Table
//!
//! Maps each level entity type to the property names it requires and
//! accepts. The table is data, not types: the level validator walks it,
//! the registry publishes it, and `content/config/entity_schema.json` may
//! replace it wholesale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved entity type that the normalizer lifts into the level's spawn.
pub const PLAYER_SPAWN: &str = "PlayerSpawn";

/// Property rules for a single entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeSchema {
    /// Properties that must all be present.
    #[serde(default)]
    pub required: Vec<String>,
    /// When non-empty, at least one of these properties must be present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<String>,
    /// Properties that are recognized but not required.
    #[serde(default)]
    pub optional: Vec<String>,
}

impl EntityTypeSchema {
    fn new(required: &[&str], one_of: &[&str], optional: &[&str]) -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            required: owned(required),
            one_of: owned(one_of),
            optional: owned(optional),
        }
    }
}

/// Entity type → property rules, iterated in type-name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySchemaTable(BTreeMap<String, EntityTypeSchema>);

impl EntitySchemaTable {
    /// Build a table from explicit entries.
    pub fn from_entries(entries: BTreeMap<String, EntityTypeSchema>) -> Self {
        Self(entries)
    }

    /// Rules for an entity type, if the type is known.
    pub fn get(&self, entity_type: &str) -> Option<&EntityTypeSchema> {
        self.0.get(entity_type)
    }

    /// Whether the type appears in the table.
    pub fn contains(&self, entity_type: &str) -> bool {
        self.0.contains_key(entity_type)
    }

    /// Iterate over `(type, rules)` in type-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &EntityTypeSchema)> {
        self.0.iter()
    }

    /// Number of entity types.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EntitySchemaTable {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert(PLAYER_SPAWN.to_string(), EntityTypeSchema::new(&[], &[], &[]));
        table.insert(
            "NPC".to_string(),
            EntityTypeSchema::new(&["storyKnot"], &[], &["name", "characterId", "sprite", "facing"]),
        );
        table.insert(
            "EncounterTrigger".to_string(),
            EntityTypeSchema::new(
                &["deckTag", "count"],
                &[],
                &["rewardId", "once", "name", "justiceId"],
            ),
        );
        table.insert(
            "Door".to_string(),
            EntityTypeSchema::new(&["targetLevel"], &[], &["locked", "requiredItem"]),
        );
        table.insert(
            "OutfitChest".to_string(),
            EntityTypeSchema::new(&["outfitId"], &[], &[]),
        );
        table.insert(
            "Prop".to_string(),
            EntityTypeSchema::new(&[], &["sprite", "propId"], &["collision"]),
        );
        Self(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_known_types() {
        let table = EntitySchemaTable::default();
        assert_eq!(table.len(), 6);
        for ty in [PLAYER_SPAWN, "NPC", "EncounterTrigger", "Door", "OutfitChest", "Prop"] {
            assert!(table.contains(ty), "missing {ty}");
        }
        assert!(!table.contains("Lamp"));
    }

    #[test]
    fn encounter_requires_deck_and_count() {
        let table = EntitySchemaTable::default();
        let rules = table.get("EncounterTrigger").unwrap();
        assert_eq!(rules.required, vec!["deckTag", "count"]);
        assert!(rules.optional.contains(&"justiceId".to_string()));
    }

    #[test]
    fn prop_uses_one_of() {
        let table = EntitySchemaTable::default();
        let rules = table.get("Prop").unwrap();
        assert!(rules.required.is_empty());
        assert_eq!(rules.one_of, vec!["sprite", "propId"]);
    }

    #[test]
    fn serializes_as_plain_map() {
        let json = serde_json::to_value(EntitySchemaTable::default()).unwrap();
        assert_eq!(json["NPC"]["required"][0], "storyKnot");
        assert!(json["NPC"].get("oneOf").is_none());
        assert_eq!(json["Prop"]["oneOf"][1], "propId");
    }
}
