//! # Level Validator
//!
//! Checks a canonical level against the entity-type schema table. Never
//! fails: every finding lands in the returned [`LevelReport`].
//!
//! | Code | Bucket |
//! |------|--------|
//! | `MISSING_PLAYER_SPAWN` | error |
//! | `MISSING_REQUIRED_FIELD` | error |
//! | `INVALID_ENCOUNTER_COUNT` | error |
//! | `DUPLICATE_ENTITY_ID` | error |
//! | `UNKNOWN_ENTITY_TYPE` | warning |
//! | `ENTITY_OUT_OF_BOUNDS` | warning |
//! | `DEPRECATED_PROPERTY` | warning |
//! | `MULTIPLE_PLAYER_SPAWN` | warning |
//! | `DEFAULT_VIEWPORT_SIZE` | warning |

use std::collections::BTreeMap;
use std::fmt;

use kimbar_core::{EntitySchemaTable, PLAYER_SPAWN};
use serde_json::Value;

use crate::level::{Entity, Level};
use crate::normalize::LEGACY_PROPERTY_NAMES;

const ENCOUNTER_TRIGGER: &str = "EncounterTrigger";

/// Finding codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LevelCode {
    /// No spawn in the level.
    MissingPlayerSpawn,
    /// An entity lacks a property its type requires.
    MissingRequiredField,
    /// An encounter count is not a positive integer.
    InvalidEncounterCount,
    /// Two entities share an explicit `id`.
    DuplicateEntityId,
    /// Entity type not in the schema table.
    UnknownEntityType,
    /// Entity outside the level bounds.
    EntityOutOfBounds,
    /// Legacy property name in a canonical level.
    DeprecatedProperty,
    /// More than one spawn was authored.
    MultiplePlayerSpawn,
    /// Level size is the default viewport.
    DefaultViewportSize,
}

impl LevelCode {
    /// Stable machine-readable code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPlayerSpawn => "MISSING_PLAYER_SPAWN",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::InvalidEncounterCount => "INVALID_ENCOUNTER_COUNT",
            Self::DuplicateEntityId => "DUPLICATE_ENTITY_ID",
            Self::UnknownEntityType => "UNKNOWN_ENTITY_TYPE",
            Self::EntityOutOfBounds => "ENTITY_OUT_OF_BOUNDS",
            Self::DeprecatedProperty => "DEPRECATED_PROPERTY",
            Self::MultiplePlayerSpawn => "MULTIPLE_PLAYER_SPAWN",
            Self::DefaultViewportSize => "DEFAULT_VIEWPORT_SIZE",
        }
    }

    /// Whether findings with this code are hard errors.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::MissingPlayerSpawn
                | Self::MissingRequiredField
                | Self::InvalidEncounterCount
                | Self::DuplicateEntityId
        )
    }
}

impl fmt::Display for LevelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One code-tagged finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFinding {
    /// Finding code.
    pub code: LevelCode,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for LevelFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result of validating one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    /// `true` when there are no errors.
    pub valid: bool,
    /// Hard errors.
    pub errors: Vec<LevelFinding>,
    /// Non-blocking warnings.
    pub warnings: Vec<LevelFinding>,
}

impl Default for LevelReport {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl LevelReport {
    /// Record a finding in the bucket its code belongs to.
    pub fn add(&mut self, code: LevelCode, message: impl Into<String>) {
        let finding = LevelFinding {
            code,
            message: message.into(),
        };
        if code.is_error() {
            self.valid = false;
            self.errors.push(finding);
        } else {
            self.warnings.push(finding);
        }
    }

    /// Error lines, `CODE: message`.
    pub fn error_lines(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Errors then warnings, each `CODE: message`.
    pub fn lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .map(ToString::to_string)
            .collect()
    }
}

/// Validates canonical levels against an entity schema table.
#[derive(Debug, Clone, Default)]
pub struct LevelValidator {
    schema: EntitySchemaTable,
}

impl LevelValidator {
    /// Validator over `schema`.
    pub fn new(schema: EntitySchemaTable) -> Self {
        Self { schema }
    }

    /// Validate a level.
    pub fn validate(&self, level: &Level) -> LevelReport {
        let mut report = LevelReport::default();
        self.check_spawn(level, &mut report);

        if level.size_fallback {
            report.add(
                LevelCode::DefaultViewportSize,
                format!(
                    "level size could not be determined; using default viewport {}x{}",
                    level.width, level.height
                ),
            );
        }

        let mut seen_ids: BTreeMap<String, usize> = BTreeMap::new();
        for (index, entity) in level.entities.iter().enumerate() {
            let label = entity_label(entity, index);
            self.check_properties(entity, &label, &mut report);
            check_bounds(level, entity, &label, &mut report);

            if let Some(stable_id) = entity.property("id").map(id_key) {
                if let Some(first) = seen_ids.get(&stable_id) {
                    report.add(
                        LevelCode::DuplicateEntityId,
                        format!("{label} reuses id `{stable_id}` of entity #{first}"),
                    );
                } else {
                    seen_ids.insert(stable_id, index);
                }
            }
        }

        tracing::debug!(
            level = %level.id,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "level validated"
        );
        report
    }

    fn check_spawn(&self, level: &Level, report: &mut LevelReport) {
        let listed = level
            .entities
            .iter()
            .filter(|e| e.entity_type == PLAYER_SPAWN)
            .count();
        if level.player_spawn.is_none() {
            // A spawn left in the entity list is never consumed.
            let message = if listed > 0 {
                "level has no `playerSpawn`; PlayerSpawn listed as an entity is not used"
            } else {
                "level has no PlayerSpawn"
            };
            report.add(LevelCode::MissingPlayerSpawn, message);
            return;
        }
        let total = 1 + listed + level.dropped_spawns as usize;
        if total > 1 {
            report.add(
                LevelCode::MultiplePlayerSpawn,
                format!("level authors {total} PlayerSpawn entities; the first in document order is used"),
            );
        }
    }

    fn check_properties(&self, entity: &Entity, label: &str, report: &mut LevelReport) {
        for (legacy, canonical) in LEGACY_PROPERTY_NAMES {
            if entity.properties.contains_key(*legacy) {
                report.add(
                    LevelCode::DeprecatedProperty,
                    format!("{label} uses deprecated property `{legacy}`; use `{canonical}`"),
                );
            }
        }

        let Some(rules) = self.schema.get(&entity.entity_type) else {
            report.add(
                LevelCode::UnknownEntityType,
                format!("{label} has unknown type `{}`", entity.entity_type),
            );
            return;
        };

        for name in &rules.required {
            if entity.property(name).is_none() {
                report.add(
                    LevelCode::MissingRequiredField,
                    format!("{label} lacks required property `{name}`"),
                );
            }
        }
        if !rules.one_of.is_empty() && !rules.one_of.iter().any(|name| entity.property(name).is_some()) {
            report.add(
                LevelCode::MissingRequiredField,
                format!("{label} needs one of: {}", rules.one_of.join(", ")),
            );
        }

        if entity.entity_type == ENCOUNTER_TRIGGER {
            if let Some(count) = entity.property("count") {
                if !count.as_u64().is_some_and(|n| n > 0) {
                    report.add(
                        LevelCode::InvalidEncounterCount,
                        format!("{label} has count {count}; expected a positive integer"),
                    );
                }
            }
        }
    }
}

fn check_bounds(level: &Level, entity: &Entity, label: &str, report: &mut LevelReport) {
    let (w, h) = (i64::from(level.width), i64::from(level.height));
    if entity.x < 0 || entity.y < 0 || entity.x > w || entity.y > h {
        report.add(
            LevelCode::EntityOutOfBounds,
            format!("{label} at ({}, {}) lies outside {}x{}", entity.x, entity.y, w, h),
        );
    }
}

fn entity_label(entity: &Entity, index: usize) -> String {
    format!("{} #{index} at ({}, {})", entity.entity_type, entity.x, entity.y)
}

fn id_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Point;
    use serde_json::json;

    fn level(entities: Value, spawn: bool) -> Level {
        let mut doc = json!({
            "id": "room.test", "width": 320, "height": 256, "tileSize": 32,
            "entities": entities
        });
        if spawn {
            doc["playerSpawn"] = json!({"x": 16, "y": 32});
        }
        serde_json::from_value(doc).unwrap()
    }

    fn codes(findings: &[LevelFinding]) -> Vec<&'static str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    fn validate(level: &Level) -> LevelReport {
        LevelValidator::default().validate(level)
    }

    #[test]
    fn clean_level_is_valid() {
        let report = validate(&level(
            json!([{"type": "Door", "x": 32, "y": 32, "properties": {"targetLevel": "room.hall", "id": "door_1"}}]),
            true,
        ));
        assert!(report.valid, "{:?}", report.lines());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn zero_spawns_is_exactly_one_error() {
        let report = validate(&level(json!([]), false));
        assert!(!report.valid);
        assert_eq!(codes(&report.errors), vec!["MISSING_PLAYER_SPAWN"]);
    }

    #[test]
    fn negative_encounter_count_rejected() {
        let report = validate(&level(
            json!([{"type": "EncounterTrigger", "x": 0, "y": 0, "properties": {"deckTag": "torts", "count": -1}}]),
            true,
        ));
        assert_eq!(codes(&report.errors), vec!["INVALID_ENCOUNTER_COUNT"]);
    }

    #[test]
    fn fractional_and_string_counts_rejected() {
        for count in [json!(2.5), json!("3"), json!(0)] {
            let report = validate(&level(
                json!([{"type": "EncounterTrigger", "x": 0, "y": 0, "properties": {"deckTag": "t", "count": count}}]),
                true,
            ));
            assert_eq!(codes(&report.errors), vec!["INVALID_ENCOUNTER_COUNT"], "{count}");
        }
    }

    #[test]
    fn absent_count_is_only_missing_field() {
        let report = validate(&level(
            json!([{"type": "EncounterTrigger", "x": 0, "y": 0, "properties": {"deckTag": "torts"}}]),
            true,
        ));
        assert_eq!(codes(&report.errors), vec!["MISSING_REQUIRED_FIELD"]);
        assert!(report.errors[0].message.contains("`count`"));
    }

    #[test]
    fn prop_needs_sprite_or_prop_id() {
        let report = validate(&level(
            json!([
                {"type": "Prop", "x": 0, "y": 0, "properties": {"collision": true}},
                {"type": "Prop", "x": 0, "y": 0, "properties": {"propId": "bench"}}
            ]),
            true,
        ));
        assert_eq!(codes(&report.errors), vec!["MISSING_REQUIRED_FIELD"]);
        assert!(report.errors[0].message.contains("#0"));
    }

    #[test]
    fn duplicate_entity_ids() {
        let report = validate(&level(
            json!([
                {"type": "Door", "x": 0, "y": 0, "properties": {"targetLevel": "room.a", "id": "d"}},
                {"type": "Door", "x": 0, "y": 0, "properties": {"targetLevel": "room.b", "id": "d"}}
            ]),
            true,
        ));
        assert_eq!(codes(&report.errors), vec!["DUPLICATE_ENTITY_ID"]);
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut lvl = level(
            json!([
                {"type": "Lamp", "x": 0, "y": 0},
                {"type": "NPC", "x": 999, "y": 0, "properties": {"storyKnot": "k", "knot": "old"}}
            ]),
            true,
        );
        lvl.dropped_spawns = 1;
        lvl.size_fallback = true;
        let report = validate(&lvl);
        assert!(report.valid);
        assert_eq!(
            codes(&report.warnings),
            vec![
                "MULTIPLE_PLAYER_SPAWN",
                "DEFAULT_VIEWPORT_SIZE",
                "UNKNOWN_ENTITY_TYPE",
                "DEPRECATED_PROPERTY",
                "ENTITY_OUT_OF_BOUNDS"
            ]
        );
    }

    #[test]
    fn spawn_listed_only_as_entity_is_missing() {
        let report = validate(&level(json!([{"type": "PlayerSpawn", "x": 1, "y": 1}]), false));
        assert!(!report.valid);
        assert_eq!(codes(&report.errors), vec!["MISSING_PLAYER_SPAWN"]);
        assert!(report.errors[0].message.contains("listed as an entity"));
        let mut lvl = level(json!([{"type": "PlayerSpawn", "x": 0, "y": 0}]), false);
        lvl.player_spawn = Some(Point { x: 1, y: 1 });
        assert_eq!(codes(&validate(&lvl).warnings), vec!["MULTIPLE_PLAYER_SPAWN"]);
    }

    #[test]
    fn lines_list_errors_before_warnings() {
        let report = validate(&level(json!([{"type": "Lamp", "x": 0, "y": 0}]), false));
        let lines = report.lines();
        assert!(lines[0].starts_with("MISSING_PLAYER_SPAWN: "));
        assert!(lines[1].starts_with("UNKNOWN_ENTITY_TYPE: "));
    }
}
