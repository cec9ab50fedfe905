//! Content validation over fixture content trees built with the real
//! scanner and registry builder.

use std::fs;
use std::path::Path;

use kimbar_core::{PipelineConfig, SkipPrefix};
use kimbar_registry::{BuildSettings, Registry, RegistryBuilder, Scanner, StaticConfig};
use kimbar_schema::SchemaValidator;
use kimbar_validate::{codes, ContentReport, ContentValidator};
use serde_json::{json, Value};
use tempfile::TempDir;

struct Project {
    _dir: TempDir,
    config: PipelineConfig,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        let project = Self { _dir: dir, config };
        project.seed();
        project
    }

    fn content(&self) -> &Path {
        &self.config.content_root
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.content().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn write_json(&self, rel: &str, value: Value) {
        self.write(rel, &serde_json::to_string_pretty(&value).unwrap());
    }

    fn write_schema(&self, kind: &str, schema: Value) {
        fs::create_dir_all(&self.config.schema_dir).unwrap();
        fs::write(
            self.config.schema_dir.join(format!("{kind}.schema.json")),
            serde_json::to_vec_pretty(&schema).unwrap(),
        )
        .unwrap();
    }

    fn seed(&self) {
        self.write_json("config/outfits.json", json!({"robe": {"id": "robe", "name": "Judicial Robe"}}));
        self.write_json("config/tags.json", json!({"subjects": ["civics"], "topicTags": ["torts"]}));
        self.write_json("characters/clerk.json", json!({"name": "Clerk", "spriteSheet": "images/clerk.png"}));
        self.write("images/clerk.png", "png");
        self.write_json("rooms/lobby.json", json!({"level": "levels/lobby.json"}));
        self.write_json("rooms/hall.json", json!({"level": "levels/hall.json"}));
        self.write_json("levels/lobby.json", level(vec![
            json!({"type": "Door", "x": 64, "y": 64, "properties": {"targetLevel": "room.hall"}}),
            json!({"type": "NPC", "x": 96, "y": 64, "properties": {"storyKnot": "greeting", "characterId": "character.clerk"}}),
        ]));
        self.write_json("levels/hall.json", level(vec![json!({
            "type": "EncounterTrigger", "x": 32, "y": 32,
            "properties": {"deckTag": "civics", "count": 3, "rewardId": "robe"}
        })]));
        self.write_json("flashcards/civics.json", json!([
            {"id": "c1", "prompt": "Who appoints judges?"},
            {"id": "c2", "prompt": "What is a tort?"}
        ]));
        self.write_json("ink/opening.ink.json", json!({"inkVersion": 21, "root": []}));
    }

    fn registry(&self) -> Registry {
        let discovery = Scanner::new(self.content()).scan().unwrap();
        let statics = StaticConfig::load(self.content()).unwrap();
        RegistryBuilder::new(statics, BuildSettings::from_config(&self.config))
            .build(&discovery, "test")
            .unwrap()
    }

    fn validate(&self) -> ContentReport {
        self.validate_registry(&self.registry())
    }

    fn validate_registry(&self, registry: &Registry) -> ContentReport {
        let schemas = SchemaValidator::new(&self.config.schema_dir).ok();
        ContentValidator::new(registry, &self.config).with_schemas(schemas).run()
    }
}

fn level(entities: Vec<Value>) -> Value {
    json!({
        "width": 320, "height": 256, "tileSize": 32,
        "playerSpawn": {"x": 16, "y": 16},
        "entities": entities
    })
}

fn codes_of(findings: &[kimbar_validate::Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.code).collect()
}

#[test]
fn consistent_tree_has_no_errors() {
    let project = Project::new();
    let report = project.validate();
    assert!(!report.has_errors(), "{}", report.render());
    assert!(report.skips.is_empty());
    assert!(report
        .warnings
        .iter()
        .all(|w| w.code == codes::SCHEMA_NOT_REGISTERED));
}

#[test]
fn missing_schema_is_reported_once_per_kind() {
    let project = Project::new();
    project.write_json("flashcards/history.json", json!([{"id": "h1", "prompt": "When?"}]));
    let report = project.validate();
    let flashcard_warnings: Vec<_> = report
        .warnings_with(codes::SCHEMA_NOT_REGISTERED)
        .into_iter()
        .filter(|w| w.subject == "flashcards")
        .collect();
    assert_eq!(flashcard_warnings.len(), 1);
}

#[test]
fn unknown_reward_outfit_is_a_single_error_naming_the_id() {
    let project = Project::new();
    project.write_json("levels/hall.json", level(vec![json!({
        "type": "EncounterTrigger", "x": 32, "y": 32,
        "properties": {"deckTag": "civics", "count": 3, "rewardId": "cape"}
    })]));
    let report = project.validate();
    assert_eq!(codes_of(&report.errors), vec![codes::UNKNOWN_OUTFIT_REF]);
    assert_eq!(report.errors[0].subject, "room.hall");
    assert!(report.errors[0].message.contains("`cape`"));
}

#[test]
fn unresolved_tags_and_characters_only_warn() {
    let project = Project::new();
    project.write_json("levels/lobby.json", level(vec![
        json!({"type": "NPC", "x": 96, "y": 64, "properties": {"storyKnot": "greeting", "characterId": "character.ghost"}}),
        json!({"type": "EncounterTrigger", "x": 32, "y": 32, "properties": {"deckTag": "astronomy", "count": 1}}),
    ]));
    let report = project.validate();
    assert!(!report.has_errors(), "{}", report.render());
    assert_eq!(report.warnings_with(codes::UNKNOWN_TAG_REF).len(), 1);
    assert_eq!(report.warnings_with(codes::UNKNOWN_CHARACTER_REF).len(), 1);
}

#[test]
fn door_to_unknown_room_is_an_error() {
    let project = Project::new();
    project.write_json("levels/lobby.json", level(vec![json!({
        "type": "Door", "x": 64, "y": 64, "properties": {"targetLevel": "room.attic"}
    })]));
    let report = project.validate();
    let errors = report.errors_with(codes::UNKNOWN_LEVEL_REF);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("room.attic"));
}

#[test]
fn level_findings_are_forwarded_with_their_codes() {
    let project = Project::new();
    project.write_json("levels/hall.json", json!({
        "width": 320, "height": 256,
        "entities": [{"type": "Statue", "x": 10, "y": 10}]
    }));
    let report = project.validate();
    assert_eq!(codes_of(&report.errors), vec!["MISSING_PLAYER_SPAWN"]);
    assert_eq!(report.warnings_with("UNKNOWN_ENTITY_TYPE").len(), 1);
}

#[test]
fn missing_and_malformed_level_files() {
    let project = Project::new();
    fs::remove_file(project.content().join("levels/hall.json")).unwrap();
    project.write("levels/lobby.json", "{ not json");
    let report = project.validate();
    let missing = report.errors_with(codes::MISSING_FILE);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].subject, "room.hall");
    assert_eq!(report.errors_with(codes::LEVEL_PARSE_ERROR).len(), 1);
}

#[test]
fn deck_count_mismatch_and_policy_skips() {
    let mut project = Project::new();
    project.config.flashcards.skip_prefixes.push(SkipPrefix {
        prefix: "draft_".to_string(),
        reason: "drafts are excluded until reviewed".to_string(),
    });
    let mut records: Vec<Value> = (0..98)
        .map(|i| json!({"id": format!("q{i}"), "prompt": "?"}))
        .collect();
    records.push(json!({"id": "draft_1"}));
    project.write_json("flashcards/civics.json", json!({"cards": records}));

    let mut registry = project.registry();
    registry.flashcard_packs[0].count = 100;
    let report = project.validate_registry(&registry);

    let mismatch = report.errors_with(codes::DECK_COUNT_MISMATCH);
    assert_eq!(mismatch.len(), 1);
    assert!(mismatch[0].message.contains("100"));
    assert!(mismatch[0].message.contains("99"));
    // The skipped draft has no prompt but is not reported as missing one.
    assert!(report.errors_with(codes::DECK_RECORD_MISSING_PROMPT).is_empty());
    assert_eq!(report.skips.len(), 1);
    assert_eq!(report.skips[0].subject, "deck.civics#draft_1");
    assert_eq!(report.skips[0].reason, "drafts are excluded until reviewed");
}

#[test]
fn deck_record_defects() {
    let project = Project::new();
    project.write_json("flashcards/civics.json", json!([
        {"id": "c1", "prompt": "?"},
        {"id": "c1", "prompt": "again?"},
        {"prompt": "no id"},
        {"id": "c3", "prompt": "  "}
    ]));
    let report = project.validate();
    assert_eq!(report.errors_with(codes::DECK_RECORD_DUPLICATE_ID).len(), 1);
    assert_eq!(report.errors_with(codes::DECK_RECORD_MISSING_ID).len(), 1);
    let prompts = report.errors_with(codes::DECK_RECORD_MISSING_PROMPT);
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].subject, "deck.civics#c3");
}

#[test]
fn oversized_deck_is_sampled_for_schema_checks() {
    let mut project = Project::new();
    project.config.flashcards.size_threshold_bytes = 16;
    project.config.flashcards.sample_size = 1;
    project.write_schema("flashcards", json!({
        "type": "array",
        "items": {"type": "object", "required": ["id", "prompt"]}
    }));
    // Record 2 violates the schema but lies outside the sample.
    project.write_json("flashcards/civics.json", json!([
        {"id": "c1", "prompt": "?"},
        {"id": "c2", "prompt": "?"},
        "not a record"
    ]));
    let mut registry = project.registry();
    registry.flashcard_packs[0].count = 3;
    let report = project.validate_registry(&registry);

    assert!(report.errors_with(codes::SCHEMA_VIOLATION).is_empty(), "{}", report.render());
    assert_eq!(report.skips.len(), 1);
    assert_eq!(report.skips[0].subject, "deck.civics");
    assert!(report.skips[0].reason.contains("1 of 3"));
}

#[test]
fn schema_violations_are_errors() {
    let project = Project::new();
    project.write_schema("ink", json!({
        "type": "object",
        "required": ["inkVersion", "root"]
    }));
    project.write_json("ink/opening.ink.json", json!({"inkVersion": 21}));
    let report = project.validate();
    let violations = report.errors_with(codes::SCHEMA_VIOLATION);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].subject, "ink.opening");
    assert!(!report
        .warnings_with(codes::SCHEMA_NOT_REGISTERED)
        .iter()
        .any(|w| w.subject == "ink"));
}

#[test]
fn ink_without_version_warns() {
    let project = Project::new();
    project.write_json("ink/opening.ink.json", json!({"root": []}));
    let report = project.validate();
    assert!(!report.has_errors());
    assert_eq!(report.warnings_with(codes::INK_VERSION_MISSING).len(), 1);
}

#[test]
fn registry_ordering_and_outfit_ids_are_reasserted() {
    let project = Project::new();
    let mut registry = project.registry();
    registry.rooms.reverse();
    registry.outfits.get_mut("robe").unwrap().id = "gown".to_string();
    let report = project.validate_registry(&registry);
    assert_eq!(report.errors_with(codes::REGISTRY_UNSORTED).len(), 1);
    let mismatch = report.errors_with(codes::OUTFIT_ID_MISMATCH);
    assert_eq!(mismatch.len(), 1);
    assert_eq!(mismatch[0].subject, "robe");
}

#[test]
fn room_schema_checks_the_authored_source() {
    let project = Project::new();
    project.write_schema("room", json!({
        "type": "object",
        "required": ["level"],
        "properties": {"level": {"type": "string"}, "displayName": {"type": "string"}},
        "additionalProperties": false
    }));
    project.write_json("rooms/lobby.json", json!({"level": "levels/lobby.json", "dispalyName": "Lobby"}));
    let report = project.validate();
    let violations = report.errors_with(codes::SCHEMA_VIOLATION);
    assert_eq!(violations.len(), 1, "{}", report.render());
    assert_eq!(violations[0].subject, "room.lobby");
    assert!(violations[0].message.contains("dispalyName"));
}

#[test]
fn sprite_schema_checks_the_authored_source() {
    let project = Project::new();
    project.write("images/judge.png", "png");
    project.write_json("sprites/judge.json", json!({
        "image": "images/judge.png", "frameWidth": 32, "frameHeight": 48, "fps": 8
    }));
    project.write_schema("sprite", json!({
        "type": "object",
        "required": ["image", "frameWidth", "frameHeight"],
        "properties": {
            "image": {"type": "string"},
            "frameWidth": {"type": "integer"},
            "frameHeight": {"type": "integer"},
            "kind": {"type": "string"},
            "portrait": {"type": "string"}
        },
        "additionalProperties": false
    }));
    let report = project.validate();
    let violations = report.errors_with(codes::SCHEMA_VIOLATION);
    assert_eq!(violations.len(), 1, "{}", report.render());
    assert_eq!(violations[0].subject, "sprite.judge");
    assert!(violations[0].message.contains("fps"));
}

#[test]
fn room_source_removed_after_build_is_missing() {
    let project = Project::new();
    let registry = project.registry();
    fs::remove_file(project.content().join("rooms/hall.json")).unwrap();
    let report = project.validate_registry(&registry);
    let missing = report.errors_with(codes::MISSING_FILE);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].subject, "room.hall");
}

#[test]
fn outfit_without_declared_id_is_reported() {
    let project = Project::new();
    project.write_json("config/outfits.json", json!({
        "robe": {"id": "robe", "name": "Judicial Robe"},
        "cape": {"name": "Cape"}
    }));
    project.write_schema("outfit", json!({"type": "object", "required": ["id", "name"]}));
    let report = project.validate();

    let mismatch = report.errors_with(codes::OUTFIT_ID_MISMATCH);
    assert_eq!(mismatch.len(), 1);
    assert_eq!(mismatch[0].subject, "cape");
    assert!(mismatch[0].message.contains("no id"));
    // The raw entry is checked, not the defaulted one.
    let violations = report.errors_with(codes::SCHEMA_VIOLATION);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].subject, "cape");
}

#[test]
fn missing_character_and_tileset_files() {
    let project = Project::new();
    let mut registry = project.registry();
    registry.tilesets.push(kimbar_registry::TilesetEntry {
        id: "tileset.gone".to_string(),
        url: "/content/tilesets/gone.png".to_string(),
        tile_size: 32,
    });
    registry.characters[0].url = "/elsewhere/clerk.json".to_string();
    let report = project.validate_registry(&registry);
    let subjects: Vec<&str> = report
        .errors_with(codes::MISSING_FILE)
        .iter()
        .map(|f| f.subject.as_str())
        .collect();
    assert_eq!(subjects, vec!["character.clerk", "tileset.gone"]);
}

#[test]
fn render_ends_with_summary_line() {
    let project = Project::new();
    fs::remove_file(project.content().join("flashcards/civics.json")).unwrap();
    let mut registry = project.registry();
    registry.flashcard_packs.push(kimbar_registry::FlashcardPackEntry {
        id: "deck.civics".to_string(),
        url: "/content/flashcards/civics.json".to_string(),
        count: 2,
        schema_version: 1,
    });
    let report = project.validate_registry(&registry);
    let text = report.render();
    assert!(text.contains("MISSING_FILE: [deck.civics]"));
    assert!(text.trim_end().ends_with("policy skip(s)"));
    assert!(report.has_errors());
}
