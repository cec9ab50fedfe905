//! # Content Validator
//!
//! One pass over everything the registry indexes. Files are located by
//! mapping registry urls back onto the content root
//! ([`PipelineConfig::content_path`]).
//!
//! Structural schemas apply to what authors wrote: room, sprite,
//! character, flashcard and ink source files, the raw entries of the
//! outfit table, and each level after normalization.
//!
//! Oversized flashcard files are schema-checked on their envelope plus
//! the first `sample_size` records only; the sampling is recorded as a
//! policy skip. Per-record id and prompt checks still cover every record.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use kimbar_core::{ContentKind, PipelineConfig};
use kimbar_level::{normalize, Level, LevelValidator, NormalizeOptions};
use kimbar_registry::{FlashcardPackEntry, OrderingIssueKind, Registry, Scanner, StaticConfig};
use kimbar_schema::{SchemaValidationError, SchemaValidator};
use serde_json::{Map, Value};

use crate::codes;
use crate::report::ContentReport;

const REGISTRY_SCHEMA_NAME: &str = "registry";
const OUTFIT_SCHEMA_NAME: &str = "outfit";
const LEVEL_SCHEMA_NAME: &str = "level";

/// Validates a built registry and the content it points at.
pub struct ContentValidator<'a> {
    registry: &'a Registry,
    config: &'a PipelineConfig,
    schemas: Option<SchemaValidator>,
}

impl<'a> ContentValidator<'a> {
    /// Validator over `registry`, resolving files through `config`.
    /// Without schemas every structural check reports
    /// `SCHEMA_NOT_REGISTERED` once per kind.
    pub fn new(registry: &'a Registry, config: &'a PipelineConfig) -> Self {
        Self {
            registry,
            config,
            schemas: None,
        }
    }

    /// Use `schemas` for structural checks.
    pub fn with_schemas(mut self, schemas: Option<SchemaValidator>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Run every check and return the accumulated report.
    pub fn run(&self) -> ContentReport {
        let mut pass = Pass {
            registry: self.registry,
            config: self.config,
            schemas: self.schemas.as_ref(),
            levels: LevelValidator::new(self.registry.entity_schema.clone()),
            normalize: NormalizeOptions {
                tile_size: self.registry.tile_size,
                default_viewport: self.config.default_viewport,
            },
            unregistered: BTreeSet::new(),
            report: ContentReport::default(),
        };

        pass.registry_document();
        pass.ordering();
        pass.outfits();
        pass.sprites();
        pass.characters();
        pass.flashcard_packs();
        pass.rooms();
        pass.ink();
        pass.tilesets();

        tracing::info!(
            errors = pass.report.errors.len(),
            warnings = pass.report.warnings.len(),
            skips = pass.report.skips.len(),
            "content validation finished"
        );
        pass.report
    }
}

// ---------------------------------------------------------------------------
// Validation pass
// ---------------------------------------------------------------------------

struct Pass<'a> {
    registry: &'a Registry,
    config: &'a PipelineConfig,
    schemas: Option<&'a SchemaValidator>,
    levels: LevelValidator,
    normalize: NormalizeOptions,
    unregistered: BTreeSet<&'static str>,
    report: ContentReport,
}

impl Pass<'_> {
    fn registry_document(&mut self) {
        match serde_json::to_value(self.registry) {
            Ok(doc) => self.schema_check(REGISTRY_SCHEMA_NAME, "registry", &doc),
            Err(e) => self.report.add_error(
                codes::SCHEMA_VIOLATION,
                "registry",
                format!("registry does not serialize: {e}"),
            ),
        }
    }

    fn ordering(&mut self) {
        for issue in self.registry.ordering_issues() {
            match issue.kind {
                OrderingIssueKind::Unsorted => self.report.add_error(
                    codes::REGISTRY_UNSORTED,
                    issue.array,
                    format!("`{}` is out of order", issue.id),
                ),
                OrderingIssueKind::Duplicate => self.report.add_error(
                    codes::DUPLICATE_REGISTRY_ID,
                    issue.array,
                    format!("`{}` appears more than once", issue.id),
                ),
            }
        }
    }

    fn outfits(&mut self) {
        let registry = self.registry;
        let sources = self.outfit_sources();
        for (key, outfit) in &registry.outfits {
            if let Some(doc) = sources.get(key) {
                self.schema_check(OUTFIT_SCHEMA_NAME, key, doc);
            }
            if outfit.id.is_empty() {
                self.report.add_error(
                    codes::OUTFIT_ID_MISMATCH,
                    key.as_str(),
                    format!("outfit under key `{key}` declares no id"),
                );
            } else if outfit.id != *key {
                self.report.add_error(
                    codes::OUTFIT_ID_MISMATCH,
                    key.as_str(),
                    format!("outfit declares id `{}` under key `{key}`", outfit.id),
                );
            }
        }
    }

    fn sprites(&mut self) {
        let registry = self.registry;
        let sources = self.source_files(ContentKind::Sprite);
        for (id, sprite) in &registry.sprites {
            self.source_schema_check(ContentKind::Sprite, id, &sources);
            self.require_file(id, &sprite.url, "sprite image");
            if let Some(portrait) = &sprite.portrait_url {
                self.require_file(id, portrait, "portrait image");
            }
        }
    }

    fn characters(&mut self) {
        let registry = self.registry;
        for character in &registry.characters {
            let Some(path) = self.require_file(&character.id, &character.url, "character spec") else {
                continue;
            };
            match read_json(&path) {
                Ok(doc) => self.schema_check(ContentKind::Character.schema_name(), &character.id, &doc),
                Err(reason) => {
                    self.report
                        .add_error(codes::CHARACTER_PARSE_ERROR, character.id.as_str(), reason)
                }
            }
        }
    }

    fn flashcard_packs(&mut self) {
        let registry = self.registry;
        for pack in &registry.flashcard_packs {
            self.flashcard_pack(pack);
        }
    }

    fn flashcard_pack(&mut self, pack: &FlashcardPackEntry) {
        let deck = pack.id.as_str();
        let Some(path) = self.require_file(deck, &pack.url, "flashcard file") else {
            return;
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                self.report
                    .add_error(codes::DECK_PARSE_ERROR, deck, format!("cannot read {}: {e}", path.display()));
                return;
            }
        };
        let doc: Value = match serde_json::from_str(&text) {
            Ok(doc) => doc,
            Err(e) => {
                self.report.add_error(codes::DECK_PARSE_ERROR, deck, format!("invalid JSON: {e}"));
                return;
            }
        };
        let Some(records) = deck_records(&doc) else {
            self.report.add_error(
                codes::DECK_PARSE_ERROR,
                deck,
                "expected a record array or an object with a `cards` array",
            );
            return;
        };

        // 1. Declared count
        if records.len() as u64 != pack.count {
            self.report.add_error(
                codes::DECK_COUNT_MISMATCH,
                deck,
                format!("registry declares {} record(s), file has {}", pack.count, records.len()),
            );
        }

        // 2. Structure, sampled above the size threshold
        let config = self.config;
        let policy = &config.flashcards;
        if text.len() as u64 > policy.size_threshold_bytes {
            let sampled = records.len().min(policy.sample_size);
            self.report.add_skip(
                deck,
                format!(
                    "file is {} bytes (threshold {}); schema-checked envelope and {sampled} of {} record(s)",
                    text.len(),
                    policy.size_threshold_bytes,
                    records.len()
                ),
            );
            let sample = sample_deck(&doc, policy.sample_size);
            self.schema_check(ContentKind::FlashcardPack.schema_name(), deck, &sample);
        } else {
            self.schema_check(ContentKind::FlashcardPack.schema_name(), deck, &doc);
        }

        // 3. Records
        let mut seen = BTreeSet::new();
        for (index, record) in records.iter().enumerate() {
            let id = record.get("id").and_then(Value::as_str).unwrap_or("");
            if let Some(rule) = policy.skip_rule_for(id) {
                self.report.add_skip(format!("{deck}#{id}"), rule.reason.clone());
                continue;
            }
            let subject = if id.is_empty() {
                self.report.add_error(
                    codes::DECK_RECORD_MISSING_ID,
                    deck,
                    format!("record {index} has no id"),
                );
                format!("{deck}#{index}")
            } else {
                if !seen.insert(id) {
                    self.report.add_error(
                        codes::DECK_RECORD_DUPLICATE_ID,
                        deck,
                        format!("record id `{id}` appears more than once"),
                    );
                }
                format!("{deck}#{id}")
            };
            let prompt = record.get("prompt").and_then(Value::as_str).unwrap_or("");
            if prompt.trim().is_empty() {
                self.report
                    .add_error(codes::DECK_RECORD_MISSING_PROMPT, subject, "record has no prompt");
            }
        }
    }

    fn rooms(&mut self) {
        let registry = self.registry;
        let sources = self.source_files(ContentKind::Room);
        for room in &registry.rooms {
            let id = room.id.as_str();
            self.source_schema_check(ContentKind::Room, id, &sources);
            let Some(path) = self.require_file(id, &room.level_url, "level file") else {
                continue;
            };
            let doc = match read_json(&path) {
                Ok(doc) => doc,
                Err(reason) => {
                    self.report.add_error(codes::LEVEL_PARSE_ERROR, id, reason);
                    continue;
                }
            };
            let level = match normalize(&doc, id, &self.normalize) {
                Ok(level) => level,
                Err(e) => {
                    self.report
                        .add_error(codes::LEVEL_PARSE_ERROR, id, format!("cannot normalize: {e}"));
                    continue;
                }
            };
            if let Ok(canonical) = serde_json::to_value(&level) {
                self.schema_check(LEVEL_SCHEMA_NAME, id, &canonical);
            }

            let findings = self.levels.validate(&level);
            for finding in findings.errors {
                self.report.add_error(finding.code.as_str(), id, finding.message);
            }
            for finding in findings.warnings {
                self.report.add_warning(finding.code.as_str(), id, finding.message);
            }

            self.entity_references(id, &level);
        }
    }

    fn entity_references(&mut self, room: &str, level: &Level) {
        for (index, entity) in level.entities.iter().enumerate() {
            let at = format!("{} #{index}", entity.entity_type);

            for key in ["rewardId", "outfitId"] {
                if let Some(outfit) = entity.str_property(key) {
                    if !self.registry.outfits.contains_key(outfit) {
                        self.report.add_error(
                            codes::UNKNOWN_OUTFIT_REF,
                            room,
                            format!("{at}: {key} `{outfit}` is not a known outfit"),
                        );
                    }
                }
            }
            if let Some(tag) = entity.str_property("deckTag") {
                if !self.registry.tags.contains(tag) {
                    self.report.add_warning(
                        codes::UNKNOWN_TAG_REF,
                        room,
                        format!("{at}: deckTag `{tag}` is not a known subject or topic tag"),
                    );
                }
            }
            if let Some(target) = entity.str_property("targetLevel") {
                if self.registry.room(target).is_none() {
                    self.report.add_error(
                        codes::UNKNOWN_LEVEL_REF,
                        room,
                        format!("{at}: targetLevel `{target}` is not a known room"),
                    );
                }
            }
            if let Some(character) = entity.str_property("characterId") {
                if self.registry.character(character).is_none() {
                    self.report.add_warning(
                        codes::UNKNOWN_CHARACTER_REF,
                        room,
                        format!("{at}: characterId `{character}` is not a known character"),
                    );
                }
            }
        }
    }

    fn ink(&mut self) {
        let registry = self.registry;
        for script in &registry.ink {
            let id = script.id.as_str();
            let Some(path) = self.require_file(id, &script.url, "ink script") else {
                continue;
            };
            match read_json(&path) {
                Ok(doc) => {
                    self.schema_check(ContentKind::Ink.schema_name(), id, &doc);
                    if doc.get("inkVersion").is_none() {
                        self.report
                            .add_warning(codes::INK_VERSION_MISSING, id, "compiled script has no `inkVersion`");
                    }
                }
                Err(reason) => self.report.add_error(codes::INK_PARSE_ERROR, id, reason),
            }
        }
    }

    fn tilesets(&mut self) {
        let registry = self.registry;
        for tileset in &registry.tilesets {
            self.require_file(&tileset.id, &tileset.url, "tileset image");
        }
    }

    // -- helpers ------------------------------------------------------------

    /// Source paths of `kind` keyed by canonical id, assigned the way the
    /// scanner assigns them.
    fn source_files(&mut self, kind: ContentKind) -> BTreeMap<String, PathBuf> {
        match Scanner::new(&self.config.content_root).sources(kind) {
            Ok(sources) => sources.into_iter().collect(),
            Err(e) => {
                self.report
                    .add_error(codes::SOURCE_SCAN_ERROR, kind.dir_name(), e.to_string());
                BTreeMap::new()
            }
        }
    }

    /// Schema-check the source file behind `id`.
    fn source_schema_check(&mut self, kind: ContentKind, id: &str, sources: &BTreeMap<String, PathBuf>) {
        let Some(path) = sources.get(id) else {
            self.report.add_error(
                codes::MISSING_FILE,
                id,
                format!("no {} source file under `{}/`", kind, kind.dir_name()),
            );
            return;
        };
        match read_json(path) {
            Ok(doc) => self.schema_check(kind.schema_name(), id, &doc),
            Err(reason) => self.report.add_error(codes::SOURCE_PARSE_ERROR, id, reason),
        }
    }

    /// Raw entries of the outfit table, before serde fills defaults.
    fn outfit_sources(&mut self) -> Map<String, Value> {
        let path = StaticConfig::outfits_path(&self.config.content_root);
        if !path.is_file() {
            return Map::new();
        }
        match read_json(&path) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) => {
                self.report
                    .add_error(codes::SOURCE_PARSE_ERROR, "outfits", "outfit table is not a JSON object");
                Map::new()
            }
            Err(reason) => {
                self.report.add_error(codes::SOURCE_PARSE_ERROR, "outfits", reason);
                Map::new()
            }
        }
    }

    /// The on-disk path behind `url`, or a `MISSING_FILE` error.
    fn require_file(&mut self, subject: &str, url: &str, what: &str) -> Option<PathBuf> {
        match self.config.content_path(url) {
            None => {
                self.report.add_error(
                    codes::MISSING_FILE,
                    subject,
                    format!(
                        "{what} url `{url}` is not under the content prefix `{}`",
                        self.config.url_prefix
                    ),
                );
                None
            }
            Some(path) if !path.is_file() => {
                self.report.add_error(
                    codes::MISSING_FILE,
                    subject,
                    format!("{what} `{url}` not found at {}", path.display()),
                );
                None
            }
            Some(path) => Some(path),
        }
    }

    fn schema_check(&mut self, kind: &'static str, subject: &str, doc: &Value) {
        let Some(schemas) = self.schemas.filter(|s| s.has_schema(kind)) else {
            if self.unregistered.insert(kind) {
                tracing::warn!(kind, "no schema registered; structural checks skipped");
                self.report.add_warning(
                    codes::SCHEMA_NOT_REGISTERED,
                    kind,
                    format!("no {kind}.schema.json registered; {kind} documents are not structurally checked"),
                );
            }
            return;
        };
        match schemas.validate_document(doc, kind) {
            Ok(()) => {}
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
                for violation in violations.violations() {
                    let at = if violation.instance_path.is_empty() {
                        "/"
                    } else {
                        violation.instance_path.as_str()
                    };
                    self.report.add_error(
                        codes::SCHEMA_VIOLATION,
                        subject,
                        format!("{at}: {}", violation.message),
                    );
                }
            }
            Err(e) => self.report.add_error(codes::SCHEMA_VIOLATION, subject, e.to_string()),
        }
    }
}

fn read_json(path: &std::path::Path) -> Result<Value, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))
}

/// Records of a deck: a bare array or the `cards` array of an envelope.
fn deck_records(doc: &Value) -> Option<&Vec<Value>> {
    match doc {
        Value::Array(records) => Some(records),
        Value::Object(envelope) => envelope.get("cards").and_then(Value::as_array),
        _ => None,
    }
}

/// The deck with only its first `n` records kept.
fn sample_deck(doc: &Value, n: usize) -> Value {
    let head = |records: &[Value]| Value::Array(records.iter().take(n).cloned().collect());
    match doc {
        Value::Array(records) => head(records),
        Value::Object(envelope) => Value::Object(
            envelope
                .iter()
                .map(|(key, value)| match (key.as_str(), value) {
                    ("cards", Value::Array(records)) => (key.clone(), head(records)),
                    _ => (key.clone(), value.clone()),
                })
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deck_records_accepts_both_shapes() {
        let bare = json!([{"id": "a"}]);
        let envelope = json!({"schemaVersion": 2, "cards": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(deck_records(&bare).map(Vec::len), Some(1));
        assert_eq!(deck_records(&envelope).map(Vec::len), Some(2));
        assert!(deck_records(&json!({"questions": []})).is_none());
        assert!(deck_records(&json!("cards")).is_none());
    }

    #[test]
    fn sample_keeps_envelope_and_leading_records() {
        let doc = json!({"schemaVersion": 2, "cards": [{"id": "a"}, {"id": "b"}, {"id": "c"}]});
        let sample = sample_deck(&doc, 2);
        assert_eq!(sample["schemaVersion"], 2);
        assert_eq!(sample["cards"], json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(sample_deck(&json!([1, 2, 3]), 1), json!([1]));
    }
}
