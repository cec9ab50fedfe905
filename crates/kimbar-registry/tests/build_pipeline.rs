//! End-to-end scan + build over fixture content trees.

use std::fs;
use std::path::Path;

use kimbar_registry::{
    BuildSettings, MissingFileError, RegistryBuilder, ScanError, Scanner, StaticConfig,
};
use serde_json::json;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn write_json(root: &Path, rel: &str, value: serde_json::Value) {
    write(root, rel, &serde_json::to_string_pretty(&value).unwrap());
}

fn fixture_tree(root: &Path) {
    write_json(root, "config/outfits.json", json!({"robe": {"id": "robe", "name": "Robe", "buffs": ["gravitas"]}}));
    write_json(root, "config/tags.json", json!({"subjects": ["law"], "topicTags": ["torts", "law"]}));
    write_json(root, "rooms/b_room.json", json!({"level": "levels/b.json"}));
    write_json(root, "rooms/a_room.json", json!({"displayName": "Atrium", "level": "levels/a.json"}));
    write_json(root, "characters/Clerk.json", json!({"name": "Court Clerk", "spriteSheet": "images/clerk.png"}));
    write(root, "images/clerk.png", "png");
    write(root, "images/judge.png", "png");
    write_json(root, "sprites/judge.json", json!({"image": "images/judge.png", "frameWidth": 32, "frameHeight": 48}));
    write_json(root, "flashcards/civics/basics.json", json!([{"id": "c1", "prompt": "?"}]));
    write_json(root, "flashcards/history/basics.json", json!({"cards": [{"id": "h1", "prompt": "?"}, {"id": "h2", "prompt": "?"}]}));
    write_json(root, "ink/opening.ink.json", json!({"inkVersion": 21, "root": []}));
    write(root, "tilesets/lpc/Floors.png", "png");
    write(root, "rooms/._a_room.json", "\u{0}\u{5}binary junk");
    write(root, "rooms/.DS_Store", "junk");
}

fn build(root: &Path, build_id: &str) -> kimbar_registry::Registry {
    let discovery = Scanner::new(root).scan().unwrap();
    let statics = StaticConfig::load(root).unwrap();
    RegistryBuilder::new(statics, BuildSettings::default())
        .build(&discovery, build_id)
        .unwrap()
}

#[test]
fn build_is_idempotent_apart_from_build_id() {
    let dir = tempfile::tempdir().unwrap();
    fixture_tree(dir.path());

    let first = build(dir.path(), "build-1");
    let second = build(dir.path(), "build-2");

    assert_eq!(first.content_digest, second.content_digest);
    let mut relabeled = second.clone();
    relabeled.build_id = first.build_id.clone();
    assert_eq!(first.to_pretty_json().unwrap(), relabeled.to_pretty_json().unwrap());
}

#[test]
fn arrays_are_sorted_and_ids_derived() {
    let dir = tempfile::tempdir().unwrap();
    fixture_tree(dir.path());
    let registry = build(dir.path(), "t");

    let rooms: Vec<&str> = registry.rooms.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rooms, vec!["room.a_room", "room.b_room"]);
    assert_eq!(registry.rooms[0].display_name, "Atrium");
    assert_eq!(registry.rooms[1].display_name, "B Room");

    let decks: Vec<&str> = registry.flashcard_packs.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(decks, vec!["deck.basics_civics", "deck.basics_history"]);
    assert_eq!(registry.flashcard_packs[1].count, 2);
    assert_eq!(registry.flashcard_packs[1].url, "/content/flashcards/history/basics.json");

    assert_eq!(registry.ink[0].id, "ink.opening");
    assert_eq!(registry.characters[0].id, "character.clerk");
    assert_eq!(registry.characters[0].name, "Court Clerk");
    assert_eq!(registry.tilesets[0].id, "tileset.floors");
    assert_eq!(registry.tilesets[0].url, "/content/tilesets/lpc/Floors.png");
    assert_eq!(registry.flat_tags, vec!["law", "torts"]);
    assert!(registry.ordering_issues().is_empty());
}

#[test]
fn junk_files_are_not_discovered() {
    let dir = tempfile::tempdir().unwrap();
    fixture_tree(dir.path());
    let discovery = Scanner::new(dir.path()).scan().unwrap();
    assert!(discovery.items().iter().all(|item| !item.rel_path.contains("/.")));
    assert_eq!(discovery.of_kind(kimbar_core::ContentKind::Room).count(), 2);
}

#[test]
fn missing_sprite_image_is_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "sprites/ghost.json", json!({"image": "images/ghost.png", "frameWidth": 32, "frameHeight": 32}));
    let err = Scanner::new(dir.path()).scan().unwrap_err();
    match err {
        ScanError::MissingFile(MissingFileError { field, asset, .. }) => {
            assert_eq!(field, "image");
            assert!(asset.ends_with("images/ghost.png"));
        }
        other => panic!("Expected MissingFile, got: {other}"),
    }
}

#[test]
fn missing_editor_tileset_is_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "rooms/lobby.json", json!({"level": "levels/lobby.json"}));
    write_json(
        dir.path(),
        "levels/lobby.json",
        json!({
            "defs": {"tilesets": [
                {"identifier": "Floors", "relPath": "../tilesets/floors.png", "pxWid": 64, "pxHei": 64, "tileGridSize": 32},
                {"identifier": "Atlas", "relPath": null}
            ]},
            "levels": [{"identifier": "Lobby", "layerInstances": []}]
        }),
    );
    let err = Scanner::new(dir.path()).scan().unwrap_err();
    assert!(matches!(err, ScanError::MissingFile(ref e) if e.field == "defs.tilesets.relPath"));

    write(dir.path(), "tilesets/floors.png", "png");
    Scanner::new(dir.path()).scan().unwrap();
}

#[test]
fn missing_level_file_is_not_a_scan_error() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "rooms/lobby.json", json!({"level": "levels/nowhere.json"}));
    let discovery = Scanner::new(dir.path()).scan().unwrap();
    assert_eq!(discovery.len(), 1);
}

#[test]
fn duplicate_ids_name_both_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "rooms/Lobby.json", json!({"level": "levels/a.json"}));
    write_json(dir.path(), "rooms/lobby.json", json!({"level": "levels/b.json"}));
    let err = Scanner::new(dir.path()).scan().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Lobby.json"), "{message}");
    assert!(message.contains("lobby.json"), "{message}");
}

#[test]
fn malformed_source_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ink/broken.json", "{ not json");
    let err = Scanner::new(dir.path()).scan().unwrap_err();
    assert!(matches!(err, ScanError::Parse { .. }));
}

#[test]
fn missing_content_root_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Scanner::new(dir.path().join("nope")).scan().unwrap_err();
    assert!(matches!(err, ScanError::NoContentRoot { .. }));
}
