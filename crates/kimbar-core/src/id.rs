//! # Content Kinds and Canonical Ids
//!
//! A canonical id is `<namespace prefix><slug>`, where the slug is the
//! source file name with every extension stripped, camelCase boundaries
//! split, lowercased, and every run of non-alphanumerics collapsed to a
//! single `_`.
//!
//! ```text
//! rooms/CourtRoom.json          -> room.court_room
//! ink/opening-argument.ink.json -> ink.opening_argument
//! tilesets/lpc/Floors.png       -> tileset.floors
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of content the scanner discovers.
///
/// Each kind owns one directory under the content root, one file
/// extension, and one namespace prefix. Levels are not a discovered kind:
/// they are reached through room specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Character definition.
    Character,
    /// Room spec pointing at a level file.
    Room,
    /// Question deck.
    FlashcardPack,
    /// Compiled narrative script.
    Ink,
    /// Sprite sheet descriptor.
    Sprite,
    /// Tileset image.
    Tileset,
}

impl ContentKind {
    /// Every kind, in scan order.
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Character,
        ContentKind::Room,
        ContentKind::FlashcardPack,
        ContentKind::Ink,
        ContentKind::Sprite,
        ContentKind::Tileset,
    ];

    /// Directory under the content root that holds this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Character => "characters",
            Self::Room => "rooms",
            Self::FlashcardPack => "flashcards",
            Self::Ink => "ink",
            Self::Sprite => "sprites",
            Self::Tileset => "tilesets",
        }
    }

    /// Namespace prefix applied to every canonical id of this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Character => "character.",
            Self::Room => "room.",
            Self::FlashcardPack => "deck.",
            Self::Ink => "ink.",
            Self::Sprite => "sprite.",
            Self::Tileset => "tileset.",
        }
    }

    /// File extension (without dot) of source files of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tileset => "png",
            _ => "json",
        }
    }

    /// Whether source files of this kind are parsed as JSON during discovery.
    pub fn is_document(&self) -> bool {
        !matches!(self, Self::Tileset)
    }

    /// Base name of the structural schema for source files of this kind,
    /// resolved as `<name>.schema.json`.
    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Room => "room",
            Self::FlashcardPack => "flashcards",
            Self::Ink => "ink",
            Self::Sprite => "sprite",
            Self::Tileset => "tileset",
        }
    }

    /// Build a canonical id for this kind from an already normalized slug.
    pub fn canonical_id(&self, slug: &str) -> String {
        format!("{}{slug}", self.prefix())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Character => "character",
            Self::Room => "room",
            Self::FlashcardPack => "flashcard pack",
            Self::Ink => "ink",
            Self::Sprite => "sprite",
            Self::Tileset => "tileset",
        })
    }
}

/// Normalize a file name (or any label) into a snake_case slug.
///
/// Everything from the first `.` on is treated as extension and dropped,
/// so `story.ink.json` and `story.json` both become `story`.
pub fn canonical_slug(name: &str) -> String {
    let stem = name.split('.').next().unwrap_or(name);
    let chars: Vec<char> = stem.chars().collect();

    let mut spaced = String::with_capacity(stem.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                spaced.push('_');
            }
        }
        spaced.extend(c.to_lowercase());
    }

    let mut slug = String::with_capacity(spaced.len());
    let mut pending_sep = false;
    for c in spaced.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    slug
}
