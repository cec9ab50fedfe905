//! Finding codes emitted by the content validator. Level findings are
//! forwarded with the level validator's own codes.

/// A document does not match its kind schema.
pub const SCHEMA_VIOLATION: &str = "SCHEMA_VIOLATION";
/// No schema is registered for a kind.
pub const SCHEMA_NOT_REGISTERED: &str = "SCHEMA_NOT_REGISTERED";
/// A registry array is out of order.
pub const REGISTRY_UNSORTED: &str = "REGISTRY_UNSORTED";
/// A registry array repeats an id.
pub const DUPLICATE_REGISTRY_ID: &str = "DUPLICATE_REGISTRY_ID";
/// An outfit's declared id is absent or differs from its key.
pub const OUTFIT_ID_MISMATCH: &str = "OUTFIT_ID_MISMATCH";
/// A referenced file does not exist.
pub const MISSING_FILE: &str = "MISSING_FILE";
/// A room, sprite or outfit source is unreadable or malformed.
pub const SOURCE_PARSE_ERROR: &str = "SOURCE_PARSE_ERROR";
/// The source files of a kind cannot be enumerated.
pub const SOURCE_SCAN_ERROR: &str = "SOURCE_SCAN_ERROR";
/// A character spec is unreadable or malformed.
pub const CHARACTER_PARSE_ERROR: &str = "CHARACTER_PARSE_ERROR";
/// A deck file is unreadable or malformed.
pub const DECK_PARSE_ERROR: &str = "DECK_PARSE_ERROR";
/// A deck's record count differs from the registry.
pub const DECK_COUNT_MISMATCH: &str = "DECK_COUNT_MISMATCH";
/// A deck record has no id.
pub const DECK_RECORD_MISSING_ID: &str = "DECK_RECORD_MISSING_ID";
/// Two deck records share an id.
pub const DECK_RECORD_DUPLICATE_ID: &str = "DECK_RECORD_DUPLICATE_ID";
/// A deck record has no prompt.
pub const DECK_RECORD_MISSING_PROMPT: &str = "DECK_RECORD_MISSING_PROMPT";
/// A level file is unreadable, malformed, or cannot be normalized.
pub const LEVEL_PARSE_ERROR: &str = "LEVEL_PARSE_ERROR";
/// A level entity references an outfit that does not exist.
pub const UNKNOWN_OUTFIT_REF: &str = "UNKNOWN_OUTFIT_REF";
/// A level entity references a tag outside the vocabulary.
pub const UNKNOWN_TAG_REF: &str = "UNKNOWN_TAG_REF";
/// A level entity references a room that does not exist.
pub const UNKNOWN_LEVEL_REF: &str = "UNKNOWN_LEVEL_REF";
/// A level entity references a character that does not exist.
pub const UNKNOWN_CHARACTER_REF: &str = "UNKNOWN_CHARACTER_REF";
/// A compiled script is unreadable or malformed.
pub const INK_PARSE_ERROR: &str = "INK_PARSE_ERROR";
/// A compiled script has no `inkVersion`.
pub const INK_VERSION_MISSING: &str = "INK_VERSION_MISSING";
