//! # kimbar-validate — Content Validation
//!
//! Checks the whole content set against a built [`Registry`], which acts
//! as the index of every file to read:
//!
//! 1. **Structural**: the registry, its entries, and every referenced
//!    source file against the schema registered for its kind.
//! 2. **Integrity**: registry ordering, outfit key/id agreement, deck
//!    record ids and counts, level and script parseability.
//! 3. **Cross-reference**: entity properties in levels resolve against
//!    the registry's outfits, tags, rooms and characters.
//!
//! Every finding is accumulated; nothing short-circuits. The
//! [`ContentReport`] separates hard errors, warnings, and policy skips
//! (content excluded by configuration, never counted as a defect).
//!
//! [`Registry`]: kimbar_registry::Registry

pub mod codes;
pub mod report;
pub mod validator;

pub use report::{ContentReport, Finding, PolicySkip};
pub use validator::ContentValidator;
