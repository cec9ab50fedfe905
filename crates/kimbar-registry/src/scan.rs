//! # Scanner / Discovery
//!
//! Walks each kind directory under the content root, assigns canonical
//! ids, parses every JSON source, and checks referenced assets on disk.
//!
//! ## Id Assignment
//!
//! Ids are derived by [`assign_ids`], a pure function of the set of
//! source paths. When two files of one kind normalize to the same slug,
//! every member of the colliding group is suffixed with the slug of its
//! immediate parent directory:
//!
//! ```text
//! flashcards/civics/basics.json   -> deck.basics_civics
//! flashcards/history/basics.json  -> deck.basics_history
//! ```
//!
//! A collision that survives suffixing is a [`ScanError::DuplicateId`].
//!
//! ## Asset References
//!
//! Sprite `image`/`portrait` and character `spriteSheet` are resolved
//! against the content root. Editor-native level exports reached through
//! a room spec have their `defs.tilesets[].relPath` resolved against the
//! level file's directory.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use kimbar_core::{canonical_slug, detect_format, ContentKind, SourceFormat};
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{MissingFileError, ScanError};

// ---------------------------------------------------------------------------
// Discovery output
// ---------------------------------------------------------------------------

/// One discovered source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovered {
    /// Content kind.
    pub kind: ContentKind,
    /// Canonical id, including the kind prefix.
    pub id: String,
    /// Absolute (or root-joined) path of the source file.
    pub source: PathBuf,
    /// Path relative to the content root, `/`-separated.
    pub rel_path: String,
    /// Parsed JSON payload; `None` for binary assets.
    pub payload: Option<Value>,
}

impl Discovered {
    /// The id with its kind prefix removed.
    pub fn slug(&self) -> &str {
        self.id.strip_prefix(self.kind.prefix()).unwrap_or(&self.id)
    }

    /// A string field of the payload, if present.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.payload.as_ref()?.get(field)?.as_str()
    }
}

/// Every discovered source, sorted ascending by canonical id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    items: Vec<Discovered>,
}

impl Discovery {
    /// Build a discovery set. Items are sorted by id here and nowhere else.
    pub fn from_items(mut items: Vec<Discovered>) -> Self {
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Self { items }
    }

    /// All items, sorted by id.
    pub fn items(&self) -> &[Discovered] {
        &self.items
    }

    /// Items of one kind, sorted by id.
    pub fn of_kind(&self, kind: ContentKind) -> impl Iterator<Item = &Discovered> {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Id assignment
// ---------------------------------------------------------------------------

/// Assign canonical ids to the files of one kind.
///
/// `files` are paths under `kind_dir`; their order does not matter.
/// Returns `(id, path)` pairs sorted by id.
///
/// # Errors
///
/// `ScanError::EmptyId` when a file name has no alphanumerics, and
/// `ScanError::DuplicateId` when two files still share an id after
/// parent-category suffixing.
pub fn assign_ids(
    kind: ContentKind,
    kind_dir: &Path,
    files: &[PathBuf],
) -> Result<Vec<(String, PathBuf)>, ScanError> {
    let mut by_slug: BTreeMap<String, Vec<&PathBuf>> = BTreeMap::new();
    for path in files {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let slug = canonical_slug(name);
        if slug.is_empty() {
            return Err(ScanError::EmptyId { path: path.clone() });
        }
        by_slug.entry(slug).or_default().push(path);
    }

    let mut assigned: BTreeMap<String, PathBuf> = BTreeMap::new();
    for (slug, mut group) in by_slug {
        group.sort();
        let suffix = group.len() > 1;
        for path in group {
            let id = match suffix.then(|| parent_category(kind_dir, path)).flatten() {
                Some(category) => kind.canonical_id(&format!("{slug}_{category}")),
                None => kind.canonical_id(&slug),
            };
            if let Some(existing) = assigned.get(&id) {
                let (first, second) = if existing <= path {
                    (existing.clone(), path.clone())
                } else {
                    (path.clone(), existing.clone())
                };
                return Err(ScanError::DuplicateId {
                    kind,
                    id,
                    first,
                    second,
                });
            }
            assigned.insert(id, path.clone());
        }
    }

    Ok(assigned.into_iter().collect())
}

/// Slug of the file's immediate parent directory, if the file is not at
/// the kind root.
fn parent_category(kind_dir: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let rel = parent.strip_prefix(kind_dir).ok()?;
    let name = rel.file_name()?.to_str()?;
    let category = canonical_slug(name);
    (!category.is_empty()).then_some(category)
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Editor and OS leftovers that are never content (`._*`, `.DS_Store`,
/// any other dot file).
fn is_junk(name: &str) -> bool {
    name.starts_with('.')
}

/// Walks a content root.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    /// Scanner over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The content root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover, parse and check every source under the content root.
    ///
    /// Kind directories that do not exist contribute nothing.
    pub fn scan(&self) -> Result<Discovery, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::NoContentRoot {
                path: self.root.clone(),
            });
        }

        let mut items = Vec::new();
        for kind in ContentKind::ALL {
            for (id, source) in self.sources(kind)? {
                let payload = if kind.is_document() {
                    Some(read_json(&source)?)
                } else {
                    None
                };
                let rel_path = relative_url_path(&self.root, &source);
                tracing::debug!(kind = %kind, id = %id, path = %rel_path, "discovered");
                items.push(Discovered {
                    kind,
                    id,
                    source,
                    rel_path,
                    payload,
                });
            }
        }

        for item in &items {
            self.check_assets(item)?;
        }

        let discovery = Discovery::from_items(items);
        tracing::info!(
            root = %self.root.display(),
            count = discovery.len(),
            "content scan complete"
        );
        Ok(discovery)
    }

    /// Canonical ids and source paths of one kind, sorted by id, without
    /// parsing the files or checking their assets.
    ///
    /// An absent kind directory yields no sources.
    pub fn sources(&self, kind: ContentKind) -> Result<Vec<(String, PathBuf)>, ScanError> {
        let kind_dir = self.root.join(kind.dir_name());
        if !kind_dir.is_dir() {
            tracing::debug!(kind = %kind, dir = %kind_dir.display(), "kind directory absent");
            return Ok(Vec::new());
        }
        let files = collect_files_sorted(&kind_dir, kind.extension())?;
        assign_ids(kind, &kind_dir, &files)
    }

    fn check_assets(&self, item: &Discovered) -> Result<(), ScanError> {
        let fields: &[&str] = match item.kind {
            ContentKind::Sprite => &["image", "portrait"],
            ContentKind::Character => &["spriteSheet"],
            ContentKind::Room => {
                return self.check_level_tilesets(item);
            }
            _ => &[],
        };
        for field in fields {
            if let Some(reference) = item.str_field(field) {
                let asset = self.root_relative(reference);
                if !asset.is_file() {
                    return Err(MissingFileError {
                        referenced_by: item.source.clone(),
                        field: field.to_string(),
                        asset,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Tileset images of an editor-native level export. A missing or
    /// malformed level file is left to the content validator.
    fn check_level_tilesets(&self, room: &Discovered) -> Result<(), ScanError> {
        let Some(level_ref) = room.str_field("level") else {
            return Ok(());
        };
        let level_path = self.root_relative(level_ref);
        let Ok(text) = std::fs::read_to_string(&level_path) else {
            return Ok(());
        };
        let Ok(doc) = serde_json::from_str::<Value>(&text) else {
            tracing::debug!(path = %level_path.display(), "level not parseable; skipping asset check");
            return Ok(());
        };
        if detect_format(&doc) != SourceFormat::EditorNative {
            return Ok(());
        }

        let level_dir = level_path.parent().unwrap_or(&self.root);
        let tilesets = doc
            .pointer("/defs/tilesets")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for tileset in tilesets {
            // Embedded atlases carry a null relPath.
            let Some(rel) = tileset.get("relPath").and_then(Value::as_str) else {
                continue;
            };
            let asset = level_dir.join(rel);
            if !asset.is_file() {
                return Err(MissingFileError {
                    referenced_by: level_path.clone(),
                    field: "defs.tilesets.relPath".to_string(),
                    asset,
                }
                .into());
            }
        }
        Ok(())
    }

    fn root_relative(&self, reference: &str) -> PathBuf {
        self.root.join(reference.trim_start_matches('/'))
    }
}

fn collect_files_sorted(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, ScanError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default();
        if is_junk(name) {
            tracing::debug!(path = %entry.path().display(), "skipping junk file");
            continue;
        }
        if entry
            .path()
            .extension()
            .is_some_and(|x| x.eq_ignore_ascii_case(ext))
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_json(path: &Path) -> Result<Value, ScanError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| ScanError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn relative_url_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
