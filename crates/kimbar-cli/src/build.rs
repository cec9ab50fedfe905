//! # Build Subcommand
//!
//! Scans the content root, builds the registry, and writes it as pretty
//! JSON. With `--check`, nothing is written: the freshly computed
//! `contentDigest` is compared with the registry on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::Project;

/// Environment variable consulted for the build id.
pub const BUILD_ID_ENV: &str = "KIMBAR_BUILD_ID";

/// Arguments for the `kimbar build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Build id stamped into the registry.
    #[arg(long)]
    pub build_id: Option<String>,

    /// Output path (defaults to the configured `output`).
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Verify the registry on disk is up to date instead of writing it.
    #[arg(long)]
    pub check: bool,
}

/// Execute the build subcommand.
///
/// Returns exit code: 0 on success, 1 if `--check` finds the registry
/// missing or stale.
pub fn run_build(args: &BuildArgs, project: &Project) -> Result<u8> {
    let out_path = args
        .out
        .as_deref()
        .map(|p| project.resolve(p))
        .unwrap_or_else(|| project.config.output.clone());
    let build_id = resolve_build_id(args.build_id.as_deref());
    let registry = project.build_registry(&build_id)?;

    if args.check {
        if !out_path.exists() {
            println!("FAIL: registry does not exist: {}", out_path.display());
            return Ok(1);
        }
        let existing = crate::read_registry(&out_path)?;
        if existing.content_digest == registry.content_digest {
            println!("OK: registry is up to date ({})", registry.content_digest);
            Ok(0)
        } else {
            println!("FAIL: registry is stale: {}", out_path.display());
            println!("  Expected digest: {}", registry.content_digest);
            println!("  Existing digest: {}", existing.content_digest);
            Ok(1)
        }
    } else {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
        }
        let text = registry.to_pretty_json().context("failed to serialize registry")?;
        std::fs::write(&out_path, text)
            .with_context(|| format!("failed to write registry: {}", out_path.display()))?;
        println!("OK: wrote registry to {}", out_path.display());
        println!(
            "  {} room(s), {} character(s), {} flashcard pack(s), {} ink script(s), {} sprite(s), {} tileset(s)",
            registry.rooms.len(),
            registry.characters.len(),
            registry.flashcard_packs.len(),
            registry.ink.len(),
            registry.sprites.len(),
            registry.tilesets.len()
        );
        println!("  buildId:       {}", registry.build_id);
        println!("  contentDigest: {}", registry.content_digest);
        Ok(0)
    }
}

/// Resolve the build id.
///
/// Priority:
/// 1. Explicit `--build-id` flag
/// 2. `KIMBAR_BUILD_ID` environment variable
/// 3. Current UTC time
fn resolve_build_id(flag: Option<&str>) -> String {
    if let Some(id) = flag {
        return id.to_string();
    }
    if let Ok(id) = std::env::var(BUILD_ID_ENV) {
        if !id.trim().is_empty() {
            return id;
        }
    }
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_build_id_wins() {
        assert_eq!(resolve_build_id(Some("ci-42")), "ci-42");
    }

    #[test]
    fn timestamp_build_id_shape() {
        if std::env::var(BUILD_ID_ENV).is_ok() {
            return;
        }
        let id = resolve_build_id(None);
        assert_eq!(id.len(), "20260101T000000Z".len());
        assert!(id.ends_with('Z'));
    }
}
