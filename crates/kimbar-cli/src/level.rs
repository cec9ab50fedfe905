//! # Level Subcommand
//!
//! Normalizes one level file (editor export or canonical) and runs the
//! level validator over it, using the project's entity-type table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kimbar_core::{canonical_slug, ContentKind};
use kimbar_level::{normalize, LevelValidator, NormalizeOptions};
use kimbar_registry::StaticConfig;
use serde_json::Value;

use crate::Project;

/// Arguments for the `kimbar level` subcommand.
#[derive(Args, Debug)]
pub struct LevelArgs {
    /// Level file to check.
    #[arg(value_name = "LEVEL_JSON")]
    pub file: PathBuf,

    /// Level id (defaults to the room id derived from the file name).
    #[arg(long)]
    pub id: Option<String>,

    /// Print the canonical level JSON.
    #[arg(long)]
    pub emit: bool,
}

/// Execute the level subcommand.
///
/// Returns exit code: 0 if the level is valid (warnings allowed), 1 if
/// it has hard errors.
pub fn run_level(args: &LevelArgs, project: &Project) -> Result<u8> {
    let path = project.resolve(&args.file);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read level: {}", path.display()))?;
    let doc: Value =
        serde_json::from_str(&text).with_context(|| format!("failed to parse level: {}", path.display()))?;

    let id = args.id.clone().unwrap_or_else(|| {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        ContentKind::Room.canonical_id(&canonical_slug(name))
    });
    let level = normalize(&doc, &id, &NormalizeOptions::from_config(&project.config))
        .with_context(|| format!("failed to normalize level: {}", path.display()))?;

    let statics =
        StaticConfig::load(&project.config.content_root).context("failed to load static content config")?;
    let report = LevelValidator::new(statics.entity_schema).validate(&level);

    if args.emit {
        println!(
            "{}",
            serde_json::to_string_pretty(&level).context("failed to serialize level")?
        );
    }
    for line in report.lines() {
        println!("{line}");
    }
    println!(
        "{}: {} error(s), {} warning(s)",
        if report.valid { "OK" } else { "FAIL" },
        report.errors.len(),
        report.warnings.len()
    );
    Ok(if report.valid { 0 } else { 1 })
}
