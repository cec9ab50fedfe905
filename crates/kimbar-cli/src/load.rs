//! # Load Subcommand
//!
//! Runtime smoke test: preloads levels through the cached loader over the
//! content directory, exactly as a client would fetch them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kimbar_level::{FsFetcher, LevelLoader, LoaderOptions};

use crate::Project;

/// Arguments for the `kimbar load` subcommand.
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Level ids to preload (defaults to every room).
    #[arg(value_name = "ID")]
    pub ids: Vec<String>,

    /// Registry to load from (defaults to the configured output, or a
    /// fresh build when that does not exist).
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

/// Execute the load subcommand.
///
/// Returns exit code: 0 if every level loaded, 1 otherwise.
pub fn run_load(args: &LoadArgs, project: &Project) -> Result<u8> {
    let registry = match &args.registry {
        Some(path) => crate::read_registry(&project.resolve(path))?,
        None if project.config.output.is_file() => crate::read_registry(&project.config.output)?,
        None => project.build_registry("load")?,
    };

    let loader = LevelLoader::new(
        &registry,
        FsFetcher::from_config(&project.config),
        LoaderOptions::from_config(&project.config),
    );
    let ids: Vec<String> = if args.ids.is_empty() {
        loader.level_ids().map(str::to_string).collect()
    } else {
        args.ids.clone()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(loader.preload(&ids));

    for id in &report.loaded {
        println!("  loaded  {id}");
    }
    for (id, error) in &report.failed {
        println!("  FAILED  {id}: {error}");
    }
    println!("{} loaded, {} failed", report.loaded.len(), report.failed.len());
    Ok(if report.is_complete() { 0 } else { 1 })
}
