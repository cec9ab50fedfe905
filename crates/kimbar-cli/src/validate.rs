//! # Validate Subcommand
//!
//! Content validation against a registry file, or against a fresh
//! in-memory build when none is given.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kimbar_schema::SchemaValidator;
use kimbar_validate::ContentValidator;

use crate::Project;

/// Arguments for the `kimbar validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Registry to validate against (defaults to a fresh build).
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if no hard errors were found, 1 otherwise.
pub fn run_validate(args: &ValidateArgs, project: &Project) -> Result<u8> {
    let registry = match &args.registry {
        Some(path) => crate::read_registry(&project.resolve(path))?,
        None => project.build_registry("validate")?,
    };

    let schema_dir = &project.config.schema_dir;
    let schemas = if schema_dir.is_dir() {
        let validator = SchemaValidator::new(schema_dir)
            .with_context(|| format!("failed to load schemas: {}", schema_dir.display()))?;
        tracing::info!(count = validator.schema_count(), "loaded schemas");
        Some(validator)
    } else {
        tracing::warn!(dir = %schema_dir.display(), "schema directory not found; structural checks skipped");
        None
    };

    let report = ContentValidator::new(&registry, &project.config)
        .with_schemas(schemas)
        .run();
    print!("{}", report.render());
    Ok(if report.has_errors() { 1 } else { 0 })
}
