//! # kimbar CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kimbar_cli::build::{run_build, BuildArgs};
use kimbar_cli::level::{run_level, LevelArgs};
use kimbar_cli::load::{run_load, LoadArgs};
use kimbar_cli::validate::{run_validate, ValidateArgs};
use kimbar_cli::{find_project_root, Project};

/// Kimbar content pipeline.
///
/// Discovers game content, assembles the versioned registry, and checks
/// structural and cross-document consistency before anything ships.
#[derive(Parser, Debug)]
#[command(name = "kimbar", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan content and write (or check) the registry.
    Build(BuildArgs),

    /// Validate content against the registry.
    Validate(ValidateArgs),

    /// Normalize and validate a single level file.
    Level(LevelArgs),

    /// Preload levels through the runtime loader.
    Load(LoadArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let project_root = match &cli.config {
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| cwd.join(p))
            .unwrap_or_else(|| cwd.clone()),
        None => find_project_root(&cwd).unwrap_or_else(|| {
            tracing::warn!("no kimbar.yaml found; using current directory with defaults");
            cwd.clone()
        }),
    };
    tracing::debug!(root = %project_root.display(), "resolved project root");

    let config_path = cli.config.as_ref().map(|p| cwd.join(p));
    let project = match Project::open(&project_root, config_path.as_deref()) {
        Ok(project) => project,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Build(args) => run_build(&args, &project),
        Commands::Validate(args) => run_validate(&args, &project),
        Commands::Level(args) => run_level(&args, &project),
        Commands::Load(args) => run_load(&args, &project),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
