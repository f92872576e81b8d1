//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sf_core::path::is_virtual;
use sf_core::{Config, RootPathMapper};
use sf_db::duckdb_factory;
use sf_migrate::{MigrationEvent, Migrator, Stage};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors (and the database connection) run first.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main reports the code without a message
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load and validate the project configuration
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let project_dir = Path::new(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(project_dir),
    }
    .with_context(|| format!("Failed to load config for {}", project_dir.display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Database path: `--database` wins, relative paths are taken from the project directory
pub(crate) fn database_path(config: &Config, global: &GlobalArgs) -> String {
    let raw = global
        .database
        .as_deref()
        .unwrap_or(config.database.path.as_str());
    if raw == ":memory:" || Path::new(raw).is_absolute() {
        return raw.to_string();
    }
    Path::new(&global.project_dir)
        .join(raw)
        .display()
        .to_string()
}

/// Script folder as the migrator should see it.
///
/// `~` folders are left for the path mapper; other relative folders are
/// anchored at the project directory.
pub(crate) fn scripts_folder(config: &Config, global: &GlobalArgs) -> String {
    let folder = &config.scripts_folder;
    if is_virtual(folder) || Path::new(folder).is_absolute() {
        return folder.clone();
    }
    Path::new(&global.project_dir)
        .join(folder)
        .display()
        .to_string()
}

/// Build a migrator from the project configuration
pub(crate) fn build_migrator(global: &GlobalArgs) -> Result<Migrator> {
    let config = load_config(global)?;
    let database = database_path(&config, global);
    log::debug!("Using database {database}");

    let migrator = Migrator::builder()
        .config(&config)?
        .scripts_folder(scripts_folder(&config, global))
        .connection_factory(duckdb_factory(database))
        .path_mapper(RootPathMapper::new(project_root(global)?))
        .build()?;
    Ok(migrator)
}

fn project_root(global: &GlobalArgs) -> Result<PathBuf> {
    let dir = Path::new(&global.project_dir);
    dir.canonicalize()
        .with_context(|| format!("Project directory not found: {}", dir.display()))
}

/// Observer printing run progress to the console
pub(crate) fn console_observer(verbose: bool) -> impl Fn(&MigrationEvent<'_>) + Send + Sync {
    move |event| match (event.stage, event.error) {
        (_, Some(err)) => {
            eprintln!("  ✗ {}", event.message);
            eprintln!("    {err}");
        }
        (Stage::Initializing, None) if !verbose => {}
        (Stage::Migrating, None) => println!("  {}", event.message),
        (_, None) => println!("{}", event.message),
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
