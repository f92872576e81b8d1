//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// SqlForward - forward-only SQL script migrations
#[derive(Parser, Debug)]
#[command(name = "sqlforward")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config file
    #[arg(short, long, global = true, env = "SQLFORWARD_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create sqlforward.yml and an initialization script
    Init(InitArgs),

    /// Apply every pending script
    Sync(SyncArgs),

    /// Show executed and pending scripts without changing the database
    Status(StatusArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Script folder to create, relative to the project directory
    #[arg(long, default_value = "DatabaseScripts")]
    pub scripts_folder: String,

    /// DuckDB database file written to the config
    #[arg(long, default_value = "sqlforward.duckdb")]
    pub database_path: String,
}

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Stop after this script (file name or name without extension)
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Include the rows of the execution log
    #[arg(long)]
    pub history: bool,

    /// Exit with code 2 when scripts are pending
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
