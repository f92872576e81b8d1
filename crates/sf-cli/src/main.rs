//! SqlForward CLI - apply pending SQL scripts to a database

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, GlobalArgs};
use commands::{init, status, sync};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global);

    let result = match &cli.command {
        cli::Commands::Init(args) => init::execute(args, &cli.global),
        cli::Commands::Sync(args) => sync::execute(args, &cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(code) = err.downcast_ref::<commands::common::ExitCode>() {
                return ExitCode::from(code.0);
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(global: &GlobalArgs) {
    // Progress goes to stdout through the console observer; the logger only
    // carries warnings unless asked for more.
    let level = if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
