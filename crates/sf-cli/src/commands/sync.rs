//! Sync command implementation - applies pending scripts

use anyhow::Result;

use crate::cli::{GlobalArgs, SyncArgs};
use crate::commands::common::{build_migrator, console_observer};

/// Execute the sync command
pub(crate) fn execute(args: &SyncArgs, global: &GlobalArgs) -> Result<()> {
    let mut migrator = build_migrator(global)?;
    if !global.quiet {
        migrator.subscribe(console_observer(global.verbose));
    }

    let report = match &args.to {
        Some(target) => migrator.synchronize_to(target)?,
        None => migrator.synchronize()?,
    };

    if !global.quiet {
        println!();
        match report.applied.len() {
            0 => println!("Database is up to date ({} scripts already executed)", report.already_executed),
            n => println!("Applied {n} script(s), {} already executed", report.already_executed),
        }
        if let Some(target) = &report.stopped_at {
            println!("Stopped at {target}");
        }
    }
    Ok(())
}
