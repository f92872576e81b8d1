//! Status command implementation - compares the script folder with the execution log

use anyhow::{Context, Result};
use serde::Serialize;
use sf_migrate::{ExecutionRecord, MigrationStatus};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{build_migrator, ExitCode};

/// JSON shape of `status --json`
#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(flatten)]
    status: MigrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<ExecutionRecord>>,
}

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = build_migrator(global)?;
    let status = migrator.status()?;
    let history = if args.history {
        Some(migrator.execution_records()?)
    } else {
        None
    };
    let up_to_date = status.is_up_to_date();

    let report = StatusReport { status, history };
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize to JSON")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&report));
    }

    if args.check && !up_to_date {
        return Err(ExitCode(2).into());
    }
    Ok(())
}

fn render_text(report: &StatusReport) -> String {
    let status = &report.status;
    let mut out = String::new();

    out.push_str(&format!("Executed: {}\n", status.executed.len()));
    out.push_str(&format!("Pending: {}\n", status.pending.len()));
    for name in &status.pending {
        out.push_str(&format!("  - {name}\n"));
    }
    if !status.missing.is_empty() {
        out.push_str(&format!("Logged without a file: {}\n", status.missing.len()));
        for name in &status.missing {
            out.push_str(&format!("  ? {name}\n"));
        }
    }

    if let Some(history) = &report.history {
        out.push_str("\nHistory:\n");
        for record in history {
            let when = record
                .executed_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "  {:<40} {}  {}\n",
                record.script_name,
                when,
                record.user.as_deref().unwrap_or("-")
            ));
        }
    }
    out
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
