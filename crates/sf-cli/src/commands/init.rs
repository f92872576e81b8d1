//! Init command implementation - scaffolds sqlforward.yml and the script folder

use anyhow::{Context, Result};
use sf_core::config::CONFIG_FILE_NAMES;
use sf_core::Config;
use std::fs;
use std::path::Path;

use crate::cli::{GlobalArgs, InitArgs};

const INITIALIZATION_SQL: &str = r#"-- Creates the execution log. Runs before every sync, so it must be idempotent.
CREATE TABLE IF NOT EXISTS ScriptLog (
    ScriptName VARCHAR PRIMARY KEY,
    ScriptDate TIMESTAMP,
    Status VARCHAR,
    DomainUser VARCHAR
);
"#;

/// Execute the init command
pub(crate) fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    if args.scripts_folder.contains("..") || Path::new(&args.scripts_folder).is_absolute() {
        anyhow::bail!(
            "Invalid scripts folder '{}': must be a relative path inside the project",
            args.scripts_folder
        );
    }

    let project_dir = Path::new(&global.project_dir);
    if let Some(existing) = Config::find_in_dir(project_dir) {
        anyhow::bail!("{} already exists", existing.display());
    }

    let scripts_dir = project_dir.join(&args.scripts_folder);
    fs::create_dir_all(&scripts_dir)
        .with_context(|| format!("Failed to create directory: {}", scripts_dir.display()))?;

    let init_path = scripts_dir.join("Initialization.sql");
    if !init_path.exists() {
        fs::write(&init_path, INITIALIZATION_SQL)
            .with_context(|| format!("Failed to write {}", init_path.display()))?;
    }

    let config_content = format!(
        r#"# SqlForward configuration
scripts_folder: "{folder}"
initialization_script: Initialization.sql
record_mode: in_transaction

database:
  path: "{db_path}"

# parameters:
#   - name: Environment
#     value: dev
# log_parameters:
#   - name: user
#     env: USER
"#,
        folder = args.scripts_folder.replace('"', "\\\""),
        db_path = args.database_path.replace('"', "\\\""),
    );
    let config_path = project_dir.join(CONFIG_FILE_NAMES[0]);
    fs::write(&config_path, config_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    if !global.quiet {
        println!("Created {}", config_path.display());
        println!("Created {}", init_path.display());
        println!("\nAdd scripts to {} and run `sqlforward sync`.", scripts_dir.display());
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
