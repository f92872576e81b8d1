use super::*;
use crate::commands::sync;
use crate::cli::SyncArgs;

fn global(project_dir: &Path) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        quiet: true,
        project_dir: project_dir.display().to_string(),
        config: None,
        database: None,
    }
}

fn init_args() -> InitArgs {
    InitArgs {
        scripts_folder: "DatabaseScripts".to_string(),
        database_path: "app.duckdb".to_string(),
    }
}

#[test]
fn test_init_creates_config_and_initialization_script() {
    let dir = tempfile::tempdir().unwrap();

    execute(&init_args(), &global(dir.path())).unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.scripts_folder, "DatabaseScripts");
    assert_eq!(config.database.path, "app.duckdb");
    assert!(dir
        .path()
        .join("DatabaseScripts/Initialization.sql")
        .exists());
}

#[test]
fn test_init_refuses_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sqlforward.yml"), "").unwrap();

    let err = execute(&init_args(), &global(dir.path())).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn test_init_rejects_escaping_scripts_folder() {
    let dir = tempfile::tempdir().unwrap();
    let args = InitArgs {
        scripts_folder: "../outside".to_string(),
        database_path: "app.duckdb".to_string(),
    };
    assert!(execute(&args, &global(dir.path())).is_err());
}

#[test]
fn test_init_then_sync() {
    let dir = tempfile::tempdir().unwrap();
    let global = global(dir.path());
    execute(&init_args(), &global).unwrap();
    fs::write(
        dir.path().join("DatabaseScripts/Rev001.sql"),
        "CREATE TABLE items (id INT); INSERT INTO items VALUES (1);",
    )
    .unwrap();

    sync::execute(&SyncArgs { to: None }, &global).unwrap();
    // Second sync has nothing to do
    sync::execute(&SyncArgs { to: None }, &global).unwrap();

    let db = sf_db::DuckDbConnection::new(&dir.path().join("app.duckdb").display().to_string())
        .unwrap();
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM ScriptLog").unwrap(), 2);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM items").unwrap(), 1);
}
