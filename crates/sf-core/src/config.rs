//! Configuration types and parsing for sqlforward.yml

use crate::error::{CoreError, CoreResult};
use crate::parameter::{is_valid_parameter_name, DbType, MigrationParameter, ParamValue, ParameterCollection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Statement used to record an executed script when none is configured.
///
/// `@name` is always bound to the script's file name.
pub const DEFAULT_LOG_INSERT: &str = "INSERT INTO ScriptLog (ScriptName, ScriptDate, Status, DomainUser) VALUES (@name, current_timestamp, NULL, NULL)";

/// Parameter name reserved for the script file name in the log-insert statement
pub const LOG_NAME_PARAMETER: &str = "name";

/// Config file names looked up by [`Config::load_from_dir`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sqlforward.yml", "sqlforward.yaml"];

/// Migrator configuration from sqlforward.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Folder holding the migration scripts. A leading `~` is resolved by a path mapper.
    #[serde(default = "default_scripts_folder")]
    pub scripts_folder: String,

    /// File name, relative to the script folder, of the script that creates the execution log
    #[serde(default = "default_initialization_script")]
    pub initialization_script: String,

    /// Statement that records an executed script; must bind `@name`
    #[serde(default = "default_log_insert")]
    pub log_insert: String,

    /// When the execution log record is written relative to the script's transaction
    #[serde(default)]
    pub record_mode: RecordMode,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Parameters bound into migration scripts
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,

    /// Parameters bound into the initialization script and the log-insert statement
    #[serde(default)]
    pub log_parameters: Vec<ParameterSpec>,
}

/// When the execution log record is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Insert the record inside the script's own transaction (default)
    #[default]
    InTransaction,
    /// Insert the record as a separate statement right after the script commits
    AfterCommit,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// A parameter declared in configuration.
///
/// Exactly one value source must be given: a literal `value`, an environment
/// variable `env` (read each time the parameter is resolved, NULL when unset),
/// or `script_name: true` to bind the display name of the script being run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    /// Placeholder name, referenced as `@name` in SQL
    pub name: String,

    /// Declared type
    #[serde(rename = "type", default = "default_parameter_type")]
    pub db_type: DbType,

    /// Literal value
    #[serde(default)]
    pub value: Option<serde_yaml::Value>,

    /// Environment variable holding the value
    #[serde(default)]
    pub env: Option<String>,

    /// Bind the current script's display name
    #[serde(default)]
    pub script_name: bool,
}

fn default_scripts_folder() -> String {
    "DatabaseScripts".to_string()
}

fn default_initialization_script() -> String {
    "Initialization.sql".to_string()
}

fn default_log_insert() -> String {
    DEFAULT_LOG_INSERT.to_string()
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

fn default_parameter_type() -> DbType {
    DbType::String
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts_folder: default_scripts_folder(),
            initialization_script: default_initialization_script(),
            log_insert: default_log_insert(),
            record_mode: RecordMode::default(),
            database: DatabaseConfig::default(),
            parameters: Vec::new(),
            log_parameters: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sqlforward.yml or sqlforward.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Locate the config file inside `dir`, if any
    pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.scripts_folder.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "scripts_folder cannot be empty".to_string(),
            });
        }

        if self.initialization_script.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "initialization_script cannot be empty".to_string(),
            });
        }

        if !self.log_insert.contains(&format!("@{LOG_NAME_PARAMETER}")) {
            return Err(CoreError::ConfigInvalid {
                message: format!("log_insert must bind the script name as @{LOG_NAME_PARAMETER}"),
            });
        }

        for spec in self.parameters.iter().chain(&self.log_parameters) {
            spec.validate()?;
        }

        if self
            .log_parameters
            .iter()
            .any(|p| p.name == LOG_NAME_PARAMETER)
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "log parameter '{LOG_NAME_PARAMETER}' is reserved for the script file name"
                ),
            });
        }

        Ok(())
    }

    /// Build the collection bound into migration scripts
    pub fn script_parameter_collection(&self) -> CoreResult<ParameterCollection> {
        build_collection(&self.parameters)
    }

    /// Build the collection bound into the initialization script and log inserts
    pub fn log_parameter_collection(&self) -> CoreResult<ParameterCollection> {
        build_collection(&self.log_parameters)
    }
}

fn build_collection(specs: &[ParameterSpec]) -> CoreResult<ParameterCollection> {
    let mut collection = ParameterCollection::new();
    for spec in specs {
        collection.insert(spec.to_parameter()?)?;
    }
    Ok(collection)
}

impl ParameterSpec {
    fn validate(&self) -> CoreResult<()> {
        if !is_valid_parameter_name(&self.name) {
            return Err(CoreError::InvalidParameterName {
                name: self.name.clone(),
            });
        }

        let sources =
            usize::from(self.value.is_some()) + usize::from(self.env.is_some()) + usize::from(self.script_name);
        if sources != 1 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "parameter '{}' must set exactly one of value, env or script_name",
                    self.name
                ),
            });
        }
        Ok(())
    }

    /// Turn the declaration into a parameter with a resolver
    pub fn to_parameter(&self) -> CoreResult<MigrationParameter> {
        self.validate()?;

        if let Some(value) = &self.value {
            let value = yaml_to_value(&self.name, value)?;
            return MigrationParameter::new(&self.name, self.db_type, move |_, _| value.clone());
        }

        if let Some(var) = &self.env {
            let var = var.clone();
            return MigrationParameter::new(&self.name, self.db_type, move |_, _| {
                std::env::var(&var).ok().into()
            });
        }

        MigrationParameter::new(&self.name, self.db_type, |script, _| script.into())
    }
}

fn yaml_to_value(name: &str, value: &serde_yaml::Value) -> CoreResult<ParamValue> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => ParamValue::Null,
        Value::Bool(b) => ParamValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ParamValue::Int(i)
            } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                ParamValue::Float(f)
            } else {
                return Err(CoreError::ConfigInvalid {
                    message: format!("parameter '{name}' value {n} does not fit a 64-bit integer"),
                });
            }
        }
        Value::String(s) => ParamValue::Text(s.clone()),
        _ => {
            return Err(CoreError::ConfigInvalid {
                message: format!("parameter '{name}' must have a scalar value"),
            })
        }
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
