//! Migration engine.
//!
//! A [`Migrator`] brings a database up to date with a folder of scripts:
//!
//! 1. list the scripts of the folder in file name order and check the target;
//! 2. run the initialization script (creates the execution log if needed);
//! 3. read the names already in the execution log;
//! 4. apply every script missing from the log, one transaction each, stopping
//!    at the first failure.
//!
//! Each call opens one connection from the factory and drops it before
//! returning, whatever the outcome. Once the run has started every error is
//! also sent to the observers as a failure event.

use crate::error::{MigrateError, MigrateResult};
use crate::event::{MigrationEvent, Notifier, Stage, SubscriptionId};
use crate::execution_log::{ExecutionLog, ExecutionRecord};
use crate::executor::ScriptExecutor;
use serde::Serialize;
use sf_core::path::is_virtual;
use sf_core::{
    Config, MigrationScript, ParameterCollection, PathMapper, RecordMode, ScriptRepository,
    DEFAULT_LOG_INSERT, LOG_NAME_PARAMETER,
};
use sf_db::{Connection, ConnectionFactory, DbResult};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Folder, initialization script and log statement used by a [`Migrator`]
#[derive(Debug, Clone, PartialEq)]
pub struct MigratorSettings {
    /// Script folder; a leading `~` needs a path mapper
    pub scripts_folder: String,
    /// File name of the initialization script, relative to the folder
    pub initialization_script: String,
    /// Log insert statement, binding `@name`
    pub log_insert: String,
    pub record_mode: RecordMode,
}

impl Default for MigratorSettings {
    fn default() -> Self {
        Self {
            scripts_folder: "DatabaseScripts".to_string(),
            initialization_script: "Initialization.sql".to_string(),
            log_insert: DEFAULT_LOG_INSERT.to_string(),
            record_mode: RecordMode::default(),
        }
    }
}

impl From<&Config> for MigratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            scripts_folder: config.scripts_folder.clone(),
            initialization_script: config.initialization_script.clone(),
            log_insert: config.log_insert.clone(),
            record_mode: config.record_mode,
        }
    }
}

/// Outcome of a successful synchronization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// File names applied by this run, in order
    pub applied: Vec<String>,
    /// Scripts of the folder that were already in the log
    pub already_executed: usize,
    /// Target the run stopped at, when one was given
    pub stopped_at: Option<String>,
}

/// Executed and pending scripts, as read without changing anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// File names present in the execution log
    pub executed: Vec<String>,
    /// Scripts of the folder missing from the log, in execution order
    pub pending: Vec<String>,
    /// Logged names with no file in the folder
    pub missing: Vec<String>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Builder for [`Migrator`]
#[derive(Default)]
pub struct MigratorBuilder {
    connection_factory: Option<ConnectionFactory>,
    settings: MigratorSettings,
    path_mapper: Option<Box<dyn PathMapper>>,
    script_parameters: ParameterCollection,
    log_parameters: ParameterCollection,
    notifier: Notifier,
}

impl MigratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings and parameter collections from a loaded configuration
    pub fn config(mut self, config: &Config) -> MigrateResult<Self> {
        self.settings = MigratorSettings::from(config);
        self.script_parameters = config.script_parameter_collection()?;
        self.log_parameters = config.log_parameter_collection()?;
        Ok(self)
    }

    pub fn connection_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> DbResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        self.connection_factory = Some(Box::new(factory));
        self
    }

    pub fn settings(mut self, settings: MigratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn scripts_folder(mut self, folder: impl Into<String>) -> Self {
        self.settings.scripts_folder = folder.into();
        self
    }

    pub fn initialization_script(mut self, file_name: impl Into<String>) -> Self {
        self.settings.initialization_script = file_name.into();
        self
    }

    pub fn log_insert(mut self, sql: impl Into<String>) -> Self {
        self.settings.log_insert = sql.into();
        self
    }

    pub fn record_mode(mut self, record_mode: RecordMode) -> Self {
        self.settings.record_mode = record_mode;
        self
    }

    pub fn path_mapper(mut self, mapper: impl PathMapper + 'static) -> Self {
        self.path_mapper = Some(Box::new(mapper));
        self
    }

    pub fn script_parameters(mut self, parameters: ParameterCollection) -> Self {
        self.script_parameters = parameters;
        self
    }

    pub fn log_parameters(mut self, parameters: ParameterCollection) -> Self {
        self.log_parameters = parameters;
        self
    }

    /// Subscribe an observer before the migrator exists
    pub fn observer<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MigrationEvent<'_>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler);
        self
    }

    pub fn build(self) -> MigrateResult<Migrator> {
        let connection_factory = self.connection_factory.ok_or_else(|| {
            MigrateError::Configuration("no connection factory provided".to_string())
        })?;

        let migrator = Migrator {
            connection_factory,
            settings: self.settings,
            path_mapper: self.path_mapper,
            script_parameters: self.script_parameters,
            log_parameters: self.log_parameters,
            notifier: self.notifier,
            current_stage: Stage::None,
        };
        migrator.validate()?;
        Ok(migrator)
    }
}

/// Applies pending scripts of a folder to a database
pub struct Migrator {
    connection_factory: ConnectionFactory,
    settings: MigratorSettings,
    path_mapper: Option<Box<dyn PathMapper>>,
    script_parameters: ParameterCollection,
    log_parameters: ParameterCollection,
    notifier: Notifier,
    current_stage: Stage,
}

impl Migrator {
    pub fn builder() -> MigratorBuilder {
        MigratorBuilder::new()
    }

    /// Migrator with default settings
    pub fn new<F>(factory: F) -> MigrateResult<Self>
    where
        F: Fn() -> DbResult<Box<dyn Connection>> + Send + Sync + 'static,
    {
        Self::builder().connection_factory(factory).build()
    }

    /// Stage reached by the latest run
    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    pub fn settings(&self) -> &MigratorSettings {
        &self.settings
    }

    /// Settings are validated again at the start of every run
    pub fn settings_mut(&mut self) -> &mut MigratorSettings {
        &mut self.settings
    }

    pub fn script_parameters(&self) -> &ParameterCollection {
        &self.script_parameters
    }

    pub fn script_parameters_mut(&mut self) -> &mut ParameterCollection {
        &mut self.script_parameters
    }

    pub fn log_parameters(&self) -> &ParameterCollection {
        &self.log_parameters
    }

    pub fn log_parameters_mut(&mut self) -> &mut ParameterCollection {
        &mut self.log_parameters
    }

    pub fn set_path_mapper(&mut self, mapper: impl PathMapper + 'static) {
        self.path_mapper = Some(Box::new(mapper));
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&MigrationEvent<'_>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Apply every pending script
    pub fn synchronize(&mut self) -> MigrateResult<SyncReport> {
        self.run(None)
    }

    /// Apply pending scripts up to and including `target`.
    ///
    /// `target` is a file name (`Rev002.sql`) or display name (`Rev002`). The
    /// run stops once the target is reached, whether it was applied now or
    /// earlier.
    pub fn synchronize_to(&mut self, target: &str) -> MigrateResult<SyncReport> {
        self.run(Some(target))
    }

    /// Compare the folder with the log without initializing or applying anything
    pub fn status(&self) -> MigrateResult<MigrationStatus> {
        self.validate()?;
        let folder = self.resolve_scripts_folder()?;
        let scripts = ScriptRepository::new(&folder)
            .scripts()
            .map_err(MigrateError::Discovery)?;

        let connection = (self.connection_factory)().map_err(MigrateError::Connection)?;
        let log = ExecutionLog::new(
            connection.as_ref(),
            &self.settings.log_insert,
            &self.log_parameters,
        );
        let executed = log.executed_if_initialized()?;

        let in_folder: BTreeSet<&str> = scripts.iter().map(|s| s.file_name()).collect();
        Ok(MigrationStatus {
            pending: scripts
                .iter()
                .filter(|s| !executed.contains(s.file_name()))
                .map(|s| s.file_name().to_string())
                .collect(),
            missing: executed
                .iter()
                .filter(|name| !in_folder.contains(name.as_str()))
                .cloned()
                .collect(),
            executed: executed.into_iter().collect(),
        })
    }

    /// Rows of the execution log; empty when it does not exist yet
    pub fn execution_records(&self) -> MigrateResult<Vec<ExecutionRecord>> {
        let connection = (self.connection_factory)().map_err(MigrateError::Connection)?;
        let log = ExecutionLog::new(
            connection.as_ref(),
            &self.settings.log_insert,
            &self.log_parameters,
        );
        if log.executed_if_initialized()?.is_empty() {
            return Ok(Vec::new());
        }
        log.records()
    }

    fn run(&mut self, target: Option<&str>) -> MigrateResult<SyncReport> {
        self.validate()?;
        let folder = self.resolve_scripts_folder()?;

        let started = match target {
            Some(target) => format!(
                "Started migration at {}. Migrating to {target}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            None => format!(
                "Started migration at {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
        };
        announce(&mut self.current_stage, &self.notifier, Stage::Started, None, &started);

        let repository = ScriptRepository::new(&folder);
        let scripts = repository
            .scripts()
            .map_err(|e| report(&self.notifier, self.current_stage, MigrateError::Discovery(e)))?;

        if let Some(target) = target {
            if !scripts.iter().any(|s| s.matches(target)) {
                let err = MigrateError::UnknownTarget(target.to_string());
                return Err(report(&self.notifier, self.current_stage, err));
            }
        }

        let connection = (self.connection_factory)()
            .map_err(|e| report(&self.notifier, self.current_stage, MigrateError::Connection(e)))?;
        let conn = connection.as_ref();
        let record_mode = self.settings.record_mode;
        let log = ExecutionLog::new(conn, &self.settings.log_insert, &self.log_parameters);

        let init = MigrationScript::new(&folder, self.settings.initialization_script.as_str());
        announce(
            &mut self.current_stage,
            &self.notifier,
            Stage::Initializing,
            Some(init.file_name()),
            &format!("Initializing execution log with {}", init.file_name()),
        );
        let initializer = ScriptExecutor::new(conn, &self.notifier, Stage::Initializing)
            .with_record_mode(record_mode);
        log.initialize(&initializer, &init)?;

        let executed = log
            .executed()
            .map_err(|e| report(&self.notifier, self.current_stage, e))?;

        let pending = scripts
            .iter()
            .filter(|s| !executed.contains(s.file_name()))
            .count();
        let already_executed = scripts.len() - pending;
        announce(
            &mut self.current_stage,
            &self.notifier,
            Stage::CheckingPendingMigrations,
            None,
            &format!(
                "There are {pending} pending migrations. {} all migrations, {} already executed migrations",
                scripts.len(),
                executed.len()
            ),
        );

        self.current_stage = Stage::Migrating;
        let executor = ScriptExecutor::new(conn, &self.notifier, Stage::Migrating)
            .with_record_mode(record_mode);
        let mut report = SyncReport {
            already_executed,
            ..SyncReport::default()
        };

        for script in &scripts {
            let name = script.file_name();
            if !executed.contains(name) {
                announce(
                    &mut self.current_stage,
                    &self.notifier,
                    Stage::Migrating,
                    Some(name),
                    &format!(
                        "Starting {}/{pending} migration {name}",
                        report.applied.len() + 1
                    ),
                );
                executor.apply(script, &self.script_parameters, Some(&log))?;
                report.applied.push(name.to_string());
            }

            if target.is_some_and(|t| script.matches(t)) {
                report.stopped_at = Some(name.to_string());
                break;
            }
        }

        announce(
            &mut self.current_stage,
            &self.notifier,
            Stage::Finished,
            None,
            &format!("Finished migration, {} script(s) applied", report.applied.len()),
        );
        Ok(report)
    }

    fn validate(&self) -> MigrateResult<()> {
        if self.settings.scripts_folder.trim().is_empty() {
            return Err(MigrateError::Configuration(
                "script folder cannot be empty".to_string(),
            ));
        }
        if self.settings.initialization_script.trim().is_empty() {
            return Err(MigrateError::Configuration(
                "initialization script name cannot be empty".to_string(),
            ));
        }
        if self.log_parameters.contains(LOG_NAME_PARAMETER) {
            return Err(MigrateError::Configuration(format!(
                "log parameter '{LOG_NAME_PARAMETER}' is reserved for the script file name"
            )));
        }
        Ok(())
    }

    fn resolve_scripts_folder(&self) -> MigrateResult<PathBuf> {
        let folder = &self.settings.scripts_folder;
        if !is_virtual(folder) {
            return Ok(PathBuf::from(folder));
        }
        let mapper = self.path_mapper.as_ref().ok_or_else(|| {
            MigrateError::Configuration(format!(
                "script folder '{folder}' starts with '~' but no path mapper is set"
            ))
        })?;
        Ok(mapper.map_path(folder)?)
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("settings", &self.settings)
            .field("current_stage", &self.current_stage)
            .field("script_parameters", &self.script_parameters)
            .field("log_parameters", &self.log_parameters)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

/// Move to `stage` and tell the observers
fn announce(
    current: &mut Stage,
    notifier: &Notifier,
    stage: Stage,
    script: Option<&str>,
    message: &str,
) {
    *current = stage;
    notifier.notify(&MigrationEvent::new(stage, script, message));
}

/// Send a failure event for an error raised outside script execution
fn report(notifier: &Notifier, stage: Stage, err: MigrateError) -> MigrateError {
    let message = err.to_string();
    notifier.notify(&MigrationEvent::failure(stage, None, &message, &err));
    err
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
