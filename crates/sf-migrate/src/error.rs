//! Error types for the migration engine

use sf_core::CoreError;
use sf_db::DbError;
use thiserror::Error;

/// Migration errors.
///
/// A synchronization reports every error except `Configuration` to its
/// observers as a failure event before returning it.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// SF001: Migrator settings are incomplete or contradictory
    #[error("[SF001] Invalid migrator configuration: {0}")]
    Configuration(String),

    /// SF002: Script folder missing or unreadable
    #[error("[SF002] Script discovery failed: {0}")]
    Discovery(#[source] CoreError),

    /// SF003: Script file could not be read
    #[error("[SF003] Cannot read script {script}: {source}")]
    ScriptRead {
        script: String,
        #[source]
        source: CoreError,
    },

    /// SF004: The database rejected a statement of the script
    #[error("[SF004] Script {script} failed: {source}")]
    Execution {
        script: String,
        #[source]
        source: DbError,
    },

    /// SF005: The execution log already holds this script
    #[error("[SF005] Script {script} is already recorded in the execution log: {source}")]
    AlreadyRecorded {
        script: String,
        #[source]
        source: DbError,
    },

    /// SF006: The connection factory failed
    #[error("[SF006] Could not open a database connection: {0}")]
    Connection(#[source] DbError),

    /// SF007: A parameter resolver produced an unusable value
    #[error("[SF007] Parameter resolution failed for {script}: {source}")]
    Parameter {
        script: String,
        #[source]
        source: CoreError,
    },

    /// SF008: Stop-at target names no script in the folder
    #[error("[SF008] Target script '{0}' is not in the script folder")]
    UnknownTarget(String),

    /// SF009: Reading the execution log failed
    #[error("[SF009] Execution log could not be read: {0}")]
    Log(#[source] DbError),

    /// SF010: Transaction control failed outside any statement
    #[error("[SF010] Database error: {0}")]
    Database(#[from] DbError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// Name of the script the error is attached to, if any
    pub fn script(&self) -> Option<&str> {
        match self {
            MigrateError::ScriptRead { script, .. }
            | MigrateError::Execution { script, .. }
            | MigrateError::AlreadyRecorded { script, .. }
            | MigrateError::Parameter { script, .. } => Some(script),
            _ => None,
        }
    }
}

impl From<CoreError> for MigrateError {
    fn from(err: CoreError) -> Self {
        MigrateError::Configuration(err.to_string())
    }
}
