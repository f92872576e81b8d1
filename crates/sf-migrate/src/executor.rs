//! Transactional script executor
//!
//! Applies one script inside its own transaction and reports the outcome to
//! the notifier. Everything that can fail without touching the database
//! (reading the file, resolving parameters) happens before `BEGIN`.

use crate::error::{MigrateError, MigrateResult};
use crate::event::{MigrationEvent, Notifier, Stage};
use crate::execution_log::ExecutionLog;
use sf_core::{MigrationScript, ParameterCollection, RecordMode};
use sf_db::{with_transaction, Connection};
use std::time::{Duration, Instant};

/// Runs scripts on one borrowed connection
pub struct ScriptExecutor<'a> {
    conn: &'a dyn Connection,
    notifier: &'a Notifier,
    stage: Stage,
    record_mode: RecordMode,
}

impl<'a> ScriptExecutor<'a> {
    /// Executor reporting its events under `stage`
    pub fn new(conn: &'a dyn Connection, notifier: &'a Notifier, stage: Stage) -> Self {
        Self {
            conn,
            notifier,
            stage,
            record_mode: RecordMode::default(),
        }
    }

    /// Choose when the log record is written relative to the script's commit
    pub fn with_record_mode(mut self, record_mode: RecordMode) -> Self {
        self.record_mode = record_mode;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn record_mode(&self) -> RecordMode {
        self.record_mode
    }

    /// Apply `script` with `parameters`, recording it in `log` when given.
    ///
    /// On failure the transaction is rolled back, a failure event carrying the
    /// error is sent and the error is returned. Nothing is retried.
    pub fn apply(
        &self,
        script: &MigrationScript,
        parameters: &ParameterCollection,
        log: Option<&ExecutionLog<'_>>,
    ) -> MigrateResult<Duration> {
        let started = Instant::now();
        match self.run(script, parameters, log) {
            Ok(()) => {
                let elapsed = started.elapsed();
                let message = format!(
                    "Executed migration {} in {:?}",
                    script.display_name(),
                    elapsed
                );
                self.notifier.notify(&MigrationEvent::new(
                    self.stage,
                    Some(script.file_name()),
                    &message,
                ));
                Ok(elapsed)
            }
            Err(err) => {
                let message = format!(
                    "Error on migration {} (time: {:?})",
                    script.display_name(),
                    started.elapsed()
                );
                self.notifier.notify(&MigrationEvent::failure(
                    self.stage,
                    Some(script.file_name()),
                    &message,
                    &err,
                ));
                Err(err)
            }
        }
    }

    fn run(
        &self,
        script: &MigrationScript,
        parameters: &ParameterCollection,
        log: Option<&ExecutionLog<'_>>,
    ) -> MigrateResult<()> {
        let name = script.file_name();
        let sql = script
            .load_sql()
            .map_err(|source| MigrateError::ScriptRead {
                script: name.to_string(),
                source,
            })?;
        let params = parameters
            .resolve(script.display_name())
            .map_err(|source| MigrateError::Parameter {
                script: name.to_string(),
                source,
            })?;

        log::debug!(
            "Applying {} on {} with {} parameter(s)",
            name,
            self.conn.db_type(),
            params.len()
        );

        let record_inside = log.filter(|_| self.record_mode == RecordMode::InTransaction);
        with_transaction(self.conn, |conn| {
            conn.execute(&sql, &params)
                .map_err(|source| MigrateError::Execution {
                    script: name.to_string(),
                    source,
                })?;
            if let Some(log) = record_inside {
                log.record(script)?;
            }
            Ok(())
        })
        .map_err(|err| match err {
            // BEGIN or COMMIT failed
            MigrateError::Database(source) => MigrateError::Execution {
                script: name.to_string(),
                source,
            },
            other => other,
        })?;

        if self.record_mode == RecordMode::AfterCommit {
            if let Some(log) = log {
                log.record(script)?;
            }
        }
        Ok(())
    }
}
