//! Execution log accessor
//!
//! The `ScriptLog` table holds one row per applied script, keyed by the
//! script's file name. The table is created by the initialization script;
//! this module only reads it and inserts into it.

use crate::error::{MigrateError, MigrateResult};
use crate::executor::ScriptExecutor;
use chrono::NaiveDateTime;
use serde::Serialize;
use sf_core::{
    parse_timestamp, DbType, MigrationScript, ParameterCollection, ResolvedParameter,
    LOG_NAME_PARAMETER,
};
use sf_db::{Connection, DbError, Row};
use std::collections::BTreeSet;
use std::time::Duration;

const EXECUTED_QUERY: &str = "SELECT ScriptName FROM ScriptLog";

const RECORDS_QUERY: &str = "SELECT ScriptName, CAST(ScriptDate AS VARCHAR), \
     CAST(Status AS VARCHAR), CAST(DomainUser AS VARCHAR) \
     FROM ScriptLog ORDER BY ScriptName";

/// One row of the execution log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub script_name: String,
    pub executed_at: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub user: Option<String>,
}

/// Reads and writes the execution log over a borrowed connection
pub struct ExecutionLog<'a> {
    conn: &'a dyn Connection,
    insert_sql: &'a str,
    parameters: &'a ParameterCollection,
}

impl<'a> ExecutionLog<'a> {
    /// `insert_sql` must reference `@name`; `parameters` supply any other placeholders
    pub fn new(
        conn: &'a dyn Connection,
        insert_sql: &'a str,
        parameters: &'a ParameterCollection,
    ) -> Self {
        Self {
            conn,
            insert_sql,
            parameters,
        }
    }

    /// Run the initialization script with the log parameters.
    ///
    /// The script is expected to be idempotent (`CREATE TABLE IF NOT EXISTS`).
    /// It is not recorded here; if it lives in the script folder it is picked
    /// up and recorded like any other pending script.
    pub fn initialize(
        &self,
        executor: &ScriptExecutor<'_>,
        script: &MigrationScript,
    ) -> MigrateResult<Duration> {
        executor.apply(script, self.parameters, None)
    }

    /// File names of every script in the log
    pub fn executed(&self) -> MigrateResult<BTreeSet<String>> {
        self.read_names().map_err(MigrateError::Log)
    }

    /// Like [`executed`](Self::executed), but a missing log table means nothing ran yet
    pub fn executed_if_initialized(&self) -> MigrateResult<BTreeSet<String>> {
        match self.read_names() {
            Ok(names) => Ok(names),
            Err(DbError::TableNotFound(msg)) => {
                log::debug!("Execution log not initialized yet: {msg}");
                Ok(BTreeSet::new())
            }
            Err(e) => Err(MigrateError::Log(e)),
        }
    }

    /// Every log row, ordered by script name
    pub fn records(&self) -> MigrateResult<Vec<ExecutionRecord>> {
        let rows = self.conn.query(RECORDS_QUERY).map_err(MigrateError::Log)?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(ExecutionRecord {
                    script_name: column(row, 0)?,
                    executed_at: column(row, 1).as_deref().and_then(parse_timestamp),
                    status: column(row, 2),
                    user: column(row, 3),
                })
            })
            .collect())
    }

    /// Insert the log row for `script`.
    ///
    /// `@name` is bound to the script's file name; the log parameters are
    /// resolved with its display name. A uniqueness violation means another
    /// run recorded the script first and yields [`MigrateError::AlreadyRecorded`].
    pub fn record(&self, script: &MigrationScript) -> MigrateResult<()> {
        let name = script.file_name();
        let mut params = Vec::with_capacity(self.parameters.len() + 1);
        params.push(ResolvedParameter::new(
            LOG_NAME_PARAMETER,
            DbType::String,
            name,
        ));
        params.extend(
            self.parameters
                .resolve(script.display_name())
                .map_err(|source| MigrateError::Parameter {
                    script: name.to_string(),
                    source,
                })?,
        );

        self.conn
            .execute(self.insert_sql, &params)
            .map_err(|source| {
                if source.is_duplicate_key() {
                    MigrateError::AlreadyRecorded {
                        script: name.to_string(),
                        source,
                    }
                } else {
                    MigrateError::Execution {
                        script: name.to_string(),
                        source,
                    }
                }
            })?;
        log::debug!("Recorded {name} in the execution log");
        Ok(())
    }

    fn read_names(&self) -> Result<BTreeSet<String>, DbError> {
        let rows = self.conn.query(EXECUTED_QUERY)?;
        Ok(rows.iter().filter_map(|row| column(row, 0)).collect())
    }
}

fn column(row: &Row, index: usize) -> Option<String> {
    row.get(index).cloned().flatten()
}
