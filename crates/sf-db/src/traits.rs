//! Connection trait definition

use crate::error::{DbError, DbResult};
use sf_core::ResolvedParameter;

/// One result row, every column rendered as text (`None` for NULL)
pub type Row = Vec<Option<String>>;

/// Produces a fresh connection for one migration run.
///
/// The migrator calls the factory once per run and drops the returned
/// connection when the run ends, whatever its outcome.
pub type ConnectionFactory = Box<dyn Fn() -> DbResult<Box<dyn Connection>> + Send + Sync>;

/// Synchronous database connection used by the migrator
///
/// Implementations are owned by a single run and never shared across threads.
pub trait Connection {
    /// Execute SQL text, binding `@name` placeholders from `params`.
    ///
    /// The text may contain several statements. Returns the number of affected
    /// rows where the backend reports it.
    fn execute(&self, sql: &str, params: &[ResolvedParameter]) -> DbResult<usize>;

    /// Execute a query and return its rows
    fn query(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Start a transaction
    fn begin(&self) -> DbResult<()>;

    /// Commit the current transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the current transaction
    fn rollback(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Run `body` between `begin` and `commit`, rolling back when it fails.
///
/// A failed rollback is logged and the original error is returned.
pub fn with_transaction<T, E, F>(conn: &dyn Connection, body: F) -> Result<T, E>
where
    F: FnOnce(&dyn Connection) -> Result<T, E>,
    E: From<DbError>,
{
    conn.begin()?;

    match body(conn) {
        Ok(value) => {
            if let Err(commit_err) = conn.commit() {
                if let Err(rollback_err) = conn.rollback() {
                    log::warn!("ROLLBACK after failed COMMIT also failed: {rollback_err}");
                }
                return Err(commit_err.into());
            }
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                log::warn!("ROLLBACK failed: {rollback_err}");
            }
            Err(err)
        }
    }
}
