//! DuckDB connection implementation

use crate::error::{DbError, DbResult};
use crate::sql::{bind_named, split_statements};
use crate::traits::{Connection, ConnectionFactory, Row};
use duckdb::types::{TimeUnit, Value};
use sf_core::{DbType, ParamValue, ResolvedParameter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// DuckDB database connection
pub struct DuckDbConnection {
    conn: Mutex<duckdb::Connection>,
}

impl DuckDbConnection {
    /// Create a new in-memory DuckDB database
    pub fn in_memory() -> DbResult<Self> {
        let conn = duckdb::Connection::open_in_memory()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::wrap(conn))
    }

    /// Open (or create) a DuckDB database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = duckdb::Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::wrap(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Open another connection to the same database.
    ///
    /// Clones of an in-memory database see each other's committed data.
    pub fn try_clone(&self) -> DbResult<Self> {
        let conn = self
            .lock()?
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::wrap(conn))
    }

    /// Query a single integer value (COUNT(*) and similar)
    pub fn query_i64(&self, sql: &str) -> DbResult<i64> {
        let conn = self.lock()?;
        let value: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value)
    }

    fn wrap(conn: duckdb::Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, duckdb::Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Connection for DuckDbConnection {
    fn execute(&self, sql: &str, params: &[ResolvedParameter]) -> DbResult<usize> {
        if params.is_empty() {
            // Whole script in one round trip; DuckDB does not report row counts for batches
            self.execute_batch_sync(sql)?;
            return Ok(0);
        }

        let conn = self.lock()?;
        let mut affected = 0;
        for statement in split_statements(sql)? {
            let bound = bind_named(statement, params)?;
            let values = bound
                .values
                .iter()
                .map(|p| to_duckdb_value(p))
                .collect::<Vec<_>>();
            log::trace!("Executing with {} bound values: {}", values.len(), bound.sql);
            affected += conn.execute(&bound.sql, duckdb::params_from_iter(values))?;
        }
        Ok(affected)
    }

    fn query(&self, sql: &str) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let columns = row.as_ref().column_count();
            let mut values = Vec::with_capacity(columns);
            for index in 0..columns {
                let value: Value = row.get(index)?;
                values.push(value_to_string(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn begin(&self) -> DbResult<()> {
        self.execute_batch_sync("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    fn commit(&self) -> DbResult<()> {
        self.execute_batch_sync("COMMIT")
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    fn rollback(&self) -> DbResult<()> {
        self.execute_batch_sync("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

fn to_duckdb_value(param: &ResolvedParameter) -> Value {
    match &param.value {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(b) => Value::Boolean(*b),
        ParamValue::Int(i) if param.db_type == DbType::Int32 => match i32::try_from(*i) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::BigInt(*i),
        },
        ParamValue::Int(i) => Value::BigInt(*i),
        ParamValue::Float(f) => Value::Double(*f),
        ParamValue::Text(s) => Value::Text(s.clone()),
        ParamValue::Timestamp(t) => {
            Value::Timestamp(TimeUnit::Microsecond, t.and_utc().timestamp_micros())
        }
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) => Some(s),
        Value::Boolean(b) => Some(b.to_string()),
        Value::TinyInt(i) => Some(i.to_string()),
        Value::SmallInt(i) => Some(i.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::BigInt(i) => Some(i.to_string()),
        Value::HugeInt(i) => Some(i.to_string()),
        Value::UTinyInt(i) => Some(i.to_string()),
        Value::USmallInt(i) => Some(i.to_string()),
        Value::UInt(i) => Some(i.to_string()),
        Value::UBigInt(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(f) => Some(f.to_string()),
        Value::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            chrono::DateTime::<chrono::Utc>::from_timestamp_micros(micros)
                .map(|t| t.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string())
        }
        other => Some(format!("{other:?}")),
    }
}

/// Factory opening a new connection to the DuckDB database at `path` on every call.
///
/// With `:memory:` each connection gets its own empty database.
pub fn duckdb_factory(path: impl Into<String>) -> ConnectionFactory {
    let path = path.into();
    Box::new(move || {
        let conn = DuckDbConnection::new(&path)?;
        Ok(Box::new(conn) as Box<dyn Connection>)
    })
}

/// Factory handing out clones of `root`, so every run talks to the same database
pub fn shared_factory(root: Arc<DuckDbConnection>) -> ConnectionFactory {
    Box::new(move || {
        let conn = root.try_clone()?;
        Ok(Box::new(conn) as Box<dyn Connection>)
    })
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
