//! Error types for sf-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Constraint violation, e.g. a duplicate primary key (D004)
    #[error("[D004] Constraint violated: {0}")]
    ConstraintViolation(String),

    /// Transaction management error (D005)
    #[error("[D005] Transaction failed: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Placeholder binding error (D007)
    #[error("[D007] Parameter binding failed: {0}")]
    BindError(String),

    /// Script text could not be split into tokens (D008)
    #[error("[D008] SQL tokenization failed: {0}")]
    TokenizeError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Whether the error reports a violated uniqueness or other constraint
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation(_))
    }

    /// Whether the error reports a duplicate primary or unique key
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            DbError::ConstraintViolation(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("duplicate key") || msg.contains("unique") || msg.contains("primary key")
            }
            _ => false,
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants, so the message
        // prefix is the only way to classify it.
        let msg = err.to_string();
        if msg.contains("Constraint Error") || msg.contains("Duplicate key") {
            DbError::ConstraintViolation(msg)
        } else if msg.contains("Table with name")
            || msg.contains("View with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
