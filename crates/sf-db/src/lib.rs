//! sf-db - Database abstraction layer for SqlForward
//!
//! This crate provides the synchronous `Connection` trait consumed by the
//! migration engine, named-placeholder binding, and a DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod sql;
pub mod traits;

pub use crate::duckdb::{duckdb_factory, shared_factory, DuckDbConnection};
pub use error::{DbError, DbResult};
pub use traits::{with_transaction, Connection, ConnectionFactory, Row};
