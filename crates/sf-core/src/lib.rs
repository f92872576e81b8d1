//! sf-core - Core library for SqlForward
//!
//! This crate provides the types shared by the migration engine and its
//! collaborators: script discovery and ordering, named script parameters,
//! path mapping, and `sqlforward.yml` configuration parsing.

pub mod config;
pub mod error;
pub mod parameter;
pub mod path;
pub mod script;

pub use config::{
    Config, DatabaseConfig, ParameterSpec, RecordMode, DEFAULT_LOG_INSERT, LOG_NAME_PARAMETER,
};
pub use error::{CoreError, CoreResult};
pub use parameter::{
    parse_timestamp, DbType, MigrationParameter, ParamValue, ParameterCollection,
    ResolvedParameter,
};
pub use path::{PathMapper, RootPathMapper, VIRTUAL_ROOT};
pub use script::{MigrationScript, ScriptRepository, SCRIPT_EXTENSION};
