//! Migration engine for SqlForward.
//!
//! Discovers the `.sql` scripts of a folder, compares them with the names
//! recorded in the `ScriptLog` table and applies every pending script in file
//! name order. Each script runs in its own transaction together with its log
//! record, so a script is applied exactly once even across interrupted runs.

pub mod engine;
pub mod error;
pub mod event;
pub mod execution_log;
pub mod executor;

pub use engine::{MigrationStatus, Migrator, MigratorBuilder, MigratorSettings, SyncReport};
pub use error::{MigrateError, MigrateResult};
pub use event::{MigrationEvent, Notifier, Stage, SubscriptionId};
pub use execution_log::{ExecutionLog, ExecutionRecord};
pub use executor::ScriptExecutor;
