//! Progress notification.
//!
//! The engine reports every step of a run as a [`MigrationEvent`]. Handlers
//! are called synchronously, in the order they subscribed, on the thread that
//! runs the migration. A panicking handler is isolated: the panic is logged
//! and the remaining handlers and the migration carry on.

use crate::error::MigrateError;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Phase of a migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// No run has started yet
    #[default]
    None,
    Started,
    Initializing,
    CheckingPendingMigrations,
    Migrating,
    Finished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::None => "None",
            Stage::Started => "Started",
            Stage::Initializing => "Initializing",
            Stage::CheckingPendingMigrations => "CheckingPendingMigrations",
            Stage::Migrating => "Migrating",
            Stage::Finished => "Finished",
        };
        f.write_str(name)
    }
}

/// One progress report
#[derive(Debug, Clone, Copy)]
pub struct MigrationEvent<'a> {
    pub stage: Stage,
    /// File name of the script the event is about
    pub script: Option<&'a str>,
    pub message: &'a str,
    /// Set on failure events
    pub error: Option<&'a MigrateError>,
}

impl<'a> MigrationEvent<'a> {
    pub fn new(stage: Stage, script: Option<&'a str>, message: &'a str) -> Self {
        Self {
            stage,
            script,
            message,
            error: None,
        }
    }

    pub fn failure(
        stage: Stage,
        script: Option<&'a str>,
        message: &'a str,
        error: &'a MigrateError,
    ) -> Self {
        Self {
            stage,
            script,
            message,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Handle returned by [`Notifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn Fn(&MigrationEvent<'_>) + Send + Sync>;

/// Ordered list of event handlers
#[derive(Default)]
pub struct Notifier {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&MigrationEvent<'_>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Write the event to the log and deliver it to every handler
    pub fn notify(&self, event: &MigrationEvent<'_>) {
        let script = event.script.unwrap_or("-");
        match event.error {
            Some(err) => log::error!(
                "Database migration [{}] [{}] {}: {}",
                event.stage,
                script,
                event.message,
                err
            ),
            None => log::info!(
                "Database migration [{}] [{}] {}",
                event.stage,
                script,
                event.message
            ),
        }

        for (id, handler) in &self.handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                log::warn!(
                    "Migration observer {:?} panicked while handling a {} event",
                    id,
                    event.stage
                );
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
