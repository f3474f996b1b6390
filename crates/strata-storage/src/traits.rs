//! Storage and executor traits.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use strata_core::{AppliedRecord, MigrationVersion, StatusEntry};

use crate::error::Result;

/// Durable log of applied migrations (the state tracker).
pub trait HistoryStore {
    /// Creates the history table if it does not exist.
    fn ensure_history_table(&self) -> Result<()>;

    /// Returns every applied record in ascending version order.
    ///
    /// Returns an empty list if the history table does not exist yet.
    fn applied(&self) -> Result<Vec<AppliedRecord>>;

    /// Runs `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    fn run_in_transaction(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()>;

    /// Path of the database file, or `None` for in-memory databases.
    fn database_path(&self) -> Option<&Path>;
}

/// Operations available inside a migration transaction.
pub trait Transaction {
    /// Executes one or more SQL statements.
    fn execute_batch(&self, sql: &str) -> Result<()>;

    /// Inserts an applied record.
    fn record_applied(&self, record: &AppliedRecord) -> Result<()>;

    /// Deletes the applied record for `version`.
    fn remove_applied(&self, version: &MigrationVersion) -> Result<()>;
}

/// A migrator: sequences and applies migrations.
pub trait Migrate {
    /// Applies up to `step` pending migrations; `0` applies all pending.
    fn up_to(&self, step: usize) -> Result<UpReport>;

    /// Reverts the `step` most recently applied migrations; `0` reverts all.
    fn down(&self, step: usize) -> Result<DownReport>;

    /// Reports the state of every known or applied version.
    fn status(&self) -> Result<Vec<StatusEntry>>;

    /// Reverts everything, then applies everything.
    fn reset(&self) -> Result<ResetReport>;
}

/// One migration script that ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub version: MigrationVersion,
    pub name: String,
    pub file_name: String,
}

/// Result of [`Migrate::up_to`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpReport {
    pub applied: Vec<MigrationOutcome>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

/// Result of [`Migrate::down`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownReport {
    pub reverted: Vec<MigrationOutcome>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

/// Result of [`Migrate::reset`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    pub down: DownReport,
    pub up: UpReport,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
