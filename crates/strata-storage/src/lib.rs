//! Migration state tracking and execution for strata.
//!
//! Provides the [`HistoryStore`] trait with a SQLite implementation
//! ([`SqliteStore`]), and the [`FileMigrator`] executor that applies
//! migration units against it.

pub mod error;
pub mod lock;
pub mod migrator;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use error::StorageError;
pub use lock::MigrationLock;
pub use migrator::{FileMigrator, MigratorOptions};
pub use sqlite::SqliteStore;
pub use traits::{
    DownReport, HistoryStore, Migrate, MigrationOutcome, ResetReport, Transaction, UpReport,
};
