//! Storage error types.

use strata_core::CoreError;

/// Errors that can occur while tracking or executing migrations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database is locked by another process.
    #[error("database locked: {0}")]
    DatabaseLocked(String),

    /// Failed to establish or maintain a database connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A transaction operation failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A migration script failed; the unit was rolled back.
    #[error("migration {name} failed: {reason}")]
    Migration {
        /// File name of the failing script.
        name: String,
        /// Underlying error description.
        reason: String,
    },

    /// Applied migrations whose files changed after they were applied.
    #[error("checksum mismatch for applied migration(s): {versions}")]
    ChecksumMismatch {
        /// Comma-separated list of versions.
        versions: String,
    },

    /// The configured history table name is not a plain SQL identifier.
    #[error("invalid history table name '{0}'")]
    InvalidTableName(String),

    /// A row in the history table could not be decoded.
    #[error("corrupt history row for version '{version}': {reason}")]
    CorruptHistory {
        /// The raw version column.
        version: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Discovery or planning failed.
    #[error(transparent)]
    Plan(#[from] CoreError),

    /// A raw SQLite query error.
    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// The lock file could not be created.
    #[error("lock error: {0}")]
    Lock(#[from] std::io::Error),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Creates a [`StorageError::Migration`] for a failing script.
    pub fn migration(name: impl Into<String>, source: &StorageError) -> Self {
        Self::Migration {
            name: name.into(),
            reason: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_error_names_the_file() {
        let inner = StorageError::Transaction("boom".into());
        let err = StorageError::migration("0001_a.up.sql", &inner);
        assert_eq!(
            err.to_string(),
            "migration 0001_a.up.sql failed: transaction error: boom"
        );
    }
}
