//! [`SqliteStore`] -- SQLite-backed migration history.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::sqlite::schema;

/// SQLite-backed implementation of [`HistoryStore`](crate::traits::HistoryStore).
///
/// Wraps a [`rusqlite::Connection`] in a `Mutex` for thread safety. The
/// history table name is validated once at construction.
pub struct SqliteStore {
    /// The mutex-protected SQLite connection.
    pub(crate) conn: Mutex<Connection>,
    /// Name of the history table.
    pub(crate) table: String,
    /// Database file, `None` when in memory.
    pub(crate) path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at the given path.
    ///
    /// Enables WAL mode and foreign keys. Parent directories are created
    /// if missing.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let path = path.as_ref();
        schema::validate_table_name(table)?;
        info!(?path, table, "opening SQLite database");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Connection(format!("failed to create {}: {e}", parent.display()))
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            path: Some(path.to_path_buf()),
        };
        store.configure_connection(true)?;
        Ok(store)
    }

    /// Opens an in-memory SQLite database (useful for tests).
    pub fn open_in_memory(table: &str) -> Result<Self> {
        schema::validate_table_name(table)?;
        debug!("opening in-memory SQLite database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("failed to open in-memory db: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            path: None,
        };
        store.configure_connection(false)?;
        Ok(store)
    }

    /// Sets connection pragmas (WAL mode for files, foreign keys, busy timeout).
    fn configure_connection(&self, wal: bool) -> Result<()> {
        let conn = self.lock_conn()?;

        if wal {
            // journal_mode answers with the resulting mode, so read it back.
            let mode: String = conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                .map_err(|e| StorageError::Connection(format!("failed to enable WAL: {e}")))?;
            debug!(%mode, "journal mode set");
        }
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| StorageError::Connection(format!("failed to set pragmas: {e}")))?;

        Ok(())
    }

    /// Name of the history table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Acquires the connection lock. Helper used by all operation modules.
    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }

    /// Runs `f` with the raw connection.
    ///
    /// Intended for inspecting the schema a migration produced.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock_conn()?;
        f(&conn)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("table", &self.table)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
