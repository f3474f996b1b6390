//! Transaction wrapper for [`SqliteStore`](crate::SqliteStore).

use rusqlite::Connection;
use tracing::debug;

use strata_core::{AppliedRecord, MigrationVersion};

use crate::error::Result;
use crate::sqlite::history;
use crate::traits::Transaction;

/// A thin wrapper around a SQLite connection that is inside a transaction.
///
/// The [`SqliteTx`] holds a reference to the connection (which already has an
/// active transaction via `BEGIN`). It implements [`Transaction`] by delegating
/// to the same connection-level helpers used by the store.
pub(crate) struct SqliteTx<'a> {
    pub(crate) conn: &'a Connection,
    pub(crate) table: &'a str,
}

impl Transaction for SqliteTx<'_> {
    fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(bytes = sql.len(), "executing migration SQL");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn record_applied(&self, record: &AppliedRecord) -> Result<()> {
        history::record_applied_on_conn(self.conn, self.table, record)
    }

    fn remove_applied(&self, version: &MigrationVersion) -> Result<()> {
        history::remove_applied_on_conn(self.conn, self.table, version)
    }
}
