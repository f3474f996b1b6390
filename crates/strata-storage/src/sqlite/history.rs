//! History table operations for [`SqliteStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use strata_core::{AppliedRecord, MigrationVersion};

use crate::error::{Result, StorageError};
use crate::sqlite::schema;
use crate::sqlite::store::SqliteStore;
use crate::sqlite::transaction::SqliteTx;
use crate::traits::{HistoryStore, Transaction};

// ---------------------------------------------------------------------------
// Connection-level helpers (shared with Transaction)
// ---------------------------------------------------------------------------

pub(crate) fn table_exists_on_conn(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn applied_on_conn(conn: &Connection, table: &str) -> Result<Vec<AppliedRecord>> {
    if !table_exists_on_conn(conn, table)? {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT version, name, checksum, applied_at FROM {table}"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (version, name, checksum, applied_at) = row?;
        let parsed = MigrationVersion::parse(&version).map_err(|e| StorageError::CorruptHistory {
            version: version.clone(),
            reason: e.to_string(),
        })?;
        let applied_at = DateTime::parse_from_rfc3339(&applied_at)
            .map_err(|e| StorageError::CorruptHistory {
                version: version.clone(),
                reason: format!("bad applied_at '{applied_at}': {e}"),
            })?
            .with_timezone(&Utc);
        records.push(AppliedRecord {
            version: parsed,
            name,
            checksum,
            applied_at,
        });
    }
    records.sort_by(|a, b| a.version.cmp(&b.version));
    Ok(records)
}

pub(crate) fn record_applied_on_conn(conn: &Connection, table: &str, record: &AppliedRecord) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO {table} (version, name, checksum, applied_at) VALUES (?1, ?2, ?3, ?4)"),
        params![
            record.version.as_str(),
            record.name,
            record.checksum,
            record.applied_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub(crate) fn remove_applied_on_conn(conn: &Connection, table: &str, version: &MigrationVersion) -> Result<()> {
    // Stored versions keep their original spelling, so match numerically.
    let mut stmt = conn.prepare(&format!("SELECT version FROM {table}"))?;
    let stored: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<_, _>>()?;

    let mut removed = 0;
    for raw in stored {
        if MigrationVersion::parse(&raw).is_ok_and(|v| v == *version) {
            removed += conn.execute(&format!("DELETE FROM {table} WHERE version = ?1"), params![raw])?;
        }
    }
    debug!(%version, removed, "removed history record");
    Ok(())
}

// ---------------------------------------------------------------------------
// HistoryStore implementation
// ---------------------------------------------------------------------------

impl HistoryStore for SqliteStore {
    fn ensure_history_table(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(&schema::create_history_table_sql(&self.table))?;
        Ok(())
    }

    fn applied(&self) -> Result<Vec<AppliedRecord>> {
        let conn = self.lock_conn()?;
        applied_on_conn(&conn, &self.table)
    }

    fn run_in_transaction(&self, f: &dyn Fn(&dyn Transaction) -> Result<()>) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        let sqlite_tx = SqliteTx {
            conn: &tx,
            table: &self.table,
        };
        // Rolled back on drop if `f` fails.
        f(&sqlite_tx)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(())
    }

    fn database_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
