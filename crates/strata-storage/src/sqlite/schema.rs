//! DDL for the migration history table.
//!
//! Timestamps are stored as TEXT in RFC 3339 format (SQLite has no native
//! datetime type). Versions are stored as written in the file name; numeric
//! ordering happens in Rust.

use crate::error::{Result, StorageError};

/// Checks that `table` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// The table name is interpolated into SQL text, so nothing else is allowed.
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut bytes = table.bytes();
    let valid = match bytes.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == b'_')
                && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTableName(table.to_string()))
    }
}

/// Returns the `CREATE TABLE` statement for the history table.
pub fn create_history_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            version    TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            checksum   TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )
        "#
    )
}
