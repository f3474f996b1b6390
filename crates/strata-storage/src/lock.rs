//! Advisory lock that keeps two processes from migrating one database.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Result, StorageError};

/// An exclusive lock on `<database>.lock`, released on drop.
#[derive(Debug)]
pub struct MigrationLock {
    _file: File,
    path: PathBuf,
}

impl MigrationLock {
    /// Takes the lock for `database` without blocking.
    ///
    /// Returns [`StorageError::DatabaseLocked`] if another process holds it.
    pub fn acquire(database: &Path) -> Result<Self> {
        let path = lock_path(database);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired migration lock");
                Ok(Self { _file: file, path })
            }
            Err(e) if is_contended(&e) => Err(StorageError::DatabaseLocked(format!(
                "another process is migrating {} (lock file {})",
                database.display(),
                path.display()
            ))),
            Err(e) => Err(StorageError::Lock(e)),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Returns `<database>.lock`, keeping the database's own extension.
pub fn lock_path(database: &Path) -> PathBuf {
    let mut s: OsString = database.as_os_str().to_owned();
    s.push(".lock");
    PathBuf::from(s)
}
