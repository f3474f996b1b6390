//! Creation of new, empty migration files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{CoreError, Result};
use crate::filename::normalize_name;
use crate::unit::Direction;

/// Timestamp layout used for generated versions (UTC, second precision).
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Paths of a freshly created up/down pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMigration {
    pub version: String,
    pub name: String,
    pub up: PathBuf,
    pub down: PathBuf,
}

/// Writes empty `<timestamp>_<name>.up.sql` and `.down.sql` files into `dir`.
///
/// The directory is created if needed. The name is normalized to
/// `snake_case`; a name that normalizes to nothing is rejected. Existing
/// files are never overwritten.
pub fn create_migration(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<CreatedMigration> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return Err(CoreError::InvalidName(name.to_string()));
    }

    fs::create_dir_all(dir).map_err(|source| CoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let version = now.format(VERSION_FORMAT).to_string();
    let up = dir.join(format!("{version}_{normalized}.{}.sql", Direction::Up));
    let down = dir.join(format!("{version}_{normalized}.{}.sql", Direction::Down));

    for path in [&up, &down] {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| CoreError::Io {
                path: path.clone(),
                source,
            })?;
    }

    info!(up = %up.display(), down = %down.display(), "created migration");
    Ok(CreatedMigration {
        version,
        name: normalized,
        up,
        down,
    })
}
