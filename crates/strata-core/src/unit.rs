//! Migration units: one version, its name, and its up/down scripts.

use std::fmt;

use serde::Serialize;

use crate::checksum::compute_checksum;
use crate::version::MigrationVersion;

/// Which way a migration script moves the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Forward change.
    Up,
    /// Inverse change.
    Down,
}

impl Direction {
    /// Returns the string used in file names (`up` or `down`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single SQL script belonging to a migration unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    /// File name the script was loaded from (synthesized for in-memory units).
    pub file_name: String,
    /// The SQL body.
    pub sql: String,
    /// SHA-256 of the normalized body.
    pub checksum: String,
}

impl MigrationScript {
    /// Builds a script, computing its checksum.
    pub fn new(file_name: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let checksum = compute_checksum(&sql);
        Self {
            file_name: file_name.into(),
            sql,
            checksum,
        }
    }

    /// Returns `true` if the body contains nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

/// A versioned migration with a forward script and an optional inverse.
///
/// Units are immutable once built and identified by [`MigrationVersion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub version: MigrationVersion,
    pub name: String,
    pub up: MigrationScript,
    pub down: Option<MigrationScript>,
}

impl MigrationUnit {
    /// Builds an in-memory unit with only an up script.
    pub fn new(version: MigrationVersion, name: impl Into<String>, up_sql: impl Into<String>) -> Self {
        let name = name.into();
        let up = MigrationScript::new(file_name_for(&version, &name, Direction::Up), up_sql);
        Self {
            version,
            name,
            up,
            down: None,
        }
    }

    /// Attaches a down script to an in-memory unit.
    pub fn with_down(mut self, down_sql: impl Into<String>) -> Self {
        let file_name = file_name_for(&self.version, &self.name, Direction::Down);
        self.down = Some(MigrationScript::new(file_name, down_sql));
        self
    }

    /// Returns the checksum recorded when this unit is applied.
    pub fn checksum(&self) -> &str {
        &self.up.checksum
    }

    /// Returns the script for the given direction, if present.
    pub fn script(&self, direction: Direction) -> Option<&MigrationScript> {
        match direction {
            Direction::Up => Some(&self.up),
            Direction::Down => self.down.as_ref(),
        }
    }
}

/// Returns the canonical file name for a version, name, and direction.
pub fn file_name_for(version: &MigrationVersion, name: &str, direction: Direction) -> String {
    format!("{version}_{name}.{direction}.sql")
}
