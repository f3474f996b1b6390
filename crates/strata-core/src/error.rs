//! Error types for migration discovery and planning.

use std::path::PathBuf;

use crate::version::MigrationVersion;

/// Errors raised while loading or planning migrations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The migration directory does not exist.
    #[error("migration directory not found: {}", .0.display())]
    MigrationDirNotFound(PathBuf),

    /// A migration file or directory could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A version string is not a valid migration version.
    #[error("invalid migration version '{0}': expected ASCII digits")]
    InvalidVersion(String),

    /// Two files claim the same version and direction.
    #[error("duplicate {direction} migration for version {version}: {first} and {second}")]
    DuplicateVersion {
        /// The clashing version.
        version: MigrationVersion,
        /// `up` or `down`.
        direction: String,
        /// First file seen.
        first: String,
        /// Second file seen.
        second: String,
    },

    /// A down file exists without a matching up file.
    #[error("down migration {file} has no matching up migration")]
    OrphanDown {
        /// The orphaned down file.
        file: String,
    },

    /// Pending migrations sort before the newest applied one.
    #[error(
        "migration {pending} is pending but {latest} is already applied \
         (use --allow-out-of-order to apply it anyway)"
    )]
    OutOfOrder {
        /// The lowest pending version.
        pending: MigrationVersion,
        /// The highest applied version.
        latest: MigrationVersion,
    },

    /// An applied version has no migration file.
    #[error("migration version {0} is applied but its files do not exist")]
    MissingMigration(MigrationVersion),

    /// An applied version has no down script.
    #[error("migration {version}_{name} has no down migration")]
    IrreversibleMigration {
        /// The version being reverted.
        version: MigrationVersion,
        /// The migration name.
        name: String,
    },

    /// The migration name given to `create` is unusable.
    #[error("invalid migration name '{0}'")]
    InvalidName(String),
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
