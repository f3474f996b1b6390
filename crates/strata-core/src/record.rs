//! Records of applied migrations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::unit::MigrationUnit;
use crate::version::MigrationVersion;

/// Proof that a migration unit was applied.
///
/// Created when the executor applies a unit, never mutated, and deleted only
/// when the unit is migrated down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRecord {
    pub version: MigrationVersion,
    pub name: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

impl AppliedRecord {
    /// Builds the record for a unit applied at `applied_at`.
    pub fn for_unit(unit: &MigrationUnit, applied_at: DateTime<Utc>) -> Self {
        Self {
            version: unit.version.clone(),
            name: unit.name.clone(),
            checksum: unit.checksum().to_string(),
            applied_at,
        }
    }
}
