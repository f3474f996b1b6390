//! Planning: which units an `up` or `down` run touches, and in what order.
//!
//! These are pure functions over the registry's units and the applied
//! records read from the history table, so the executor can stay a thin
//! loop and the ordering rules can be tested without a database.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::{CoreError, Result};
use crate::record::AppliedRecord;
use crate::unit::MigrationUnit;
use crate::version::MigrationVersion;

/// Returns the units an `up` run should apply, in order.
///
/// Pending units are those with no applied record. When `step` is nonzero
/// at most `step` units are returned; zero means all pending.
///
/// If a pending unit sorts before the newest applied record the history is
/// out of order, which is an error unless `allow_out_of_order` is set.
pub fn plan_up<'a>(
    units: &'a [MigrationUnit],
    applied: &[AppliedRecord],
    step: usize,
    allow_out_of_order: bool,
) -> Result<Vec<&'a MigrationUnit>> {
    let applied_versions: HashSet<&MigrationVersion> = applied.iter().map(|r| &r.version).collect();
    let mut pending: Vec<&MigrationUnit> = units
        .iter()
        .filter(|u| !applied_versions.contains(&u.version))
        .collect();
    pending.sort_by(|a, b| a.version.cmp(&b.version));

    if let (Some(first), Some(latest)) = (pending.first(), applied.iter().map(|r| &r.version).max()) {
        if first.version < *latest {
            if !allow_out_of_order {
                return Err(CoreError::OutOfOrder {
                    pending: first.version.clone(),
                    latest: latest.clone(),
                });
            }
            warn!(pending = %first.version, latest = %latest, "applying migrations out of order");
        }
    }

    if step > 0 {
        pending.truncate(step);
    }
    Ok(pending)
}

/// Returns the applied records a `down` run should revert, newest first,
/// each paired with the unit holding its down script.
///
/// `step` is the number of records to revert; zero means all of them.
pub fn plan_down<'a, 'r>(
    units: &'a [MigrationUnit],
    applied: &'r [AppliedRecord],
    step: usize,
) -> Result<Vec<(&'r AppliedRecord, &'a MigrationUnit)>> {
    let mut records: Vec<&AppliedRecord> = applied.iter().collect();
    records.sort_by(|a, b| b.version.cmp(&a.version));
    if step > 0 {
        records.truncate(step);
    }

    records
        .into_iter()
        .map(|record| {
            let unit = units
                .iter()
                .find(|u| u.version == record.version)
                .ok_or_else(|| CoreError::MissingMigration(record.version.clone()))?;
            if unit.down.is_none() {
                return Err(CoreError::IrreversibleMigration {
                    version: unit.version.clone(),
                    name: unit.name.clone(),
                });
            }
            Ok((record, unit))
        })
        .collect()
}

/// State of one version as reported by `migrate status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Applied and the file still matches the recorded checksum.
    Applied,
    /// Known file, not yet applied.
    Pending,
    /// Applied, but the up script changed since.
    Modified,
    /// Applied, but no file exists for it any more.
    Missing,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Pending => "pending",
            Self::Modified => "modified",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `migrate status` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub version: MigrationVersion,
    pub name: String,
    pub state: MigrationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Merges known units and applied records into one row per version.
pub fn status(units: &[MigrationUnit], applied: &[AppliedRecord]) -> Vec<StatusEntry> {
    let mut rows: BTreeMap<&MigrationVersion, StatusEntry> = BTreeMap::new();

    for unit in units {
        rows.insert(
            &unit.version,
            StatusEntry {
                version: unit.version.clone(),
                name: unit.name.clone(),
                state: MigrationState::Pending,
                applied_at: None,
            },
        );
    }

    for record in applied {
        let state = match units.iter().find(|u| u.version == record.version) {
            Some(unit) if unit.checksum() == record.checksum => MigrationState::Applied,
            Some(_) => MigrationState::Modified,
            None => MigrationState::Missing,
        };
        let entry = rows.entry(&record.version).or_insert_with(|| StatusEntry {
            version: record.version.clone(),
            name: record.name.clone(),
            state,
            applied_at: None,
        });
        entry.state = state;
        entry.applied_at = Some(record.applied_at);
    }

    rows.into_values().collect()
}

/// Returns the versions whose applied checksum no longer matches the file.
pub fn modified_versions(units: &[MigrationUnit], applied: &[AppliedRecord]) -> Vec<MigrationVersion> {
    status(units, applied)
        .into_iter()
        .filter(|row| row.state == MigrationState::Modified)
        .map(|row| row.version)
        .collect()
}
