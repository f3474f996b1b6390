//! [`FileMigrator`] -- applies registry units against a history store.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use strata_core::plan::{self, modified_versions};
use strata_core::{AppliedRecord, MigrationUnit, Registry, StatusEntry};

use crate::error::{Result, StorageError};
use crate::lock::MigrationLock;
use crate::traits::{DownReport, HistoryStore, Migrate, MigrationOutcome, ResetReport, UpReport};

/// Knobs that change how the executor treats history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigratorOptions {
    /// Apply pending units that sort before the newest applied one.
    pub allow_out_of_order: bool,
    /// Refuse to run `up` when an applied unit's file has changed.
    pub verify_checksums: bool,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            allow_out_of_order: false,
            verify_checksums: true,
        }
    }
}

/// Executes migrations from a [`Registry`] against a [`HistoryStore`].
///
/// Each unit runs in its own transaction together with its history write,
/// so a failing unit leaves no trace while the units before it stay applied.
#[derive(Debug)]
pub struct FileMigrator<S> {
    registry: Registry,
    store: S,
    options: MigratorOptions,
}

impl<S: HistoryStore> FileMigrator<S> {
    /// Builds a migrator over an already-loaded registry.
    pub fn new(registry: Registry, store: S, options: MigratorOptions) -> Self {
        Self {
            registry,
            store,
            options,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Takes the cross-process lock for file databases.
    fn lock(&self) -> Result<Option<MigrationLock>> {
        match self.store.database_path() {
            Some(path) => MigrationLock::acquire(path).map(Some),
            None => Ok(None),
        }
    }

    fn up_locked(&self, step: usize) -> Result<UpReport> {
        let started = Instant::now();
        self.store.ensure_history_table()?;
        let applied = self.store.applied()?;

        if self.options.verify_checksums {
            let modified = modified_versions(self.registry.units(), &applied);
            if !modified.is_empty() {
                let versions = modified
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(StorageError::ChecksumMismatch { versions });
            }
        }

        let pending = plan::plan_up(
            self.registry.units(),
            &applied,
            step,
            self.options.allow_out_of_order,
        )?;
        debug!(step, count = pending.len(), "planned up migration");

        let mut report = UpReport::default();
        for unit in pending {
            self.apply_up(unit)?;
            report.applied.push(outcome(unit, &unit.up.file_name));
        }
        report.elapsed = started.elapsed();
        Ok(report)
    }

    fn apply_up(&self, unit: &MigrationUnit) -> Result<()> {
        let record = AppliedRecord::for_unit(unit, Utc::now());
        self.store
            .run_in_transaction(&|tx| {
                if unit.up.is_blank() {
                    debug!(version = %unit.version, "empty up migration, recording only");
                } else {
                    tx.execute_batch(&unit.up.sql)?;
                }
                tx.record_applied(&record)
            })
            .map_err(|e| StorageError::migration(&unit.up.file_name, &e))?;
        info!(version = %unit.version, name = %unit.name, "applied migration");
        Ok(())
    }

    fn down_locked(&self, step: usize) -> Result<DownReport> {
        let started = Instant::now();
        self.store.ensure_history_table()?;
        let applied = self.store.applied()?;
        let targets = plan::plan_down(self.registry.units(), &applied, step)?;
        debug!(step, count = targets.len(), "planned down migration");

        let mut report = DownReport::default();
        for (record, unit) in targets {
            // plan_down only returns units that have a down script.
            let Some(script) = unit.down.as_ref() else {
                continue;
            };
            self.store
                .run_in_transaction(&|tx| {
                    if script.is_blank() {
                        debug!(version = %unit.version, "empty down migration, removing record only");
                    } else {
                        tx.execute_batch(&script.sql)?;
                    }
                    tx.remove_applied(&record.version)
                })
                .map_err(|e| StorageError::migration(&script.file_name, &e))?;
            info!(version = %unit.version, name = %unit.name, "reverted migration");
            report.reverted.push(outcome(unit, &script.file_name));
        }
        report.elapsed = started.elapsed();
        Ok(report)
    }
}

impl<S: HistoryStore> Migrate for FileMigrator<S> {
    fn up_to(&self, step: usize) -> Result<UpReport> {
        let _lock = self.lock()?;
        self.up_locked(step)
    }

    fn down(&self, step: usize) -> Result<DownReport> {
        let _lock = self.lock()?;
        self.down_locked(step)
    }

    fn status(&self) -> Result<Vec<StatusEntry>> {
        let applied = self.store.applied()?;
        Ok(plan::status(self.registry.units(), &applied))
    }

    fn reset(&self) -> Result<ResetReport> {
        let _lock = self.lock()?;
        let down = self.down_locked(0)?;
        let up = self.up_locked(0)?;
        Ok(ResetReport { down, up })
    }
}

fn outcome(unit: &MigrationUnit, file_name: &str) -> MigrationOutcome {
    MigrationOutcome {
        version: unit.version.clone(),
        name: unit.name.clone(),
        file_name: file_name.to_string(),
    }
}
