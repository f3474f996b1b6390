//! Discovery of migration units from a directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::filename::parse_file_name;
use crate::unit::{Direction, MigrationScript, MigrationUnit};
use crate::version::MigrationVersion;

/// A script found during discovery, before up and down files are paired.
struct Found {
    name: String,
    script: MigrationScript,
    tagged: bool,
}

/// An ordered, duplicate-free set of migration units.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    units: Vec<MigrationUnit>,
    dir: Option<PathBuf>,
}

impl Registry {
    /// Loads every migration in `dir` (non-recursive).
    ///
    /// Files that are not migrations, or that target another SQL dialect,
    /// are skipped. Units are returned sorted by version.
    ///
    /// A `sqlite`/`sqlite3`-tagged file replaces an untagged file of the same
    /// version and direction, so `0001_x.sqlite3.up.sql` wins over
    /// `0001_x.up.sql`. Two files with the same tagging are a duplicate.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CoreError::MigrationDirNotFound(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|source| CoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut file_names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            if !entry.path().is_file() {
                continue;
            }
            file_names.push(entry.file_name().to_string_lossy().into_owned());
        }
        // Directory iteration order is unspecified; sort so duplicate errors
        // name files deterministically.
        file_names.sort();

        let mut ups: BTreeMap<MigrationVersion, Found> = BTreeMap::new();
        let mut downs: BTreeMap<MigrationVersion, Found> = BTreeMap::new();

        for file_name in file_names {
            let Some(parsed) = parse_file_name(&file_name) else {
                debug!(file = %file_name, "skipping non-migration file");
                continue;
            };
            if !parsed.is_supported_dialect() {
                debug!(file = %file_name, dialect = ?parsed.dialect, "skipping migration for other dialect");
                continue;
            }

            let tagged = parsed.dialect.is_some();
            let slot = match parsed.direction {
                Direction::Up => &mut ups,
                Direction::Down => &mut downs,
            };
            match slot.get(&parsed.version) {
                Some(existing) if existing.tagged == tagged => {
                    return Err(duplicate(&parsed.version, parsed.direction, &existing.script, &file_name));
                }
                Some(existing) if existing.tagged => {
                    debug!(file = %file_name, kept = %existing.script.file_name, "dialect file overrides generic migration");
                    continue;
                }
                _ => {}
            }

            let path = dir.join(&file_name);
            let sql = fs::read_to_string(&path).map_err(|source| CoreError::Io {
                path: path.clone(),
                source,
            })?;
            slot.insert(
                parsed.version,
                Found {
                    name: parsed.name,
                    script: MigrationScript::new(file_name.clone(), sql),
                    tagged,
                },
            );
        }

        if let Some((version, found)) = downs.iter().find(|(v, _)| !ups.contains_key(*v)) {
            debug!(%version, "down migration without up");
            return Err(CoreError::OrphanDown {
                file: found.script.file_name.clone(),
            });
        }

        let units = ups
            .into_iter()
            .map(|(version, up)| {
                let down = downs.remove(&version).map(|f| f.script);
                MigrationUnit {
                    version,
                    name: up.name,
                    up: up.script,
                    down,
                }
            })
            .collect::<Vec<_>>();

        debug!(dir = %dir.display(), count = units.len(), "discovered migrations");
        Ok(Self {
            units,
            dir: Some(dir.to_path_buf()),
        })
    }

    /// Builds a registry from in-memory units.
    ///
    /// Units are sorted by version; a repeated version is an error.
    pub fn from_units(units: impl IntoIterator<Item = MigrationUnit>) -> Result<Self> {
        let mut units: Vec<MigrationUnit> = units.into_iter().collect();
        units.sort_by(|a, b| a.version.cmp(&b.version));
        for pair in units.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(duplicate(
                    &pair[1].version,
                    Direction::Up,
                    &pair[0].up,
                    &pair[1].up.file_name,
                ));
            }
        }
        Ok(Self { units, dir: None })
    }

    /// All units in ascending version order.
    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    /// The directory the registry was discovered from, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn duplicate(
    version: &MigrationVersion,
    direction: Direction,
    existing: &MigrationScript,
    second: &str,
) -> CoreError {
    CoreError::DuplicateVersion {
        version: version.clone(),
        direction: direction.to_string(),
        first: existing.file_name.clone(),
        second: second.to_string(),
    }
}
