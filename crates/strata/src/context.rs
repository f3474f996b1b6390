//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the global flags and knows how to turn them,
//! together with `strata.yaml`, into a migration directory and a database
//! connection.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use strata_config::config::{IN_MEMORY_DATABASE, load_config};
use strata_config::project_dir::find_config_file;
use strata_config::LoadedConfig;
use strata_core::Registry;
use strata_storage::{FileMigrator, MigratorOptions, SqliteStore};
use tracing::debug;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Working directory the command was started from.
    pub cwd: PathBuf,

    /// Explicit config file (`--config` / `STRATA_CONFIG`).
    pub config_path: Option<PathBuf>,

    /// Selected environment.
    pub env: String,

    /// `--database` override.
    pub database: Option<String>,

    /// `--path` override.
    pub path: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_cwd(global, cwd)
    }

    fn with_cwd(global: &GlobalArgs, cwd: PathBuf) -> Self {
        let env = if global.env.is_empty() {
            strata_config::config::DEFAULT_ENVIRONMENT.to_string()
        } else {
            global.env.clone()
        };
        Self {
            config_path: global.config.as_ref().map(|p| cwd.join(p)),
            path: global.path.as_ref().map(|p| cwd.join(p)),
            database: global.database.clone(),
            env,
            cwd,
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// Loads configuration from the explicit file, a discovered
    /// `strata.yaml`, or defaults and `STRATA_*` variables alone.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let file = match &self.config_path {
            Some(p) => Some(p.clone()),
            None => find_config_file(&self.cwd),
        };
        debug!(config = ?file, "loading configuration");
        let loaded = load_config(file.as_deref(), &self.cwd).with_context(|| match &file {
            Some(p) => format!("failed to load {}", p.display()),
            None => "failed to load configuration".to_string(),
        })?;
        Ok(loaded)
    }

    /// Migration directory: `--path`, then config `migrations`.
    pub fn migrations_dir(&self, loaded: &LoadedConfig) -> PathBuf {
        match &self.path {
            Some(p) => p.clone(),
            None => loaded.migrations_dir(),
        }
    }

    /// Resolves the database: `--database`, then the config for the
    /// selected environment. `None` means in-memory.
    pub fn database(&self, loaded: &LoadedConfig) -> Result<Option<PathBuf>> {
        match self.database.as_deref() {
            Some(IN_MEMORY_DATABASE) => Ok(None),
            Some(db) => Ok(Some(self.cwd.join(db))),
            None => Ok(loaded.database(&self.env)?),
        }
    }

    /// Opens the history store for the resolved database.
    pub fn open_store(&self, loaded: &LoadedConfig) -> Result<SqliteStore> {
        let table = &loaded.config.table;
        let store = match self.database(loaded)? {
            Some(path) => {
                debug!(database = %path.display(), env = %self.env, "resolved database");
                SqliteStore::open(&path, table)?
            }
            None => SqliteStore::open_in_memory(table)?,
        };
        Ok(store)
    }

    /// Builds a file migrator over the resolved migration directory and
    /// database.
    ///
    /// The directory is scanned before the database is opened, so a bad
    /// migration directory never creates a database file.
    pub fn migrator(&self, allow_out_of_order: bool) -> Result<FileMigrator<SqliteStore>> {
        let loaded = self.load_config()?;
        let dir = self.migrations_dir(&loaded);
        let registry = Registry::discover(&dir)?;
        let store = self.open_store(&loaded)?;
        let options = MigratorOptions {
            allow_out_of_order: allow_out_of_order || loaded.config.allow_out_of_order,
            verify_checksums: loaded.config.verify_checksums,
        };
        debug!(path = %dir.display(), ?options, "building migrator");
        Ok(FileMigrator::new(registry, store, options))
    }

    /// Path shown to the user, relative to the working directory when possible.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.cwd).unwrap_or(path).display()
    }
}
