//! Configuration types and loading for strata.
//!
//! The main entry point is [`StrataConfig`], which represents the contents of
//! `strata.yaml`. Configuration is loaded with [`load_config`], which layers
//! struct defaults, the YAML file, and `STRATA_*` environment variables, and
//! saved with [`save_config`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be serialized to YAML.
    #[error("failed to write config file: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The layered configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Extract(#[from] figment::Error),

    /// No database is configured for the selected environment.
    #[error("no database configured for environment '{env}' (set `database` or `environments.{env}.database` in strata.yaml, or pass --database)")]
    NoDatabase {
        /// The selected environment.
        env: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "STRATA_";

/// Environment selected when none is given.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Database value that selects a private in-memory database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Per-environment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnvironmentConfig {
    /// Path of the SQLite database file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// The full strata configuration, corresponding to `strata.yaml`.
///
/// All fields use `serde` defaults so that a partially-specified YAML file
/// will be deserialized correctly with sensible default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrataConfig {
    /// Directory holding migration files.
    #[serde(default = "default_migrations")]
    pub migrations: String,

    /// Name of the history table.
    #[serde(default = "default_table")]
    pub table: String,

    /// Apply pending migrations older than the newest applied one.
    #[serde(default)]
    pub allow_out_of_order: bool,

    /// Refuse to migrate up when an applied file has been edited.
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// Database override that applies to every environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Named environments (`development`, `test`, ...).
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            migrations: default_migrations(),
            table: default_table(),
            allow_out_of_order: false,
            verify_checksums: true,
            database: None,
            environments: BTreeMap::new(),
        }
    }
}

fn default_migrations() -> String {
    "migrations".to_string()
}

fn default_table() -> String {
    "schema_migration".to_string()
}

fn default_true() -> bool {
    true
}

impl StrataConfig {
    /// Config written by `strata init`: development and test databases
    /// under `db/`.
    pub fn starter() -> Self {
        let mut environments = BTreeMap::new();
        for env in ["development", "test"] {
            environments.insert(
                env.to_string(),
                EnvironmentConfig {
                    database: Some(format!("db/{env}.sqlite3")),
                },
            );
        }
        Self {
            environments,
            ..Self::default()
        }
    }

    /// Returns the database configured for `env`, as written in the config.
    ///
    /// The top-level `database` wins over the environment's entry.
    pub fn database_for(&self, env: &str) -> Option<&str> {
        self.database
            .as_deref()
            .or_else(|| self.environments.get(env).and_then(|e| e.database.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Loaded config
// ---------------------------------------------------------------------------

/// A [`StrataConfig`] together with the directory it resolves paths against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: StrataConfig,
    /// Directory relative paths are resolved against.
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    /// Resolves a path from the config against [`LoadedConfig::base_dir`].
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    /// The migration directory to use.
    pub fn migrations_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.migrations)
    }

    /// The database to use for `env`, or `None` for an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDatabase`] if nothing is configured.
    pub fn database(&self, env: &str) -> Result<Option<PathBuf>> {
        match self.config.database_for(env) {
            Some(IN_MEMORY_DATABASE) => Ok(None),
            Some(db) => Ok(Some(self.resolve_path(db))),
            None => Err(ConfigError::NoDatabase {
                env: env.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Builds the layered figment: defaults, then the file (if any), then
/// `STRATA_*` variables. Nested keys use `__`, e.g.
/// `STRATA_ENVIRONMENTS__TEST__DATABASE`.
pub fn figment(config_file: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(StrataConfig::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Yaml::file(path));
    }
    // STRATA_CONFIG and STRATA_ENV select the file and environment; they
    // are not config keys.
    figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config", "env"]).split("__"))
}

/// Load configuration from `config_file`, or from defaults and environment
/// variables alone when there is no file.
///
/// Relative paths resolve against the config file's directory, or against
/// `cwd` when there is no file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if a named file does not exist, or
/// [`ConfigError::Extract`] if the YAML or an environment value is invalid.
pub fn load_config(config_file: Option<&Path>, cwd: &Path) -> Result<LoadedConfig> {
    if let Some(path) = config_file {
        if !path.is_file() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
    }

    let config: StrataConfig = figment(config_file).extract()?;
    let base_dir = config_file
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());

    Ok(LoadedConfig { config, base_dir })
}

/// Save configuration as YAML to `path`.
///
/// The parent directory is created if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] on I/O failure or [`ConfigError::Serialize`]
/// if serialization fails.
pub fn save_config(path: &Path, config: &StrataConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
