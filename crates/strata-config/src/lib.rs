//! Configuration management for strata.
//!
//! This crate finds `strata.yaml`, layers it with `STRATA_*` environment
//! variables, and resolves the database and migration directory a command
//! should use.

pub mod config;
pub mod project_dir;

pub use config::{ConfigError, EnvironmentConfig, LoadedConfig, StrataConfig};
