//! Core types for the strata migration engine.
//!
//! This crate knows nothing about databases. It models migration units and
//! applied records, discovers migration files on disk, and computes which
//! units an `up` or `down` run should touch.

pub mod checksum;
pub mod error;
pub mod filename;
pub mod plan;
pub mod record;
pub mod registry;
pub mod scaffold;
pub mod unit;
pub mod version;

pub use error::CoreError;
pub use plan::{MigrationState, StatusEntry};
pub use record::AppliedRecord;
pub use registry::Registry;
pub use unit::{Direction, MigrationScript, MigrationUnit};
pub use version::MigrationVersion;
