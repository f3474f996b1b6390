//! Terminal UI helpers for strata.
//!
//! Provides Ayu-themed color styling for migration states and terminal
//! detection for deciding when color is appropriate.

pub mod styles;
pub mod terminal;
