//! SQLite-backed history store.

mod history;
pub mod schema;
mod store;
mod transaction;

pub use store::SqliteStore;
