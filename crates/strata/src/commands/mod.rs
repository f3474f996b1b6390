//! Command handlers, one module per subcommand.

pub mod completion;
pub mod init;
pub mod migrate;
pub mod version;
