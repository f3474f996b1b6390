//! Clap CLI definitions for the `strata` command.

use clap::{Args, Parser, Subcommand};

/// strata -- SQL schema migrations for SQLite.
///
/// Applies versioned `.sql` migration files in order and records each one
/// in a history table.
#[derive(Parser, Debug)]
#[command(
    name = "strata",
    about = "SQL schema migrations for SQLite",
    long_about = "Applies versioned .sql migration files in order and records each applied migration in a history table.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: discover strata.yaml upwards from the current directory).
    #[arg(long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<String>,

    /// Environment whose database to use.
    #[arg(short = 'e', long, global = true, env = "STRATA_ENV", default_value = "development")]
    pub env: String,

    /// Database file, overriding the config (`:memory:` for a throwaway database).
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Directory containing migration files (default: config `migrations`, then ./migrations).
    #[arg(short = 'p', long, global = true)]
    pub path: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run, revert, inspect, or create migrations.
    Migrate(MigrateArgs),

    /// Write a starter strata.yaml and migrations directory.
    Init(InitArgs),

    /// Print version information.
    Version,

    /// Generate shell completion scripts.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// migrate
// ---------------------------------------------------------------------------

/// Arguments for `strata migrate`. Without a subcommand it behaves like `up`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: Option<MigrateCommands>,
}

/// Migrate subcommands.
#[derive(Subcommand, Debug)]
pub enum MigrateCommands {
    /// Apply pending migrations.
    Up(UpArgs),

    /// Revert the most recently applied migrations.
    Down(DownArgs),

    /// Show the state of every migration.
    Status,

    /// Revert every applied migration, then apply them all again.
    Reset,

    /// Create an empty up/down migration pair.
    Create(CreateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpArgs {
    /// Number of pending migrations to apply (0 or less applies all).
    #[arg(short = 's', long, default_value_t = 0, allow_negative_numbers = true)]
    pub step: i64,

    /// Apply pending migrations older than the newest applied one.
    #[arg(long)]
    pub allow_out_of_order: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DownArgs {
    /// Number of migrations to revert (0 or less reverts all).
    #[arg(short = 's', long, default_value_t = 1, allow_negative_numbers = true)]
    pub step: i64,
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Migration name, normalized to snake_case.
    pub name: String,
}

// ---------------------------------------------------------------------------
// init / completion
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing strata.yaml.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
