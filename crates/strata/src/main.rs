//! `strata` -- SQL schema migrations for SQLite.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Exit status after Ctrl+C (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Log filter used with `--verbose`.
const VERBOSE_FILTER: &str = "strata=debug,strata_core=debug,strata_storage=debug,strata_config=debug";

fn main() {
    // An interrupted run is a failed run. The open transaction is rolled
    // back by SQLite and the migration lock is dropped with the process.
    let _ = ctrlc::set_handler(|| {
        eprintln!("Interrupted");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });

    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);

    if ctx.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(VERBOSE_FILTER)
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match &cli.command {
        Some(Commands::Migrate(args)) => commands::migrate::run(&ctx, args),
        Some(Commands::Init(args)) => commands::init::run(&ctx, args),
        Some(Commands::Version) => commands::version::run(&ctx),
        Some(Commands::Completion(args)) => commands::completion::run(args),
        None => {
            // No subcommand -- print help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    // Handle errors: print message and exit with code 1
    if let Err(e) = result {
        if ctx.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
