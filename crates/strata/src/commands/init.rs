//! `strata init` -- write a starter `strata.yaml` and migrations directory.

use std::fs;

use anyhow::{Context, Result, bail};
use strata_config::config::save_config;
use strata_config::StrataConfig;

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Name of the config file written by `init`.
const CONFIG_FILE: &str = "strata.yaml";

/// Execute the `strata init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE);

    if !args.force && config_path.exists() {
        bail!(
            "Found existing config at {}\n\n\
            This project is already initialized.\n\n\
            Use --force to overwrite it.",
            config_path.display()
        );
    }

    let config = StrataConfig::starter();
    save_config(&config_path, &config)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    let migrations_dir = match &ctx.path {
        Some(p) => p.clone(),
        None => ctx.cwd.join(&config.migrations),
    };
    fs::create_dir_all(&migrations_dir)
        .with_context(|| format!("failed to create directory: {}", migrations_dir.display()))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "config": config_path,
            "migrations": migrations_dir,
        }));
    } else if !ctx.quiet {
        println!();
        println!("strata initialized successfully!");
        println!();
        println!("  Config: {}", config_path.display());
        println!("  Migrations: {}", migrations_dir.display());
        println!();
        println!("Run `strata migrate create <name>` to write your first migration.");
        println!();
    }

    Ok(())
}
