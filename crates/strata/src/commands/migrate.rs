//! `strata migrate` -- apply, revert, inspect, and create migrations.
//!
//! Every subcommand that touches the database builds a [`FileMigrator`]
//! from the resolved migration directory and database, then calls one
//! [`Migrate`] operation on it. Errors from the migrator are returned as-is.
//!
//! [`FileMigrator`]: strata_storage::FileMigrator

use anyhow::Result;
use chrono::Utc;
use strata_core::scaffold::create_migration;
use strata_storage::{DownReport, Migrate, UpReport};
use strata_ui::styles::{render_accent, render_muted, render_pass_icon};

use crate::cli::{CreateArgs, DownArgs, MigrateArgs, MigrateCommands, UpArgs};
use crate::context::RuntimeContext;
use crate::output::{format_status_summary, format_status_table, output_json};

/// Execute `strata migrate`.
pub fn run(ctx: &RuntimeContext, args: &MigrateArgs) -> Result<()> {
    match &args.command {
        None => run_up(ctx, &UpArgs::default()),
        Some(MigrateCommands::Up(up)) => run_up(ctx, up),
        Some(MigrateCommands::Down(down)) => run_down(ctx, down),
        Some(MigrateCommands::Status) => run_status(ctx),
        Some(MigrateCommands::Reset) => run_reset(ctx),
        Some(MigrateCommands::Create(create)) => run_create(ctx, create),
    }
}

/// Applies up to `step` pending migrations; zero or a negative step applies
/// all of them.
pub fn apply_up<M: Migrate + ?Sized>(migrator: &M, step: i64) -> Result<UpReport> {
    Ok(migrator.up_to(step_count(step))?)
}

/// Reverts the `step` most recent migrations; zero or a negative step
/// reverts all of them.
pub fn apply_down<M: Migrate + ?Sized>(migrator: &M, step: i64) -> Result<DownReport> {
    Ok(migrator.down(step_count(step))?)
}

/// Maps a command-line step to the migrator's count, where `0` means all.
fn step_count(step: i64) -> usize {
    usize::try_from(step.max(0)).unwrap_or(usize::MAX)
}

fn run_up(ctx: &RuntimeContext, args: &UpArgs) -> Result<()> {
    let migrator = ctx.migrator(args.allow_out_of_order)?;
    let report = apply_up(&migrator, args.step)?;

    if ctx.json {
        output_json(&report);
    } else if !ctx.quiet {
        print_up(&report);
    }
    Ok(())
}

fn run_down(ctx: &RuntimeContext, args: &DownArgs) -> Result<()> {
    let migrator = ctx.migrator(false)?;
    let report = apply_down(&migrator, args.step)?;

    if ctx.json {
        output_json(&report);
    } else if !ctx.quiet {
        print_down(&report);
    }
    Ok(())
}

fn run_status(ctx: &RuntimeContext) -> Result<()> {
    let migrator = ctx.migrator(false)?;
    let entries = migrator.status()?;

    if ctx.json {
        output_json(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        let dir = migrator.registry().dir().map(|d| ctx.display_path(d).to_string());
        println!(
            "No migrations found in {}",
            dir.unwrap_or_else(|| "the migration directory".to_string())
        );
        return Ok(());
    }

    for line in format_status_table(&entries) {
        println!("{line}");
    }
    if !ctx.quiet {
        println!();
        println!("{}", format_status_summary(&entries));
    }
    Ok(())
}

fn run_reset(ctx: &RuntimeContext) -> Result<()> {
    let migrator = ctx.migrator(false)?;
    let report = migrator.reset()?;

    if ctx.json {
        output_json(&report);
    } else if !ctx.quiet {
        print_down(&report.down);
        print_up(&report.up);
    }
    Ok(())
}

fn run_create(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    let loaded = ctx.load_config()?;
    let dir = ctx.migrations_dir(&loaded);
    let created = create_migration(&dir, &args.name, Utc::now())?;

    if ctx.json {
        output_json(&serde_json::json!({
            "version": created.version,
            "name": created.name,
            "up": created.up,
            "down": created.down,
        }));
    } else if !ctx.quiet {
        println!("{} {}", render_pass_icon(), ctx.display_path(&created.up));
        println!("{} {}", render_pass_icon(), ctx.display_path(&created.down));
    }
    Ok(())
}

fn print_up(report: &UpReport) {
    if report.applied.is_empty() {
        println!("Migrations already up to date, nothing to apply.");
        return;
    }
    for outcome in &report.applied {
        println!("> {}", outcome.file_name);
    }
    println!();
    println!(
        "Successfully applied {} migrations. {}",
        report.applied.len(),
        render_muted(&format!("({:.4} seconds)", report.elapsed.as_secs_f64()))
    );
}

fn print_down(report: &DownReport) {
    if report.reverted.is_empty() {
        println!("No applied migrations to revert.");
        return;
    }
    for outcome in &report.reverted {
        println!("< {}", render_accent(&outcome.file_name));
    }
    println!();
    println!(
        "Successfully reverted {} migrations. {}",
        report.reverted.len(),
        render_muted(&format!("({:.4} seconds)", report.elapsed.as_secs_f64()))
    );
}
