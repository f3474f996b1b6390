//! Output helpers for the `strata` CLI.

use std::io::{self, Write};

use serde::Serialize;
use strata_core::StatusEntry;
use strata_ui::styles::{render_header, render_muted, render_status_line};

/// Print a value as pretty-printed JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Formats the `migrate status` table, one line per entry, header first.
pub fn format_status_table(entries: &[StatusEntry]) -> Vec<String> {
    let width = entries
        .iter()
        .map(|e| e.version.as_str().len())
        .max()
        .unwrap_or(0)
        .max("version".len());

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!(
        "  {}  {}  {}",
        render_header(&format!("{:<width$}", "version")),
        render_header(&format!("{:<8}", "state")),
        render_header("name"),
    ));
    for entry in entries {
        lines.push(render_status_line(entry, width));
    }
    lines
}

/// One-line summary such as `2 applied, 1 pending`.
pub fn format_status_summary(entries: &[StatusEntry]) -> String {
    use std::collections::BTreeMap;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.state.as_str()).or_default() += 1;
    }
    let parts: Vec<String> = counts.iter().map(|(state, n)| format!("{n} {state}")).collect();
    render_muted(&parts.join(", "))
}
