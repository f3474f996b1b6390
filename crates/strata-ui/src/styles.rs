//! Ayu color theme and styling functions for strata CLI output.
//!
//! Uses the Ayu Dark color palette.
//! Color source: <https://github.com/ayu-theme/ayu-colors>
//!
//! Only states that need attention get color: `pending` is highlighted,
//! `modified` and `missing` warn, `applied` is standard text.

use owo_colors::OwoColorize;
use strata_core::{MigrationState, StatusEntry};

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

/// Applied migration (checkmark).
pub const STATE_ICON_APPLIED: &str = "\u{2713}"; // ✓
/// Pending migration (hollow circle).
pub const STATE_ICON_PENDING: &str = "\u{25CB}"; // ○
/// Applied migration whose file changed.
pub const STATE_ICON_MODIFIED: &str = "\u{26A0}"; // ⚠
/// Applied migration with no file.
pub const STATE_ICON_MISSING: &str = "\u{2716}"; // ✖

pub const ICON_PASS: &str = "\u{2713}"; // ✓

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Core semantic render helpers
// ---------------------------------------------------------------------------

/// Renders text with pass (green) styling.
pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

/// Renders text with muted (gray) styling.
pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

/// Renders text with accent (blue) styling.
pub fn render_accent(s: &str) -> String {
    color_str(s, ACCENT)
}

/// Renders a column header in uppercase with accent color and bold.
pub fn render_header(s: &str) -> String {
    color_bold_str(&s.to_uppercase(), ACCENT)
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

// ---------------------------------------------------------------------------
// Migration state rendering
// ---------------------------------------------------------------------------

/// Returns the plain icon for a migration state.
pub fn state_icon(state: MigrationState) -> &'static str {
    match state {
        MigrationState::Applied => STATE_ICON_APPLIED,
        MigrationState::Pending => STATE_ICON_PENDING,
        MigrationState::Modified => STATE_ICON_MODIFIED,
        MigrationState::Missing => STATE_ICON_MISSING,
    }
}

fn state_color(state: MigrationState) -> Option<(u8, u8, u8)> {
    match state {
        MigrationState::Applied => None,
        MigrationState::Pending => Some(ACCENT),
        MigrationState::Modified => Some(WARN),
        MigrationState::Missing => Some(FAIL),
    }
}

/// Renders one status row: `<icon> <version>  <state>  <name>`.
///
/// `version_width` pads the version column so rows line up.
pub fn render_status_line(entry: &StatusEntry, version_width: usize) -> String {
    let icon = state_icon(entry.state);
    let icon = match state_color(entry.state) {
        Some(rgb) => color_str(icon, rgb),
        None => render_pass(icon),
    };
    // Pad before coloring so escape codes do not skew the width.
    let state = format!("{:<8}", entry.state.as_str());
    let state = match state_color(entry.state) {
        Some(rgb) => color_str(&state, rgb),
        None => state,
    };
    format!(
        "{} {:<width$}  {}  {}",
        icon,
        entry.version.as_str(),
        state,
        entry.name,
        width = version_width
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::MigrationVersion;

    fn entry(version: &str, name: &str, state: MigrationState) -> StatusEntry {
        StatusEntry {
            version: MigrationVersion::parse(version).unwrap(),
            name: name.to_string(),
            state,
            applied_at: None,
        }
    }

    #[test]
    fn state_icons_are_distinct() {
        let icons = [
            state_icon(MigrationState::Applied),
            state_icon(MigrationState::Pending),
            state_icon(MigrationState::Modified),
            state_icon(MigrationState::Missing),
        ];
        for (i, a) in icons.iter().enumerate() {
            for b in &icons[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn status_line_contains_fields() {
        let line = render_status_line(&entry("0002", "add_posts", MigrationState::Modified), 6);
        assert!(line.contains("0002"));
        assert!(line.contains("modified"));
        assert!(line.contains("add_posts"));
        assert!(line.contains(STATE_ICON_MODIFIED));
    }

    #[test]
    fn render_header_uppercases() {
        assert!(render_header("version").contains("VERSION"));
    }
}
