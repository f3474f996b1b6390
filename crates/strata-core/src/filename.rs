//! Parsing of migration file names.
//!
//! The accepted shape is `<version>_<name>[.<dialect>].<up|down>.sql`, for
//! example `20240102150405_create_users.up.sql` or
//! `0003_add_index.sqlite3.down.sql`.

use crate::unit::Direction;
use crate::version::MigrationVersion;

/// Dialect tags that target SQLite. Files tagged with anything else are
/// meant for another database and are ignored.
pub const SUPPORTED_DIALECTS: &[&str] = &["sqlite", "sqlite3"];

/// The components of a migration file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub version: MigrationVersion,
    pub name: String,
    pub dialect: Option<String>,
    pub direction: Direction,
}

impl ParsedFileName {
    /// Returns `true` if the file has no dialect tag or targets SQLite.
    pub fn is_supported_dialect(&self) -> bool {
        match &self.dialect {
            None => true,
            Some(d) => SUPPORTED_DIALECTS.contains(&d.as_str()),
        }
    }
}

/// Parses a migration file name, returning `None` if it does not match.
pub fn parse_file_name(file_name: &str) -> Option<ParsedFileName> {
    let stem = file_name.strip_suffix(".sql")?;

    let (stem, direction) = if let Some(s) = stem.strip_suffix(".up") {
        (s, Direction::Up)
    } else if let Some(s) = stem.strip_suffix(".down") {
        (s, Direction::Down)
    } else {
        return None;
    };

    let (version, rest) = stem.split_once('_')?;
    let version = MigrationVersion::parse(version).ok()?;

    let (name, dialect) = match rest.split_once('.') {
        Some((name, dialect)) => {
            if dialect.is_empty() || !dialect.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return None;
            }
            (name, Some(dialect.to_ascii_lowercase()))
        }
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }

    Some(ParsedFileName {
        version,
        name: name.to_string(),
        dialect,
        direction,
    })
}

/// Normalizes a user-supplied migration name to `snake_case`.
///
/// Runs of characters other than ASCII letters and digits collapse into a
/// single underscore, and CamelCase boundaries become underscores. Returns
/// an empty string if nothing usable remains.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}
