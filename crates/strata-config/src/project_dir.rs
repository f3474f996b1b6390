//! Discovery of the project's `strata.yaml`.
//!
//! The config file marks the root of a strata project. Commands run from a
//! subdirectory find it by walking up the directory tree.

use std::path::{Path, PathBuf};

/// File names recognised as a strata config, in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &["strata.yaml", "strata.yml"];

/// Walk up the directory tree from `start` looking for a config file.
///
/// Returns the path of the first match, or `None` if the filesystem root is
/// reached without finding one.
///
/// # Examples
///
/// ```no_run
/// use strata_config::project_dir::find_config_file;
/// use std::path::Path;
///
/// if let Some(file) = find_config_file(Path::new(".")) {
///     println!("Using {}", file.display());
/// }
/// ```
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    // Canonicalize the start path so we get absolute paths.
    let start = start.canonicalize().ok()?;

    let mut current = start.as_path();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent;
            }
            _ => break, // Reached filesystem root.
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
