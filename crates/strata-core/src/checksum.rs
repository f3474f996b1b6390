//! Checksums over migration script bodies.
//!
//! Produces a SHA-256 hex digest of the script with CRLF line endings
//! normalized to LF, so that a checkout on a different platform does not
//! look like an edited migration.

use sha2::{Digest, Sha256};

/// Computes the checksum of a migration script.
pub fn compute_checksum(sql: &str) -> String {
    let mut h = Sha256::new();
    let mut rest = sql;
    while let Some(idx) = rest.find("\r\n") {
        h.update(rest[..idx].as_bytes());
        h.update(b"\n");
        rest = &rest[idx + 2..];
    }
    h.update(rest.as_bytes());
    format!("{:x}", h.finalize())
}
