//! Migration version identifiers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A monotonic, numerically ordered migration identifier.
///
/// Versions are the leading digits of a migration file name, usually a UTC
/// timestamp such as `20240102150405` or a sequence number such as `0001`.
/// Ordering and equality use the numeric value, so `0001` and `1` are the
/// same version. The original text is kept for display and storage.
#[derive(Debug, Clone)]
pub struct MigrationVersion {
    raw: String,
    value: u64,
}

impl MigrationVersion {
    /// Parses a version from a string of ASCII digits.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidVersion(s.to_string()));
        }
        let value = s
            .parse::<u64>()
            .map_err(|_| CoreError::InvalidVersion(s.to_string()))?;
        Ok(Self {
            raw: s.to_string(),
            value,
        })
    }

    /// Returns the version exactly as written in the file name.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the numeric value used for ordering.
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl PartialEq for MigrationVersion {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for MigrationVersion {}

impl Hash for MigrationVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for MigrationVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for MigrationVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MigrationVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
