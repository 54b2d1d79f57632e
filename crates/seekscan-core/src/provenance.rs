//! Provenance and schema descriptors attached to persisted records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance information attached to every persisted experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Provenance {
    /// SHA-256 of the canonical JSON of the geometric payload.
    pub fingerprint: String,
    /// RFC 3339 timestamp recording when the record was written.
    pub created_at: String,
    /// Version map for the tools involved in producing the record.
    #[serde(default)]
    pub tool_versions: BTreeMap<String, String>,
}

impl Provenance {
    /// Stamps a fingerprint with the current time and this crate's version.
    pub fn stamped(fingerprint: String) -> Self {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        Self {
            fingerprint,
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_versions,
        }
    }
}
