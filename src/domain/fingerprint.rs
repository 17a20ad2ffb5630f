use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::snapshot::SchemaSnapshot;

/// SHA-256 hex fingerprint of a snapshot's structure.
///
/// Two snapshots with the same fingerprint compare as identical, so callers
/// can store it and skip a full comparison when nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Returns the raw hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Compute a SHA-256 fingerprint of a snapshot.
///
/// Algorithm:
/// 1. The database info, every table and every stored procedure are
///    serialised to canonical JSON (records are `BTreeMap`s, so keys are sorted).
/// 2. Table and procedure lines are sorted so the result does not depend on
///    the order the catalog returned them in.
/// 3. Lines are joined with `\n` and hashed.
///
/// Fetch failures are not part of the fingerprint.
pub fn fingerprint(snapshot: &SchemaSnapshot) -> Fingerprint {
    let mut lines: Vec<String> = snapshot
        .tables
        .iter()
        .map(|t| serde_json::to_string(t).unwrap_or_default())
        .chain(
            snapshot
                .stored_procedures
                .iter()
                .flatten()
                .map(|p| format!("proc:{}", serde_json::to_string(p).unwrap_or_default())),
        )
        .collect();

    lines.sort_unstable();
    lines.insert(
        0,
        serde_json::to_string(&snapshot.database_info).unwrap_or_default(),
    );

    let hash = Sha256::digest(lines.join("\n").as_bytes());
    Fingerprint(format!("{:x}", hash))
}
