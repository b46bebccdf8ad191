//! Hash-chain computation.
//!
//! `integrity_hash = SHA-256(canonical(entry without hashes) || prev_hash)`.
//! The canonical form feeds each field to the hasher in a fixed order with
//! a unit-separator byte between fields, so reordering or merging field
//! contents cannot produce the same digest.

use crate::entry::AuditEntry;
use chrono::SecondsFormat;
use sha2::{Digest, Sha256};

/// `prev_hash` of the first entry in a stream.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

const FIELD_SEPARATOR: [u8; 1] = [0x1f];

/// Compute the integrity hash for an entry, using the `prev_hash` it
/// carries. The entry's own `integrity_hash` field is ignored.
pub fn compute_hash(entry: &AuditEntry) -> String {
    let mut hasher = Sha256::new();

    let mut field = |bytes: &[u8]| {
        hasher.update(bytes);
        hasher.update(FIELD_SEPARATOR);
    };

    field(entry.id.to_string().as_bytes());
    field(entry.sequence_no.to_string().as_bytes());
    field(
        entry
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    field(
        entry
            .actor_id
            .map(|id| id.to_string())
            .unwrap_or_default()
            .as_bytes(),
    );
    field(entry.action.label().as_bytes());
    field(entry.resource_type.as_bytes());
    field(entry.resource_id.as_deref().unwrap_or_default().as_bytes());
    field(entry.description.as_bytes());
    field(canonical_json(&entry.before_snapshot).as_bytes());
    field(canonical_json(&entry.after_snapshot).as_bytes());
    field(entry.ip_address.as_bytes());
    field(entry.user_agent.as_bytes());
    field(entry.prev_hash.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// Verify a single entry: recompute its hash from the stored fields and
/// `prev_hash` and compare against the stored `integrity_hash`.
pub fn verify_entry(entry: &AuditEntry) -> bool {
    compute_hash(entry) == entry.integrity_hash
}

// serde_json maps are ordered (BTreeMap keys), so this is deterministic.
fn canonical_json(value: &Option<serde_json::Value>) -> String {
    match value {
        Some(v) => serde_json::to_string(v).unwrap_or_default(),
        None => String::new(),
    }
}
