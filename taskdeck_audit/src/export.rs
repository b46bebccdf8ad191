//! Audit export for compliance reporting.
//!
//! Both formats reproduce entries in `sequence_no` order and include the
//! integrity hash, so an external party can re-verify the chain without
//! access to this system.

use crate::entry::AuditEntry;
use crate::storage::{AuditFilter, AuditStorage};
use crate::trail::AuditTrail;
use chrono::SecondsFormat;
use taskdeck_core::error::AuditError;

/// Columns of the CSV export, in order.
const CSV_HEADER: &str = "sequence_no,timestamp,actor_id,action,resource_type,resource_id,description,ip_address,user_agent,prev_hash,integrity_hash";

/// Render entries as newline-delimited JSON, one entry per line.
pub fn to_ndjson(entries: &[AuditEntry]) -> Result<String, AuditError> {
    let mut out = String::new();
    for entry in entries {
        let line = serde_json::to_string(entry)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Render entries as flat CSV rows with a header line. Snapshots are
/// omitted; the JSON export carries them.
pub fn to_csv(entries: &[AuditEntry]) -> String {
    let mut out = String::with_capacity(entries.len() * 128);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for entry in entries {
        let row = [
            entry.sequence_no.to_string(),
            entry
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            entry
                .actor_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            entry.action.label().to_string(),
            entry.resource_type.clone(),
            entry.resource_id.clone().unwrap_or_default(),
            entry.description.clone(),
            entry.ip_address.clone(),
            entry.user_agent.clone(),
            entry.prev_hash.clone(),
            entry.integrity_hash.clone(),
        ];
        let escaped: Vec<String> = row.iter().map(|field| escape_csv(field)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }
    out
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl<S: AuditStorage> AuditTrail<S> {
    /// Export matching entries as newline-delimited JSON.
    pub async fn export_json(&self, filter: &AuditFilter) -> Result<String, AuditError> {
        let entries = self.query(filter).await?;
        to_ndjson(&entries)
    }

    /// Export matching entries as CSV.
    pub async fn export_csv(&self, filter: &AuditFilter) -> Result<String, AuditError> {
        let entries = self.query(filter).await?;
        Ok(to_csv(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuditAction, AuditDraft};
    use crate::storage::MemoryAuditStorage;

    async fn trail() -> AuditTrail<MemoryAuditStorage> {
        let trail = AuditTrail::open(MemoryAuditStorage::new()).await.unwrap();
        for i in 0..3 {
            trail
                .append(
                    AuditDraft::new(AuditAction::StateChange, "task")
                        .with_resource_id(&format!("t-{i}"))
                        .with_description(&format!("entry {i}")),
                )
                .await;
        }
        trail
    }

    #[tokio::test]
    async fn test_ndjson_one_line_per_entry_in_order() {
        let trail = trail().await;
        let out = trail.export_json(&AuditFilter::all()).await.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let entry: AuditEntry = serde_json::from_str(line).unwrap();
            assert_eq!(entry.sequence_no, i as u64 + 1);
            assert!(!entry.integrity_hash.is_empty());
        }
    }

    #[tokio::test]
    async fn test_csv_has_header_and_hashes() {
        let trail = trail().await;
        let out = trail.export_csv(&AuditFilter::all()).await.unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("1,"));
        assert!(lines[3].starts_with("3,"));
        // Each row ends with a 64-char hash.
        let last_field = lines[1].rsplit(',').next().unwrap();
        assert_eq!(last_field.len(), 64);
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
