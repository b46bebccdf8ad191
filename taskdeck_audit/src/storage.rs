//! Audit storage boundary.
//!
//! Durable persistence of the audit stream is an external collaborator;
//! this module defines the seam plus an in-memory reference
//! implementation. All reads return entries in `sequence_no` order.

use crate::entry::{AuditAction, AuditEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use taskdeck_core::error::StoreError;
use taskdeck_core::id::UserId;
use tokio::sync::RwLock;

/// Filter for audit queries and exports.
///
/// All criteria are optional and conjunctive. `offset`/`limit` paginate
/// the filtered, sequence-ordered result.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Match entries by acting user.
    pub actor_id: Option<UserId>,

    /// Match entries by action.
    pub action: Option<AuditAction>,

    /// Match entries by resource type label.
    pub resource_type: Option<String>,

    /// Match entries by resource identifier.
    pub resource_id: Option<String>,

    /// Match entries at or after this time.
    pub from: Option<DateTime<Utc>>,

    /// Match entries at or before this time.
    pub to: Option<DateTime<Utc>>,

    /// Skip this many matching entries.
    pub offset: usize,

    /// Return at most this many entries.
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// A filter matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one actor.
    pub fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Restrict to one action.
    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restrict to one resource type.
    pub fn with_resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }

    /// Restrict to one resource ID.
    pub fn with_resource_id(mut self, resource_id: &str) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    /// Restrict to a date range (inclusive on both ends).
    pub fn with_date_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Paginate the result.
    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Whether an entry matches the criteria (ignoring pagination).
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(actor_id) = self.actor_id {
            if entry.actor_id != Some(actor_id) {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(resource_type) = &self.resource_type {
            if entry.resource_type != *resource_type {
                return false;
            }
        }
        if let Some(resource_id) = &self.resource_id {
            if entry.resource_id.as_deref() != Some(resource_id.as_str()) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Storage seam for the audit stream.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Persist one entry. The trail guarantees `sequence_no` ordering; the
    /// backend only has to store what it is given.
    async fn append_raw(&self, entry: AuditEntry) -> Result<(), StoreError>;

    /// Read entries with `sequence_no` in `from..=to`.
    async fn read_range(&self, from: u64, to: u64) -> Result<Vec<AuditEntry>, StoreError>;

    /// Read entries matching a filter, in sequence order.
    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, StoreError>;

    /// The entry with the highest `sequence_no`, if any.
    async fn last(&self) -> Result<Option<AuditEntry>, StoreError>;

    /// Number of stored entries.
    async fn len(&self) -> Result<u64, StoreError>;
}

/// In-memory audit storage.
///
/// Entries are held in append order, which the trail keeps identical to
/// sequence order.
#[derive(Clone, Default)]
pub struct MemoryAuditStorage {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStorage {
    async fn append_raw(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn read_range(&self, from: u64, to: u64) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.sequence_no >= from && e.sequence_no <= to)
            .cloned()
            .collect())
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, StoreError> {
        let entries = self.entries.read().await;
        let iter = entries.iter().filter(|e| filter.matches(e)).skip(filter.offset);
        let result = match filter.limit {
            Some(limit) => iter.take(limit).cloned().collect(),
            None => iter.cloned().collect(),
        };
        Ok(result)
    }

    async fn last(&self) -> Result<Option<AuditEntry>, StoreError> {
        Ok(self.entries.read().await.last().cloned())
    }

    async fn len(&self) -> Result<u64, StoreError> {
        Ok(self.entries.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{compute_hash, GENESIS_HASH};
    use crate::entry::AuditDraft;

    fn entry(seq: u64, action: AuditAction) -> AuditEntry {
        let draft = AuditDraft::new(action, "task").with_resource_id(&format!("t-{seq}"));
        let mut entry =
            AuditEntry::from_draft(draft, seq, Utc::now(), GENESIS_HASH.to_string());
        entry.integrity_hash = compute_hash(&entry);
        entry
    }

    #[tokio::test]
    async fn test_append_and_read_range() {
        let storage = MemoryAuditStorage::new();
        for seq in 1..=5 {
            storage
                .append_raw(entry(seq, AuditAction::StateChange))
                .await
                .unwrap();
        }

        let range = storage.read_range(2, 4).await.unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].sequence_no, 2);
        assert_eq!(range[2].sequence_no, 4);
        assert_eq!(storage.len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_query_by_action_with_pagination() {
        let storage = MemoryAuditStorage::new();
        for seq in 1..=6 {
            let action = if seq % 2 == 0 {
                AuditAction::AccessDenied
            } else {
                AuditAction::StateChange
            };
            storage.append_raw(entry(seq, action)).await.unwrap();
        }

        let filter = AuditFilter::all()
            .with_action(AuditAction::AccessDenied)
            .with_page(1, 2);
        let result = storage.query(&filter).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].sequence_no, 4);
        assert_eq!(result[1].sequence_no, 6);
    }

    #[tokio::test]
    async fn test_last() {
        let storage = MemoryAuditStorage::new();
        assert!(storage.last().await.unwrap().is_none());

        storage
            .append_raw(entry(1, AuditAction::Create))
            .await
            .unwrap();
        storage
            .append_raw(entry(2, AuditAction::Update))
            .await
            .unwrap();
        assert_eq!(storage.last().await.unwrap().unwrap().sequence_no, 2);
    }
}
