//! Audit entries and drafts.
//!
//! [`AuditEntry`] is immutable once written and only constructed inside
//! this crate; callers describe what happened with an [`AuditDraft`] and
//! the trail fills in sequence number, timestamp and hashes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_core::id::{AuditEntryId, UserId};
use taskdeck_core::types::RequestContext;

/// The closed set of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// Resource created.
    Create,

    /// Resource fields updated.
    Update,

    /// Resource deleted.
    Delete,

    /// Kanban stage transition applied.
    StateChange,

    /// Permission check denied an operation.
    AccessDenied,

    /// Actor logged in.
    Login,

    /// Actor logged out.
    Logout,

    /// Operational error worth recording.
    Error,
}

impl AuditAction {
    /// Stable lowercase label, used by exports.
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::StateChange => "state_change",
            AuditAction::AccessDenied => "access_denied",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::Error => "error",
        }
    }
}

/// One immutable record in the audit stream.
///
/// `sequence_no` is strictly increasing and gapless within a stream;
/// `prev_hash` and `integrity_hash` form the tamper-evidence chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier.
    pub id: AuditEntryId,

    /// Position in the stream, 1-based, gapless.
    pub sequence_no: u64,

    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,

    /// Actor that triggered the recorded operation, if any.
    pub actor_id: Option<UserId>,

    /// What happened.
    pub action: AuditAction,

    /// Resource type label, e.g. `"task"`.
    pub resource_type: String,

    /// Resource identifier, if the action targets one resource.
    pub resource_id: Option<String>,

    /// Human-readable description; denial reasons land here.
    pub description: String,

    /// Resource state before the mutation, if applicable.
    pub before_snapshot: Option<serde_json::Value>,

    /// Resource state after the mutation, if applicable.
    pub after_snapshot: Option<serde_json::Value>,

    /// Request origin IP address.
    pub ip_address: String,

    /// Request origin user agent.
    pub user_agent: String,

    /// The previous entry's `integrity_hash` (genesis constant for the
    /// first entry).
    pub prev_hash: String,

    /// SHA-256 over the canonical entry and `prev_hash`, lowercase hex.
    pub integrity_hash: String,
}

/// Caller-side description of an auditable event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDraft {
    /// Actor that triggered the operation, if any.
    pub actor_id: Option<UserId>,

    /// What happened.
    pub action: AuditAction,

    /// Resource type label.
    pub resource_type: String,

    /// Resource identifier.
    pub resource_id: Option<String>,

    /// Human-readable description.
    pub description: String,

    /// Resource state before the mutation.
    pub before_snapshot: Option<serde_json::Value>,

    /// Resource state after the mutation.
    pub after_snapshot: Option<serde_json::Value>,

    /// Request origin IP address.
    pub ip_address: String,

    /// Request origin user agent.
    pub user_agent: String,
}

impl AuditDraft {
    /// Create a draft for an action on a resource type.
    pub fn new(action: AuditAction, resource_type: &str) -> Self {
        Self {
            actor_id: None,
            action,
            resource_type: resource_type.to_string(),
            resource_id: None,
            description: String::new(),
            before_snapshot: None,
            after_snapshot: None,
            ip_address: String::new(),
            user_agent: String::new(),
        }
    }

    /// Set the acting user.
    pub fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Set the target resource ID.
    pub fn with_resource_id(mut self, resource_id: &str) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set the before snapshot.
    pub fn with_before<T: Serialize>(mut self, before: &T) -> Self {
        self.before_snapshot = serde_json::to_value(before).ok();
        self
    }

    /// Set the after snapshot.
    pub fn with_after<T: Serialize>(mut self, after: &T) -> Self {
        self.after_snapshot = serde_json::to_value(after).ok();
        self
    }

    /// Attach request origin metadata.
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.ip_address = ctx.ip_address.clone();
        self.user_agent = ctx.user_agent.clone();
        self
    }
}

impl AuditEntry {
    /// Build an entry from a draft. Hashes are filled in by the trail,
    /// which is the only caller.
    pub(crate) fn from_draft(
        draft: AuditDraft,
        sequence_no: u64,
        timestamp: DateTime<Utc>,
        prev_hash: String,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            sequence_no,
            timestamp,
            actor_id: draft.actor_id,
            action: draft.action,
            resource_type: draft.resource_type,
            resource_id: draft.resource_id,
            description: draft.description,
            before_snapshot: draft.before_snapshot,
            after_snapshot: draft.after_snapshot,
            ip_address: draft.ip_address,
            user_agent: draft.user_agent,
            prev_hash,
            integrity_hash: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_builder() {
        let actor = UserId::new();
        let draft = AuditDraft::new(AuditAction::StateChange, "task")
            .with_actor(actor)
            .with_resource_id("t-1")
            .with_description("moved")
            .with_context(&RequestContext::new("10.0.0.1", "test-agent"));

        assert_eq!(draft.actor_id, Some(actor));
        assert_eq!(draft.resource_type, "task");
        assert_eq!(draft.resource_id.as_deref(), Some("t-1"));
        assert_eq!(draft.ip_address, "10.0.0.1");
        assert_eq!(draft.user_agent, "test-agent");
    }

    #[test]
    fn test_action_labels_are_stable() {
        assert_eq!(AuditAction::StateChange.label(), "state_change");
        assert_eq!(AuditAction::AccessDenied.label(), "access_denied");
    }
}
