//! Request-side types consumed by the permission engine.

use serde::{Deserialize, Serialize};

/// One discrete permission being requested against a task.
///
/// This is a closed set; there is no string form at this layer. A malformed
/// capability cannot be represented, so the engine never has to handle one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Read the resource.
    View,

    /// Edit task fields (title, priority, progress, remark, ...).
    ModifyFields,

    /// Move the task along a forward edge other than into/out of review.
    MoveStage,

    /// Approve a task in review (`Review -> Done`).
    ApproveReview,

    /// Reject a task in review (`Review -> InProgress`).
    RejectReview,

    /// Hard-delete the task.
    Delete,
}

impl Capability {
    /// All capabilities, for exhaustive property checks.
    pub const ALL: [Capability; 6] = [
        Capability::View,
        Capability::ModifyFields,
        Capability::MoveStage,
        Capability::ApproveReview,
        Capability::RejectReview,
        Capability::Delete,
    ];
}

/// Which fields a `ModifyFields` request intends to touch.
///
/// Employees who are the assignee may edit only their progress and remark;
/// the distinction is carried on the request rather than inferred from a
/// field diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldScope {
    /// Any task field.
    All,

    /// Only `progress` and `remark`.
    ProgressAndRemark,
}

/// What kind of resource a `View` request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A task document.
    Task,

    /// The actor's own user record.
    OwnRecord,
}

/// Transport-level metadata carried with each mutating call so the audit
/// trail can record request origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client IP address as reported by the transport.
    pub ip_address: String,

    /// Client user agent string.
    pub user_agent: String,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(ip_address: &str, user_agent: &str) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Context for internally-originated operations (no transport).
    pub fn internal() -> Self {
        Self {
            ip_address: "127.0.0.1".to_string(),
            user_agent: "internal".to_string(),
        }
    }
}
