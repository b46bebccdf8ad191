//! Permission decisions.

use serde::{Deserialize, Serialize};

/// Outcome of a permission check.
///
/// Ephemeral: produced per call, consumed immediately by the caller, never
/// persisted on its own. On denial the reason is folded into the audit
/// entry's description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    /// Whether the operation is allowed.
    pub allowed: bool,

    /// Human-readable reason for the decision.
    pub reason: String,
}

impl PermissionDecision {
    /// An allowing decision.
    pub fn allow(reason: &str) -> Self {
        Self {
            allowed: true,
            reason: reason.to_string(),
        }
    }

    /// A denying decision.
    pub fn deny(reason: &str) -> Self {
        Self {
            allowed: false,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the operation is allowed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_deny() {
        assert!(PermissionDecision::allow("ok").is_allowed());
        assert!(!PermissionDecision::deny("no").is_allowed());
    }
}
