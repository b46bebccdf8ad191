//! The decision function.
//!
//! A single ordered rule cascade replaces the scattered ad hoc role checks
//! a system like this tends to accumulate: every authorization question in
//! the workspace goes through [`PolicyEvaluator::decide`].

use crate::model::{AccessRequest, PermissionDecision};
use taskdeck_core::types::{Actor, Capability, FieldScope, ResourceKind, Role, Task};

/// Permission resolution engine.
///
/// Pure: two calls with identical inputs yield identical decisions. Rules
/// are evaluated top to bottom; the first matching rule wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEvaluator;

impl PolicyEvaluator {
    /// Create a new evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `actor` may exercise `request` against `task`.
    pub fn decide(&self, actor: &Actor, task: &Task, request: &AccessRequest) -> PermissionDecision {
        let decision = self.evaluate(actor, task, request);
        if !decision.allowed {
            tracing::debug!(
                actor = %actor.id,
                task = %task.id,
                capability = ?request.capability,
                reason = %decision.reason,
                "permission denied"
            );
        }
        decision
    }

    /// Convenience wrapper for the common case: a capability against a
    /// task, touching any field.
    pub fn decide_capability(
        &self,
        actor: &Actor,
        task: &Task,
        capability: Capability,
    ) -> PermissionDecision {
        self.decide(actor, task, &AccessRequest::new(capability))
    }

    fn evaluate(&self, actor: &Actor, task: &Task, request: &AccessRequest) -> PermissionDecision {
        let is_lead_of_either = actor.is_team_lead_of(task.requesting_department)
            || actor.is_team_lead_of(task.executing_department);
        let is_assignee = task.assigned_to == Some(actor.id);
        let is_creator = task.created_by == actor.id;

        // Rule 1: full-authority roles bypass all capability checks.
        if actor.role.is_full_authority() {
            return PermissionDecision::allow("full-authority role");
        }

        match request.capability {
            // Rule 2: deletion is reserved for full-authority roles.
            Capability::Delete => {
                PermissionDecision::deny("only a managing director or IT admin may delete")
            }

            // Rule 3: review approval/rejection needs a team lead of the
            // requesting or executing department.
            Capability::ApproveReview | Capability::RejectReview => {
                if is_lead_of_either {
                    PermissionDecision::allow("team lead of an involved department")
                } else {
                    PermissionDecision::deny(
                        "review decisions require a team lead of the requesting or executing department",
                    )
                }
            }

            // Rule 4: forward progression.
            Capability::MoveStage => {
                if is_assignee || is_creator || is_lead_of_either {
                    PermissionDecision::allow("assignee, creator, or involved team lead")
                } else {
                    PermissionDecision::deny("not the assignee, creator, or an involved team lead")
                }
            }

            // Rule 5: field edits.
            Capability::ModifyFields => {
                if is_creator || is_lead_of_either {
                    PermissionDecision::allow("creator or involved team lead")
                } else if actor.role == Role::Employee
                    && is_assignee
                    && request.field_scope == FieldScope::ProgressAndRemark
                {
                    PermissionDecision::allow("assignee editing progress/remark")
                } else {
                    PermissionDecision::deny("not permitted to modify these fields")
                }
            }

            // Rule 6: reads.
            Capability::View => {
                if is_creator || is_assignee || is_lead_of_either {
                    PermissionDecision::allow("creator, assignee, or involved team lead")
                } else if actor.role == Role::Employee
                    && request.resource == ResourceKind::OwnRecord
                {
                    PermissionDecision::allow("own user record")
                } else {
                    // Rule 7: default deny.
                    PermissionDecision::deny("no matching rule")
                }
            }
        }
    }
}
