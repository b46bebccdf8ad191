//! The Kanban state machine.
//!
//! [`StateMachine`] owns every mutation of a task: creation, field edits,
//! stage moves and deletion. It consults the permission engine before
//! touching anything, writes through the audit trail on every accepted or
//! rejected mutation attempt, and publishes stage changes to the event
//! bus.
//!
//! # Ordering of effects
//!
//! For `move_stage`: structural validation, then permission, then the CAS
//! save, then the audit entry, then the event. A storage failure aborts
//! before anything is audited; an audit failure after the save is
//! swallowed (the mutation has already been committed) and only logged.

use crate::transition::{EdgeRequirement, TransitionTable};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use taskdeck_audit::{AuditAction, AuditDraft, AuditStorage, AuditTrail};
use taskdeck_core::bus::{EventBus, StageChanged, TOPIC_STAGE_CHANGED};
use taskdeck_core::error::{StoreError, WorkflowError};
use taskdeck_core::id::{TaskId, UserId};
use taskdeck_core::store::TaskStore;
use taskdeck_core::types::{
    Actor, Capability, FieldScope, KanbanStage, Priority, RequestContext, Role, Task, TaskDraft,
};
use taskdeck_policy::{AccessRequest, PermissionDecision, PolicyEvaluator};

const RESOURCE_TASK: &str = "task";

/// A partial update to a task's editable fields. `None` leaves a field
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,

    /// New priority.
    pub priority: Option<Priority>,

    /// New progress value in `[0, 99]` (100 is owned by the `Done` stage).
    pub progress: Option<u8>,

    /// New remark.
    pub remark: Option<String>,

    /// New due date.
    pub due_date: Option<DateTime<Utc>>,

    /// New assignee.
    pub assigned_to: Option<UserId>,
}

impl TaskPatch {
    /// Whether the patch touches only progress and remark, the scope an
    /// employee assignee is allowed to edit.
    pub fn is_progress_and_remark_only(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }
}

/// The task lifecycle state machine.
///
/// Generic over its collaborators so embedding layers can substitute real
/// persistence and delivery; the in-memory implementations from
/// `taskdeck_core` and `taskdeck_audit` back the tests.
pub struct StateMachine<TS, AS, B> {
    tasks: Arc<TS>,
    policy: PolicyEvaluator,
    audit: Arc<AuditTrail<AS>>,
    bus: Arc<B>,
}

impl<TS, AS, B> StateMachine<TS, AS, B>
where
    TS: TaskStore,
    AS: AuditStorage,
    B: EventBus,
{
    /// Create a state machine over the given collaborators.
    pub fn new(tasks: Arc<TS>, audit: Arc<AuditTrail<AS>>, bus: Arc<B>) -> Self {
        Self {
            tasks,
            policy: PolicyEvaluator::new(),
            audit,
            bus,
        }
    }

    /// Create a task. Tasks enter the workflow at [`KanbanStage::Backlog`]
    /// and may only be created by team leads and full-authority roles.
    pub async fn create_task(
        &self,
        actor: &Actor,
        ctx: &RequestContext,
        draft: TaskDraft,
    ) -> Result<Task, WorkflowError> {
        if actor.role.rank() < Role::TeamLead.rank() {
            let reason = "only team leads and above may create tasks";
            self.audit_denial(actor, ctx, None, reason).await;
            return Err(WorkflowError::Forbidden(reason.to_string()));
        }

        let task = draft.into_task(actor.id);
        let task = self
            .tasks
            .insert(task)
            .await
            .map_err(map_store_error)?;

        self.audit_best_effort(
            AuditDraft::new(AuditAction::Create, RESOURCE_TASK)
                .with_actor(actor.id)
                .with_resource_id(&task.id.to_string())
                .with_description(&format!("created task '{}'", task.title))
                .with_after(&task.snapshot())
                .with_context(ctx),
        )
        .await;

        tracing::info!(task = %task.id, actor = %actor.id, "task created");
        Ok(task)
    }

    /// Move a task to `target`, enforcing the transition table and the
    /// permission rules for the edge.
    ///
    /// The reject edge (`Review -> InProgress`) must carry a non-empty
    /// `reason`, which is appended to the task's remark.
    pub async fn move_stage(
        &self,
        actor: &Actor,
        ctx: &RequestContext,
        task_id: TaskId,
        target: KanbanStage,
        reason: Option<&str>,
    ) -> Result<Task, WorkflowError> {
        let task = self.load(task_id).await?;
        let current = task.kanban_stage;

        // Structurally impossible moves fail before any permission check
        // and are never audited.
        let requirement = TransitionTable::requirement(current, target).ok_or(
            WorkflowError::InvalidTransition {
                from: current,
                to: target,
            },
        )?;

        let reject_reason = if TransitionTable::is_reject_edge(current, target) {
            match reason.map(str::trim) {
                Some(r) if !r.is_empty() => Some(r.to_string()),
                _ => {
                    return Err(WorkflowError::InvalidTransition {
                        from: current,
                        to: target,
                    })
                }
            }
        } else {
            None
        };

        let decision = self.decide_edge(actor, &task, requirement);
        if !decision.is_allowed() {
            self.audit_denial(actor, ctx, Some(&task), &decision.reason)
                .await;
            return Err(WorkflowError::Forbidden(decision.reason));
        }

        let before = task.snapshot();
        let mut updated = task;
        updated.kanban_stage = target;
        match target {
            KanbanStage::Done => updated.progress = 100,
            _ if TransitionTable::is_reopen_edge(current, target) => {
                // Reopened work starts its progress over.
                updated.progress = 0;
            }
            _ => {}
        }
        if let Some(r) = reject_reason {
            if !updated.remark.is_empty() {
                updated.remark.push('\n');
            }
            updated.remark.push_str(&r);
        }

        let saved = self
            .tasks
            .save(updated, before.version)
            .await
            .map_err(map_store_error)?;

        self.audit_best_effort(
            AuditDraft::new(AuditAction::StateChange, RESOURCE_TASK)
                .with_actor(actor.id)
                .with_resource_id(&saved.id.to_string())
                .with_description(&format!("stage {current:?} -> {target:?}"))
                .with_before(&before)
                .with_after(&saved.snapshot())
                .with_context(ctx),
        )
        .await;

        self.publish_stage_change(saved.id, current, target);

        tracing::info!(task = %saved.id, from = ?current, to = ?target, "stage changed");
        Ok(saved)
    }

    /// Apply a field patch to a task under the `ModifyFields` capability.
    pub async fn update_fields(
        &self,
        actor: &Actor,
        ctx: &RequestContext,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> Result<Task, WorkflowError> {
        let task = self.load(task_id).await?;

        if let Some(progress) = patch.progress {
            // 100 is set by the approval edge, never by a field edit.
            if progress > 99 {
                return Err(WorkflowError::Validation(format!(
                    "progress must be in 0..=99, got {progress}"
                )));
            }
        }

        let scope = if patch.is_progress_and_remark_only() {
            FieldScope::ProgressAndRemark
        } else {
            FieldScope::All
        };
        let request = AccessRequest::new(Capability::ModifyFields).with_field_scope(scope);
        let decision = self.policy.decide(actor, &task, &request);
        if !decision.is_allowed() {
            self.audit_denial(actor, ctx, Some(&task), &decision.reason)
                .await;
            return Err(WorkflowError::Forbidden(decision.reason));
        }

        let before = task.snapshot();
        let mut updated = task;
        if let Some(title) = patch.title {
            updated.title = title;
        }
        if let Some(priority) = patch.priority {
            updated.priority = priority;
        }
        if let Some(progress) = patch.progress {
            if updated.kanban_stage != KanbanStage::Done {
                updated.progress = progress;
            }
        }
        if let Some(remark) = patch.remark {
            updated.remark = remark;
        }
        if let Some(due_date) = patch.due_date {
            updated.due_date = Some(due_date);
        }
        if let Some(assigned_to) = patch.assigned_to {
            updated.assigned_to = Some(assigned_to);
        }

        let saved = self
            .tasks
            .save(updated, before.version)
            .await
            .map_err(map_store_error)?;

        self.audit_best_effort(
            AuditDraft::new(AuditAction::Update, RESOURCE_TASK)
                .with_actor(actor.id)
                .with_resource_id(&saved.id.to_string())
                .with_description("fields updated")
                .with_before(&before)
                .with_after(&saved.snapshot())
                .with_context(ctx),
        )
        .await;

        Ok(saved)
    }

    /// Hard-delete a task. Reserved for full-authority roles via the
    /// `Delete` capability.
    pub async fn delete_task(
        &self,
        actor: &Actor,
        ctx: &RequestContext,
        task_id: TaskId,
    ) -> Result<Task, WorkflowError> {
        let task = self.load(task_id).await?;

        let decision = self
            .policy
            .decide_capability(actor, &task, Capability::Delete);
        if !decision.is_allowed() {
            self.audit_denial(actor, ctx, Some(&task), &decision.reason)
                .await;
            return Err(WorkflowError::Forbidden(decision.reason));
        }

        let before = task.snapshot();
        let removed = self
            .tasks
            .remove(task_id)
            .await
            .map_err(map_store_error)?;

        self.audit_best_effort(
            AuditDraft::new(AuditAction::Delete, RESOURCE_TASK)
                .with_actor(actor.id)
                .with_resource_id(&removed.id.to_string())
                .with_description(&format!("deleted task '{}'", removed.title))
                .with_before(&before)
                .with_context(ctx),
        )
        .await;

        tracing::info!(task = %removed.id, actor = %actor.id, "task deleted");
        Ok(removed)
    }

    async fn load(&self, task_id: TaskId) -> Result<Task, WorkflowError> {
        self.tasks.load(task_id).await.map_err(|err| match err {
            StoreError::NotFound(_) => WorkflowError::NotFound(task_id),
            other => WorkflowError::StorageFailure(other.to_string()),
        })
    }

    fn decide_edge(
        &self,
        actor: &Actor,
        task: &Task,
        requirement: EdgeRequirement,
    ) -> PermissionDecision {
        match requirement {
            EdgeRequirement::Capability(capability) => {
                self.policy.decide_capability(actor, task, capability)
            }
            EdgeRequirement::FullAuthority => {
                if actor.role.is_full_authority() {
                    PermissionDecision::allow("full-authority role")
                } else {
                    PermissionDecision::deny("only full-authority roles may reopen a completed task")
                }
            }
        }
    }

    async fn audit_denial(
        &self,
        actor: &Actor,
        ctx: &RequestContext,
        task: Option<&Task>,
        reason: &str,
    ) {
        let mut draft = AuditDraft::new(AuditAction::AccessDenied, RESOURCE_TASK)
            .with_actor(actor.id)
            .with_description(reason)
            .with_context(ctx);
        if let Some(task) = task {
            draft = draft.with_resource_id(&task.id.to_string());
        }
        self.audit_best_effort(draft).await;
    }

    async fn audit_best_effort(&self, draft: AuditDraft) {
        // The trail itself retries and swallows storage errors; nothing to
        // handle here beyond letting it record the attempt.
        let _ = self.audit.append(draft).await;
    }

    fn publish_stage_change(&self, task_id: TaskId, old_stage: KanbanStage, new_stage: KanbanStage) {
        let change = StageChanged {
            task_id,
            old_stage,
            new_stage,
        };
        match serde_json::to_value(&change) {
            Ok(payload) => self.bus.publish(TOPIC_STAGE_CHANGED, payload),
            Err(err) => tracing::warn!(error = %err, "failed to encode stage change event"),
        }
    }
}

fn map_store_error(err: StoreError) -> WorkflowError {
    match err {
        StoreError::Conflict { .. } => WorkflowError::Conflict,
        StoreError::NotFound(id) => WorkflowError::StorageFailure(format!("document vanished: {id}")),
        other => WorkflowError::StorageFailure(other.to_string()),
    }
}
