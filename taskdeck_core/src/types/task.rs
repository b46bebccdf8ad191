//! Tasks and the Kanban stage model.

use crate::id::{DepartmentId, ProjectId, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a task in the Kanban workflow.
///
/// The ordered forward path is `Backlog -> Todo -> InProgress -> Review ->
/// Done`, with a single reject back-edge `Review -> InProgress`. `Done` is
/// terminal for everyone except full-authority roles, which may reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KanbanStage {
    /// Not yet scheduled.
    Backlog,

    /// Scheduled but not started.
    Todo,

    /// Actively being worked on.
    InProgress,

    /// Awaiting review by a team lead.
    Review,

    /// Approved and complete.
    Done,
}

impl KanbanStage {
    /// All stages in forward order.
    pub const ALL: [KanbanStage; 5] = [
        KanbanStage::Backlog,
        KanbanStage::Todo,
        KanbanStage::InProgress,
        KanbanStage::Review,
        KanbanStage::Done,
    ];
}

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// A work item tracked through the Kanban lifecycle.
///
/// Invariant: `progress == 100` iff `kanban_stage == Done`. Mutated only by
/// the state machine; the `version` field is the optimistic-concurrency
/// token checked by the task store on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,

    /// Short human-readable title.
    pub title: String,

    /// Current Kanban stage.
    pub kanban_stage: KanbanStage,

    /// Task priority.
    pub priority: Priority,

    /// Completion percentage in `[0, 100]`.
    pub progress: u8,

    /// User the task is assigned to, if any.
    pub assigned_to: Option<UserId>,

    /// User who created the task.
    pub created_by: UserId,

    /// Department that requested the work.
    pub requesting_department: DepartmentId,

    /// Department that executes the work. May differ from the requesting
    /// department for cross-department tasks.
    pub executing_department: DepartmentId,

    /// Project the task belongs to.
    pub project_id: ProjectId,

    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,

    /// Free-form remark; rejection reasons are appended here.
    pub remark: String,

    /// Optimistic-concurrency version token, bumped on every save.
    pub version: u64,
}

impl Task {
    /// Whether the progress invariant holds for this task.
    pub fn progress_invariant_holds(&self) -> bool {
        (self.progress == 100) == (self.kanban_stage == KanbanStage::Done)
    }

    /// Take an immutable snapshot for audit purposes.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            title: self.title.clone(),
            kanban_stage: self.kanban_stage,
            priority: self.priority,
            progress: self.progress,
            assigned_to: self.assigned_to,
            remark: self.remark.clone(),
            version: self.version,
        }
    }
}

/// Input for creating a task. Tasks always enter the workflow at
/// [`KanbanStage::Backlog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Short human-readable title.
    pub title: String,

    /// Task priority.
    pub priority: Priority,

    /// User the task is assigned to, if any.
    pub assigned_to: Option<UserId>,

    /// Department that requested the work.
    pub requesting_department: DepartmentId,

    /// Department that executes the work.
    pub executing_department: DepartmentId,

    /// Project the task belongs to.
    pub project_id: ProjectId,

    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Create a draft for a task executed by the requesting department.
    pub fn new(title: &str, department: DepartmentId, project_id: ProjectId) -> Self {
        Self {
            title: title.to_string(),
            priority: Priority::default(),
            assigned_to: None,
            requesting_department: department,
            executing_department: department,
            project_id,
            due_date: None,
        }
    }

    /// Set the executing department for a cross-department task.
    pub fn with_executing_department(mut self, department: DepartmentId) -> Self {
        self.executing_department = department;
        self
    }

    /// Set the assignee.
    pub fn with_assignee(mut self, user_id: UserId) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the due date.
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Materialize the draft into a task created by `created_by`.
    pub fn into_task(self, created_by: UserId) -> Task {
        Task {
            id: TaskId::new(),
            title: self.title,
            kanban_stage: KanbanStage::Backlog,
            priority: self.priority,
            progress: 0,
            assigned_to: self.assigned_to,
            created_by,
            requesting_department: self.requesting_department,
            executing_department: self.executing_department,
            project_id: self.project_id,
            due_date: self.due_date,
            remark: String::new(),
            version: 0,
        }
    }
}

/// Point-in-time view of the mutable task fields, captured as the
/// before/after snapshots of audit entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: TaskId,

    /// Title at capture time.
    pub title: String,

    /// Stage at capture time.
    pub kanban_stage: KanbanStage,

    /// Priority at capture time.
    pub priority: Priority,

    /// Progress at capture time.
    pub progress: u8,

    /// Assignee at capture time.
    pub assigned_to: Option<UserId>,

    /// Remark at capture time.
    pub remark: String,

    /// Version at capture time.
    pub version: u64,
}
