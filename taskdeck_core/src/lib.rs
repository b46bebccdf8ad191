//! # TaskDeck Core
//!
//! Shared foundation for the TaskDeck task-lifecycle core: strongly-typed
//! identifiers, the role and task data model, the error hierarchy, and the
//! boundary traits (task storage, event bus, rate limiting) that the
//! policy, audit and workflow crates build on.
//!
//! The real persistence layer, identity provider and event delivery are
//! external collaborators; this crate only defines their seams, together
//! with in-memory reference implementations used by tests and embedding
//! callers.

/// Strongly-typed identifiers.
pub mod id;

/// Error hierarchy.
pub mod error;

/// Actor, task and request types.
pub mod types;

/// Task storage boundary and in-memory store.
pub mod store;

/// Fire-and-forget event bus boundary.
pub mod bus;

/// Time-windowed attempt limiting.
pub mod rate_limit;

// Re-export the types that nearly every downstream module touches.
pub use bus::{BroadcastBus, BusEvent, EventBus, NullBus, StageChanged, TOPIC_STAGE_CHANGED};
pub use error::{AuditError, Error, RateLimitError, Result, StoreError, WorkflowError};
pub use id::{AuditEntryId, DepartmentId, ProjectId, TaskId, TeamId, UserId};
pub use store::{MemoryTaskStore, TaskStore};
pub use types::{
    Actor, Capability, FieldScope, KanbanStage, Priority, RequestContext, ResourceKind, Role,
    Task, TaskDraft, TaskSnapshot,
};
