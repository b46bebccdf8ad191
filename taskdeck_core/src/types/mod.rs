//! Core data model types.
//!
//! This module defines the actor, task and request types shared by the
//! policy, audit and workflow crates.

pub mod actor;
pub mod request;
pub mod task;

pub use actor::{Actor, Role};
pub use request::{Capability, FieldScope, RequestContext, ResourceKind};
pub use task::{KanbanStage, Priority, Task, TaskDraft, TaskSnapshot};
