//! # TaskDeck Workflow
//!
//! The Kanban stage state machine for the TaskDeck lifecycle core. Work
//! items progress `Backlog -> Todo -> InProgress -> Review -> Done`, with
//! one reject back-edge out of review and a privileged reopen edge out of
//! the terminal stage.
//!
//! Every mutation goes through [`StateMachine`], which:
//!
//! - validates the requested edge against the fixed transition table
//!   (structurally impossible moves fail fast, unaudited);
//! - asks the permission engine (`taskdeck_policy`) for a decision, and
//!   records denials as `AccessDenied` audit entries;
//! - applies the mutation with compare-and-swap semantics against the task
//!   store, so concurrent conflicting moves cannot both succeed;
//! - writes a `StateChange` audit entry with before/after snapshots; and
//! - publishes the change to the event bus, fire-and-forget.

/// The fixed transition table.
pub mod transition;

/// The state machine over its collaborators.
pub mod machine;


pub use machine::{StateMachine, TaskPatch};
pub use transition::{EdgeRequirement, TransitionTable};
