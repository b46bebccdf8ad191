//! Error types for the TaskDeck lifecycle core.
//!
//! This module defines the error hierarchy used across the workspace,
//! enabling precise, typed error handling at each boundary.

use crate::id::TaskId;
use crate::types::KanbanStage;
use thiserror::Error;

/// Root error type for the TaskDeck core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors surfaced by the Kanban state machine.
///
/// These are the only errors a caller of `move_stage` and friends can
/// observe; everything else is resolved internally.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The requested stage transition is not in the transition table.
    ///
    /// Structurally impossible moves are rejected before any permission
    /// check runs and are never audited.
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: KanbanStage, to: KanbanStage },

    /// The permission engine denied the operation. Always preceded by an
    /// `AccessDenied` audit entry.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Optimistic-concurrency loss; the caller should reload the task and
    /// retry against the refreshed state.
    #[error("conflict: task was modified concurrently")]
    Conflict,

    /// Task persistence failed; the operation was aborted with no partial
    /// state and nothing audited.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A field edit carried an out-of-range or invariant-breaking value.
    /// Like `InvalidTransition`, this is a client bug and is not audited.
    #[error("invalid field value: {0}")]
    Validation(String),
}

/// Errors from the storage boundary traits.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("version conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("document already exists: {0}")]
    AlreadyExists(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Errors internal to the audit trail.
///
/// These never escape `AuditTrail::append` (best-effort policy); they are
/// visible only through queries, verification, and export paths.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("entry not found at sequence {0}")]
    EntryNotFound(u64),

    #[error("invalid verification range: {from}..={to}")]
    InvalidRange { from: u64, to: u64 },

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from the rate-limit counter store.
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limited: {attempts} attempts in window (max {max})")]
    Limited { attempts: u32, max: u32 },

    #[error("backend failure: {0}")]
    Backend(String),
}

/// Convenience result alias for the root error type.
pub type Result<T> = std::result::Result<T, Error>;
