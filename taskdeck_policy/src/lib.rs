//! # TaskDeck Policy
//!
//! `taskdeck_policy` provides the permission resolution engine for the
//! TaskDeck lifecycle core. It decides, for a given actor, task and
//! requested capability, whether an operation is allowed.
//!
//! Key concepts:
//!
//! 1. **Capability**: one discrete permission being requested (view, modify
//!    fields, move stage, approve/reject review, delete).
//!
//! 2. **Access request**: a capability plus the field scope and resource
//!    kind it targets.
//!
//! 3. **Decision**: an allow/deny outcome with a human-readable reason,
//!    produced per call and folded into the audit entry on denial.
//!
//! The engine is a pure function over its inputs: no hidden state, no side
//! effects. Callers are responsible for auditing the outcome.

pub mod engine;
pub mod model;

// Re-export key types for convenience
pub use engine::PolicyEvaluator;
pub use model::{AccessRequest, PermissionDecision};
