//! Policy models.
//!
//! This module defines the request and decision types consumed and
//! produced by the evaluator.

pub mod decision;
pub mod request;

pub use decision::PermissionDecision;
pub use request::AccessRequest;
