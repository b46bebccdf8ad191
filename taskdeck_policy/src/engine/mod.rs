//! Policy evaluation engine.
//!
//! This module provides functionality for evaluating access requests.

mod evaluator;

pub use evaluator::PolicyEvaluator;
