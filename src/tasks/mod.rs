//! Task planning.
//!
//! Turns the configured `[[tasks]]` table and the request's query properties
//! into dispatchable descriptors.

pub mod planner;

pub use planner::{plan_tasks, INVALID_SELECTION};
