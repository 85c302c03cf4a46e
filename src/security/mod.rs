//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → referer.rs (allow-list check on the referer host)
//!     → 403 on rejection, before any upstream work
//!     → Pass to dispatch
//! ```
//!
//! # Design Decisions
//! - Fail closed once an allow-list is configured
//! - No trust in client input

pub mod referer;

pub use referer::RefererPolicy;
