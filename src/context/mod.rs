//! Request context subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request (headers, peer addr, query)
//!     → client.rs (ClientInfo: ip, user agent, origin, referer)
//!     → deadline.rs (platform remaining-time source)
//!     → request.rs (RequestContext::budget(headroom) → per-call timeout)
//! ```

pub mod client;
pub mod deadline;
pub mod request;

pub use client::ClientInfo;
pub use deadline::{Deadline, FixedRemaining, RemainingTime};
pub use request::RequestContext;
