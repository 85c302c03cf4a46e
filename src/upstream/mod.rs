//! Upstream access subsystem.
//!
//! # Data Flow
//! ```text
//! Connection copy (path, params, timeout)
//!     → fetcher.rs (HTTP GET via reqwest)
//!     → FetchedBody { status, body, max_age }
//!     → cache port stores / returns it
//!     → payload.rs (typed shape check per upstream)
//! ```
//!
//! # Design Decisions
//! - No retries: a failed fetch becomes one placeholder field
//! - Shape checks are typed (serde), not key-presence probing

pub mod error;
pub mod fetcher;
pub mod payload;

pub use error::{PayloadError, UpstreamError};
pub use fetcher::{FetchedBody, Fetcher, HttpFetcher};
pub use payload::{GamesPayload, PredictionPayload};
