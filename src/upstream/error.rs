//! Upstream failure types.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while fetching from an upstream connection.
///
/// All of these are contained to the task that hit them.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Network or protocol failure.
    #[error("request to '{connection}' failed: {reason}")]
    Transport { connection: String, reason: String },

    /// Upstream answered with a non-success status.
    #[error("'{connection}' returned status {status}")]
    Status { connection: String, status: u16 },

    /// The call did not finish within its budget.
    #[error("'{connection}' timed out after {}ms", .after.as_millis())]
    Timeout { connection: String, after: Duration },

    /// The connection does not form a valid URL.
    #[error("invalid url for '{connection}': {reason}")]
    InvalidUrl { connection: String, reason: String },

    /// A secret-backed parameter has no value.
    #[error("parameter '{parameter}' on '{connection}' is not set")]
    MissingParameter { connection: String, parameter: String },
}

/// Errors raised while projecting an upstream body.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body is not JSON at all.
    #[error("upstream body is not JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    /// Body is JSON but not the expected shape.
    #[error("upstream payload does not match {expected}: {source}")]
    ShapeMismatch {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
