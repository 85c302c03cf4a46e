//! Named cache policies attached to a connection.

use serde::{Deserialize, Serialize};

/// A named caching policy for one upstream connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheProfile {
    /// Profile name, unique within its connection.
    pub profile: String,

    /// Ignore upstream `cache-control` and always use the local expiration.
    #[serde(default)]
    pub override_origin_header_expiration: bool,

    /// Local time-to-live in seconds. Zero disables storage.
    #[serde(default)]
    pub default_expiration_in_seconds: u64,

    /// Align expiry to wall-clock boundaries instead of a rolling TTL.
    #[serde(default)]
    pub expiration_is_on_interval: bool,

    /// Store the payload encrypted at rest.
    #[serde(default)]
    pub encrypt: bool,

    /// Upstream response headers to keep alongside the body.
    #[serde(default)]
    pub headers_to_retain: String,

    /// Host label for logs only.
    #[serde(default)]
    pub host: String,

    /// Path label for logs only.
    #[serde(default)]
    pub path: String,
}

impl CacheProfile {
    /// Create a profile with the given name and TTL; every flag is off.
    pub fn new(profile: impl Into<String>, default_expiration_in_seconds: u64) -> Self {
        Self {
            profile: profile.into(),
            override_origin_header_expiration: false,
            default_expiration_in_seconds,
            expiration_is_on_interval: false,
            encrypt: false,
            headers_to_retain: String::new(),
            host: String::new(),
            path: String::new(),
        }
    }

    /// Label used in logs and metrics (`host/path`, or the profile name).
    pub fn label(&self) -> String {
        if self.host.is_empty() && self.path.is_empty() {
            self.profile.clone()
        } else {
            format!("{}/{}", self.host, self.path)
        }
    }
}
