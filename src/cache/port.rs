//! Cache access contract used by the dispatcher.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::connections::{CacheProfile, Connection};
use crate::upstream::{Fetcher, PayloadError, UpstreamError};

/// Where a cached result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store, still fresh.
    Hit,
    /// Fetched from the upstream on this call.
    Miss,
    /// Upstream failed; an expired entry was served instead.
    Stale,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }
}

/// Body returned by a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResult {
    body: String,
    status: CacheStatus,
}

impl CachedResult {
    pub fn new(body: impl Into<String>, status: CacheStatus) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }

    /// Raw body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> Result<Value, PayloadError> {
        serde_json::from_str(&self.body).map_err(PayloadError::NotJson)
    }

    pub fn status(&self) -> CacheStatus {
        self.status
    }
}

/// Get-or-fetch-and-store access to upstream data.
///
/// Implementations decide whether a call is served from storage or goes to
/// the upstream through `fetcher`. Callers cannot tell the difference apart
/// from [`CachedResult::status`].
pub trait CacheAccessPort: Send + Sync {
    fn get_data<'a>(
        &'a self,
        profile: &'a CacheProfile,
        fetcher: &'a dyn Fetcher,
        connection: &'a Connection,
        request_body: Option<&'a str>,
    ) -> BoxFuture<'a, Result<CachedResult, UpstreamError>>;
}
