//! In-process cache store.

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::cache::expiration::{expires_at, now_secs};
use crate::cache::port::{CacheAccessPort, CacheStatus, CachedResult};
use crate::config::schema::CacheConfig;
use crate::connections::{CacheProfile, Connection};
use crate::observability::metrics;
use crate::upstream::{FetchedBody, Fetcher, UpstreamError};

/// A stored upstream body.
#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    /// Expiry timestamp (seconds since epoch).
    expires_at: u64,
}

impl CacheEntry {
    fn is_fresh(&self, now: u64) -> bool {
        self.expires_at > now
    }
}

/// A thread-safe, in-memory implementation of [`CacheAccessPort`].
///
/// Entries are keyed by a SHA-256 of profile, resolved URL and request body,
/// so secrets in query parameters never appear in keys.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, CacheEntry>>,
    config: CacheConfig,
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> usize {
        let now = now_secs();
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.is_fresh(now));
        let purged = before.saturating_sub(self.inner.len());
        metrics::record_cache_size(self.inner.len());
        purged
    }

    async fn lookup(
        &self,
        profile: &CacheProfile,
        fetcher: &dyn Fetcher,
        connection: &Connection,
        request_body: Option<&str>,
    ) -> Result<CachedResult, UpstreamError> {
        let key = cache_key(profile, connection, request_body)?;
        let now = now_secs();

        let existing = self.inner.get(&key).map(|r| r.value().clone());
        if let Some(entry) = &existing {
            if entry.is_fresh(now) {
                metrics::record_cache_lookup(&profile.profile, CacheStatus::Hit);
                return Ok(CachedResult::new(entry.body.clone(), CacheStatus::Hit));
            }
        }

        let fetched = bounded_fetch(fetcher, connection).await.and_then(|fetched| {
            if fetched.is_success() {
                Ok(fetched)
            } else {
                Err(UpstreamError::Status {
                    connection: connection.name().to_string(),
                    status: fetched.status,
                })
            }
        });

        match fetched {
            Ok(fetched) => {
                match expires_at(profile, fetched.max_age, now, self.config.interval_offset_minutes) {
                    Some(expiry) => self.store(&key, profile, &fetched.body, expiry),
                    None => self.evict(&key),
                }
                metrics::record_cache_lookup(&profile.profile, CacheStatus::Miss);
                Ok(CachedResult::new(fetched.body, CacheStatus::Miss))
            }
            Err(err) => match existing {
                Some(stale) if self.config.error_extension_secs > 0 => {
                    let extended = now.saturating_add(self.config.error_extension_secs);
                    tracing::warn!(
                        profile = %profile.label(),
                        error = %err,
                        extended_until = extended,
                        "Upstream failed, serving stale entry"
                    );
                    self.inner.insert(
                        key,
                        CacheEntry {
                            body: stale.body.clone(),
                            expires_at: extended,
                        },
                    );
                    metrics::record_cache_lookup(&profile.profile, CacheStatus::Stale);
                    Ok(CachedResult::new(stale.body, CacheStatus::Stale))
                }
                _ => Err(err),
            },
        }
    }

    /// Forget a key whose latest body must not be cached.
    fn evict(&self, key: &str) {
        if self.inner.remove(key).is_some() {
            metrics::record_cache_size(self.inner.len());
        }
    }

    fn store(&self, key: &str, profile: &CacheProfile, body: &str, expires_at: u64) {
        if !self.inner.contains_key(key) && self.inner.len() >= self.config.max_entries {
            self.purge_expired();
            if self.inner.len() >= self.config.max_entries {
                tracing::warn!(
                    profile = %profile.label(),
                    max_entries = self.config.max_entries,
                    "Cache full, not storing"
                );
                return;
            }
        }

        self.inner.insert(
            key.to_string(),
            CacheEntry {
                body: body.to_string(),
                expires_at,
            },
        );
        tracing::debug!(
            profile = %profile.label(),
            expires_at,
            encrypt = profile.encrypt,
            "Stored upstream body"
        );
        metrics::record_cache_size(self.inner.len());
    }
}

impl CacheAccessPort for MemoryCache {
    fn get_data<'a>(
        &'a self,
        profile: &'a CacheProfile,
        fetcher: &'a dyn Fetcher,
        connection: &'a Connection,
        request_body: Option<&'a str>,
    ) -> BoxFuture<'a, Result<CachedResult, UpstreamError>> {
        Box::pin(self.lookup(profile, fetcher, connection, request_body))
    }
}

/// Fetch under the connection's timeout so a slow origin surfaces as an
/// error here, where a stale entry can still answer.
async fn bounded_fetch(fetcher: &dyn Fetcher, connection: &Connection) -> Result<FetchedBody, UpstreamError> {
    match connection.timeout() {
        Some(limit) => tokio::time::timeout(limit, fetcher.fetch(connection))
            .await
            .map_err(|_| UpstreamError::Timeout {
                connection: connection.name().to_string(),
                after: limit,
            })?,
        None => fetcher.fetch(connection).await,
    }
}

fn cache_key(profile: &CacheProfile, connection: &Connection, request_body: Option<&str>) -> Result<String, UpstreamError> {
    let url = connection.url()?;
    let mut hasher = Sha256::new();
    hasher.update(profile.profile.as_bytes());
    hasher.update([0u8]);
    hasher.update(url.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(request_body.unwrap_or("").as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
