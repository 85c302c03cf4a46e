//! HTTP transport for upstream connections.
//!
//! # Responsibilities
//! - Build the request from a connection copy (url, headers, timeout)
//! - Return the raw body plus the origin's `max-age`, if any
//! - Map transport failures to `UpstreamError`

use futures_util::future::BoxFuture;
use reqwest::header::CACHE_CONTROL;
use std::time::Duration;

use crate::connections::Connection;
use crate::upstream::error::UpstreamError;

/// Raw response from an upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub status: u16,
    pub body: String,
    /// `max-age` from the origin's `cache-control` header.
    pub max_age: Option<u64>,
}

impl FetchedBody {
    /// A 200 response with no cache headers.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            max_age: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches the current body for a connection.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, connection: &'a Connection) -> BoxFuture<'a, Result<FetchedBody, UpstreamError>>;
}

/// `reqwest`-backed fetcher sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    async fn execute(&self, connection: &Connection) -> Result<FetchedBody, UpstreamError> {
        let url = connection.url()?;
        let timeout = connection.timeout().unwrap_or(self.default_timeout);

        let mut request = self.client.get(url).timeout(timeout);
        for (key, value) in connection.headers() {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| map_reqwest_error(connection, timeout, e))?;
        let status = response.status().as_u16();
        let max_age = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age);

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(connection, timeout, e))?;

        tracing::debug!(
            connection = %connection.name(),
            status,
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(FetchedBody { status, body, max_age })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, connection: &'a Connection) -> BoxFuture<'a, Result<FetchedBody, UpstreamError>> {
        Box::pin(self.execute(connection))
    }
}

fn map_reqwest_error(connection: &Connection, timeout: Duration, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout {
            connection: connection.name().to_string(),
            after: timeout,
        }
    } else {
        UpstreamError::Transport {
            connection: connection.name().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Extract `max-age` seconds from a `cache-control` value.
pub fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|directive| {
            let (name, value) = directive.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("max-age") {
                value.trim().trim_matches('"').parse().ok()
            } else {
                None
            }
        })
}
