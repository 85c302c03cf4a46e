//! Inbound request translation.
//!
//! # Responsibilities
//! - Extract client metadata and query properties
//! - Anchor the request deadline at arrival
//!
//! # Design Decisions
//! - Repeated query keys: the last value wins
//! - Malformed percent-encoding is decoded lossily, never rejected

use axum::http::{HeaderMap, HeaderValue, Request, Uri};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::context::{ClientInfo, Deadline, RequestContext};

/// Header carrying the handler's execution time in milliseconds.
pub const X_EXEC_MS: &str = "x-exec-ms";

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Query properties of a request URI.
pub fn query_properties(uri: &Uri) -> HashMap<String, String> {
    uri.query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// Build the per-request context with a deadline `budget` from now.
pub fn build_context(
    headers: &HeaderMap,
    uri: &Uri,
    peer: Option<SocketAddr>,
    budget: Duration,
    fallback_remaining_ms: u64,
) -> RequestContext {
    RequestContext::new(
        ClientInfo::from_headers(headers, peer),
        uri.path(),
        query_properties(uri),
    )
    .with_clock(Arc::new(Deadline::after(budget)))
    .with_fallback_remaining_ms(fallback_remaining_ms)
}
