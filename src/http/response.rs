//! Response assembly.
//!
//! # Responsibilities
//! - Merge per-field task results into one JSON object
//! - Build the error envelope used for rejected or failed requests
//! - Convert the envelope into an axum response
//!
//! # Design Decisions
//! - A failed field still appears, carrying its placeholder
//! - Error responses advertise a short public cache lifetime

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::dispatch::TaskResult;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Status, headers and serialized body of an outbound response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ResponseEnvelope {
    /// Merge task results into a `200` response keyed by field name.
    pub fn assemble(results: Vec<TaskResult>) -> Self {
        let mut fields = Map::with_capacity(results.len());
        for result in results {
            let field = result.field_name.clone();
            fields.insert(field, result.into_value());
        }

        Self {
            status_code: StatusCode::OK.as_u16(),
            headers: base_headers(),
            body: Value::Object(fields).to_string(),
        }
    }

    /// An error response cacheable by clients for `ttl_secs`.
    pub fn error(status: StatusCode, message: &str, ttl_secs: u64) -> Self {
        let body = json!({
            "errors": [{
                "code": status.as_u16().to_string(),
                "type": "Error",
                "message": message,
            }]
        });

        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let now = Utc::now();
        let expires = ChronoDuration::try_seconds(ttl)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(now);

        let mut headers = base_headers();
        headers.insert(
            header::EXPIRES.as_str().to_string(),
            expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        );
        headers.insert(
            header::CACHE_CONTROL.as_str().to_string(),
            format!("public, max-age={}", ttl_secs),
        );

        Self {
            status_code: status.as_u16(),
            headers,
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

fn base_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(header::CONTENT_TYPE.as_str().to_string(), JSON_CONTENT_TYPE.to_string());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN.as_str().to_string(),
        "*".to_string(),
    );
    headers
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}
