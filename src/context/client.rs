//! Client metadata taken from the inbound request.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Identifying attributes of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    ip: String,
    user_agent: String,
    origin: String,
    referer: String,
}

impl ClientInfo {
    pub fn new(
        ip: impl Into<String>,
        user_agent: impl Into<String>,
        origin: impl Into<String>,
        referer: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
            origin: origin.into(),
            referer: referer.into(),
        }
    }

    /// Read client metadata from request headers.
    ///
    /// The first `x-forwarded-for` hop wins over the socket address.
    pub fn from_headers(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        let forwarded = header("x-forwarded-for");
        let ip = forwarded
            .split(',')
            .map(str::trim)
            .find(|hop| !hop.is_empty())
            .map(str::to_string)
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_default();

        Self {
            ip,
            user_agent: header("user-agent"),
            origin: header("origin"),
            referer: header("referer"),
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn referer(&self) -> &str {
        &self.referer
    }
}
