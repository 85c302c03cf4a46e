//! Per-invocation request context.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::client::ClientInfo;
use crate::context::deadline::RemainingTime;

/// Remaining time assumed when no platform clock is wired.
pub const DEFAULT_FALLBACK_REMAINING_MS: u64 = 1000;

/// One inbound request: who called, what they asked for, and how long the
/// platform will wait.
#[derive(Clone)]
pub struct RequestContext {
    client: ClientInfo,
    route: String,
    properties: HashMap<String, String>,
    clock: Option<Arc<dyn RemainingTime>>,
    fallback_remaining_ms: u64,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("client", &self.client)
            .field("route", &self.route)
            .field("properties", &self.properties)
            .field("has_clock", &self.clock.is_some())
            .finish()
    }
}

impl RequestContext {
    /// Create a context with no platform clock.
    pub fn new(client: ClientInfo, route: impl Into<String>, properties: HashMap<String, String>) -> Self {
        Self {
            client,
            route: route.into(),
            properties,
            clock: None,
            fallback_remaining_ms: DEFAULT_FALLBACK_REMAINING_MS,
        }
    }

    /// Attach the platform's remaining-time source.
    pub fn with_clock(mut self, clock: Arc<dyn RemainingTime>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the remaining time used when no clock is attached.
    pub fn with_fallback_remaining_ms(mut self, millis: u64) -> Self {
        self.fallback_remaining_ms = millis;
        self
    }

    pub fn client(&self) -> &ClientInfo {
        &self.client
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// A query property of the request, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Milliseconds left, read fresh from the platform clock on every call.
    pub fn remaining_time(&self) -> u64 {
        match &self.clock {
            Some(clock) => clock.remaining_millis(),
            None => {
                tracing::warn!(
                    fallback_ms = self.fallback_remaining_ms,
                    "No platform clock on request context, using fallback remaining time"
                );
                self.fallback_remaining_ms
            }
        }
    }

    /// Remaining time minus `headroom_ms`, never below zero.
    ///
    /// This is the timeout handed to each upstream call so the handler can
    /// still answer after the slowest one gives up.
    pub fn budget(&self, headroom_ms: u64) -> u64 {
        self.remaining_time().saturating_sub(headroom_ms)
    }
}
