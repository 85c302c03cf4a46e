//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Emit the per-request response line and critical errors with client fields
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};
use crate::context::RequestContext;

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "api_fanout={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Log the outcome of one request with the caller's metadata.
pub fn log_response(ctx: &RequestContext, status: u16, bytes: usize, exec_ms: u128) {
    let client = ctx.client();
    tracing::info!(
        status,
        bytes,
        exec_ms = exec_ms as u64,
        client_ip = %client.ip(),
        user_agent = %client.user_agent(),
        origin = %client.origin(),
        referer = %client.referer(),
        route = %ctx.route(),
        "Response"
    );
}

/// Log a fault that fails the whole request.
pub fn log_critical(ctx: &RequestContext, message: &str) {
    let client = ctx.client();
    tracing::error!(
        client_ip = %client.ip(),
        user_agent = %client.user_agent(),
        origin = %client.origin(),
        referer = %client.referer(),
        route = %ctx.route(),
        reason = message,
        "Critical"
    );
}
