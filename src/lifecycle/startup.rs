//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every subsystem from a validated configuration
//! - Start background maintenance (cache purge)
//! - Log the cold-start time
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Runs once; the result is shared read-only by every request

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::cache::MemoryCache;
use crate::config::schema::{AppConfig, InvocationConfig, TaskConfig};
use crate::connections::{ConnectionRegistry, RegistryError};
use crate::dispatch::{TaskDispatcher, TracingHook};
use crate::security::RefererPolicy;
use crate::upstream::HttpFetcher;

/// How often expired cache entries are dropped.
pub const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("connection registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Everything a request handler needs, built once.
pub struct Application {
    pub dispatcher: TaskDispatcher,
    pub tasks: Vec<TaskConfig>,
    pub referers: RefererPolicy,
    pub invocation: InvocationConfig,
    pub cache: MemoryCache,
}

/// Build the application from a validated configuration.
pub fn initialize(config: &AppConfig) -> Result<Application, StartupError> {
    let started = Instant::now();

    let registry = ConnectionRegistry::from_config(&config.connections)?;
    tracing::info!(connections = ?registry.names(), "Connection registry built");

    let client = reqwest::Client::builder()
        .user_agent(concat!("api-fanout/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let fetcher = HttpFetcher::new(client, Duration::from_millis(config.invocation.timeout_ms));

    let cache = MemoryCache::new(config.cache.clone());
    let dispatcher = TaskDispatcher::new(
        Arc::new(registry),
        Arc::new(cache.clone()),
        Arc::new(fetcher),
        Arc::new(TracingHook),
    )
    .with_headroom_ms(config.invocation.headroom_ms);

    let application = Application {
        dispatcher,
        tasks: config.tasks.clone(),
        referers: RefererPolicy::new(config.security.referers.clone()),
        invocation: config.invocation.clone(),
        cache,
    };

    tracing::info!(
        tasks = application.tasks.len(),
        cold_start_ms = started.elapsed().as_millis() as u64,
        "Application initialized"
    );

    Ok(application)
}

/// Periodically purge expired cache entries until shutdown.
pub fn spawn_cache_purger(
    cache: MemoryCache,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = cache.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, remaining = cache.len(), "Purged expired cache entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Cache purger stopping");
                    break;
                }
            }
        }
    })
}
