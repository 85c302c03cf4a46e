//! Request-time API aggregation service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ RequestContext ──▶ referer policy
//!                                                            │
//!                                                            ▼
//!                                     task planner ◀── [[tasks]] config
//!                                          │
//!                                          ▼
//!                                   TaskDispatcher (join_all, budget timeout)
//!                                     │      │      │
//!                                     ▼      ▼      ▼
//!                                  CacheAccessPort (MemoryCache)
//!                                          │ miss
//!                                          ▼
//!                                   HttpFetcher ──────────────▶ upstreams
//!                                          │
//!     Client Response                      ▼
//!     ◀────────────── ResponseEnvelope ◀── TaskResults (payload | placeholder)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use api_fanout::config::{load_config, AppConfig};
use api_fanout::lifecycle::signals::wait_for_signal;
use api_fanout::lifecycle::startup::{spawn_cache_purger, CACHE_PURGE_INTERVAL};
use api_fanout::observability::{logging, metrics};
use api_fanout::{initialize, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "api-fanout")]
#[command(about = "Aggregates cached upstream APIs into one JSON response", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults are used if absent.
    #[arg(short, long, env = "FANOUT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-fanout starting");
    match &args.config {
        Some(path) => tracing::info!(path = %path.display(), "Configuration loaded"),
        None => tracing::info!("Using built-in configuration"),
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Arc::new(initialize(&config)?);
    let shutdown = Shutdown::new();

    let server_shutdown = shutdown.subscribe();
    let purger = spawn_cache_purger(app.cache.clone(), CACHE_PURGE_INTERVAL, shutdown.subscribe());
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(app).run(listener, server_shutdown).await?;
    let _ = purger.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
