//! Request-time API aggregation library.
//!
//! Fans one inbound request out to several cached upstreams within the
//! request's time budget and merges the results into one JSON object.

pub mod cache;
pub mod config;
pub mod connections;
pub mod context;
pub mod dispatch;
pub mod games;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod tasks;
pub mod upstream;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{initialize, Application, Shutdown};
