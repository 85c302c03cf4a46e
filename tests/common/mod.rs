//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use api_fanout::config::schema::{AppConfig, ConnectionConfig};
use api_fanout::connections::{CacheProfile, ParameterValue};
use api_fanout::lifecycle::Shutdown;
use api_fanout::{initialize, HttpServer};

pub const GAMES_FIXTURE: &str = include_str!("../data/games.json");

/// Canned answer for one upstream path.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockRoute {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A programmable upstream that answers by request path and counts hits.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, MockRoute>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockUpstream {
    /// Bind on an ephemeral port and start answering.
    pub async fn start(routes: &[(&str, MockRoute)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let upstream = Self {
            addr: listener.local_addr().unwrap(),
            routes: Arc::new(Mutex::new(
                routes.iter().map(|(p, r)| (p.to_string(), r.clone())).collect(),
            )),
            hits: Arc::new(Mutex::new(HashMap::new())),
        };

        let state = upstream.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((mut socket, _)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            let Some(path) = read_request_path(&mut socket).await else {
                                return;
                            };
                            *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

                            let route = state
                                .routes
                                .lock()
                                .unwrap()
                                .get(&path)
                                .cloned()
                                .unwrap_or_else(|| MockRoute::status(404, r#"{"message":"not found"}"#));
                            if !route.delay.is_zero() {
                                tokio::time::sleep(route.delay).await;
                            }

                            let response = format!(
                                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                route.status,
                                reason(route.status),
                                route.body.len(),
                                route.body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        upstream
    }

    /// Replace the answer for `path`.
    pub fn set_route(&self, path: &str, route: MockRoute) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn read_request_path(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head.lines().next()?.split_whitespace().nth(1)?;
    Some(target.split('?').next().unwrap_or(target).to_string())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

pub fn games_body() -> String {
    GAMES_FIXTURE.to_string()
}

/// The default deployment, pointed at a mock upstream.
///
/// Games are cached for a minute, predictions never, weather needs `appid`.
pub fn config_for(upstream: SocketAddr, appid: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.observability.metrics_enabled = false;
    config.cache.error_extension_secs = 60;

    let mut weather_params = BTreeMap::new();
    weather_params.insert("q".to_string(), ParameterValue::from("Chicago,US"));
    weather_params.insert("appid".to_string(), ParameterValue::from(appid));

    config.connections = vec![
        ConnectionConfig {
            name: "demo".into(),
            protocol: "http".into(),
            host: upstream.to_string(),
            path: None,
            parameters: BTreeMap::new(),
            headers: BTreeMap::new(),
            cache: vec![CacheProfile::new("games", 60), CacheProfile::new("prediction", 0)],
        },
        ConnectionConfig {
            name: "weather".into(),
            protocol: "http".into(),
            host: upstream.to_string(),
            path: Some("/weather".into()),
            parameters: weather_params,
            headers: BTreeMap::new(),
            cache: vec![CacheProfile::new("default", 60)],
        },
    ];
    config
}

/// Serve `config` on an ephemeral port.
pub async fn start_app(config: AppConfig) -> (SocketAddr, Shutdown) {
    let app = Arc::new(initialize(&config).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        HttpServer::new(app).run(listener, rx).await.unwrap();
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
