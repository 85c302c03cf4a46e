//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::connections::{CacheProfile, ParameterValue};

/// Root configuration for the aggregation endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-request time budget settings.
    pub invocation: InvocationConfig,

    /// In-process cache store settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Referer allow-list.
    pub security: SecurityConfig,

    /// Upstream connection definitions.
    pub connections: Vec<ConnectionConfig>,

    /// Fields assembled into every response, one upstream task each.
    pub tasks: Vec<TaskConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            invocation: InvocationConfig::default(),
            cache: CacheConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
            connections: default_connections(),
            tasks: default_tasks(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Time budget for one inbound request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InvocationConfig {
    /// Wall-clock budget the host grants each request, in milliseconds.
    pub timeout_ms: u64,

    /// Time kept back from upstream calls so the response can still be sent.
    pub headroom_ms: u64,

    /// Remaining time assumed when a context has no clock.
    pub fallback_remaining_ms: u64,

    /// Cache lifetime advertised on error responses, in seconds.
    pub error_expiration_secs: u64,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 6000,
            headroom_ms: 500,
            fallback_remaining_ms: 1000,
            error_expiration_secs: 180,
        }
    }
}

/// In-process cache store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on stored entries.
    pub max_entries: usize,

    /// How long a stale entry keeps being served after an upstream error.
    /// Zero disables stale serving.
    pub error_extension_secs: u64,

    /// Shift applied to UTC before aligning interval expirations.
    pub interval_offset_minutes: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            error_extension_secs: 300,
            interval_offset_minutes: 0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Inbound request policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Accepted referer host suffixes. Empty accepts everything.
    pub referers: Vec<String>,
}

/// One upstream connection and its cache profiles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Unique connection name referenced by tasks.
    pub name: String,

    /// URL scheme (default: https).
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Host, optionally with port.
    pub host: String,

    /// Base path; tasks may override it per request.
    #[serde(default)]
    pub path: Option<String>,

    /// Query parameters. Values are literals or `{ env = "VAR" }` secrets.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,

    /// Static request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Named cache profiles for this connection.
    #[serde(default)]
    pub cache: Vec<CacheProfile>,
}

fn default_protocol() -> String {
    "https".to_string()
}

/// How a task turns its upstream body into a response field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// One game picked by the `play` query property.
    Game,
    /// Signed position of the `game` query property.
    GameIndex,
    /// The full games payload.
    GameList,
    /// The prediction string.
    Prediction,
    /// The upstream body unchanged.
    #[default]
    Passthrough,
}

/// One response field and the upstream it comes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskConfig {
    /// Response field name.
    pub field: String,

    /// Connection name.
    pub connection: String,

    /// Cache profile name on that connection.
    pub profile: String,

    /// Path override applied to the task's connection copy.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub kind: TaskKind,

    /// Connection parameter that must be set before calling out.
    #[serde(default)]
    pub requires_parameter: Option<String>,

    /// Reported as `{"message": ...}` when the required parameter is blank.
    #[serde(default)]
    pub missing_parameter_message: Option<String>,
}

fn interval_profile(name: &str, ttl: u64, encrypt: bool) -> CacheProfile {
    CacheProfile {
        override_origin_header_expiration: true,
        expiration_is_on_interval: true,
        encrypt,
        ..CacheProfile::new(name, ttl)
    }
}

fn default_connections() -> Vec<ConnectionConfig> {
    let mut demo_headers = BTreeMap::new();
    demo_headers.insert("referer".to_string(), "https://chadkluck.net".to_string());

    let mut weather_params = BTreeMap::new();
    weather_params.insert("q".to_string(), ParameterValue::from("Chicago,US"));
    weather_params.insert("units".to_string(), ParameterValue::from("imperial"));
    weather_params.insert(
        "appid".to_string(),
        ParameterValue::Secret {
            env: "WEATHER_API_KEY".to_string(),
        },
    );

    vec![
        ConnectionConfig {
            name: "demo".to_string(),
            protocol: default_protocol(),
            host: "api.chadkluck.net".to_string(),
            path: None,
            parameters: BTreeMap::new(),
            headers: demo_headers,
            cache: vec![
                CacheProfile {
                    host: "demo".to_string(),
                    path: "games".to_string(),
                    ..interval_profile("games", 10 * 60, false)
                },
                CacheProfile {
                    host: "demo".to_string(),
                    path: "prediction".to_string(),
                    ..interval_profile("prediction", 1, true)
                },
            ],
        },
        ConnectionConfig {
            name: "weather".to_string(),
            protocol: default_protocol(),
            host: "api.openweathermap.org".to_string(),
            path: Some("/data/2.5/weather".to_string()),
            parameters: weather_params,
            headers: BTreeMap::new(),
            cache: vec![CacheProfile {
                host: "weather".to_string(),
                path: "default".to_string(),
                ..interval_profile("default", 5 * 60, false)
            }],
        },
    ]
}

fn default_tasks() -> Vec<TaskConfig> {
    let task = |field: &str, connection: &str, profile: &str, path: Option<&str>, kind: TaskKind| TaskConfig {
        field: field.to_string(),
        connection: connection.to_string(),
        profile: profile.to_string(),
        path: path.map(str::to_string),
        kind,
        requires_parameter: None,
        missing_parameter_message: None,
    };

    vec![
        task("game", "demo", "games", Some("/games/"), TaskKind::Game),
        task("prediction", "demo", "prediction", Some("/8ball/"), TaskKind::Prediction),
        TaskConfig {
            requires_parameter: Some("appid".to_string()),
            missing_parameter_message: Some("weather api key not set".to_string()),
            ..task("weather", "weather", "default", None, TaskKind::Passthrough)
        },
        task("gameindex", "demo", "games", Some("/games/"), TaskKind::GameIndex),
        task("games", "demo", "games", Some("/games/"), TaskKind::GameList),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.connections.len(), 2);
        assert_eq!(config.tasks.len(), 5);

        let demo = &config.connections[0];
        assert_eq!(demo.cache[0].default_expiration_in_seconds, 600);
        assert!(demo.cache[1].encrypt);
        assert_eq!(config.invocation.headroom_ms, 500);
    }

    #[test]
    fn test_minimal_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [[connections]]
            name = "games"
            host = "127.0.0.1:4000"
            protocol = "http"

            [[connections.cache]]
            profile = "short"
            default_expiration_in_seconds = 5

            [[tasks]]
            field = "games"
            connection = "games"
            profile = "short"
            kind = "game_list"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.connections.len(), 1);
        assert_eq!(config.connections[0].cache[0].profile, "short");
        assert_eq!(config.tasks[0].kind, TaskKind::GameList);
        assert_eq!(config.invocation.timeout_ms, 6000);
    }

    #[test]
    fn test_protocol_defaults_to_https() {
        let config: ConnectionConfig = toml::from_str(
            r#"
            name = "x"
            host = "example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.protocol, "https");
        assert!(config.cache.is_empty());
    }

    #[test]
    fn test_secret_parameter_and_log_format() {
        let config: AppConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"

            [[connections]]
            name = "weather"
            host = "example.com"
            parameters = { q = "Chicago", appid = { env = "WEATHER_API_KEY" } }
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(matches!(
            config.connections[0].parameters["appid"],
            ParameterValue::Secret { .. }
        ));
    }
}
