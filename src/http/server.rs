//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the aggregation handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and drain on shutdown
//! - Per request: context → referer check → plan → dispatch → assemble
//! - Observability (response log line, metrics, `x-exec-ms`)

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::context::RequestContext;
use crate::http::request::{build_context, MakeRequestUuidV4, X_EXEC_MS};
use crate::http::response::ResponseEnvelope;
use crate::lifecycle::Application;
use crate::observability::{logging, metrics};
use crate::tasks::plan_tasks;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
}

/// HTTP server for the aggregation endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around an initialized application.
    pub fn new(app: Arc<Application>) -> Self {
        let router = Self::build_router(AppState { app });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_millis(state.app.invocation.timeout_ms);
        Router::new()
            .route("/", get(aggregate_handler))
            .route("/{*path}", get(aggregate_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Fan out to every configured task and answer with one JSON object.
async fn aggregate_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let app = &state.app;

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ctx = build_context(
        request.headers(),
        request.uri(),
        peer,
        Duration::from_millis(app.invocation.timeout_ms),
        app.invocation.fallback_remaining_ms,
    );

    let envelope = respond(app, &ctx).await;

    let exec_ms = started.elapsed().as_millis();
    let envelope = envelope.with_header(X_EXEC_MS, exec_ms.to_string());
    logging::log_response(&ctx, envelope.status_code, envelope.body_len(), exec_ms);
    metrics::record_request(envelope.status_code, started);

    envelope.into_response()
}

async fn respond(app: &Application, ctx: &RequestContext) -> ResponseEnvelope {
    let ttl = app.invocation.error_expiration_secs;

    if !app.referers.is_allowed(ctx.client().referer()) {
        logging::log_critical(ctx, "403 Invalid request");
        return ResponseEnvelope::error(StatusCode::FORBIDDEN, "Invalid request", ttl);
    }

    let tasks = plan_tasks(&app.tasks, ctx);
    match app.dispatcher.dispatch(ctx, tasks).await {
        Ok(results) => ResponseEnvelope::assemble(results),
        Err(e) => {
            logging::log_critical(ctx, &format!("500 {}", e));
            ResponseEnvelope::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Application encountered an error",
                ttl,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AppConfig, TaskConfig, TaskKind};
    use crate::lifecycle::initialize;
    use serde_json::Value;
    use tower::ServiceExt;

    fn server(config: AppConfig) -> HttpServer {
        HttpServer::new(Arc::new(initialize(&config).unwrap()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, referer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(referer) = referer {
            builder = builder.header("referer", referer);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_no_tasks_yields_empty_object() {
        let config = AppConfig {
            tasks: Vec::new(),
            ..AppConfig::default()
        };

        let response = server(config).router().oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-exec-ms"));
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_disallowed_referer_is_forbidden() {
        let mut config = AppConfig {
            tasks: Vec::new(),
            ..AppConfig::default()
        };
        config.security.referers = vec!["example.com".into()];

        let response = server(config.clone())
            .router()
            .oneshot(get("/", Some("https://evil.test/")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["cache-control"], "public, max-age=180");
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["code"], "403");

        let response = server(config)
            .router()
            .oneshot(get("/", Some("https://www.example.com/page")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_connection_is_server_error() {
        let config = AppConfig {
            tasks: vec![TaskConfig {
                field: "ghost".into(),
                connection: "nowhere".into(),
                profile: "default".into(),
                path: None,
                kind: TaskKind::Passthrough,
                requires_parameter: None,
                missing_parameter_message: None,
            }],
            ..AppConfig::default()
        };

        let response = server(config).router().oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["type"], "Error");
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_propagated() {
        let config = AppConfig {
            tasks: Vec::new(),
            ..AppConfig::default()
        };
        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = server(config).router().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
