//! One upstream failing must never take down its siblings.

use serde_json::{json, Value};
use std::time::{Duration, Instant};

use common::{client, config_for, games_body, start_app, MockRoute, MockUpstream};

mod common;

const PREDICTION: &str = r#"{"prediction":"Outlook good"}"#;
const WEATHER: &str = r#"{"name":"Chicago"}"#;

async fn get_json(url: String) -> (reqwest::StatusCode, Value) {
    let response = client().get(url).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_upstream_error_becomes_placeholder() {
    let upstream = MockUpstream::start(&[
        ("/games/", MockRoute::ok(games_body())),
        ("/8ball/", MockRoute::status(500, "oops")),
        ("/weather", MockRoute::ok(WEATHER)),
    ])
    .await;
    let (addr, shutdown) = start_app(config_for(upstream.addr, "key")).await;

    let (status, body) = get_json(format!("http://{}/?play=7", addr)).await;
    assert_eq!(status, 200);
    assert_eq!(body["prediction"], json!({ "msg": "error" }));
    assert_eq!(body["game"], json!("Chess"));
    assert_eq!(body["weather"]["name"], json!("Chicago"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_games_payload_fails_only_game_fields() {
    let upstream = MockUpstream::start(&[
        ("/games/", MockRoute::ok("<html>maintenance</html>")),
        ("/8ball/", MockRoute::ok(PREDICTION)),
        ("/weather", MockRoute::ok(WEATHER)),
    ])
    .await;
    let (addr, shutdown) = start_app(config_for(upstream.addr, "key")).await;

    let (status, body) = get_json(format!("http://{}/?game=Chess", addr)).await;
    assert_eq!(status, 200);
    for field in ["game", "gameindex", "games"] {
        assert_eq!(body[field], json!({ "msg": "error" }), "field {}", field);
    }
    assert_eq!(body["prediction"], json!("Outlook good"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_wrong_shape_fails_only_that_field() {
    let upstream = MockUpstream::start(&[
        ("/games/", MockRoute::ok(games_body())),
        ("/8ball/", MockRoute::ok(r#"{"answer":"maybe"}"#)),
        ("/weather", MockRoute::ok(WEATHER)),
    ])
    .await;
    let (addr, shutdown) = start_app(config_for(upstream.addr, "key")).await;

    let (_, body) = get_json(format!("http://{}/?play=-1", addr)).await;
    assert_eq!(body["prediction"], json!({ "msg": "error" }));
    assert_eq!(body["game"], json!("Tic-Tac-Toe"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_is_cut_at_budget() {
    let upstream = MockUpstream::start(&[
        ("/games/", MockRoute::ok(games_body())),
        ("/8ball/", MockRoute::ok(PREDICTION).delayed(Duration::from_secs(3))),
        ("/weather", MockRoute::ok(WEATHER)),
    ])
    .await;

    let mut config = config_for(upstream.addr, "key");
    config.invocation.timeout_ms = 1500;
    config.invocation.headroom_ms = 500;
    let (addr, shutdown) = start_app(config).await;

    let started = Instant::now();
    let (status, body) = get_json(format!("http://{}/?play=7", addr)).await;
    let elapsed = started.elapsed();

    assert_eq!(status, 200);
    assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);
    assert_eq!(body["prediction"], json!({ "msg": "error" }));
    assert_eq!(body["game"], json!("Chess"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let (addr, shutdown) = start_app(config_for(dead, "key")).await;

    let (status, body) = get_json(format!("http://{}/", addr)).await;
    assert_eq!(status, 200);
    for field in ["game", "prediction", "weather", "gameindex", "games"] {
        assert_eq!(body[field], json!({ "msg": "error" }), "field {}", field);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_stale_entry_served_on_error() {
    let upstream = MockUpstream::start(&[
        ("/games/", MockRoute::ok(games_body())),
        ("/8ball/", MockRoute::ok(PREDICTION)),
        ("/weather", MockRoute::ok(WEATHER)),
    ])
    .await;

    let mut config = config_for(upstream.addr, "key");
    for profile in &mut config.connections[0].cache {
        if profile.profile == "games" {
            profile.default_expiration_in_seconds = 1;
        }
    }
    let (addr, shutdown) = start_app(config).await;

    let (_, body) = get_json(format!("http://{}/?play=7", addr)).await;
    assert_eq!(body["game"], json!("Chess"));

    tokio::time::sleep(Duration::from_millis(2100)).await;
    upstream.set_route("/games/", MockRoute::status(503, "down"));

    let (_, body) = get_json(format!("http://{}/?play=7", addr)).await;
    assert_eq!(body["game"], json!("Chess"));
    assert_eq!(body["games"]["gamechoices"][6], json!("Chess"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_disallowed_referer_never_dispatches() {
    let upstream = MockUpstream::start(&[("/games/", MockRoute::ok(games_body()))]).await;

    let mut config = config_for(upstream.addr, "key");
    config.security.referers = vec!["example.com".into()];
    let (addr, shutdown) = start_app(config).await;

    let response = client()
        .get(format!("http://{}/", addr))
        .header("referer", "https://elsewhere.test/")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], json!("Invalid request"));
    assert_eq!(upstream.hits("/games/"), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_stale_entry_served_when_upstream_is_slow() {
    let upstream = MockUpstream::start(&[
        ("/games/", MockRoute::ok(games_body())),
        ("/8ball/", MockRoute::ok(PREDICTION)),
        ("/weather", MockRoute::ok(WEATHER)),
    ])
    .await;

    let mut config = config_for(upstream.addr, "key");
    config.invocation.timeout_ms = 1500;
    config.invocation.headroom_ms = 500;
    for profile in &mut config.connections[0].cache {
        if profile.profile == "games" {
            profile.default_expiration_in_seconds = 1;
        }
    }
    let (addr, shutdown) = start_app(config).await;

    let (_, body) = get_json(format!("http://{}/?play=7", addr)).await;
    assert_eq!(body["game"], json!("Chess"));

    tokio::time::sleep(Duration::from_millis(2100)).await;
    upstream.set_route("/games/", MockRoute::ok(games_body()).delayed(Duration::from_secs(3)));

    let started = Instant::now();
    let (status, body) = get_json(format!("http://{}/?play=7", addr)).await;
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(status, 200);
    assert_eq!(body["game"], json!("Chess"));
    assert_eq!(body["games"]["gamechoices"][6], json!("Chess"));

    shutdown.trigger();
}
