//! End-to-end scenarios for route management and server lifecycle.

use ai_mock_server::config::loader::parse_config;
use ai_mock_server::http::ErrorEnvelope;
use ai_mock_server::{MockServer, MockServerConfig, ResponseStrategy, ServerError};

mod common;

#[tokio::test]
async fn test_static_route_hello_world() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;
    server.add_route("/api/test", "GET", ResponseStrategy::static_text("Hello World"));

    let res = common::client().get(format!("{}/api/test", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Hello World");

    server.stop().await;
}

#[tokio::test]
async fn test_unconfigured_path_is_404_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;

    let res = common::client().get(format!("{}/missing", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["content-type"], "application/json");

    let envelope: ErrorEnvelope = res.json().await.unwrap();
    assert_eq!(envelope.status, 404);
    assert_eq!(envelope.error, "No route configured for GET /missing");

    server.stop().await;
}

#[tokio::test]
async fn test_clear_routes() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;
    server.add_route("/api/test", "GET", ResponseStrategy::static_text("Hello World"));
    server.add_route("/api/other", "*", ResponseStrategy::static_json("{}"));

    server.clear_routes();

    let res = common::client().get(format!("{}/api/test", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    server.stop().await;
}

#[tokio::test]
async fn test_remove_route() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;
    server.add_route("/api/test", "GET", ResponseStrategy::static_text("Hello World"));

    assert!(server.remove_route("/api/test", "GET"));
    assert!(!server.remove_route("/api/test", "GET"));

    let res = common::client().get(format!("{}/api/test", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    server.stop().await;
}

#[tokio::test]
async fn test_first_matching_route_wins() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;
    server.add_route("/users/{id}", "GET", ResponseStrategy::static_text("by id"));
    server.add_route("/users/{*}", "*", ResponseStrategy::static_text("catch all"));

    let client = common::client();
    let res = client.get(format!("{}/USERS/42", base)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "by id");

    let res = client.delete(format!("{}/users/42/posts", base)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "catch all");

    server.stop().await;
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;
    server.add_route("/ping", "GET", ResponseStrategy::static_text("pong"));

    let client = common::client();
    let res = client.get(format!("{}/ping", base)).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let res = client
        .get(format!("{}/ping", base))
        .header("x-request-id", "client-chosen")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "client-chosen");

    server.stop().await;
}

#[tokio::test]
async fn test_second_start_is_rejected_and_stop_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (server, base) = common::start_server(common::test_config(dir.path()), common::StubBackend::replying("{}")).await;

    assert!(matches!(server.start().await, Err(ServerError::AlreadyRunning)));
    assert!(server.is_running().await);
    assert_eq!(server.base_url().await.as_deref(), Some(base.as_str()));

    server.stop().await;
    server.stop().await;
    assert!(!server.is_running().await);
    assert!(server.local_addr().await.is_none());

    // Closed listener.
    assert!(common::client().get(format!("{}/", base)).send().await.is_err());

    // A stopped server can be started again.
    let addr = server.start().await.unwrap();
    assert_eq!(server.local_addr().await, Some(addr));
    server.stop().await;
}

#[tokio::test]
async fn test_missing_credential_fails_construction() {
    let err = MockServer::new(MockServerConfig::default()).unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
    assert!(err.to_string().contains("API key"));

    let err = MockServer::with_backend(MockServerConfig::default(), common::StubBackend::replying("{}")).unwrap_err();
    assert!(matches!(err, ServerError::Config(_)));
}

#[tokio::test]
async fn test_routes_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let body_file = dir.path().join("orders.json");
    std::fs::write(&body_file, r#"[{"id":1}]"#).unwrap();

    let text = format!(
        r#"
            api_key = "sk-test"
            cache_directory = "{cache}"

            [[routes]]
            pattern = "/health"
            method = "GET"
            strategy = {{ type = "static", body = "ok", content_type = "text/plain" }}

            [[routes]]
            pattern = "/orders"
            strategy = {{ type = "file", path = "{file}" }}
        "#,
        cache = dir.path().join("cache").display(),
        file = body_file.display(),
    );
    let config = parse_config(&text, None).unwrap();
    let (server, base) = common::start_server(config, common::StubBackend::replying("{}")).await;
    assert_eq!(server.routes().len(), 2);

    let client = common::client();
    let res = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client.post(format!("{}/orders", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), r#"[{"id":1}]"#);

    std::fs::remove_file(&body_file).unwrap();
    let res = client.get(format!("{}/orders", base)).send().await.unwrap();
    assert_eq!(res.status(), 500);

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path());
    config.set_max_body_bytes(16).unwrap();
    let (server, base) = common::start_server(config, common::StubBackend::replying("{}")).await;
    server.add_route("/upload", "POST", ResponseStrategy::static_text("stored"));

    let res = common::client()
        .post(format!("{}/upload", base))
        .body("x".repeat(64))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    server.stop().await;
}

#[tokio::test]
async fn test_router_serves_on_caller_owned_listener() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::with_backend(common::test_config(dir.path()), common::StubBackend::replying("{}")).unwrap();
    server.add_route("/embedded", "GET", ResponseStrategy::static_text("from router"));

    let shutdown = tokio_util::sync::CancellationToken::new();
    let app = server.router(shutdown.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let signal = shutdown.clone().cancelled_owned();
    let task = tokio::spawn(async move { axum::serve(listener, app).with_graceful_shutdown(signal).await });

    let res = common::client().get(format!("http://{}/embedded", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "from router");

    // The server's own listener is untouched.
    assert!(!server.is_running().await);

    shutdown.cancel();
    task.await.unwrap().unwrap();
}
