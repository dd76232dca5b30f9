//! # Integration Tests for the static host
//!
//! Route behaviour through `oneshot`, lifecycle through real listeners on
//! ephemeral ports.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use eidas_api::host::router;
use eidas_api::{HttpCounts, HttpServer, ServerError, StatusBoard, StatusReport};

fn web_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>eIDAS</h1>").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
    dir
}

fn ephemeral() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(app: axum::Router, uri: &str) -> axum::http::Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Minimal HTTP/1.1 client: returns the raw response.
async fn fetch(addr: SocketAddr, path: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

// -- Routes -------------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let root = web_root();
    let response = get(router(root.path(), StatusBoard::new()), "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let root = web_root();
    let response = get(router(root.path(), StatusBoard::new()), "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_serves_index_and_nested_files() {
    let root = web_root();
    let app = router(root.path(), StatusBoard::new());

    let response = get(app.clone(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>eIDAS</h1>");

    let response = get(app, "/assets/app.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "console.log(1)");
}

#[tokio::test]
async fn test_missing_file_is_404_and_counted() {
    let root = web_root();
    let board = StatusBoard::new();
    let app = router(root.path(), board.clone());

    let response = get(app.clone(), "/nope.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    get(app, "/").await;

    assert_eq!(board.http().requests(), 2);
    assert_eq!(board.http().errors(), 1);
}

#[tokio::test]
async fn test_status_reports_counters() {
    let root = web_root();
    let response = get(router(root.path(), StatusBoard::new()), "/status").await;
    assert_eq!(response.status(), StatusCode::OK);
    let report: StatusReport = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(report.server, None);
    assert_eq!(report.socket, None);
    assert_eq!(report.sessions.opened, 0);
    assert_eq!(report.sessions.active, 0);
    assert_eq!(report.http, HttpCounts { requests: 0, errors: 0 });
}

// -- Lifecycle ----------------------------------------------------------------

#[tokio::test]
async fn test_start_serves_files_over_tcp() {
    let root = web_root();
    let board = StatusBoard::new();
    let mut server = HttpServer::new(board.clone());
    let addr = server.start(ephemeral(), root.path()).await.unwrap();
    assert!(server.is_started());
    assert_eq!(board.endpoints().server, Some(addr));

    let response = fetch(addr, "/").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("<h1>eIDAS</h1>"));

    let missing = fetch(addr, "/missing.js").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

    let status = fetch(addr, "/status").await;
    assert!(status.contains(&format!("\"server\":\"http://{addr}\"")), "{status}");
    assert!(status.contains(r#""http":{"requests":2,"errors":1}"#), "{status}");

    server.close().await.unwrap();
    assert!(board.endpoints().server.is_none());
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let root = web_root();
    let mut server = HttpServer::new(StatusBoard::new());
    server.start(ephemeral(), root.path()).await.unwrap();
    let err = server.start(ephemeral(), root.path()).await.unwrap_err();
    assert!(matches!(err, ServerError::AlreadyStarted("http")));
    server.close().await.unwrap();
}

#[tokio::test]
async fn test_close_without_start_is_rejected() {
    let mut server = HttpServer::new(StatusBoard::new());
    let err = server.close().await.unwrap_err();
    assert!(matches!(err, ServerError::NotStarted("http")));
}

#[tokio::test]
async fn test_restart_after_close() {
    let root = web_root();
    let mut server = HttpServer::new(StatusBoard::new());
    let first = server.start(ephemeral(), root.path()).await.unwrap();
    server.close().await.unwrap();
    assert!(tokio::net::TcpStream::connect(first).await.is_err());

    let second = server.start(ephemeral(), root.path()).await.unwrap();
    assert!(fetch(second, "/health/liveness").await.ends_with("ok"));
    server.close().await.unwrap();
    assert!(!server.is_started());
}

#[tokio::test]
async fn test_missing_web_root_is_rejected() {
    let root = web_root();
    let missing = root.path().join("dist");
    let mut server = HttpServer::new(StatusBoard::new());
    let err = server.start(ephemeral(), &missing).await.unwrap_err();
    assert!(matches!(err, ServerError::WebRoot(path) if path == missing));
    assert!(!server.is_started());
}

#[tokio::test]
async fn test_bind_conflict_is_reported() {
    let root = web_root();
    let taken = tokio::net::TcpListener::bind(ephemeral()).await.unwrap();
    let addr = taken.local_addr().unwrap();
    let mut server = HttpServer::new(StatusBoard::new());
    let err = server.start(addr, root.path()).await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { server: "http", .. }));
}
