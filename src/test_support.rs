use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use health_checker::{HealthCheckerConfig, HealthMonitor, InMemoryRegistry, RegistryEntry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::routes::AppState;

pub fn test_state(entries: Vec<RegistryEntry>) -> AppState {
    let config = HealthCheckerConfig {
        http_timeout: Duration::from_secs(5),
        ..Default::default()
    };

    AppState {
        monitor: HealthMonitor::build(&config).unwrap(),
        registry: Arc::new(InMemoryRegistry::new(entries)),
        proxy_client: reqwest::Client::new(),
        proxy_timeout: Duration::from_secs(5),
    }
}

/// Local stand-in for third-party APIs. Returns its base URL.
pub async fn spawn_target_server() -> String {
    let app = Router::new()
        .route("/ok", get(|| async { "hello" }))
        .route("/broken", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/auth", get(|| async { (StatusCode::UNAUTHORIZED, "unauthorized") }))
        .route(
            "/json",
            get(|| async { axum::Json(serde_json::json!({ "fact": "Cats sleep a lot" })) }),
        )
        .route(
            "/json-as-text",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], r#"{"ok":true}"#) }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Accepts connections and never answers.
pub async fn spawn_hanging_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_response().into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
