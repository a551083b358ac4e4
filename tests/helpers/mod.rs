#![allow(dead_code)] // Test helpers appear unused when compiled independently

use axum::{
    extract::{Query, State},
    http::Uri,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "secret";
pub const PLAYER_ID: i64 = 42;

/// One request seen by the mock API
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
}

#[derive(Clone, Default)]
struct ApiState {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ApiState {
    async fn record(&self, path: &str, body: Value) {
        self.requests.lock().await.push(Recorded {
            path: path.to_string(),
            body,
        });
    }
}

pub struct MockApi {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl MockApi {
    pub async fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().await.clone()
    }

    pub async fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// Best-effort check for whether binding to loopback is permitted in the current sandbox.
pub async fn can_bind_loopback() -> bool {
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => false,
        Err(_) => true, // treat other errors as non-fatal for skipping
    }
}

/// A loopback URL nothing is listening on
pub async fn dead_url() -> String {
    let port = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{}", port)
}

/// Spawn the mock coaching API on a free port
pub async fn spawn_mock_api() -> MockApi {
    let state = ApiState::default();
    let requests = state.requests.clone();

    let app = Router::new()
        .route("/login", get(login))
        .route("/register", post(register))
        .route("/reset-password", post(reset_password))
        .route("/player_metric", post(player_metric))
        .route("/coach", post(coach))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock API listener");
    let url = format!("http://{}", listener.local_addr().unwrap());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = server.await {
            eprintln!("mock API server error: {}", err);
        }
    });

    MockApi {
        url,
        requests,
        shutdown_tx,
        handle,
    }
}

async fn login(
    State(state): State<ApiState>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state
        .record(uri.path(), json!({ "username": params.get("username") }))
        .await;

    if params.get("password").map(String::as_str) == Some(PASSWORD) {
        Json(json!({
            "token": "abc",
            "type": "bearer",
            "expires": "2030-01-01T00:00:00Z",
            "is_error": false,
            "player_id": PLAYER_ID
        }))
    } else {
        Json(json!({
            "token": "",
            "type": "",
            "expires": "",
            "is_error": true,
            "error_message": "invalid credentials"
        }))
    }
}

async fn register(State(state): State<ApiState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("/register", body).await;
    Json(json!({ "success": true }))
}

async fn reset_password(State(state): State<ApiState>, Json(body): Json<Value>) -> Json<Value> {
    let known = body["email"] == "sara@example.com";
    state.record("/reset-password", body).await;
    Json(json!({ "success": known }))
}

async fn player_metric(State(state): State<ApiState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("/player_metric", body).await;
    Json(json!({ "status": "ok" }))
}

async fn coach(State(state): State<ApiState>, Json(body): Json<Value>) -> Json<Value> {
    let message = body["message"].as_str().unwrap_or_default().to_string();
    state.record("/coach", body).await;
    Json(json!({
        "response": format!("You said: {}", message),
        "player_name": "Sara"
    }))
}
