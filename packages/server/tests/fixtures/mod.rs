//! Shared helpers for integration tests.
//!
//! `TestServer` runs the real router in-process on an ephemeral port, wired to
//! a fake toxicity service that rejects anything containing "toxic" and fails
//! with 500 on anything containing "explode".

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Json, Router, http::StatusCode, routing::post};
use campfire_server::{ServerConfig, ui::create_app, ui::state::AppState};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

async fn check_toxicity(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let message = body["message"].as_str().unwrap_or_default();
    if message.contains("explode") {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})))
    } else if message.contains("toxic") {
        (
            StatusCode::OK,
            Json(json!({"allowed": false, "reason": "toxic", "score": 0.9, "language": "en"})),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({"allowed": true, "score": 0.01, "language": "en"})),
        )
    }
}

async fn spawn_classifier() -> (SocketAddr, JoinHandle<()>) {
    let app = Router::new().route("/check-toxicity", post(check_toxicity));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    server: JoinHandle<()>,
    classifier: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_groups(&[]).await
    }

    /// Start with groups created at startup
    pub async fn start_with_groups(groups: &[&str]) -> Self {
        let (classifier_addr, classifier) = spawn_classifier().await;
        let mut config = ServerConfig::for_local(format!("http://{classifier_addr}"));
        config.classifier_timeout = Duration::from_secs(2);
        config.seed_groups = groups.iter().map(|name| name.to_string()).collect();

        let (app, state) = create_app(&config).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
            classifier,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, query: &str) -> String {
        if query.is_empty() {
            format!("ws://{}/ws", self.addr)
        } else {
            format!("ws://{}/ws?{}", self.addr, query)
        }
    }

    /// Register a user and return `(user_id, token)`
    pub async fn signup(&self, client: &reqwest::Client, name: &str) -> (String, String) {
        let response = client
            .post(format!("{}/api/signup", self.base_url()))
            .json(&json!({
                "email": format!("{name}@example.com"),
                "password": "correct horse",
                "name": name,
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        (
            body["user_id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Create a group and return its id
    pub async fn create_group(&self, client: &reqwest::Client, name: &str) -> String {
        let response = client
            .post(format!("{}/api/groups", self.base_url()))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
        self.classifier.abort();
    }
}

/// WebSocket client speaking the `{"event", "data"}` envelope
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("Failed to connect");
        Self { stream }
    }

    pub async fn emit(&mut self, event: &str, data: Value) {
        let frame = json!({ "event": event, "data": data }).to_string();
        self.stream
            .send(Message::Text(frame.into()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn send_chat(&mut self, content: &str, user_id: &str, group_id: &str) {
        self.emit(
            "chat message",
            json!({
                "content": content,
                "user": { "_id": user_id },
                "group": { "_id": group_id },
            }),
        )
        .await;
    }

    /// Next event as `(name, data)`; panics after two seconds of silence
    pub async fn next_event(&mut self) -> (String, Value) {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(2), self.stream.next())
                .await
                .expect("Timed out waiting for an event")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                let mut value: Value = serde_json::from_str(text.as_str()).unwrap();
                let name = value["event"].as_str().unwrap().to_string();
                return (name, value["data"].take());
            }
        }
    }

    /// Asserts that nothing arrives within `wait`
    pub async fn expect_silence(&mut self, wait: Duration) {
        match tokio::time::timeout(wait, self.stream.next()).await {
            Err(_) => {}
            Ok(Some(Ok(Message::Text(text)))) => panic!("Unexpected event: {}", text.as_str()),
            Ok(other) => panic!("Unexpected frame: {other:?}"),
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
