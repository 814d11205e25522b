//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use kaiwa_server::{
    infrastructure::auth::PasswordHasher,
    ui::{router, state::AppState},
};
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A server running on an ephemeral local port for the duration of a test.
pub struct TestServer {
    address: String,
    pub state: Arc<AppState>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with in-memory storage.
    ///
    /// The listener is bound before this returns, so requests can be sent
    /// immediately.
    pub fn start() -> Self {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind test listener");
        listener
            .set_nonblocking(true)
            .expect("Failed to set non-blocking");
        let address = listener
            .local_addr()
            .expect("Failed to read local address")
            .to_string();
        let listener =
            tokio::net::TcpListener::from_std(listener).expect("Failed to adopt listener");

        // 既定の反復回数はデバッグビルドでは遅いため小さくする
        let state = Arc::new(AppState {
            hasher: PasswordHasher::with_iterations(1_000),
            ..AppState::in_memory(Duration::from_secs(60 * 60))
        });
        let app = router(state.clone());
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            address,
            state,
            task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.address)
    }

    /// Register `username` and log in, returning the issued token.
    pub async fn issue_token(&self, username: &str) -> String {
        let client = reqwest::Client::new();
        let password = "password123";

        let response = client
            .post(format!("{}/auth/register", self.base_url()))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "email": format!("{username}@example.com"),
            }))
            .send()
            .await
            .expect("Failed to send register request");
        assert_eq!(response.status(), 200);

        let response = client
            .post(format!("{}/auth/login", self.base_url()))
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        body["data"]["token"]
            .as_str()
            .expect("token missing from login response")
            .to_string()
    }

    /// Open a WebSocket connection to `/ws`.
    pub async fn connect(&self) -> WsClient {
        let (ws, _) = tokio_tungstenite::connect_async(self.ws_url())
            .await
            .expect("Failed to connect WebSocket");
        ws
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Send one JSON text frame.
pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Failed to send frame");
}

/// Wait for the next text frame, skipping pings.
pub async fn recv_text(ws: &mut WsClient) -> String {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("Stream ended")
            .expect("WebSocket error");
        match message {
            Message::Text(text) => return text.as_str().to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Unexpected frame: {other:?}"),
        }
    }
}

/// Whether the server closes the connection within a short time.
pub async fn closed_by_server(ws: &mut WsClient) -> bool {
    let wait = async {
        while let Some(message) = ws.next().await {
            match message {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    };
    tokio::time::timeout(Duration::from_secs(2), wait)
        .await
        .unwrap_or(false)
}
