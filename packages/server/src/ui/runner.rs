//! Router construction and the server entry point.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    error::ServerError,
    ui::{
        handler::{health_check, login, recent_messages, register, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
};

/// Build the application router
///
/// Every route accepts cross-origin requests so browser clients served from
/// another origin can register, log in and open the socket.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/messages", get(recent_messages))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listener and serve until a shutdown signal arrives
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let state = Arc::new(AppState::in_memory(config.token_ttl()));
    let address = config.bind_address();

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}
