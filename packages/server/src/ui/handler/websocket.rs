//! WebSocket connection handlers.

use std::{future, sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionHandle, OutboundFrame},
    ui::{
        session::{InboundFrame, handle_connection},
        state::AppState,
    },
};

/// How long queued frames may take to flush once the session has ended
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    // Spawn a task that writes queued frames to this client
    let (handle, outbound) = ConnectionHandle::channel();
    let mut writer = tokio::spawn(write_outbound(sender, outbound));

    let inbound = receiver
        .take_while(|message| {
            if let Err(e) = message {
                tracing::warn!("WebSocket error: {}", e);
            }
            future::ready(message.is_ok())
        })
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(InboundFrame::Text(text.as_str().to_string())),
                Ok(Message::Binary(_)) => Some(InboundFrame::Binary),
                Ok(Message::Close(_)) => Some(InboundFrame::Close),
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => None,
            })
        });

    handle_connection(state, handle, inbound).await;

    // The registry no longer holds the handle; the writer stops once the
    // remaining queued frames are written.
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        tracing::warn!("Writer did not drain in time, aborting");
        writer.abort();
    }
}

async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            OutboundFrame::Text(text) => {
                if let Err(e) = sender.send(Message::Text(text.into())).await {
                    tracing::debug!("Failed to write frame: {}", e);
                    return;
                }
            }
            OutboundFrame::Close => {
                if let Err(e) = sender.send(Message::Close(None)).await {
                    tracing::debug!("Failed to write close frame: {}", e);
                }
                return;
            }
        }
    }
    if let Err(e) = sender.close().await {
        tracing::debug!("Failed to close socket: {}", e);
    }
}
