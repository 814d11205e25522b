//! Per-connection dispatch loop.
//!
//! [`handle_connection`] owns one connection from acceptance to teardown. It
//! registers the connection as a guest, decodes every inbound frame once into
//! an [`InboundMessage`], hands it to the matching use case and turns the
//! outcome into a plain-text [`Notice`] for the sender. Whatever ends the loop
//! (peer close, transport error, session conflict), the [`Registration`] guard
//! unregisters the connection exactly once.

use std::{pin::pin, sync::Arc};

use futures_util::{Stream, StreamExt};

use crate::{
    domain::{ConnectionHandle, ConnectionId, Registration, Username, ValueObjectError},
    infrastructure::dto::websocket::{DecodeError, InboundMessage, Notice},
    ui::state::AppState,
    usecase::{
        AuthOutcome, AuthenticateError, AuthenticateUseCase, ChangeUsernameError,
        ChangeUsernameUseCase, SendChatError, SendChatUseCase,
    },
};

/// Transport-independent view of one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// Binary payloads are not part of the protocol
    Binary,
    /// The peer asked to close
    Close,
}

/// Whether the loop keeps reading after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Routes decoded messages to the use cases
#[derive(Clone)]
pub struct Dispatcher {
    authenticate: AuthenticateUseCase,
    send_chat: SendChatUseCase,
    change_username: ChangeUsernameUseCase,
}

impl Dispatcher {
    pub fn new(state: &AppState) -> Self {
        Self {
            authenticate: AuthenticateUseCase::new(
                state.registry.clone(),
                state.credentials.clone(),
            ),
            send_chat: SendChatUseCase::new(state.registry.clone(), state.messages.clone()),
            change_username: ChangeUsernameUseCase::new(
                state.registry.clone(),
                state.users.clone(),
            ),
        }
    }

    /// Handle one text frame from `connection`.
    pub async fn dispatch(
        &self,
        connection: &ConnectionId,
        handle: &ConnectionHandle,
        text: &str,
    ) -> Flow {
        let message = match InboundMessage::decode(text) {
            Ok(message) => message,
            Err(DecodeError::MissingType) => {
                reply(handle, Notice::TypeNotSpecified);
                return Flow::Continue;
            }
            Err(e @ DecodeError::Malformed(_)) => {
                tracing::warn!("Failed to decode message from {}: {}", connection, e);
                reply(handle, Notice::InvalidFormat);
                return Flow::Continue;
            }
        };
        tracing::debug!("Received {} message from {}", message.type_name(), connection);

        match message {
            InboundMessage::Auth { token } => self.auth(connection, handle, token).await,
            InboundMessage::Chat { content } => {
                self.chat(connection, handle, content).await;
                Flow::Continue
            }
            InboundMessage::UsernameChange { username } => {
                self.rename(connection, handle, username).await;
                Flow::Continue
            }
            InboundMessage::Unknown { r#type } => {
                tracing::warn!("Unknown message type from {}: {}", connection, r#type);
                reply(handle, Notice::UnknownType);
                Flow::Continue
            }
        }
    }

    async fn auth(
        &self,
        connection: &ConnectionId,
        handle: &ConnectionHandle,
        token: Option<String>,
    ) -> Flow {
        let notice = match self.authenticate.execute(connection, token).await {
            Ok(AuthOutcome::Admitted { username }) => Notice::Welcome(username.into_string()),
            Ok(AuthOutcome::Rejected { .. }) => {
                reply(handle, Notice::SessionConflict);
                if let Err(e) = handle.close() {
                    tracing::debug!("Connection {} already closing: {}", connection, e);
                }
                return Flow::Close;
            }
            Err(AuthenticateError::TokenMissing) => Notice::TokenMissing,
            Err(AuthenticateError::InvalidToken) => Notice::InvalidToken,
            Err(AuthenticateError::UserNotFound) => Notice::UserNotFound,
            Err(AuthenticateError::AlreadyAuthenticated) => Notice::AlreadyAuthenticated,
            Err(e @ (AuthenticateError::Storage(_) | AuthenticateError::Registry(_))) => {
                tracing::error!("Authentication failed for {}: {}", connection, e);
                return Flow::Continue;
            }
        };
        reply(handle, notice);
        Flow::Continue
    }

    async fn chat(
        &self,
        connection: &ConnectionId,
        handle: &ConnectionHandle,
        content: Option<String>,
    ) {
        let notice = match self.send_chat.execute(connection, content).await {
            Ok(report) => {
                if !report.failed.is_empty() {
                    tracing::debug!(
                        "Broadcast from {} missed {} connection(s)",
                        connection,
                        report.failed.len()
                    );
                }
                return;
            }
            Err(SendChatError::AuthenticationRequired) => Notice::AuthenticationRequired,
            Err(SendChatError::InvalidContent(ValueObjectError::MessageContentTooLong {
                ..
            })) => Notice::ContentTooLong,
            Err(SendChatError::InvalidContent(_)) => Notice::EmptyContent,
            Err(e) => {
                tracing::error!("Error saving message from {}: {}", connection, e);
                return;
            }
        };
        reply(handle, notice);
    }

    async fn rename(
        &self,
        connection: &ConnectionId,
        handle: &ConnectionHandle,
        username: Option<String>,
    ) {
        let notice = match self.change_username.execute(connection, username).await {
            Ok(_) => Notice::UsernameChanged,
            Err(ChangeUsernameError::InvalidOrUnchanged) => Notice::InvalidOrUnchangedUsername,
            Err(ChangeUsernameError::UserNotFound) => Notice::UserNotFound,
            Err(e) => {
                tracing::error!("Error changing username for {}: {}", connection, e);
                return;
            }
        };
        reply(handle, notice);
    }
}

/// Queue a notice for the sender. A closed queue means the peer is gone.
fn reply(handle: &ConnectionHandle, notice: Notice) {
    if let Err(e) = handle.send_text(notice.to_string()) {
        tracing::debug!("Dropping notice \"{}\": {}", notice, e);
    }
}

/// Run the dispatch loop for one accepted connection until it closes.
///
/// `handle` is the outbound queue of the connection and `inbound` yields its
/// frames; the stream ending is treated as the peer going away. The
/// connection is unregistered before this returns.
pub async fn handle_connection<S>(state: Arc<AppState>, handle: ConnectionHandle, inbound: S)
where
    S: Stream<Item = InboundFrame>,
{
    let registration =
        Registration::new(state.registry.clone(), handle.clone(), Username::guest());
    let connection = *registration.id();

    let dispatcher = Dispatcher::new(&state);
    let mut inbound = pin!(inbound);
    while let Some(frame) = inbound.next().await {
        let flow = match frame {
            InboundFrame::Text(text) => dispatcher.dispatch(&connection, &handle, &text).await,
            InboundFrame::Binary => {
                reply(&handle, Notice::InvalidFormat);
                Flow::Continue
            }
            InboundFrame::Close => {
                tracing::info!("Client {} requested close", connection);
                Flow::Close
            }
        };
        if flow == Flow::Close {
            break;
        }
    }

    drop(registration);
    tracing::debug!(
        "Dispatch loop for {} finished (active sessions: {})",
        connection,
        state.registry.len()
    );
}
