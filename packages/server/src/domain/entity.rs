//! Core domain models for the chat application.

use serde::{Deserialize, Serialize};

use super::{
    connection::ConnectionHandle,
    value_object::{
        ConnectionId, Credential, Email, MessageContent, PasswordHash, Timestamp, UserId, Username,
    },
};

/// The identity bound to a connection once it has authenticated.
///
/// Credential and user id are set together, so a session is either fully
/// authenticated or a guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Token presented in the `auth` frame
    pub credential: Credential,
    /// User resolved from the token
    pub user_id: UserId,
}

/// Per-connection client state held by the connection registry
#[derive(Debug, Clone)]
pub struct ClientSession {
    /// Registry key of the connection
    pub id: ConnectionId,
    /// Outbound queue of the connection
    pub handle: ConnectionHandle,
    /// Name shown in front of chat lines; "Guest" until authenticated or renamed
    pub username: Username,
    /// `None` while the connection is still a guest
    pub identity: Option<SessionIdentity>,
    /// Timestamp when the connection was accepted
    pub connected_at: Timestamp,
}

impl ClientSession {
    /// Create a guest session for a freshly accepted connection
    pub fn guest(id: ConnectionId, handle: ConnectionHandle, username: Username) -> Self {
        Self {
            id,
            handle,
            username,
            identity: None,
            connected_at: Timestamp::now(),
        }
    }

    /// Whether the session has passed `auth`
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// A registered user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Unique username
    pub username: Username,
    /// Contact address
    pub email: Email,
    /// Salted password digest
    pub password_hash: PasswordHash,
}

/// A user account that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub password_hash: PasswordHash,
}

/// An issued session credential and its lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Owner of the token
    pub user_id: UserId,
    /// Opaque token string
    pub token: Credential,
    /// Issue time
    pub created_at: Timestamp,
    /// The token is rejected from this instant on
    pub expired_at: Timestamp,
}

impl AccessToken {
    /// Whether the token is no longer usable at `now`
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expired_at
    }
}

/// Identity resolved from a valid credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: Username,
}

/// Represents a stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the sender at the time of sending
    pub username: Username,
    /// Message content
    pub content: MessageContent,
    /// Timestamp when the message was sent
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(username: Username, content: MessageContent, timestamp: Timestamp) -> Self {
        Self {
            username,
            content,
            timestamp,
        }
    }
}
