//! WebSocket message DTOs for the chat application.
//!
//! Inbound frames are JSON objects whose values are all strings, e.g.
//! `{"type":"auth","token":"..."}`. They are decoded once into
//! [`InboundMessage`]; everything downstream works on the typed variant.
//! Outbound frames are plain text ([`Notice`] or a `name: content` chat line).

use std::{collections::HashMap, fmt};

use thiserror::Error;

/// Message type discriminators
pub mod message_type {
    pub const AUTH: &str = "auth";
    pub const CHAT: &str = "chat";
    pub const USERNAME_CHANGE: &str = "username_change";
}

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// `{"type":"auth","token":...}`
    Auth { token: Option<String> },
    /// `{"type":"chat","content":...}`
    Chat { content: Option<String> },
    /// `{"type":"username_change","username":...}`
    UsernameChange { username: Option<String> },
    /// Any other discriminator
    Unknown { r#type: String },
}

/// Why an inbound frame could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not a JSON object of string values
    #[error("invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `type` absent or empty
    #[error("message type not specified")]
    MissingType,
}

impl InboundMessage {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let mut fields: HashMap<String, String> = serde_json::from_str(text)?;
        let kind = fields
            .remove("type")
            .filter(|kind| !kind.is_empty())
            .ok_or(DecodeError::MissingType)?;

        let message = match kind.as_str() {
            message_type::AUTH => Self::Auth {
                token: fields.remove("token"),
            },
            message_type::CHAT => Self::Chat {
                content: fields.remove("content"),
            },
            message_type::USERNAME_CHANGE => Self::UsernameChange {
                username: fields.remove("username"),
            },
            _ => Self::Unknown { r#type: kind },
        };
        Ok(message)
    }

    /// The discriminator, for logging
    pub fn type_name(&self) -> &str {
        match self {
            Self::Auth { .. } => message_type::AUTH,
            Self::Chat { .. } => message_type::CHAT,
            Self::UsernameChange { .. } => message_type::USERNAME_CHANGE,
            Self::Unknown { r#type } => r#type,
        }
    }
}

/// Plain-text status frames sent back to a single connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    TypeNotSpecified,
    InvalidFormat,
    UnknownType,
    TokenMissing,
    InvalidToken,
    UserNotFound,
    AlreadyAuthenticated,
    Welcome(String),
    /// Sent to the connection that already holds the identity
    LoginAttemptWarning,
    /// Sent to the rejected connection right before it is closed
    SessionConflict,
    AuthenticationRequired,
    EmptyContent,
    ContentTooLong,
    InvalidOrUnchangedUsername,
    UsernameChanged,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeNotSpecified => f.write_str("Message type not specified"),
            Self::InvalidFormat => f.write_str("Invalid message format"),
            Self::UnknownType => f.write_str("Unknown message type"),
            Self::TokenMissing => f.write_str("Authentication token missing"),
            Self::InvalidToken => f.write_str("Invalid authentication token"),
            Self::UserNotFound => f.write_str("User not found"),
            Self::AlreadyAuthenticated => f.write_str("Already authenticated"),
            Self::Welcome(name) => write!(f, "Welcome, {name}!"),
            Self::LoginAttemptWarning => f.write_str(
                "Warning: Someone is trying to login to your account from another location",
            ),
            Self::SessionConflict => f.write_str("Account already active in another session"),
            Self::AuthenticationRequired => f.write_str("Authentication required"),
            Self::EmptyContent => f.write_str("Message content cannot be empty"),
            Self::ContentTooLong => f.write_str("Message content too long"),
            Self::InvalidOrUnchangedUsername => f.write_str("Invalid or unchanged username"),
            Self::UsernameChanged => f.write_str("Username successfully changed"),
        }
    }
}

/// Format a broadcast chat line
pub fn chat_line(username: &str, content: &str) -> String {
    format!("{username}: {content}")
}
