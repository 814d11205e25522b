//! HTTP API request / response DTOs for the chat application.

use serde::{Deserialize, Serialize};

use kaiwa_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{AccessToken, ChatMessage, User};

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Envelope shared by every auth endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Public view of a user; the password hash never leaves the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
        }
    }
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenDto {
    pub user_id: i64,
    pub token: String,
    pub created_at: String, // ISO 8601
    pub expired_at: String, // ISO 8601
}

impl From<&AccessToken> for AccessTokenDto {
    fn from(token: &AccessToken) -> Self {
        Self {
            user_id: token.user_id.value(),
            token: token.token.as_str().to_string(),
            created_at: timestamp_to_jst_rfc3339(token.created_at.value()),
            expired_at: timestamp_to_jst_rfc3339(token.expired_at.value()),
        }
    }
}

/// Query of `GET /api/messages`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// One stored chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub username: String,
    pub content: String,
    pub timestamp: String, // ISO 8601
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            username: message.username.as_str().to_string(),
            content: message.content.as_str().to_string(),
            timestamp: timestamp_to_jst_rfc3339(message.timestamp.value()),
        }
    }
}
