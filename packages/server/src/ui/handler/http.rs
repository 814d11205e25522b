//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    infrastructure::dto::http::{
        AccessTokenDto, ApiResponse, ChatMessageDto, HistoryQuery, LoginRequest, RegisterRequest,
        UserDto,
    },
    ui::state::AppState,
    usecase::{
        LoginError, LoginUseCase, RegisterUserCommand, RegisterUserError, RegisterUserUseCase,
    },
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Default number of messages returned by `GET /api/messages`
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Upper bound for the `limit` query parameter
const MAX_HISTORY_LIMIT: usize = 1000;

/// Recent chat history, oldest first
pub async fn recent_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    match state.messages.list_recent(limit).await {
        Ok(messages) => {
            let messages: Vec<ChatMessageDto> =
                messages.iter().map(ChatMessageDto::from).collect();
            respond(StatusCode::OK, "Fetch Messages Success", messages)
        }
        Err(e) => {
            tracing::error!("Failed to load chat history: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, "Failed to find data", ())
        }
    }
}

/// Create a user account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let usecase = RegisterUserUseCase::new(state.users.clone(), state.hasher);
    let command = RegisterUserCommand {
        username: request.username,
        password: request.password,
        email: request.email,
    };

    match usecase.execute(command).await {
        Ok(user) => respond(StatusCode::OK, "Register Success", UserDto::from(&user)),
        Err(RegisterUserError::Validation(errors)) => respond(
            StatusCode::BAD_REQUEST,
            "Validation Error, Please More Carefully Insert The Data",
            errors,
        ),
        Err(RegisterUserError::UsernameTaken(username)) => {
            respond(StatusCode::CONFLICT, "Username already taken", username)
        }
        Err(RegisterUserError::Storage(e)) => {
            respond(StatusCode::INTERNAL_SERVER_ERROR, "Failed to insert data", e)
        }
        Err(e @ RegisterUserError::Hashing(_)) => {
            tracing::error!("Registration failed: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, "Failed to insert data", ())
        }
    }
}

/// Issue an access token for the WebSocket `auth` message
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let usecase = LoginUseCase::new(
        state.users.clone(),
        state.tokens.clone(),
        state.hasher,
        state.token_ttl,
    );

    match usecase.execute(request.username, request.password).await {
        Ok(token) => respond(
            StatusCode::OK,
            "Generate Token Success",
            AccessTokenDto::from(&token),
        ),
        Err(LoginError::InvalidCredentials) => {
            respond(StatusCode::UNAUTHORIZED, "Invalid username or password", ())
        }
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, "Failed Generate Token", ())
        }
    }
}

fn respond<T: serde::Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(ApiResponse::new(message, data))).into_response()
}
