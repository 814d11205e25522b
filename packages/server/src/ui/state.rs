//! Shared application state.

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{
        AccessTokenRepository, ChatMessageRepository, ConnectionRegistry, CredentialValidator,
        UserRepository,
    },
    infrastructure::{
        auth::{PasswordHasher, TokenCredentialValidator},
        repository::{
            InMemoryAccessTokenRepository, InMemoryChatMessageRepository, InMemoryUserRepository,
        },
    },
};

/// Shared application state
pub struct AppState {
    /// Live connections (the only shared mutable state of the chat core)
    pub registry: Arc<ConnectionRegistry>,
    /// Repository（データアクセス層の抽象化）
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn AccessTokenRepository>,
    pub messages: Arc<dyn ChatMessageRepository>,
    /// Resolves `auth` tokens into identities
    pub credentials: Arc<dyn CredentialValidator>,
    pub hasher: PasswordHasher,
    /// Lifetime of tokens issued by /auth/login
    pub token_ttl: Duration,
}

impl AppState {
    /// State backed by the in-memory repositories
    pub fn in_memory(token_ttl: Duration) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let tokens: Arc<dyn AccessTokenRepository> =
            Arc::new(InMemoryAccessTokenRepository::new());
        let credentials = Arc::new(TokenCredentialValidator::new(tokens.clone(), users.clone()));

        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            users,
            tokens,
            messages: Arc::new(InMemoryChatMessageRepository::new()),
            credentials,
            hasher: PasswordHasher::new(),
            token_ttl,
        }
    }
}
