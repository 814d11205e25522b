//! Token-backed credential validation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    AccessTokenRepository, AuthenticatedUser, Credential, CredentialError, CredentialValidator,
    Timestamp, UserRepository,
};

/// Resolves a session token through the issued-token store and the user store.
pub struct TokenCredentialValidator {
    tokens: Arc<dyn AccessTokenRepository>,
    users: Arc<dyn UserRepository>,
}

impl TokenCredentialValidator {
    pub fn new(tokens: Arc<dyn AccessTokenRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }
}

#[async_trait]
impl CredentialValidator for TokenCredentialValidator {
    async fn validate(
        &self,
        credential: &Credential,
    ) -> Result<AuthenticatedUser, CredentialError> {
        let token = self
            .tokens
            .find_by_token(credential)
            .await?
            .ok_or(CredentialError::NotFound)?;

        if token.is_expired_at(Timestamp::now()) {
            return Err(CredentialError::Expired);
        }

        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(CredentialError::UnknownUser(token.user_id))?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
        })
    }
}
