//! Repository and collaborator traits.
//!
//! The domain defines what it needs from storage and credential checking;
//! `infrastructure` supplies the implementations (dependency inversion).

use async_trait::async_trait;

use super::{
    entity::{AccessToken, AuthenticatedUser, ChatMessage, NewUser, User},
    error::{CredentialError, RepositoryError},
    value_object::{Credential, UserId, Username},
};

/// User account storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user and allocate its id.
    ///
    /// Fails with `RepositoryError::UsernameTaken` when the username exists.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Look a user up by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look a user up by username.
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError>;
}

/// Issued access token storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenRepository: Send + Sync {
    /// Store a freshly issued token.
    async fn save(&self, token: AccessToken) -> Result<(), RepositoryError>;

    /// Look a token record up by its token string.
    async fn find_by_token(
        &self,
        credential: &Credential,
    ) -> Result<Option<AccessToken>, RepositoryError>;
}

/// Chat history storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    /// Persist one chat message.
    async fn save(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// Most recent messages, oldest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError>;
}

/// Resolves a presented credential into the user it belongs to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Validate `credential` and return the identity behind it.
    ///
    /// Invalid and expired tokens are distinguished in the error but callers
    /// are free to treat them the same way.
    async fn validate(&self, credential: &Credential)
    -> Result<AuthenticatedUser, CredentialError>;
}
