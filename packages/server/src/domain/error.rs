//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::{ConnectionId, UserId};

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId must be a positive number
    #[error("UserId must be positive (got {0})")]
    UserIdNotPositive(i64),

    /// Credential validation error
    #[error("Credential cannot be empty")]
    CredentialEmpty,

    /// Username validation error
    #[error("Username cannot be empty")]
    UsernameEmpty,

    /// Username too long error
    #[error("Username cannot exceed {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    /// Email format error
    #[error("Email must look like local@domain (got: {0})")]
    EmailInvalidFormat(String),

    /// Password length error
    #[error("Password must be between {min} and {max} characters (got {actual})")]
    PasswordLength {
        min: usize,
        max: usize,
        actual: usize,
    },
}

/// Errors raised by storage collaborators (users, tokens, chat history)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A user with the same username already exists
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// The backing store failed
    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Errors raised while resolving a credential into an identity
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No token record matches the credential
    #[error("Credential not found")]
    NotFound,

    /// The token record exists but its expiry has passed
    #[error("Credential expired")]
    Expired,

    /// The token points at a user that no longer exists
    #[error("User {0} referenced by credential not found")]
    UnknownUser(UserId),

    /// Lookup failed in the backing store
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Precondition violations on the connection registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The connection was never registered or has already been unregistered
    #[error("Connection {0} is not registered")]
    ConnectionNotRegistered(ConnectionId),

    /// The connection already carries an identity
    #[error("Connection {0} is already authenticated")]
    AlreadyAuthenticated(ConnectionId),
}

/// Failure to queue a frame for a connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The connection's writer has shut down
    #[error("Connection writer is closed")]
    ConnectionClosed,
}
