//! Domain factories for creating domain entities and value objects.

use uuid::Uuid;

use super::{ConnectionId, Credential, error::ValueObjectError};

/// Factory for generating ConnectionId instances.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(Uuid::new_v4())
    }
}

/// Factory for issuing opaque session credentials.
///
/// This factory encapsulates the logic for generating new tokens,
/// separating the generation concern from the validation logic in Credential.
pub struct CredentialFactory;

impl CredentialFactory {
    /// Generate a new 64 hex character token from two random UUID v4 values.
    ///
    /// # Errors
    ///
    /// This method should not fail in practice, but returns Result for consistency
    /// with the domain error handling pattern.
    pub fn generate() -> Result<Credential, ValueObjectError> {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        Credential::new(token)
    }
}
