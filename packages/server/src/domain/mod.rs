//! Domain layer for the chat application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod connection;
pub mod entity;
pub mod error;
pub mod factory;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use connection::{ConnectionHandle, OutboundFrame};
pub use entity::{
    AccessToken, AuthenticatedUser, ChatMessage, ClientSession, NewUser, SessionIdentity, User,
};
pub use error::{
    CredentialError, DeliveryError, RegistryError, RepositoryError, ValueObjectError,
};
pub use factory::{ConnectionIdFactory, CredentialFactory};
pub use registry::{Admission, BroadcastSnapshot, ConnectionRegistry, Recipient, Registration};
pub use repository::{
    AccessTokenRepository, ChatMessageRepository, CredentialValidator, UserRepository,
};
pub use value_object::{
    ConnectionId, Credential, Email, MessageContent, PasswordHash, Timestamp, UserId, Username,
};
