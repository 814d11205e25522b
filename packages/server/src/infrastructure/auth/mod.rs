//! Credential handling: password digests and session token validation.

pub mod credential;
pub mod password;

pub use credential::TokenCredentialValidator;
pub use password::PasswordHasher;
