//! Infrastructure layer
//!
//! Wire DTOs, in-memory repositories and credential handling that plug into
//! the traits defined by the domain layer.

pub mod auth;
pub mod dto;
pub mod repository;
