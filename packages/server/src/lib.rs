//! Kaiwa chat server library.
//!
//! A WebSocket chat server where every user may hold at most one live
//! session. Layers: `domain` (value objects, entities, the connection
//! registry), `usecase` (authentication, chat, renaming, broadcast, account
//! management), `infrastructure` (wire DTOs, storage, credential checks) and
//! `ui` (axum router, handlers and the per-connection dispatch loop).

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::run as run_server;
