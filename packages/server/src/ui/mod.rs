//! WebSocket chat server implementation.

mod handler;
mod runner;
pub mod session;
mod signal;
pub mod state; // 統合テストのフィクスチャから AppState を組み立てるため public

pub use runner::{router, run};
