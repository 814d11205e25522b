//! Kaiwa chat server.
//!
//! Accepts WebSocket connections on `/ws`, authenticates them with tokens
//! issued by `/auth/login` and broadcasts chat lines to every connection.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kaiwa-server -- --port 8080
//! ```

use clap::Parser;
use kaiwa_server::ServerConfig;
use kaiwa_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = kaiwa_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
