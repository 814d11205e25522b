//! Server configuration (command line flags with environment fallbacks).

use std::time::Duration;

use clap::Parser;

/// Kaiwa chat server
#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[command(name = "kaiwa-server", version, about = "Single-session WebSocket chat server")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, env = "KAIWA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "KAIWA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Lifetime of access tokens issued by /auth/login, in minutes
    #[arg(long, env = "KAIWA_TOKEN_TTL_MINUTES", default_value_t = 180)]
    pub token_ttl_minutes: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "KAIWA_LOG_LEVEL", default_value = "debug")]
    pub log_level: String,
}

impl ServerConfig {
    /// `host:port` for the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_minutes.saturating_mul(60))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            token_ttl_minutes: 180,
            log_level: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルトはローカルホストの 8080 番、トークン有効期間 3 時間
        // when (操作):
        let config = ServerConfig::default();

        // then (期待する結果):
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.token_ttl(), Duration::from_secs(3 * 60 * 60));
    }

    #[test]
    fn test_flags_override_defaults() {
        // テスト項目: フラグで各設定値を上書きできる
        // when (操作):
        let parsed = ServerConfig::try_parse_from([
            "kaiwa-server",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--token-ttl-minutes",
            "5",
            "--log-level",
            "info",
        ])
        .unwrap();

        // then (期待する結果):
        assert_eq!(parsed.bind_address(), "0.0.0.0:9000");
        assert_eq!(parsed.token_ttl(), Duration::from_secs(300));
        assert_eq!(parsed.log_level, "info");
    }
}
