//! Server configuration.
//!
//! Every option can be given as a CLI flag or through its `HIROBA_*`
//! environment variable; the flag wins.

use std::time::Duration;

use clap::Parser;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "hiroba-server")]
#[command(about = "Room chat server with per-room broadcast and live presence", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HIROBA_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "HIROBA_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "HIROBA_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Max time for one write to a connection before it counts as failed
    #[arg(long, env = "HIROBA_WRITE_TIMEOUT_MS", default_value_t = DEFAULT_WRITE_TIMEOUT_MS)]
    pub write_timeout_ms: u64,

    /// Default page size of room history
    #[arg(long, env = "HIROBA_HISTORY_LIMIT", default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub history_limit: usize,
}

impl ServerConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parsed_defaults() {
        // テスト項目: 引数なしでパースした設定が Default と一致する
        // given (前提条件):
        let args = ["hiroba-server"];

        // when (操作):
        let config = ServerConfig::try_parse_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.write_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_flags_override_defaults() {
        // テスト項目: CLI フラグで各設定を上書きできる
        // given (前提条件):
        let args = [
            "hiroba-server",
            "-H",
            "0.0.0.0",
            "-p",
            "3000",
            "--log-level",
            "info",
            "--write-timeout-ms",
            "250",
            "--history-limit",
            "20",
        ];

        // when (操作):
        let config = ServerConfig::try_parse_from(args).unwrap();

        // then (期待する結果):
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.write_timeout(), Duration::from_millis(250));
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        // テスト項目: 範囲外のポート番号はエラーになる
        // given (前提条件):
        let args = ["hiroba-server", "--port", "70000"];

        // when (操作):
        let result = ServerConfig::try_parse_from(args);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
