//! Hiroba room chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! HIROBA_WRITE_TIMEOUT_MS=5000 cargo run --bin hiroba-server
//! ```

use clap::Parser;
use hiroba_server::{app, config::ServerConfig};
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    let app = app::build(&config);
    if let Err(e) = app.server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
