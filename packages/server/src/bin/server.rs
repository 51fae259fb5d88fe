//! Campfire group chat server.
//!
//! Relays chat messages between the members of a group, after checking them
//! with the toxicity analysis service.
//!
//! Run with:
//! ```not_rust
//! CAMPFIRE_JWT_SECRET=change-me cargo run --bin campfire-server -- --seed-group general
//! ```

use campfire_server::{ServerArgs, ServerConfig};
use campfire_shared::logger::setup_logger;
use clap::Parser;

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    // Run the server
    if let Err(e) = campfire_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
