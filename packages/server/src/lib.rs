//! Campfire group chat server library.
//!
//! Real-time relay of chat messages within groups over WebSocket, gated by
//! a remote toxicity classifier, plus the HTTP API for accounts and groups.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use config::{ServerArgs, ServerConfig};
pub use error::ServerError;

/// Run the server until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ui::run(config).await
}
