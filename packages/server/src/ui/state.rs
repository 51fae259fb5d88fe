//! Shared application state.

use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::ServerConfig,
    domain::{IdentityStore, MessageStore},
    infrastructure::{RoomRegistry, auth::TokenService},
    usecase::RelayServices,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Session token; binds the connection to a user
    #[serde(default)]
    pub token: Option<String>,
    /// Group to join immediately after connecting
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Shared application state
pub struct AppState {
    pub identity: Arc<dyn IdentityStore>,
    pub messages: Arc<dyn MessageStore>,
    /// Live sessions and their group subscriptions
    pub registry: Arc<RoomRegistry>,
    /// Use cases shared by every WebSocket session
    pub relay: Arc<RelayServices>,
    pub tokens: Arc<TokenService>,
    pub config: ServerConfig,
}
