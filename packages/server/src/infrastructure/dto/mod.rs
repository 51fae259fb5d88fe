//! Data transfer objects for the HTTP API and the WebSocket gateway.

pub mod http;
pub mod websocket;
