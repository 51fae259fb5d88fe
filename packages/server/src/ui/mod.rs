//! Chat server UI layer: HTTP routes and the WebSocket gateway.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use handler::http::{ApiError, AuthUser};
pub use runner::{create_app, run};
