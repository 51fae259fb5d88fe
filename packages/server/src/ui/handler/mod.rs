//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{
    add_user_to_group, create_group, current_user, delete_user, get_user, group_messages,
    health_check, join_group, list_groups, list_user_groups, login, signup, update_avatar,
    update_user,
};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
