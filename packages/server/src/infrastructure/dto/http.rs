//! HTTP API request and response DTOs for the chat application.

use serde::{Deserialize, Serialize};

use crate::domain::{Group, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both signup and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub token: String,
}

/// Public user profile (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub created_at: String, // ISO 8601
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_str().to_string(),
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
            avatar: user.avatar.clone(),
            created_at: campfire_shared::time::millis_to_rfc3339(user.created_at.value()),
        }
    }
}

/// Partial profile update; absent fields stay unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// An empty string removes the avatar
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarRequest {
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Group summary for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub created_at: String, // ISO 8601
}

impl From<&Group> for GroupDto {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.as_str().to_string(),
            name: group.name.as_str().to_string(),
            description: group.description.clone(),
            members: group
                .members
                .iter()
                .map(|member| member.as_str().to_string())
                .collect(),
            created_at: campfire_shared::time::millis_to_rfc3339(group.created_at.value()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUserRequest {
    pub user_id: String,
}

/// Result of an idempotent membership change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub group_id: String,
    pub user_id: String,
    /// `false` when the user was already a member
    pub added: bool,
}
