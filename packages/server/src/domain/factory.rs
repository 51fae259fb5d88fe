//! Domain factories for creating identifiers.

use uuid::Uuid;

use super::{GroupId, MessageId, SessionId, UserId};

/// Factory for generating identifier value objects.
///
/// Keeps the generation concern (random UUID v4) apart from the validation
/// logic in the identifier types themselves.
pub struct IdFactory;

impl IdFactory {
    /// Generate a new UserId with a random UUID v4.
    pub fn user_id() -> UserId {
        UserId::from_uuid(Uuid::new_v4())
    }

    /// Generate a new GroupId with a random UUID v4.
    pub fn group_id() -> GroupId {
        GroupId::from_uuid(Uuid::new_v4())
    }

    /// Generate a new MessageId with a random UUID v4.
    pub fn message_id() -> MessageId {
        MessageId::from_uuid(Uuid::new_v4())
    }

    /// Generate a new SessionId with a random UUID v4.
    pub fn session_id() -> SessionId {
        SessionId::from_uuid(Uuid::new_v4())
    }
}
