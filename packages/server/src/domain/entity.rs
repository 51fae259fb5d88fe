//! Core domain models for the chat application.

use serde::{Deserialize, Serialize};

use super::value_object::{
    DisplayName, Email, GroupId, MessageContent, MessageId, Timestamp, UserId,
};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: DisplayName,
    /// bcrypt hash of the password
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: Timestamp,
}

impl User {
    /// Create a new user record
    pub fn new(
        id: UserId,
        email: Email,
        name: DisplayName,
        password_hash: String,
        avatar: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            email,
            name,
            password_hash,
            avatar,
            created_at,
        }
    }
}

/// A chat group with its member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: DisplayName,
    pub description: Option<String>,
    /// Member user ids, in the order they were added. Never contains duplicates.
    pub members: Vec<UserId>,
    pub created_at: Timestamp,
}

impl Group {
    /// Create a new group without members
    pub fn new(
        id: GroupId,
        name: DisplayName,
        description: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            description,
            members: Vec::new(),
            created_at,
        }
    }

    /// Add a member if not already present.
    ///
    /// Returns `true` when the member was newly added.
    pub fn add_member(&mut self, user_id: UserId) -> bool {
        if self.is_member(&user_id) {
            return false;
        }
        self.members.push(user_id);
        true
    }

    /// Returns `true` when the member was present.
    pub fn remove_member(&mut self, user_id: &UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member != user_id);
        self.members.len() != before
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }
}

/// A chat message that passed the toxicity gate but is not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub content: MessageContent,
    pub sender: UserId,
    pub group: GroupId,
    pub timestamp: Timestamp,
}

impl NewMessage {
    pub fn new(
        content: MessageContent,
        sender: UserId,
        group: GroupId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            content,
            sender,
            group,
            timestamp,
        }
    }
}

/// A persisted chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier assigned by the message store
    pub id: MessageId,
    pub content: MessageContent,
    pub sender: UserId,
    pub group: GroupId,
    pub timestamp: Timestamp,
}

impl Message {
    /// Attach a store-assigned id to a new message
    pub fn persisted(id: MessageId, message: NewMessage) -> Self {
        Self {
            id,
            content: message.content,
            sender: message.sender,
            group: message.group,
            timestamp: message.timestamp,
        }
    }
}

/// Outcome of a toxicity check. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
    pub score: f64,
}

impl ToxicityVerdict {
    pub fn allow(score: f64) -> Self {
        Self {
            allowed: true,
            reason: None,
            score,
        }
    }

    pub fn deny(reason: impl Into<String>, score: f64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            score,
        }
    }
}
