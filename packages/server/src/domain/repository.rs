//! Repository and gateway traits the use cases depend on.
//!
//! Concrete implementations live in the infrastructure layer; use cases only
//! see these traits (dependency inversion).

use async_trait::async_trait;

use super::{
    Email, Group, GroupId, Message, NewMessage, ToxicityVerdict, User, UserId,
    error::{ClassifierError, RepositoryError},
};

/// User and group records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_user(&self, id: &UserId) -> Result<User, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<User, RepositoryError>;

    /// Insert a new user. Fails with `Conflict` if the e-mail is taken.
    async fn insert_user(&self, user: User) -> Result<(), RepositoryError>;

    /// Replace a stored user. Fails with `NotFound` if absent and with
    /// `Conflict` if another user holds the new e-mail.
    async fn update_user(&self, user: User) -> Result<(), RepositoryError>;

    /// Remove a user and drop it from every group's member list.
    async fn delete_user(&self, id: &UserId) -> Result<(), RepositoryError>;

    async fn get_group(&self, id: &GroupId) -> Result<Group, RepositoryError>;

    async fn insert_group(&self, group: Group) -> Result<(), RepositoryError>;

    /// All groups, sorted by name.
    async fn list_groups(&self) -> Result<Vec<Group>, RepositoryError>;

    /// Groups that list the user as a member, sorted by name.
    async fn list_groups_for_member(&self, user_id: &UserId)
    -> Result<Vec<Group>, RepositoryError>;

    /// Add a member to a group (`$addToSet` semantics).
    ///
    /// Returns `true` if the user was newly added, `false` if already a member.
    async fn add_member(&self, group_id: &GroupId, user_id: &UserId)
    -> Result<bool, RepositoryError>;
}

/// Append-only chat message persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and return it with its store-assigned id.
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// Messages of a group in ascending timestamp order; ties keep insertion order.
    async fn list_by_group(&self, group_id: &GroupId) -> Result<Vec<Message>, RepositoryError>;
}

/// Remote toxicity analysis.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ToxicityVerdict, ClassifierError>;
}
