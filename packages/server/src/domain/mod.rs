//! Domain layer for the chat application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{Group, Message, NewMessage, ToxicityVerdict, User};
pub use error::{ClassifierError, RepositoryError, ValueObjectError};
pub use factory::IdFactory;
pub use repository::{IdentityStore, MessageStore, ToxicityClassifier};
pub use value_object::{
    DisplayName, Email, GroupId, MessageContent, MessageId, SessionId, Timestamp, UserId,
};
