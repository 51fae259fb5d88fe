//! Infrastructure layer: stores, the room registry, external service clients
//! and wire DTOs.

pub mod auth;
pub mod dto;
pub mod registry;
pub mod repository;
pub mod toxicity;

pub use registry::{RegistryError, RoomRegistry, SessionSender};
pub use toxicity::HttpToxicityClassifier;
