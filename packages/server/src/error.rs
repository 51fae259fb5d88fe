//! Startup and serve errors.

use thiserror::Error;

use crate::domain::{ClassifierError, RepositoryError, ValueObjectError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("toxicity classifier setup failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("failed to seed group: {0}")]
    Seed(#[from] RepositoryError),

    #[error("invalid seed group: {0}")]
    InvalidSeedGroup(#[from] ValueObjectError),
}
