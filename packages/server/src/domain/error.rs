//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// Identifier validation error
    #[error("{kind} id cannot be empty")]
    IdEmpty { kind: &'static str },

    /// Identifier invalid format error (not a valid UUID format)
    #[error("{kind} id must be a valid UUID (got: {value})")]
    IdInvalidFormat { kind: &'static str, value: String },

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} bytes (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    #[error("invalid e-mail address: {0}")]
    EmailInvalid(String),

    #[error("name cannot be empty")]
    NameEmpty,

    #[error("name cannot exceed {max} bytes (got {actual})")]
    NameTooLong { max: usize, actual: usize },
}

/// Errors returned by the identity and message stores
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The requested record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint was violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or failed
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the toxicity classifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("toxicity check timed out after {0} ms")]
    Timeout(u64),

    #[error("toxicity service unreachable: {0}")]
    Transport(String),

    #[error("toxicity service answered with status {0}")]
    Status(u16),

    #[error("toxicity service returned an invalid response: {0}")]
    InvalidResponse(String),
}
