use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[error("Invalid input provided")]
    ValidationFailed,
    #[error("Already voted")]
    AlreadyVoted,
    #[error("Resource not found")]
    NotFound,
    #[error("Operation not authorized")]
    Unauthorized,
    #[error("Storage failure")]
    PersistenceFailed,
    #[error("Rate limit exceeded")]
    RateLimited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub error: String,
}

/// Which identity signal revealed that a vote was already cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChannel {
    Device,
    Email,
}

impl fmt::Display for VoteChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteChannel::Device => f.write_str("device"),
            VoteChannel::Email => f.write_str("email"),
        }
    }
}

/// Failure taxonomy of the voting core. Every operation returns either its
/// success value or one of these.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A ballot has already been cast from this {0}")]
    AlreadyVoted(VoteChannel),
    #[error("Storage failure: {0}")]
    Persistence(String),
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation(_) => ErrorCode::ValidationFailed,
            CoreError::AlreadyVoted(_) => ErrorCode::AlreadyVoted,
            CoreError::Persistence(_) => ErrorCode::PersistenceFailed,
        }
    }

    pub fn persistence(err: impl fmt::Display) -> Self {
        CoreError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
