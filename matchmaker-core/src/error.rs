//! Error types for the matchmaking engine

use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid profile ({id}): {reason}")]
    InvalidProfile { id: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MatchError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        MatchError::NotFound(msg.into())
    }

    pub fn invalid_profile(id: impl Into<String>, reason: impl Into<String>) -> Self {
        MatchError::InvalidProfile {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        MatchError::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        MatchError::Storage(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        MatchError::Serialization(msg.into())
    }

    /// True for errors caused by the caller's input rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MatchError::NotFound(_) | MatchError::InvalidProfile { .. } | MatchError::Validation(_)
        )
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(e: serde_json::Error) -> Self {
        MatchError::Serialization(e.to_string())
    }
}

/// Result type alias for matchmaking operations
pub type MatchResult<T> = Result<T, MatchError>;
