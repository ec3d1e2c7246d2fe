//! Error types for embedding operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The model could not be loaded or refused the input
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

impl From<rusqlite::Error> for EmbeddingError {
    fn from(e: rusqlite::Error) -> Self {
        EmbeddingError::Cache(e.to_string())
    }
}

impl From<bincode::error::EncodeError> for EmbeddingError {
    fn from(e: bincode::error::EncodeError) -> Self {
        EmbeddingError::Serialization(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for EmbeddingError {
    fn from(e: bincode::error::DecodeError) -> Self {
        EmbeddingError::Serialization(e.to_string())
    }
}
