//! Core types for embeddings

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Embedding vector (1536 dimensions for text-embedding-3-small)
pub type EmbeddingVector = Vec<f32>;

/// A cached embedding for one piece of profile text
#[derive(Debug, Clone)]
pub struct CachedEmbedding {
    /// SHA256 of the embedded text (hex)
    pub text_hash: String,
    /// Model that produced the vector
    pub model: String,
    /// The (unit length) embedding vector
    pub embedding: EmbeddingVector,
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}

impl CachedEmbedding {
    /// Create a cache entry for `text`
    pub fn new(text: &str, model: &str, embedding: EmbeddingVector) -> Self {
        Self {
            text_hash: text_hash(text),
            model: model.to_string(),
            dimension: embedding.len(),
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// Stable cache key for a piece of text
pub fn text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
