//! Embeddings and Semantic Similarity for Match Scoring
//!
//! This crate provides the semantic half of the match score: free-text
//! profile descriptions are turned into vector embeddings (OpenAI's
//! text-embedding-3-small model) and compared with cosine similarity.
//!
//! ## Features
//! - `EmbeddingProvider` trait so callers can inject any model
//! - Lazily-initialized OpenAI-backed provider
//! - SQLite cache for embeddings keyed by text hash
//! - Cosine similarity scaled to a 0 - 100 score

pub mod cache;
pub mod client;
pub mod error;
pub mod provider;
pub mod similarity;
pub mod types;

pub use cache::{CachedEmbeddingProvider, EmbeddingCache, EmbeddingCacheStats};
pub use client::OpenAiEmbeddingProvider;
pub use error::{EmbeddingError, Result};
pub use provider::{normalize, EmbeddingProvider};
pub use similarity::{cosine_similarity, similarity_score};
pub use types::{CachedEmbedding, EmbeddingVector};
