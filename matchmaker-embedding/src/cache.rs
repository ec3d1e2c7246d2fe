//! SQLite cache for profile embeddings using rusqlite

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::Result,
    provider::EmbeddingProvider,
    types::{text_hash, CachedEmbedding, EmbeddingVector},
};

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// SQLite store for embeddings, keyed by (text hash, model)
#[derive(Clone)]
pub struct EmbeddingCache {
    conn: Arc<Mutex<Connection>>,
}

impl EmbeddingCache {
    /// Open (or create) a cache database
    ///
    /// # Arguments
    /// * `database_path` - Path to SQLite database file
    #[instrument(skip(database_path))]
    pub fn new<P: AsRef<Path> + std::fmt::Debug>(database_path: P) -> Result<Self> {
        info!("Opening embedding cache: {:?}", database_path.as_ref());
        if let Some(parent) = database_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    crate::EmbeddingError::Cache(format!(
                        "Failed to create cache directory: {}",
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(database_path.as_ref())?;

        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        cache.init_tables()?;
        Ok(cache)
    }

    /// Create an in-memory cache (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        cache.init_tables()?;
        Ok(cache)
    }

    fn init_tables(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS profile_embeddings (
                text_hash TEXT NOT NULL,
                model TEXT NOT NULL,
                embedding BLOB NOT NULL,
                dimension INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (text_hash, model)
            );

            CREATE INDEX IF NOT EXISTS idx_profile_embeddings_created
            ON profile_embeddings(created_at);",
        )?;

        debug!("Embedding cache tables initialized");
        Ok(())
    }

    /// Save or replace a cached embedding
    #[instrument(skip(self, entry), fields(text_hash = %entry.text_hash))]
    pub fn put(&self, entry: &CachedEmbedding) -> Result<()> {
        let embedding_bytes = bincode::encode_to_vec(&entry.embedding, bincode_config())?;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO profile_embeddings
             (text_hash, model, embedding, dimension, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(text_hash, model) DO UPDATE SET
                embedding = excluded.embedding,
                dimension = excluded.dimension,
                created_at = excluded.created_at",
            params![
                &entry.text_hash,
                &entry.model,
                &embedding_bytes,
                entry.dimension as i64,
                entry.created_at.timestamp(),
            ],
        )?;

        Ok(())
    }

    /// Look up the embedding of `text` produced by `model`
    pub fn get(&self, text: &str, model: &str) -> Result<Option<EmbeddingVector>> {
        let key = text_hash(text);
        let conn = self.conn.lock();

        let bytes: Option<Vec<u8>> = conn
            .query_row(
                "SELECT embedding FROM profile_embeddings
                 WHERE text_hash = ? AND model = ?",
                params![key, model],
                |row| row.get(0),
            )
            .optional()?;

        match bytes {
            Some(bytes) => {
                let (embedding, _): (Vec<f32>, usize) =
                    bincode::decode_from_slice(&bytes, bincode_config())?;
                Ok(Some(embedding))
            }
            None => Ok(None),
        }
    }

    /// Remove entries older than `max_age`
    #[instrument(skip(self))]
    pub fn cleanup_older_than(&self, max_age: chrono::Duration) -> Result<usize> {
        let cutoff = (Utc::now() - max_age).timestamp();
        let conn = self.conn.lock();

        let deleted = conn.execute(
            "DELETE FROM profile_embeddings WHERE created_at < ?",
            params![cutoff],
        )?;

        if deleted > 0 {
            info!("Cleaned up {} stale profile embeddings", deleted);
        }

        Ok(deleted)
    }

    /// Get statistics about cached embeddings
    pub fn stats(&self) -> Result<EmbeddingCacheStats> {
        let conn = self.conn.lock();

        let entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM profile_embeddings", [], |row| row.get(0))?;

        // Get database size (page_count * page_size)
        let page_count: i64 = conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap_or(0);
        let page_size: i64 = conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .unwrap_or(4096);

        Ok(EmbeddingCacheStats {
            entries: entries as usize,
            database_size_bytes: (page_count * page_size) as usize,
        })
    }
}

/// Statistics about the embedding cache
#[derive(Debug, Clone)]
pub struct EmbeddingCacheStats {
    pub entries: usize,
    pub database_size_bytes: usize,
}

/// Provider decorator that serves repeated texts from an [`EmbeddingCache`]
///
/// Cache read/write failures are logged and fall through to the inner
/// provider; they never fail an embedding call on their own.
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, cache: EmbeddingCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        match self.cache.get(text, self.inner.model()) {
            Ok(Some(embedding)) => {
                debug!("Embedding cache hit");
                return Ok(embedding);
            }
            Ok(None) => {}
            Err(e) => warn!("Embedding cache read failed: {}", e),
        }

        let embedding = self.inner.embed(text).await?;

        let entry = CachedEmbedding::new(text, self.inner.model(), embedding.clone());
        if let Err(e) = self.cache.put(&entry) {
            warn!("Embedding cache write failed: {}", e);
        }

        Ok(embedding)
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
