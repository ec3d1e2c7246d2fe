//! OpenAI embedding provider

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{EmbeddingError, Result},
    provider::{normalize, EmbeddingProvider},
    types::EmbeddingVector,
};

const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSION: usize = 1536;

/// OpenAI-backed embedding provider
///
/// The HTTP client is built on first use and reused afterwards. Concurrent
/// first calls share a single initialization.
pub struct OpenAiEmbeddingProvider {
    api_key: Option<String>,
    client: OnceCell<Client<OpenAIConfig>>,
    model: String,
    dimension: usize,
}

impl OpenAiEmbeddingProvider {
    /// Create a new provider
    ///
    /// Uses text-embedding-3-small model (1536 dimensions).
    /// A missing key is not an error here; every `embed` call will report
    /// the model as unavailable instead.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: OnceCell::new(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Create a provider reading `OPENAI_API_KEY` from the environment
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        if api_key.is_none() {
            warn!("OPENAI_API_KEY not set - semantic match scores will be 0");
        }
        Self::new(api_key)
    }

    /// Lazily construct the client
    async fn client(&self) -> Result<&Client<OpenAIConfig>> {
        self.client
            .get_or_try_init(|| async {
                let api_key = self
                    .api_key
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        EmbeddingError::Unavailable("OpenAI API key not configured".to_string())
                    })?;

                info!("Initializing OpenAI embedding client (model={})", self.model);
                let config = OpenAIConfig::new().with_api_key(api_key);
                Ok::<_, EmbeddingError>(Client::with_config(config))
            })
            .await
    }

    /// Low-level embedding generation
    async fn generate_embedding(&self, text: &str) -> Result<EmbeddingVector> {
        let client = self.client().await?;

        let request = CreateEmbeddingRequest {
            model: self.model.clone(),
            input: EmbeddingInput::String(text.to_string()),
            encoding_format: None,
            dimensions: None,
            user: None,
        };

        let response = client.embeddings().create(request).await?;

        let Some(first) = response.data.into_iter().next() else {
            return Err(EmbeddingError::Unavailable(
                "No embeddings returned from API".to_string(),
            ));
        };

        let mut embedding = first.embedding;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::InvalidDimension {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        normalize(&mut embedding);

        debug!(
            "Generated embedding: dimension={}, model={}",
            embedding.len(),
            self.model
        );

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        self.generate_embedding(text).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
