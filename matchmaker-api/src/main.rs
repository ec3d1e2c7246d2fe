//! Startup Matchmaker API Server
//!
//! HTTP API server that generates and manages startup / investor / advisor
//! matches.

mod routes;

use anyhow::Context;
use axum::{
    http::{header, Method},
    Router,
};
use matchmaker_embedding::{
    CachedEmbeddingProvider, EmbeddingCache, EmbeddingProvider, OpenAiEmbeddingProvider,
};
use matchmaker_services::{GeneratorConfig, MatchGenerator, MatchService, MatchStore, SqliteMatchStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Embeddings older than this are evicted on startup
const EMBEDDING_CACHE_TTL_DAYS: i64 = 30;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<MatchGenerator>,
    pub match_service: Arc<MatchService>,
    /// Model name reported by the health check
    pub embedding_model: String,
    /// Persistent embedding cache (absent if it could not be opened)
    pub embedding_cache: Option<EmbeddingCache>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,matchmaker_api=debug")),
        )
        .init();

    info!("Starting Startup Matchmaker API");

    // Initialize match store (SQLite database)
    let db_path =
        std::env::var("MATCH_DB_PATH").unwrap_or_else(|_| "data/matches.db".to_string());
    info!("Initializing match store at: {}", db_path);
    let store: Arc<dyn MatchStore> = Arc::new(
        SqliteMatchStore::new(&db_path).context("Failed to initialize match store")?,
    );

    // Initialize embedding provider; the OpenAI client itself is created on first use
    let openai: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::from_env());
    let embedding_model = openai.model().to_string();

    let cache_path = std::env::var("EMBEDDING_CACHE_PATH")
        .unwrap_or_else(|_| "data/embeddings.db".to_string());
    let (embedder, embedding_cache): (Arc<dyn EmbeddingProvider>, Option<EmbeddingCache>) =
        match EmbeddingCache::new(&cache_path) {
            Ok(cache) => {
                info!("Embedding cache opened at: {}", cache_path);
                if let Err(e) =
                    cache.cleanup_older_than(chrono::Duration::days(EMBEDDING_CACHE_TTL_DAYS))
                {
                    warn!("Failed to clean up embedding cache: {}", e);
                }
                (
                    Arc::new(CachedEmbeddingProvider::new(openai, cache.clone())),
                    Some(cache),
                )
            }
            Err(e) => {
                warn!("Embedding cache unavailable, embedding without it: {}", e);
                (openai, None)
            }
        };

    let generator_config = GeneratorConfig::from_env();
    info!(
        "Match generation: min score {}, top {}, {} concurrent scorers",
        generator_config.min_score, generator_config.top_n, generator_config.scoring_concurrency
    );

    // Create app state
    let state = AppState {
        generator: Arc::new(MatchGenerator::new(
            store.clone(),
            embedder,
            generator_config,
        )),
        match_service: Arc::new(MatchService::new(store)),
        embedding_model,
        embedding_cache,
    };

    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Build router
    let app = Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Start server
    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
