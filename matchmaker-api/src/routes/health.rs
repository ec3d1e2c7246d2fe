//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    embedding_model: String,
    /// Number of cached embeddings, absent when the cache is unavailable
    cached_embeddings: Option<usize>,
}

/// Health check handler
///
/// Reports "degraded" when the embedding cache cannot be read. Matches can
/// still be generated in that state.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cached_embeddings = match &state.embedding_cache {
        Some(cache) => match cache.stats() {
            Ok(stats) => Some(stats.entries),
            Err(e) => {
                warn!("Embedding cache stats failed: {}", e);
                None
            }
        },
        None => None,
    };

    let status = if cached_embeddings.is_some() {
        "healthy"
    } else {
        "degraded"
    };

    let response = HealthResponse {
        status: status.to_string(),
        embedding_model: state.embedding_model.clone(),
        cached_embeddings,
    };

    let code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
