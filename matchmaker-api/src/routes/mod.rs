//! API route definitions

mod health;
mod matches;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(matches::routes())
        .merge(health::routes())
}
