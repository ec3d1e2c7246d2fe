//! Match generation and management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use matchmaker_core::{CandidateKind, MatchError, MatchQuery, MatchStatus};
use matchmaker_services::StatusUpdate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::AppState;

/// Request body for generating matches
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub startup_id: String,
}

/// Query parameters for listing matches
#[derive(Debug, Default, Deserialize)]
pub struct ListMatchesQuery {
    /// Filter by kind (investor or advisor)
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Filter by status, e.g. "Contacted"
    pub status: Option<String>,
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size
    pub limit: Option<usize>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response for a removed match
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub id: String,
    pub removed: bool,
}

/// Create match routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches/generate", post(generate_matches))
        .route("/matches/detail/{id}", get(get_match))
        .route("/matches/investor/{id}", get(list_for_investor))
        .route("/matches/advisor/{id}", get(list_for_advisor))
        .route("/matches/{id}", get(list_for_startup).delete(remove_match))
        .route("/matches/{id}/stats", get(match_stats))
        .route("/matches/{id}/status", put(update_status))
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
}

/// Map an engine error onto an HTTP response
fn error_response(e: MatchError) -> Response {
    let status = match &e {
        MatchError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchError::InvalidProfile { .. } | MatchError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if !e.is_client_error() {
        error!("Request failed: {}", e);
    }

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// Turn query-string filters into a typed query
fn parse_query(params: ListMatchesQuery) -> Result<MatchQuery, Response> {
    let kind = match params.kind.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(raw.parse::<CandidateKind>().map_err(bad_request)?),
    };
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<MatchStatus>().map_err(bad_request)?),
    };

    Ok(MatchQuery {
        kind,
        status,
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(MatchQuery::DEFAULT_LIMIT),
    })
}

/// Regenerate investor and advisor matches for a startup
async fn generate_matches(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    info!("Generating matches for startup {}", request.startup_id);

    match state.generator.generate_matches(&request.startup_id).await {
        Ok(generated) => (StatusCode::OK, Json(generated)).into_response(),
        Err(e) => error_response(e),
    }
}

/// List a startup's matches
async fn list_for_startup(
    State(state): State<AppState>,
    Path(startup_id): Path<String>,
    Query(params): Query<ListMatchesQuery>,
) -> Response {
    let query = match parse_query(params) {
        Ok(query) => query,
        Err(response) => return response,
    };

    match state
        .match_service
        .list_for_startup(&startup_id, &query)
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_for_candidate(
    state: AppState,
    candidate_id: String,
    kind: CandidateKind,
    params: ListMatchesQuery,
) -> Response {
    // The candidate kind comes from the path, not the query
    let query = match parse_query(ListMatchesQuery {
        kind: None,
        ..params
    }) {
        Ok(query) => query,
        Err(response) => return response,
    };

    match state
        .match_service
        .list_for_candidate(&candidate_id, kind, &query)
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => error_response(e),
    }
}

/// List matches an investor was recommended in
async fn list_for_investor(
    State(state): State<AppState>,
    Path(investor_id): Path<String>,
    Query(params): Query<ListMatchesQuery>,
) -> Response {
    list_for_candidate(state, investor_id, CandidateKind::Investor, params).await
}

/// List matches an advisor was recommended in
async fn list_for_advisor(
    State(state): State<AppState>,
    Path(advisor_id): Path<String>,
    Query(params): Query<ListMatchesQuery>,
) -> Response {
    list_for_candidate(state, advisor_id, CandidateKind::Advisor, params).await
}

async fn get_match(State(state): State<AppState>, Path(match_id): Path<String>) -> Response {
    match state.match_service.get_match(&match_id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn update_status(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    match state.match_service.update_status(&match_id, update).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Soft delete a match
async fn remove_match(State(state): State<AppState>, Path(match_id): Path<String>) -> Response {
    match state.match_service.remove_match(&match_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(RemovedResponse {
                id: match_id,
                removed: true,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Per-kind statistics for a startup
async fn match_stats(State(state): State<AppState>, Path(startup_id): Path<String>) -> Response {
    match state.match_service.stats(&startup_id).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use matchmaker_core::{
        CandidateProfile, FundingRange, InvestorProfile, Sector, Stage, StartupProfile,
    };
    use matchmaker_embedding::{EmbeddingError, EmbeddingProvider, EmbeddingVector};
    use matchmaker_services::{
        GeneratorConfig, MatchGenerator, MatchService, SqliteMatchStore,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct OfflineProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for OfflineProvider {
        async fn embed(&self, _text: &str) -> matchmaker_embedding::Result<EmbeddingVector> {
            Err(EmbeddingError::Unavailable("offline".to_string()))
        }

        fn model(&self) -> &str {
            "offline"
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn test_app() -> Router {
        let store = SqliteMatchStore::new_in_memory().expect("Failed to create test store");
        store
            .upsert_startup(&StartupProfile {
                id: "payflow".to_string(),
                name: "PayFlow".to_string(),
                sector: Sector::Fintech,
                stage: Stage::Seed,
                funding_required: FundingRange::new(50_000.0, 200_000.0),
                description: "payments API for SMBs".to_string(),
                tags: vec![],
                location: String::new(),
                is_active: true,
            })
            .unwrap();
        store
            .upsert_candidate(&CandidateProfile::Investor(InvestorProfile {
                id: "investor-a".to_string(),
                name: "Seed Capital".to_string(),
                sectors: vec![Sector::Fintech],
                preferred_stages: vec![Stage::Seed],
                investment_range: FundingRange::new(100_000.0, 500_000.0),
                geographic_focus: vec![],
                bio: String::new(),
                looking_for: None,
                previous_investments: 0,
                is_active: true,
            }))
            .unwrap();

        let store: Arc<SqliteMatchStore> = Arc::new(store);
        let state = AppState {
            generator: Arc::new(MatchGenerator::new(
                store.clone(),
                Arc::new(OfflineProvider),
                GeneratorConfig::default(),
            )),
            match_service: Arc::new(MatchService::new(store)),
            embedding_model: "offline".to_string(),
            embedding_cache: None,
        };

        Router::new()
            .nest("/api", crate::routes::api_routes())
            .with_state(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_then_manage() {
        let app = test_app();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/matches/generate",
                serde_json::json!({ "startup_id": "payflow" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["investor_matches"]["status"], "completed");
        assert_eq!(body["advisor_matches"]["matches"].as_array().unwrap().len(), 0);
        let match_id = body["investor_matches"]["matches"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, page) = send(&app, get_request("/api/matches/payflow?type=investor")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 1);
        assert_eq!(page["data"][0]["type"], "Investor");

        let (status, updated) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/matches/{}/status", match_id),
                serde_json::json!({ "status": "Viewed" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "Viewed");

        let (status, _) = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/matches/{}", match_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, page) = send(&app, get_request("/api/matches/investor/investor-a")).await;
        assert_eq!(page["count"], 0);
    }

    #[tokio::test]
    async fn test_unknown_startup_is_404() {
        let app = test_app();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/matches/generate",
                serde_json::json!({ "startup_id": "ghost" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("ghost"));

        let (status, _) = send(&app, get_request("/api/matches/detail/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_filter_is_400() {
        let app = test_app();
        let (status, _) = send(&app, get_request("/api/matches/payflow?status=Lost")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get_request("/api/matches/payflow?limit=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_empty() {
        let app = test_app();
        let uri = format!("/api/matches/payflow?page={}&limit=100000", usize::MAX);

        let (status, page) = send(&app, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 0);
        assert!(page["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_notes_is_422() {
        let app = test_app();
        let (_, body) = send(
            &app,
            json_request(
                "POST",
                "/api/matches/generate",
                serde_json::json!({ "startup_id": "payflow" }),
            ),
        )
        .await;
        let match_id = body["investor_matches"]["matches"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, _) = send(
            &app,
            json_request(
                "PUT",
                &format!("/api/matches/{}/status", match_id),
                serde_json::json!({ "status": "Contacted", "notes": "x".repeat(1001) }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_liveness() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(get_request("/api/health/live"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
