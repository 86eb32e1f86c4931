//! HTTP API server.
//!
//! Thin axum surface over the engine: health, per-team insight profiles,
//! fixture analyses and the run history.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::db::store::RunRecord;
use crate::engine::{EngineError, FixtureReport, InsightsEngine, TeamReport};

const RUN_HISTORY_LIMIT: i64 = 50;

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<InsightsEngine>,
    started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<InsightsEngine>) -> Self {
        Self {
            engine,
            started_at: Instant::now(),
        }
    }
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/insights/{team}", get(team_handler))
        .route("/api/fixture/{home}/{away}", get(fixture_handler))
        .route("/api/runs", get(runs_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// -- Route Handlers --

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn team_handler(
    State(state): State<AppState>,
    Path(team): Path<String>,
) -> Result<Json<TeamReport>, (StatusCode, Json<serde_json::Value>)> {
    state
        .engine
        .analyze_team(&team)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn fixture_handler(
    State(state): State<AppState>,
    Path((home, away)): Path<(String, String)>,
) -> Result<Json<FixtureReport>, (StatusCode, Json<serde_json::Value>)> {
    state
        .engine
        .analyze_fixture(&home, &away)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn runs_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<RunRecord>>, (StatusCode, Json<serde_json::Value>)> {
    state
        .engine
        .recent_runs(RUN_HISTORY_LIMIT)
        .await
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: EngineError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        EngineError::SameTeam => StatusCode::BAD_REQUEST,
        EngineError::UnknownTeam(_) => StatusCode::NOT_FOUND,
        EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Analysis request failed");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}
