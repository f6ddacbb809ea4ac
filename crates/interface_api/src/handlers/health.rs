//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub scorers: usize,
}

/// Health check endpoint
///
/// Reports `degraded` when no scorer is configured; the process is still live.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let scorers = state.manager.pipeline().scorer_count();
    let status = if scorers == 0 { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scorers,
    })
}
