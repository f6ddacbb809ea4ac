//! Stats handlers

use axum::{extract::State, Json};

use crate::dto::stats::*;
use crate::AppState;

/// Processing statistics and the configured scorer line-up
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let manager = &state.manager;
    let consensus = manager.pipeline().engine().config();

    let scorers = manager
        .pipeline()
        .scorer_versions()
        .into_iter()
        .map(|(id, version)| ScorerInfo { id, version })
        .collect();

    Json(StatsResponse {
        stats: manager.stats(),
        scorers,
        fraud_threshold: consensus.fraud_threshold,
        consensus_threshold: consensus.consensus_threshold,
    })
}
