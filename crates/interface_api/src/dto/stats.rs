//! Stats DTOs

use serde::Serialize;

use engine_batch::StatsSnapshot;

#[derive(Debug, Serialize)]
pub struct ScorerInfo {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub scorers: Vec<ScorerInfo>,
    pub fraud_threshold: f64,
    pub consensus_threshold: usize,
}
